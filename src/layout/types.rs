use std::collections::BTreeMap;

use serde::Serialize;

use crate::dcel::{Dcel, DummyKind, HedgeId};
use crate::error::OrthogonalizationError;

/// Compass direction of a half-edge leaving its origin. Variants are in
/// counter-clockwise order so quarter-turn arithmetic is index arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Dir {
    East,
    North,
    West,
    South,
}

impl Dir {
    fn index(self) -> i32 {
        match self {
            Dir::East => 0,
            Dir::North => 1,
            Dir::West => 2,
            Dir::South => 3,
        }
    }

    fn from_index(i: i32) -> Dir {
        match i.rem_euclid(4) {
            0 => Dir::East,
            1 => Dir::North,
            2 => Dir::West,
            _ => Dir::South,
        }
    }

    /// Rotates by `quarters` quarter turns, counter-clockwise positive.
    pub fn rotated(self, quarters: i32) -> Dir {
        Dir::from_index(self.index() + quarters)
    }

    pub fn opposite(self) -> Dir {
        self.rotated(2)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Dir::East | Dir::West)
    }

    /// Unit grid step of this direction, y growing north.
    pub fn step(self) -> (i32, i32) {
        match self {
            Dir::East => (1, 0),
            Dir::North => (0, 1),
            Dir::West => (-1, 0),
            Dir::South => (0, -1),
        }
    }
}

/// A 90-degree bend along an edge, seen while walking the half-edge from
/// its origin. `Left` keeps the incident face of the half-edge convex at
/// the bend point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Turn {
    Left,
    Right,
}

impl Turn {
    pub fn quarters(self) -> i32 {
        match self {
            Turn::Left => 1,
            Turn::Right => -1,
        }
    }
}

/// Shape of the drawing without coordinates: a compass direction per
/// half-edge, its bend sequence, and the angle code of the corner at its
/// origin inside its face (`corners[h] + 1` quarter turns of interior
/// angle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrthoRep {
    pub dirs: Vec<Dir>,
    pub bends: Vec<Vec<Turn>>,
    pub corners: Vec<u8>,
}

impl OrthoRep {
    pub fn dir(&self, h: HedgeId) -> Dir {
        self.dirs[h.0 as usize]
    }

    pub fn bends(&self, h: HedgeId) -> &[Turn] {
        &self.bends[h.0 as usize]
    }

    /// Direction of the final segment of `h`, after its bends.
    pub fn end_dir(&self, h: HedgeId) -> Dir {
        let spin: i32 = self.bends[h.0 as usize]
            .iter()
            .map(|t| t.quarters())
            .sum();
        self.dir(h).rotated(spin)
    }

    /// Total bends over undirected edges.
    pub fn bend_count(&self) -> usize {
        self.bends.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Re-checks the discrete angle identities this representation must
    /// satisfy: every bounded face turns through +360 degrees and every
    /// outer face through -360, twins run opposite, and no two half-edges
    /// leave a vertex in the same direction.
    pub fn check_invariants(&self, dcel: &Dcel) -> Result<(), OrthogonalizationError> {
        for f in dcel.face_ids() {
            let boundary = dcel
                .face_hedges(f)
                .map_err(|_| OrthogonalizationError::InfeasibleFlow)?;
            let mut quarters: i32 = 0;
            for &h in &boundary {
                for turn in self.bends(h) {
                    quarters += turn.quarters();
                }
            }
            for &h in &boundary {
                let nh = dcel
                    .next(h)
                    .map_err(|_| OrthogonalizationError::InfeasibleFlow)?;
                quarters += 1 - i32::from(self.corners[nh.0 as usize]);
            }
            let expected = if dcel.is_outer(f).unwrap_or(false) { -4 } else { 4 };
            if quarters != expected {
                return Err(OrthogonalizationError::DirectionConflict {
                    hedge: boundary[0],
                });
            }
        }
        for h in 0..self.dirs.len() {
            let h = HedgeId(h as u32);
            let t = dcel
                .twin(h)
                .map_err(|_| OrthogonalizationError::InfeasibleFlow)?;
            if self.dir(t) != self.end_dir(h).opposite() {
                return Err(OrthogonalizationError::DirectionConflict { hedge: h });
            }
        }
        for v in 0..dcel.num_vertices() {
            let rotation = dcel
                .half_edges_ccw(crate::dcel::VertexId(v as u32))
                .map_err(|_| OrthogonalizationError::InfeasibleFlow)?;
            let mut seen = [false; 4];
            for h in rotation {
                let slot = self.dir(h).index() as usize;
                if seen[slot] {
                    return Err(OrthogonalizationError::DirectionConflict { hedge: h });
                }
                seen[slot] = true;
            }
        }
        Ok(())
    }
}

/// Integer grid point, y growing north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Polyline of one input edge, endpoints included. Interior points are
/// bends, crossings, or canonicalization dummies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgePath {
    pub from: u32,
    pub to: u32,
    pub points: Vec<Point>,
}

impl EdgePath {
    /// Interior points only, i.e. where the polyline changes direction or
    /// passes through a synthetic vertex.
    pub fn interior(&self) -> &[Point] {
        if self.points.len() <= 2 {
            &[]
        } else {
            &self.points[1..self.points.len() - 1]
        }
    }
}

/// Synthetic vertex surfaced when the caller keeps dummies visible. Ids
/// are allocated above the highest input vertex id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DummyVertex {
    pub id: u32,
    pub kind: DummyKind,
    pub position: Point,
}

/// Final drawing: integer positions per input vertex, one polyline per
/// input edge, and the synthetic vertices the caller asked to keep. The
/// drawing occupies `[0, width] x [0, height]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub positions: BTreeMap<u32, Point>,
    pub edges: Vec<EdgePath>,
    pub dummy_vertices: Vec<DummyVertex>,
    pub width: i32,
    pub height: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_in_quarter_turns() {
        assert_eq!(Dir::East.rotated(1), Dir::North);
        assert_eq!(Dir::East.rotated(-1), Dir::South);
        assert_eq!(Dir::South.rotated(2), Dir::North);
        assert_eq!(Dir::West.opposite(), Dir::East);
    }

    #[test]
    fn end_dir_applies_bends_in_order() {
        let rep = OrthoRep {
            dirs: vec![Dir::East],
            bends: vec![vec![Turn::Left, Turn::Left, Turn::Right]],
            corners: vec![0],
        };
        assert_eq!(rep.end_dir(HedgeId(0)), Dir::North);
    }

    #[test]
    fn interior_points_drop_endpoints() {
        let path = EdgePath {
            from: 0,
            to: 1,
            points: vec![Point::new(0, 0), Point::new(1, 0), Point::new(1, 1)],
        };
        assert_eq!(path.interior(), &[Point::new(1, 0)]);
    }
}
