use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use crate::dcel::{Dcel, DummyKind, HedgeId, VertexId, VertexKind};
use crate::error::{Axis, CompactionError, LayoutError};

use super::types::{Dir, OrthoRep, Point};

/// Integer geometry of one compaction run: a grid point per vertex of the
/// (bend-refined) structure and the bend points of every original
/// half-edge, origin to target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coords {
    pub pos: Vec<Point>,
    pub hedge_bends: Vec<Vec<Point>>,
}

/// Assigns minimal integer coordinates satisfying the orthogonal shape.
/// Bends become degree-2 refinement dummies so every edge runs straight;
/// maximal straight runs collapse into row/column segments, and a
/// longest-path pass over each axis's segment constraint graph yields the
/// coordinates. A cycle in either constraint graph means the shape stage
/// emitted inconsistent directions and is fatal.
pub fn compute_coordinates(
    dcel: &Dcel,
    rep: &OrthoRep,
    separation: u32,
) -> Result<Coords, LayoutError> {
    let mut refined = dcel.clone();
    let mut dirs: Vec<Dir> = rep.dirs.clone();
    let orig_hedges = dcel.num_hedges();
    let mut bend_vertices: Vec<Vec<VertexId>> = vec![Vec::new(); orig_hedges];

    for h in 0..orig_hedges {
        let twin = dcel.hedges[h].twin;
        if twin.0 < h as u32 || rep.bends[h].is_empty() {
            continue;
        }
        let mut cur = HedgeId(h as u32);
        let mut cur_dir = rep.dirs[h];
        for &turn in &rep.bends[h] {
            let far_twin = refined.hedges[cur.0 as usize].twin;
            let (d, cont) = refined.split_edge(
                cur,
                VertexKind::Dummy {
                    kind: DummyKind::Bend,
                    anchor: None,
                },
            )?;
            let next_dir = cur_dir.rotated(turn.quarters());
            dirs.push(next_dir);
            dirs.push(cur_dir.opposite());
            dirs[far_twin.0 as usize] = next_dir.opposite();
            bend_vertices[h].push(d);
            cur = cont;
            cur_dir = next_dir;
        }
    }

    let nv = refined.num_vertices();
    let mut rows = UnionFind::new(nv);
    let mut cols = UnionFind::new(nv);
    for h in 0..refined.num_hedges() {
        let twin = refined.hedges[h].twin;
        if twin.0 < h as u32 {
            continue;
        }
        let a = refined.hedges[h].origin.0 as usize;
        let b = refined.hedges[twin.0 as usize].origin.0 as usize;
        if dirs[h].is_horizontal() {
            rows.union(a, b);
        } else {
            cols.union(a, b);
        }
    }

    let sep = i64::from(separation.max(1));
    let mut xarcs = Vec::new();
    let mut yarcs = Vec::new();
    for h in 0..refined.num_hedges() {
        let twin = refined.hedges[h].twin;
        let a = refined.hedges[h].origin.0 as usize;
        let b = refined.hedges[twin.0 as usize].origin.0 as usize;
        match dirs[h] {
            Dir::East => xarcs.push((cols.find(a), cols.find(b))),
            Dir::North => yarcs.push((rows.find(a), rows.find(b))),
            Dir::West | Dir::South => {}
        }
    }

    let xval = longest_values(nv, &mut cols, &xarcs, sep, Axis::Horizontal)?;
    let yval = longest_values(nv, &mut rows, &yarcs, sep, Axis::Vertical)?;

    // Components are placed side by side, each normalized to start at
    // x = offset, y = 0. Component roots are minimal vertex ids, so the
    // ordering is stable.
    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for v in 0..nv {
        groups
            .entry(refined.component_root_of(VertexId(v as u32)))
            .or_default()
            .push(v);
    }
    let mut pos = vec![Point::new(0, 0); nv];
    let mut offset = 0i64;
    for members in groups.values() {
        let mut min_x = i64::MAX;
        let mut max_x = i64::MIN;
        let mut min_y = i64::MAX;
        for &v in members {
            let x = xval[cols.find(v)];
            let y = yval[rows.find(v)];
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
        }
        for &v in members {
            let x = xval[cols.find(v)] - min_x + offset;
            let y = yval[rows.find(v)] - min_y;
            pos[v] = Point::new(x as i32, y as i32);
        }
        offset += (max_x - min_x) + sep + 1;
    }

    let mut hedge_bends: Vec<Vec<Point>> = vec![Vec::new(); orig_hedges];
    for h in 0..orig_hedges {
        if bend_vertices[h].is_empty() {
            continue;
        }
        let points: Vec<Point> = bend_vertices[h]
            .iter()
            .map(|d| pos[d.0 as usize])
            .collect();
        let twin = dcel.hedges[h].twin;
        hedge_bends[twin.0 as usize] = points.iter().rev().copied().collect();
        hedge_bends[h] = points;
    }
    Ok(Coords { pos, hedge_bends })
}

/// Critical-path layering of one axis: Kahn order with ties broken toward
/// the lowest segment id, each arc demanding `sep` units of growth.
fn longest_values(
    num_vertices: usize,
    uf: &mut UnionFind,
    arcs: &[(usize, usize)],
    sep: i64,
    axis: Axis,
) -> Result<Vec<i64>, CompactionError> {
    let mut roots = BTreeSet::new();
    for v in 0..num_vertices {
        roots.insert(uf.find(v));
    }
    let mut indeg: BTreeMap<usize, usize> = BTreeMap::new();
    let mut succ: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &(a, b) in arcs {
        succ.entry(a).or_default().push(b);
        *indeg.entry(b).or_insert(0) += 1;
    }

    let mut values = vec![0i64; num_vertices];
    let mut heap: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
    for &r in &roots {
        if indeg.get(&r).copied().unwrap_or(0) == 0 {
            heap.push(Reverse(r));
        }
    }
    let mut processed = 0usize;
    while let Some(Reverse(r)) = heap.pop() {
        processed += 1;
        if let Some(out) = succ.get(&r) {
            for &next in out {
                if values[r] + sep > values[next] {
                    values[next] = values[r] + sep;
                }
                if let Some(slot) = indeg.get_mut(&next) {
                    *slot -= 1;
                    if *slot == 0 {
                        heap.push(Reverse(next));
                    }
                }
            }
        }
    }
    if processed < roots.len() {
        let stuck = roots
            .iter()
            .copied()
            .find(|r| indeg.get(r).copied().unwrap_or(0) > 0)
            .unwrap_or(0);
        return Err(CompactionError::ConstraintCycle {
            axis,
            segment: stuck,
        });
    }
    Ok(values)
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut v: usize) -> usize {
        while self.parent[v] != v {
            self.parent[v] = self.parent[self.parent[v]];
            v = self.parent[v];
        }
        v
    }

    /// Keeps the smaller index as the root so segment ids are stable.
    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
