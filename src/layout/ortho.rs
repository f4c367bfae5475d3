use std::collections::BTreeMap;

use crate::dcel::{Dcel, DummyKind, HedgeId, VertexId, VertexKind};
use crate::error::OrthogonalizationError;

use super::flow::MinCostFlow;
use super::types::{Dir, OrthoRep, Turn};

/// Effectively unbounded bend capacity.
const BEND_CAP: i64 = 1 << 40;

/// Link created while splitting a high-degree vertex into a cluster.
#[derive(Debug, Clone, Copy)]
pub struct ExpansionLink {
    pub child: VertexId,
    pub parent: VertexId,
    /// Half-edge running parent to child.
    pub hedge: HedgeId,
}

/// Replaces every vertex of degree above four with a chain of expansion
/// dummies of degree at most four, preserving the incident rotation
/// order. The first three half-edges stay put, the rest move one chain
/// link down; chains extend until every member fits.
pub fn expand_high_degree(dcel: &mut Dcel) -> Vec<ExpansionLink> {
    let mut links = Vec::new();
    let mut v = 0;
    while v < dcel.verts.len() {
        if dcel.verts[v].degree <= 4 {
            v += 1;
            continue;
        }
        let vid = VertexId(v as u32);
        let rot = rotation_of(dcel, vid);
        let h0 = rot[0];
        let h3 = rot[3];
        let moved = rot.len() - 3;

        let anchor = match dcel.verts[v].kind {
            VertexKind::Real { .. } => vid,
            VertexKind::Dummy {
                anchor: Some(a), ..
            } => a,
            VertexKind::Dummy { anchor: None, .. } => vid,
        };
        let child = dcel.add_vertex(VertexKind::Dummy {
            kind: DummyKind::Expansion,
            anchor: Some(anchor),
        });
        let (e, t) = dcel.alloc_edge_pair(vid, child, None);

        for &h in &rot[3..] {
            dcel.hedges[h.0 as usize].origin = child;
        }
        // e slots into the corner between rot[2] and rot[3], t into the
        // corner between the last entry and rot[0].
        let p3 = dcel.hedges[h3.0 as usize].pred;
        let p0 = dcel.hedges[h0.0 as usize].pred;
        let fa = dcel.hedges[h3.0 as usize].face;
        let fb = dcel.hedges[h0.0 as usize].face;
        dcel.hedges[e.0 as usize].next = h3;
        dcel.hedges[e.0 as usize].pred = p3;
        dcel.hedges[e.0 as usize].face = fa;
        dcel.hedges[p3.0 as usize].next = e;
        dcel.hedges[h3.0 as usize].pred = e;
        dcel.hedges[t.0 as usize].next = h0;
        dcel.hedges[t.0 as usize].pred = p0;
        dcel.hedges[t.0 as usize].face = fb;
        dcel.hedges[p0.0 as usize].next = t;
        dcel.hedges[h0.0 as usize].pred = t;
        dcel.faces[fa.0 as usize].size += 1;
        dcel.faces[fb.0 as usize].size += 1;
        dcel.verts[v].degree -= moved as u32;
        dcel.verts[v].first = Some(h0);
        dcel.verts[child.0 as usize].degree += moved as u32;
        dcel.verts[child.0 as usize].first = Some(t);
        links.push(ExpansionLink {
            child,
            parent: vid,
            hedge: e,
        });
        // vid now has degree 4; the chain member is re-examined when the
        // scan reaches it.
    }
    links
}

/// Computes the minimum-bend orthogonal shape of a planar(ized) DCEL via
/// the angle-assignment flow network: vertices supply `4 - degree` spare
/// quarter turns, bounded faces absorb `size - 4`, the outer face absorbs
/// `size + 4`, and moving a quarter turn across an edge costs one bend.
///
/// Real vertices of degree two are not allowed to lie flat on an edge, so
/// a drawing never hides an input vertex inside a straight segment; the
/// repair loop below re-solves with such corners pinned until none are
/// flat.
pub fn orthogonalize(dcel: &Dcel) -> Result<OrthoRep, OrthogonalizationError> {
    for v in 0..dcel.verts.len() {
        let degree = dcel.verts[v].degree;
        if degree > 4 {
            return Err(OrthogonalizationError::DegreeTooHigh {
                vertex: VertexId(v as u32),
                degree,
            });
        }
    }

    let mut fixed: BTreeMap<HedgeId, i64> = BTreeMap::new();
    let mut solved = solve_network(dcel, &fixed)?;
    while let Some((ha, hb)) = first_flat_vertex(dcel, &solved, &fixed) {
        let mut best: Option<(i64, BTreeMap<HedgeId, i64>, Solved)> = None;
        for (ca, cb) in [(0, 2), (2, 0)] {
            let mut trial = fixed.clone();
            trial.insert(ha, ca);
            trial.insert(hb, cb);
            if let Ok(candidate) = solve_network(dcel, &trial) {
                let better = best
                    .as_ref()
                    .map_or(true, |(cost, _, _)| candidate.cost < *cost);
                if better {
                    best = Some((candidate.cost, trial, candidate));
                }
            }
        }
        let Some((_, trial, candidate)) = best else {
            return Err(OrthogonalizationError::InfeasibleFlow);
        };
        fixed = trial;
        solved = candidate;
    }

    let num_hedges = dcel.num_hedges();
    let mut corners = Vec::with_capacity(num_hedges);
    for h in 0..num_hedges {
        corners.push(corner_value(&solved, &fixed, HedgeId(h as u32)) as u8);
    }
    // A degree-2 vertex with both corners on one face feeds two parallel
    // arcs, so the solver splits its two spare quarter turns arbitrarily.
    // Rebalancing them to 180/180 is flow-equivalent and keeps chains
    // straight instead of kinking at whichever arc the solver picked.
    for v in 0..dcel.verts.len() {
        if dcel.verts[v].degree != 2 {
            continue;
        }
        let rot = rotation_of(dcel, VertexId(v as u32));
        let (ha, hb) = (rot[0].0 as usize, rot[1].0 as usize);
        if dcel.hedges[ha].face == dcel.hedges[hb].face {
            corners[ha] = 1;
            corners[hb] = 1;
        }
    }
    let mut bends: Vec<Vec<Turn>> = Vec::with_capacity(num_hedges);
    for h in 0..num_hedges {
        let lefts = solved.bend_arc[h]
            .map(|a| solved.net.flow(a))
            .unwrap_or(0);
        let twin = dcel.hedges[h].twin;
        let rights = solved.bend_arc[twin.0 as usize]
            .map(|a| solved.net.flow(a))
            .unwrap_or(0);
        let mut list = Vec::with_capacity((lefts + rights) as usize);
        list.extend(std::iter::repeat(Turn::Left).take(lefts as usize));
        list.extend(std::iter::repeat(Turn::Right).take(rights as usize));
        bends.push(list);
    }

    let dirs = propagate_directions(dcel, &bends, &corners)?;
    Ok(OrthoRep {
        dirs,
        bends,
        corners,
    })
}

#[derive(Debug)]
struct Solved {
    net: MinCostFlow,
    corner_arc: Vec<Option<usize>>,
    bend_arc: Vec<Option<usize>>,
    cost: i64,
}

fn solve_network(
    dcel: &Dcel,
    fixed: &BTreeMap<HedgeId, i64>,
) -> Result<Solved, OrthogonalizationError> {
    let nv = dcel.verts.len();
    let mut face_node: Vec<Option<usize>> = vec![None; dcel.faces.len()];
    let mut next_node = nv;
    for (i, face) in dcel.faces.iter().enumerate() {
        if face.alive {
            face_node[i] = Some(next_node);
            next_node += 1;
        }
    }
    let mut net = MinCostFlow::new(next_node);

    for v in 0..nv {
        let degree = dcel.verts[v].degree as i64;
        if degree > 0 {
            net.add_supply(v, 4 - degree);
        }
    }
    for (i, face) in dcel.faces.iter().enumerate() {
        if !face.alive {
            continue;
        }
        let size = face.size as i64;
        let node = face_node[i].ok_or(OrthogonalizationError::InfeasibleFlow)?;
        net.add_supply(node, if face.outer { -(size + 4) } else { 4 - size });
    }

    let num_hedges = dcel.num_hedges();
    let mut corner_arc: Vec<Option<usize>> = vec![None; num_hedges];
    let mut bend_arc: Vec<Option<usize>> = vec![None; num_hedges];
    for h in 0..num_hedges {
        let rec = &dcel.hedges[h];
        let node = face_node[rec.face.0 as usize].ok_or(OrthogonalizationError::InfeasibleFlow)?;
        if let Some(&pinned) = fixed.get(&HedgeId(h as u32)) {
            net.add_supply(rec.origin.0 as usize, -pinned);
            net.add_supply(node, pinned);
        } else {
            corner_arc[h] = Some(net.add_arc(rec.origin.0 as usize, node, 3, 0));
        }
    }
    for h in 0..num_hedges {
        let rec = &dcel.hedges[h];
        let twin_face = dcel.hedges[rec.twin.0 as usize].face;
        if rec.face != twin_face {
            let from = face_node[rec.face.0 as usize].ok_or(OrthogonalizationError::InfeasibleFlow)?;
            let to = face_node[twin_face.0 as usize].ok_or(OrthogonalizationError::InfeasibleFlow)?;
            bend_arc[h] = Some(net.add_arc(from, to, BEND_CAP, 1));
        }
    }

    let cost = net
        .solve()
        .map_err(|_| OrthogonalizationError::InfeasibleFlow)?;
    Ok(Solved {
        net,
        corner_arc,
        bend_arc,
        cost,
    })
}

fn corner_value(solved: &Solved, fixed: &BTreeMap<HedgeId, i64>, h: HedgeId) -> i64 {
    if let Some(&pinned) = fixed.get(&h) {
        return pinned;
    }
    solved.corner_arc[h.0 as usize]
        .map(|a| solved.net.flow(a))
        .unwrap_or(0)
}

/// Lowest-id real degree-2 vertex on a face-separating cycle whose two
/// corners split 1/1, i.e. which the current solution draws as a straight
/// pass-through. Chain vertices inside a single face (tree paths) may lie
/// flat; cycle vertices must stay visible as corners.
fn first_flat_vertex(
    dcel: &Dcel,
    solved: &Solved,
    fixed: &BTreeMap<HedgeId, i64>,
) -> Option<(HedgeId, HedgeId)> {
    for v in 0..dcel.verts.len() {
        if dcel.verts[v].degree != 2 || !matches!(dcel.verts[v].kind, VertexKind::Real { .. }) {
            continue;
        }
        let rot = rotation_of(dcel, VertexId(v as u32));
        let (ha, hb) = if rot[0] < rot[1] {
            (rot[0], rot[1])
        } else {
            (rot[1], rot[0])
        };
        if dcel.hedges[ha.0 as usize].face == dcel.hedges[hb.0 as usize].face {
            continue;
        }
        if corner_value(solved, fixed, ha) == 1 && corner_value(solved, fixed, hb) == 1 {
            return Some((ha, hb));
        }
    }
    None
}

/// Assigns absolute compass directions by walking face cycles and twin
/// jumps from one seed half-edge per component. Angle flows fix every
/// relative turn, so a revisit with a different direction means the flow
/// solution was inconsistent.
fn propagate_directions(
    dcel: &Dcel,
    bends: &[Vec<Turn>],
    corners: &[u8],
) -> Result<Vec<Dir>, OrthogonalizationError> {
    let num_hedges = dcel.num_hedges();
    let mut dirs: Vec<Option<Dir>> = vec![None; num_hedges];
    let mut stack = Vec::new();
    for seed in 0..num_hedges {
        if dirs[seed].is_some() {
            continue;
        }
        dirs[seed] = Some(Dir::East);
        stack.push(HedgeId(seed as u32));
        while let Some(h) = stack.pop() {
            let Some(dir) = dirs[h.0 as usize] else {
                continue;
            };
            let spin: i32 = bends[h.0 as usize].iter().map(|t| t.quarters()).sum();
            let end = dir.rotated(spin);

            let twin = dcel.hedges[h.0 as usize].twin;
            assign_dir(&mut dirs, &mut stack, twin, end.opposite())?;

            let nh = dcel.hedges[h.0 as usize].next;
            let turn = 1 - i32::from(corners[nh.0 as usize]);
            assign_dir(&mut dirs, &mut stack, nh, end.rotated(turn))?;
        }
    }
    Ok(dirs.into_iter().map(|d| d.unwrap_or(Dir::East)).collect())
}

fn assign_dir(
    dirs: &mut [Option<Dir>],
    stack: &mut Vec<HedgeId>,
    h: HedgeId,
    expected: Dir,
) -> Result<(), OrthogonalizationError> {
    match dirs[h.0 as usize] {
        None => {
            dirs[h.0 as usize] = Some(expected);
            stack.push(h);
            Ok(())
        }
        Some(existing) if existing != expected => {
            Err(OrthogonalizationError::DirectionConflict { hedge: h })
        }
        Some(_) => Ok(()),
    }
}

fn rotation_of(dcel: &Dcel, v: VertexId) -> Vec<HedgeId> {
    let Some(first) = dcel.verts[v.0 as usize].first else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut h = first;
    loop {
        out.push(h);
        let twin = dcel.hedges[h.0 as usize].twin;
        h = dcel.hedges[twin.0 as usize].next;
        if h == first {
            break;
        }
    }
    out
}
