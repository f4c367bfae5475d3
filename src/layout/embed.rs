use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::dcel::{Dcel, DummyKind, FaceId, HedgeId, VertexId, VertexKind};
use crate::error::{LayoutError, PlanarizationError, TopologyError};
use crate::ir;

/// How to obtain the combinatorial embedding. The two paths share no
/// state, only the output contract.
#[derive(Debug, Clone, Copy)]
pub enum EmbeddingStrategy<'a> {
    /// Materialize the caller's rotation system verbatim. Fails if that
    /// rotation is not planar; no crossings are introduced on this path.
    FixedRotation(&'a ir::RotationSystem),
    /// Compute an embedding, planarizing with crossing dummies when the
    /// graph demands it.
    Computed,
}

/// Planarized half-edge structure plus the bookkeeping later stages need.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub dcel: Dcel,
    /// Input vertex id to arena handle.
    pub vmap: BTreeMap<u32, VertexId>,
    /// Crossing dummies introduced during planarization.
    pub crossings: usize,
}

/// Canonicalized undirected edge awaiting insertion. `orig` indexes the
/// input edge list so polylines can be reassembled after layout.
#[derive(Debug, Clone, Copy)]
struct WorkEdge {
    a: VertexId,
    b: VertexId,
    orig: usize,
}

/// Turns the abstract graph into a planar(ized) DCEL.
pub fn embed_graph(
    graph: &ir::Graph,
    strategy: EmbeddingStrategy<'_>,
) -> Result<Embedding, LayoutError> {
    graph.validate()?;
    let mut dcel = Dcel::new();
    let mut vmap = BTreeMap::new();
    for &id in graph.vertices.keys() {
        vmap.insert(id, dcel.add_vertex(VertexKind::Real { id }));
    }
    let work = canonicalize(graph, &mut dcel, &vmap);

    match strategy {
        EmbeddingStrategy::FixedRotation(rotation) => {
            rotation.validate(graph)?;
            materialize_rotation(&mut dcel, rotation, &vmap, &work)?;
            Ok(Embedding {
                dcel,
                vmap,
                crossings: 0,
            })
        }
        EmbeddingStrategy::Computed => {
            let blocks = biconnected_blocks(dcel.num_vertices(), &work);
            let mut crossings = 0;
            for block in blocks {
                // Greedy maximal planar subgraph of the block: keep
                // retrying deferred edges until a pass makes no progress.
                let mut pending = block;
                loop {
                    let mut rest = Vec::new();
                    let mut progressed = false;
                    for &widx in &pending {
                        let w = work[widx];
                        match dcel.add_edge_tagged(w.a, w.b, Some(w.orig)) {
                            Ok(_) => progressed = true,
                            Err(TopologyError::NoSharedFace { .. }) => rest.push(widx),
                            Err(err) => return Err(err.into()),
                        }
                    }
                    pending = rest;
                    if pending.is_empty() || !progressed {
                        break;
                    }
                }
                for widx in pending {
                    crossings += insert_with_crossings(&mut dcel, work[widx], graph)?;
                }
            }
            Ok(Embedding {
                dcel,
                vmap,
                crossings,
            })
        }
    }
}

/// Removes self-loops and parallel edges before embedding: a self-loop
/// becomes a two-dummy chain, each parallel duplicate gets one
/// subdivision dummy. The DCEL invariants assume a simple graph.
fn canonicalize(
    graph: &ir::Graph,
    dcel: &mut Dcel,
    vmap: &BTreeMap<u32, VertexId>,
) -> Vec<WorkEdge> {
    let subdiv = VertexKind::Dummy {
        kind: DummyKind::Subdivision,
        anchor: None,
    };
    let mut work = Vec::new();
    let mut seen: BTreeSet<(u32, u32)> = BTreeSet::new();
    for (idx, edge) in graph.edges.iter().enumerate() {
        let a = vmap[&edge.u];
        let b = vmap[&edge.v];
        if a == b {
            let d1 = dcel.add_vertex(subdiv);
            let d2 = dcel.add_vertex(subdiv);
            work.push(WorkEdge { a, b: d1, orig: idx });
            work.push(WorkEdge {
                a: d1,
                b: d2,
                orig: idx,
            });
            work.push(WorkEdge {
                a: d2,
                b: a,
                orig: idx,
            });
        } else {
            let key = (a.0.min(b.0), a.0.max(b.0));
            if seen.insert(key) {
                work.push(WorkEdge { a, b, orig: idx });
            } else {
                let d = dcel.add_vertex(subdiv);
                work.push(WorkEdge { a, b: d, orig: idx });
                work.push(WorkEdge { a: d, b, orig: idx });
            }
        }
    }
    work
}

/// Hopcroft-Tarjan lowpoint decomposition. Returns each biconnected
/// block as an ascending list of work-edge indices, in DFS discovery
/// order; bridges form single-edge blocks.
fn biconnected_blocks(num_vertices: usize, work: &[WorkEdge]) -> Vec<Vec<usize>> {
    let mut adj: Vec<Vec<(usize, usize)>> = vec![Vec::new(); num_vertices];
    for (idx, w) in work.iter().enumerate() {
        adj[w.a.0 as usize].push((idx, w.b.0 as usize));
        adj[w.b.0 as usize].push((idx, w.a.0 as usize));
    }

    const UNSEEN: usize = usize::MAX;
    struct Frame {
        v: usize,
        parent_edge: Option<usize>,
        next: usize,
    }

    let mut disc = vec![UNSEEN; num_vertices];
    let mut low = vec![0usize; num_vertices];
    let mut timer = 0usize;
    let mut blocks = Vec::new();
    let mut estack: Vec<usize> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for root in 0..num_vertices {
        if disc[root] != UNSEEN || adj[root].is_empty() {
            continue;
        }
        disc[root] = timer;
        low[root] = timer;
        timer += 1;
        stack.push(Frame {
            v: root,
            parent_edge: None,
            next: 0,
        });
        while let Some(top) = stack.last_mut() {
            let v = top.v;
            if top.next < adj[v].len() {
                let (eidx, w) = adj[v][top.next];
                top.next += 1;
                if top.parent_edge == Some(eidx) {
                    continue;
                }
                if disc[w] == UNSEEN {
                    estack.push(eidx);
                    disc[w] = timer;
                    low[w] = timer;
                    timer += 1;
                    stack.push(Frame {
                        v: w,
                        parent_edge: Some(eidx),
                        next: 0,
                    });
                } else if disc[w] < disc[v] {
                    estack.push(eidx);
                    if disc[w] < low[v] {
                        low[v] = disc[w];
                    }
                }
            } else {
                let parent_edge = top.parent_edge;
                stack.pop();
                if let (Some(pe), Some(parent)) = (parent_edge, stack.last()) {
                    let p = parent.v;
                    if low[v] < low[p] {
                        low[p] = low[v];
                    }
                    if low[v] >= disc[p] {
                        let mut block = Vec::new();
                        while let Some(top_edge) = estack.pop() {
                            block.push(top_edge);
                            if top_edge == pe {
                                break;
                            }
                        }
                        block.sort_unstable();
                        blocks.push(block);
                    }
                }
            }
        }
    }
    blocks
}

/// Routes one undeferrable edge through the dual graph: BFS from the
/// faces around `a` to the faces around `b`, then split every crossed
/// edge with a degree-4 crossing dummy and stitch the chain through.
/// Returns the number of crossings introduced.
fn insert_with_crossings(
    dcel: &mut Dcel,
    w: WorkEdge,
    graph: &ir::Graph,
) -> Result<usize, LayoutError> {
    let starts = dcel.incident_faces(w.a)?;
    let targets: BTreeSet<FaceId> = dcel.incident_faces(w.b)?.into_iter().collect();

    let mut pred: BTreeMap<FaceId, Option<(FaceId, HedgeId)>> = BTreeMap::new();
    let mut queue = VecDeque::new();
    for f in starts {
        pred.insert(f, None);
        queue.push_back(f);
    }
    let mut found = None;
    while let Some(f) = queue.pop_front() {
        if targets.contains(&f) {
            found = Some(f);
            break;
        }
        for h in dcel.face_hedges(f)? {
            let g = dcel.face(dcel.twin(h)?)?;
            if let std::collections::btree_map::Entry::Vacant(slot) = pred.entry(g) {
                slot.insert(Some((f, h)));
                queue.push_back(g);
            }
        }
    }
    let Some(end) = found else {
        let input = graph.edges[w.orig];
        return Err(PlanarizationError::NoRoute {
            edge: w.orig,
            u: input.u,
            v: input.v,
        }
        .into());
    };

    let mut hops = Vec::new();
    let mut cur = end;
    while let Some(&Some((pf, h))) = pred.get(&cur) {
        hops.push(h);
        cur = pf;
    }
    hops.reverse();

    let crossing = VertexKind::Dummy {
        kind: DummyKind::Crossing,
        anchor: None,
    };
    let count = hops.len();
    let mut anchor = w.a;
    let mut cur_face = cur;
    for hx in hops {
        let far = dcel.twin(hx)?;
        let (d, _) = dcel.split_edge(hx, crossing)?;
        let next_face = dcel.face(far)?;
        dcel.add_edge_in_face(cur_face, anchor, d, Some(w.orig))?;
        anchor = d;
        cur_face = next_face;
    }
    dcel.add_edge_in_face(cur_face, anchor, w.b, Some(w.orig))?;
    Ok(count)
}

/// Wires `next`/`pred` straight from the caller's rotation lists, walks
/// the faces, and verifies Euler's formula per component. A rotation
/// system of genus above zero is rejected, not planarized.
fn materialize_rotation(
    dcel: &mut Dcel,
    rotation: &ir::RotationSystem,
    vmap: &BTreeMap<u32, VertexId>,
    work: &[WorkEdge],
) -> Result<(), LayoutError> {
    let pairs: Vec<(HedgeId, HedgeId)> = work
        .iter()
        .map(|w| dcel.alloc_edge_pair(w.a, w.b, Some(w.orig)))
        .collect();

    // Outgoing stubs per (vertex, input edge), in canonicalization order:
    // the first rotation occurrence of a subdivided edge maps to its first
    // stub, the second (loop end) to the second.
    let mut stubs: BTreeMap<(u32, usize), VecDeque<HedgeId>> = BTreeMap::new();
    let mut outgoing: Vec<Vec<HedgeId>> = vec![Vec::new(); dcel.num_vertices()];
    for (widx, w) in work.iter().enumerate() {
        let (e, t) = pairs[widx];
        stubs.entry((w.a.0, w.orig)).or_default().push_back(e);
        stubs.entry((w.b.0, w.orig)).or_default().push_back(t);
        outgoing[w.a.0 as usize].push(e);
        outgoing[w.b.0 as usize].push(t);
    }

    let mut rot: Vec<Vec<HedgeId>> = vec![Vec::new(); dcel.num_vertices()];
    for (&ext, order) in &rotation.order {
        let v = vmap[&ext];
        for &edge_idx in order {
            let h = stubs
                .get_mut(&(v.0, edge_idx))
                .and_then(VecDeque::pop_front)
                .ok_or(PlanarizationError::InvalidRotation { vertex: ext })?;
            rot[v.0 as usize].push(h);
        }
    }
    // Subdivision dummies have no caller-visible rotation; degree 2 makes
    // any cyclic order the same embedding.
    for v in 0..rot.len() {
        if rot[v].is_empty() {
            rot[v] = outgoing[v].clone();
        }
    }

    for (v, r) in rot.iter().enumerate() {
        if r.is_empty() {
            continue;
        }
        for (j, &h) in r.iter().enumerate() {
            let tw = dcel.hedges[h.0 as usize].twin;
            let succ = r[(j + 1) % r.len()];
            dcel.hedges[tw.0 as usize].next = succ;
            dcel.hedges[succ.0 as usize].pred = tw;
        }
        dcel.verts[v].first = Some(r[0]);
    }
    dcel.rebuild_faces();

    if let Some(bad) = euler_violation(dcel) {
        let ext = external_id_near(dcel, vmap, bad);
        return Err(PlanarizationError::NonPlanarRotation { vertex: ext }.into());
    }
    Ok(())
}

/// First vertex of a component violating `V - E + F = 2`, if any.
fn euler_violation(dcel: &Dcel) -> Option<VertexId> {
    let mut verts: BTreeMap<u32, i64> = BTreeMap::new();
    let mut hedges: BTreeMap<u32, i64> = BTreeMap::new();
    let mut faces: BTreeMap<u32, i64> = BTreeMap::new();
    let mut witness: BTreeMap<u32, VertexId> = BTreeMap::new();
    for v in 0..dcel.num_vertices() {
        let vid = VertexId(v as u32);
        let root = dcel.component_root_of(vid);
        *verts.entry(root).or_insert(0) += 1;
        witness.entry(root).or_insert(vid);
    }
    for h in 0..dcel.num_hedges() {
        let root = dcel.component_root_of(dcel.hedges[h].origin);
        *hedges.entry(root).or_insert(0) += 1;
    }
    for f in dcel.face_ids() {
        let start = dcel.faces[f.0 as usize].start;
        let root = dcel.component_root_of(dcel.hedges[start.0 as usize].origin);
        *faces.entry(root).or_insert(0) += 1;
    }
    for (&root, &v) in &verts {
        let e = hedges.get(&root).copied().unwrap_or(0) / 2;
        if e == 0 {
            continue;
        }
        let f = faces.get(&root).copied().unwrap_or(0);
        if v - e + f != 2 {
            return witness.get(&root).copied();
        }
    }
    None
}

/// Some real vertex id in the same component as `v`, for error reporting.
fn external_id_near(dcel: &Dcel, vmap: &BTreeMap<u32, VertexId>, v: VertexId) -> u32 {
    let root = dcel.component_root_of(v);
    for (&ext, &vid) in vmap {
        if dcel.component_root_of(vid) == root {
            return ext;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k5() -> ir::Graph {
        let mut graph = ir::Graph::new();
        for u in 0..5u32 {
            for v in (u + 1)..5 {
                graph.add_edge(u, v);
            }
        }
        graph
    }

    #[test]
    fn four_cycle_embeds_without_crossings() {
        let graph = ir::Graph::from_edges(&[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let embedding = embed_graph(&graph, EmbeddingStrategy::Computed).unwrap();
        assert_eq!(embedding.crossings, 0);
        assert_eq!(embedding.dcel.num_faces(), 2);
        embedding.dcel.check_consistency().unwrap();
    }

    #[test]
    fn k5_needs_exactly_one_crossing() {
        let embedding = embed_graph(&k5(), EmbeddingStrategy::Computed).unwrap();
        assert_eq!(embedding.crossings, 1);
        let dummies = (0..embedding.dcel.num_vertices())
            .filter(|&v| {
                matches!(
                    embedding.dcel.kind(VertexId(v as u32)).unwrap(),
                    VertexKind::Dummy {
                        kind: DummyKind::Crossing,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(dummies, 1);
        embedding.dcel.check_consistency().unwrap();
    }

    #[test]
    fn blocks_split_at_cut_vertices() {
        // Two triangles sharing vertex 2.
        let graph = ir::Graph::from_edges(&[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)]);
        let mut dcel = Dcel::new();
        let mut vmap = BTreeMap::new();
        for &id in graph.vertices.keys() {
            vmap.insert(id, dcel.add_vertex(VertexKind::Real { id }));
        }
        let work = canonicalize(&graph, &mut dcel, &vmap);
        let blocks = biconnected_blocks(dcel.num_vertices(), &work);
        let mut sizes: Vec<usize> = blocks.iter().map(Vec::len).collect();
        sizes.sort();
        assert_eq!(sizes, vec![3, 3]);
    }

    #[test]
    fn canonicalization_subdivides_loops_and_parallels() {
        let mut graph = ir::Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(0, 1);
        graph.add_edge(2, 2);
        graph.add_edge(1, 2);
        let embedding = embed_graph(&graph, EmbeddingStrategy::Computed).unwrap();
        let subdivisions = (0..embedding.dcel.num_vertices())
            .filter(|&v| {
                matches!(
                    embedding.dcel.kind(VertexId(v as u32)).unwrap(),
                    VertexKind::Dummy {
                        kind: DummyKind::Subdivision,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(subdivisions, 3);
        assert_eq!(embedding.crossings, 0);
        embedding.dcel.check_consistency().unwrap();
    }

    #[test]
    fn planar_rotation_of_k4_materializes() {
        // Vertex 0 centered inside the 1-2-3 triangle; edge order
        // (0,1),(0,2),(0,3),(1,2),(1,3),(2,3).
        let mut graph = ir::Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(0, 2);
        graph.add_edge(0, 3);
        graph.add_edge(1, 2);
        graph.add_edge(1, 3);
        graph.add_edge(2, 3);
        let mut rotation = ir::RotationSystem::default();
        rotation.order.insert(0, vec![0, 1, 2]);
        rotation.order.insert(1, vec![3, 0, 4]);
        rotation.order.insert(2, vec![5, 1, 3]);
        rotation.order.insert(3, vec![4, 2, 5]);
        graph.rotation = Some(rotation.clone());
        let embedding = embed_graph(&graph, EmbeddingStrategy::FixedRotation(&rotation)).unwrap();
        assert_eq!(embedding.dcel.num_faces(), 4);
        assert_eq!(embedding.crossings, 0);
        embedding.dcel.check_consistency().unwrap();
    }

    #[test]
    fn toroidal_rotation_of_k4_is_rejected() {
        // Sorting every rotation by neighbor id yields a genus-1 map.
        let mut graph = ir::Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(0, 2);
        graph.add_edge(0, 3);
        graph.add_edge(1, 2);
        graph.add_edge(1, 3);
        graph.add_edge(2, 3);
        let mut rotation = ir::RotationSystem::default();
        rotation.order.insert(0, vec![0, 1, 2]);
        rotation.order.insert(1, vec![0, 3, 4]);
        rotation.order.insert(2, vec![1, 3, 5]);
        rotation.order.insert(3, vec![2, 4, 5]);
        let result = embed_graph(&graph, EmbeddingStrategy::FixedRotation(&rotation));
        assert!(matches!(
            result,
            Err(LayoutError::Planarization(
                PlanarizationError::NonPlanarRotation { .. }
            ))
        ));
    }
}
