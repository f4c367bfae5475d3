mod compact;
mod embed;
mod flow;
mod ortho;
pub(crate) mod types;

pub use compact::{Coords, compute_coordinates};
pub use embed::{Embedding, EmbeddingStrategy, embed_graph};
pub use ortho::{ExpansionLink, expand_high_degree, orthogonalize};
pub use types::*;

use std::collections::{BTreeMap, BTreeSet};

use crate::config::LayoutOptions;
use crate::dcel::{Dcel, HedgeId, VertexId, VertexKind};
use crate::error::LayoutError;
use crate::ir;

/// Runs the whole pipeline: embed (planarizing if needed), expand
/// high-degree vertices, orthogonalize, compact, then fold the geometry
/// back onto the input graph. Any stage failure aborts the run; no
/// partial result is returned.
pub fn compute_layout(graph: &ir::Graph, options: &LayoutOptions) -> Result<Layout, LayoutError> {
    graph.validate()?;
    let strategy = match &graph.rotation {
        Some(rotation) => EmbeddingStrategy::FixedRotation(rotation),
        None => EmbeddingStrategy::Computed,
    };
    let mut embedding = embed_graph(graph, strategy)?;
    let links = expand_high_degree(&mut embedding.dcel);
    let rep = orthogonalize(&embedding.dcel)?;
    let coords = compute_coordinates(&embedding.dcel, &rep, options.separation())?;
    Ok(assemble(graph, &embedding, &links, &coords, options))
}

/// Thin stateful wrapper for callers that configure once and lay out many
/// graphs.
#[derive(Debug, Clone, Default)]
pub struct LayoutPipeline {
    options: LayoutOptions,
}

impl LayoutPipeline {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn layout(&self, graph: &ir::Graph) -> Result<Layout, LayoutError> {
        compute_layout(graph, &self.options)
    }
}

fn assemble(
    graph: &ir::Graph,
    embedding: &Embedding,
    links: &[ExpansionLink],
    coords: &Coords,
    options: &LayoutOptions,
) -> Layout {
    let dcel = &embedding.dcel;
    let mut positions = BTreeMap::new();
    for (&ext, &vid) in &embedding.vmap {
        positions.insert(ext, coords.pos[vid.0 as usize]);
    }

    let mut parent_of: BTreeMap<VertexId, (VertexId, HedgeId)> = BTreeMap::new();
    for link in links {
        parent_of.insert(link.child, (link.parent, link.hedge));
    }

    let mut recs_by_orig: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (ridx, rec) in dcel.edges.iter().enumerate() {
        if let Some(orig) = rec.orig {
            recs_by_orig.entry(orig).or_default().push(ridx);
        }
    }

    let mut edges = Vec::with_capacity(graph.edges.len());
    for (idx, edge) in graph.edges.iter().enumerate() {
        let recs = recs_by_orig.get(&idx).map(Vec::as_slice).unwrap_or(&[]);
        edges.push(trace_edge(
            dcel,
            coords,
            recs,
            edge,
            &embedding.vmap,
            &parent_of,
        ));
    }

    let mut dummy_vertices = Vec::new();
    if options.preserve_dummy_vertices {
        let mut next_id = graph
            .vertices
            .keys()
            .next_back()
            .map(|&max| max + 1)
            .unwrap_or(0);
        for v in 0..dcel.num_vertices() {
            if let VertexKind::Dummy { kind, .. } = dcel.verts[v].kind {
                dummy_vertices.push(DummyVertex {
                    id: next_id,
                    kind,
                    position: coords.pos[v],
                });
                next_id += 1;
            }
        }
    }

    let mut width = 0;
    let mut height = 0;
    for point in positions.values() {
        width = width.max(point.x);
        height = height.max(point.y);
    }
    for path in &edges {
        for point in &path.points {
            width = width.max(point.x);
            height = height.max(point.y);
        }
    }
    for dummy in &dummy_vertices {
        width = width.max(dummy.position.x);
        height = height.max(dummy.position.y);
    }

    Layout {
        positions,
        edges,
        dummy_vertices,
        width,
        height,
    }
}

/// Rebuilds one input edge's polyline from its tagged segment chain.
/// Crossing and subdivision dummies become interior points; expansion
/// members are joined back to their anchor through the cluster links so
/// the polyline starts and ends at reported vertex positions.
fn trace_edge(
    dcel: &Dcel,
    coords: &Coords,
    recs: &[usize],
    edge: &ir::Edge,
    vmap: &BTreeMap<u32, VertexId>,
    parent_of: &BTreeMap<VertexId, (VertexId, HedgeId)>,
) -> EdgePath {
    let mut incident: BTreeMap<VertexId, Vec<usize>> = BTreeMap::new();
    for &r in recs {
        let h = dcel.edges[r].hedge;
        let a = dcel.hedges[h.0 as usize].origin;
        let b = dcel.hedges[dcel.hedges[h.0 as usize].twin.0 as usize].origin;
        incident.entry(a).or_default().push(r);
        incident.entry(b).or_default().push(r);
    }

    // A subdivided edge is a simple path; its ends show up once. A
    // self-loop chain is a cycle with no odd vertex, so it starts at the
    // loop vertex itself.
    let mut start = None;
    for (&v, touching) in &incident {
        if touching.len() == 1 && resolve_external(dcel, v) == Some(edge.u) {
            start = Some(v);
            break;
        }
    }
    let start = start.unwrap_or(vmap[&edge.u]);

    let mut points = connector_down(coords, start, parent_of);
    let mut used: BTreeSet<usize> = BTreeSet::new();
    let mut cur = start;
    loop {
        let next_rec = incident
            .get(&cur)
            .and_then(|list| list.iter().copied().find(|r| !used.contains(r)));
        let Some(r) = next_rec else {
            break;
        };
        used.insert(r);
        let mut h = dcel.edges[r].hedge;
        if dcel.hedges[h.0 as usize].origin != cur {
            h = dcel.hedges[h.0 as usize].twin;
        }
        points.extend(coords.hedge_bends[h.0 as usize].iter().copied());
        cur = dcel.hedges[dcel.hedges[h.0 as usize].twin.0 as usize].origin;
        points.push(coords.pos[cur.0 as usize]);
    }
    points.extend(connector_up(dcel, coords, cur, parent_of));

    EdgePath {
        from: edge.u,
        to: edge.v,
        points,
    }
}

/// Anchor-to-member prefix: positions from the cluster anchor down the
/// expansion links to `member`, ending with `member` itself. For a plain
/// vertex this is just its own position.
fn connector_down(
    coords: &Coords,
    member: VertexId,
    parent_of: &BTreeMap<VertexId, (VertexId, HedgeId)>,
) -> Vec<Point> {
    let mut chain = vec![member];
    let mut cur = member;
    while let Some(&(parent, _)) = parent_of.get(&cur) {
        chain.push(parent);
        cur = parent;
    }
    chain.reverse();
    let mut points = vec![coords.pos[chain[0].0 as usize]];
    for pair in chain.windows(2) {
        let (_, link) = parent_of[&pair[1]];
        points.extend(coords.hedge_bends[link.0 as usize].iter().copied());
        points.push(coords.pos[pair[1].0 as usize]);
    }
    points
}

/// Member-to-anchor suffix, excluding `member` itself.
fn connector_up(
    dcel: &Dcel,
    coords: &Coords,
    member: VertexId,
    parent_of: &BTreeMap<VertexId, (VertexId, HedgeId)>,
) -> Vec<Point> {
    let mut points = Vec::new();
    let mut cur = member;
    while let Some(&(parent, link)) = parent_of.get(&cur) {
        let back = dcel.hedges[link.0 as usize].twin;
        points.extend(coords.hedge_bends[back.0 as usize].iter().copied());
        points.push(coords.pos[parent.0 as usize]);
        cur = parent;
    }
    points
}

fn resolve_external(dcel: &Dcel, v: VertexId) -> Option<u32> {
    match dcel.verts[v.0 as usize].kind {
        VertexKind::Real { id } => Some(id),
        VertexKind::Dummy {
            anchor: Some(a), ..
        } => match dcel.verts[a.0 as usize].kind {
            VertexKind::Real { id } => Some(id),
            _ => None,
        },
        VertexKind::Dummy { anchor: None, .. } => None,
    }
}
