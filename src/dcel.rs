use std::collections::BTreeSet;

use crate::error::TopologyError;

/// Handle into the vertex arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub u32);

/// Handle into the half-edge arena. Twins are always allocated as a pair
/// but carry no id relationship; use [`Dcel::twin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HedgeId(pub u32);

/// Handle into the face arena. Face handles are stable across local edits
/// and invalidated only by [`Dcel::rebuild_faces`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(pub u32);

impl VertexId {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

impl HedgeId {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

impl FaceId {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Why a dummy vertex exists. The pipeline strips or keeps dummies per
/// caller request, so every synthetic vertex records its origin story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum DummyKind {
    /// Degree-4 vertex standing in for an edge crossing.
    Crossing,
    /// Degree-2 vertex splitting a parallel edge or self-loop.
    Subdivision,
    /// Member of a high-degree expansion cluster.
    Expansion,
    /// Degree-2 vertex standing in for a bend point during compaction.
    Bend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    /// Vertex of the input graph, keyed by its external id.
    Real { id: u32 },
    /// Synthetic vertex owned by the pipeline. `anchor` points at the
    /// vertex an expansion member stands in for.
    Dummy {
        kind: DummyKind,
        anchor: Option<VertexId>,
    },
}

impl VertexKind {
    pub fn is_dummy(&self) -> bool {
        matches!(self, VertexKind::Dummy { .. })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct VertexRec {
    pub(crate) kind: VertexKind,
    pub(crate) first: Option<HedgeId>,
    pub(crate) degree: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct HedgeRec {
    pub(crate) origin: VertexId,
    pub(crate) twin: HedgeId,
    pub(crate) next: HedgeId,
    pub(crate) pred: HedgeId,
    pub(crate) face: FaceId,
    /// Index into the edge-record arena; both halves of a pair share it.
    pub(crate) edge: u32,
}

/// One undirected edge segment. Splitting an edge leaves the original
/// record on the origin-side half and allocates a new record for the
/// continuation, both tagged with the same input edge index.
#[derive(Debug, Clone)]
pub(crate) struct EdgeRec {
    /// Input edge this segment belongs to; `None` for expansion links.
    pub(crate) orig: Option<usize>,
    pub(crate) hedge: HedgeId,
}

#[derive(Debug, Clone)]
pub(crate) struct FaceRec {
    pub(crate) start: HedgeId,
    pub(crate) size: u32,
    pub(crate) outer: bool,
    pub(crate) alive: bool,
}

const INVALID_FACE: FaceId = FaceId(u32::MAX);

/// Doubly-connected edge list over integer handles. Bounded faces are
/// traversed counter-clockwise by `next`, so each half-edge keeps its face
/// on the left and `next(twin(h))` is the counter-clockwise rotation
/// successor around `origin(h)`.
#[derive(Debug, Clone, Default)]
pub struct Dcel {
    pub(crate) verts: Vec<VertexRec>,
    pub(crate) hedges: Vec<HedgeRec>,
    pub(crate) edges: Vec<EdgeRec>,
    pub(crate) faces: Vec<FaceRec>,
    comp: Vec<u32>,
}

impl Dcel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, kind: VertexKind) -> VertexId {
        let id = VertexId(self.verts.len() as u32);
        self.verts.push(VertexRec {
            kind,
            first: None,
            degree: 0,
        });
        self.comp.push(id.0);
        id
    }

    pub fn num_vertices(&self) -> usize {
        self.verts.len()
    }

    pub fn num_hedges(&self) -> usize {
        self.hedges.len()
    }

    pub fn num_edges(&self) -> usize {
        self.hedges.len() / 2
    }

    pub fn num_faces(&self) -> usize {
        self.faces.iter().filter(|f| f.alive).count()
    }

    pub fn kind(&self, v: VertexId) -> Result<VertexKind, TopologyError> {
        self.check_vertex(v)?;
        Ok(self.verts[v.idx()].kind)
    }

    pub fn degree(&self, v: VertexId) -> Result<u32, TopologyError> {
        self.check_vertex(v)?;
        Ok(self.verts[v.idx()].degree)
    }

    pub fn origin(&self, h: HedgeId) -> Result<VertexId, TopologyError> {
        self.check_hedge(h)?;
        Ok(self.hedges[h.idx()].origin)
    }

    pub fn twin(&self, h: HedgeId) -> Result<HedgeId, TopologyError> {
        self.check_hedge(h)?;
        Ok(self.hedges[h.idx()].twin)
    }

    pub fn next(&self, h: HedgeId) -> Result<HedgeId, TopologyError> {
        self.check_hedge(h)?;
        Ok(self.hedges[h.idx()].next)
    }

    pub fn pred(&self, h: HedgeId) -> Result<HedgeId, TopologyError> {
        self.check_hedge(h)?;
        Ok(self.hedges[h.idx()].pred)
    }

    pub fn face(&self, h: HedgeId) -> Result<FaceId, TopologyError> {
        self.check_hedge(h)?;
        Ok(self.hedges[h.idx()].face)
    }

    pub fn target(&self, h: HedgeId) -> Result<VertexId, TopologyError> {
        let t = self.twin(h)?;
        Ok(self.hedges[t.idx()].origin)
    }

    pub fn face_size(&self, f: FaceId) -> Result<u32, TopologyError> {
        self.check_face(f)?;
        Ok(self.faces[f.idx()].size)
    }

    pub fn is_outer(&self, f: FaceId) -> Result<bool, TopologyError> {
        self.check_face(f)?;
        Ok(self.faces[f.idx()].outer)
    }

    /// Live face handles in ascending order.
    pub fn face_ids(&self) -> Vec<FaceId> {
        (0..self.faces.len())
            .filter(|&i| self.faces[i].alive)
            .map(|i| FaceId(i as u32))
            .collect()
    }

    /// Boundary of `f` in `next` order, starting at its recorded start
    /// half-edge.
    pub fn face_hedges(&self, f: FaceId) -> Result<Vec<HedgeId>, TopologyError> {
        self.check_face(f)?;
        Ok(self.walk_cycle(self.faces[f.idx()].start))
    }

    /// Outgoing half-edges of `v` in counter-clockwise embedding order.
    pub fn half_edges_ccw(&self, v: VertexId) -> Result<Vec<HedgeId>, TopologyError> {
        self.check_vertex(v)?;
        let Some(first) = self.verts[v.idx()].first else {
            return Ok(Vec::new());
        };
        let mut out = Vec::with_capacity(self.verts[v.idx()].degree as usize);
        let mut h = first;
        loop {
            out.push(h);
            h = self.hedges[self.hedges[h.idx()].twin.idx()].next;
            if h == first {
                break;
            }
        }
        Ok(out)
    }

    /// Faces incident to `v`, ascending, one entry per boundary visit
    /// collapsed to a set.
    pub fn incident_faces(&self, v: VertexId) -> Result<Vec<FaceId>, TopologyError> {
        let mut set = BTreeSet::new();
        for h in self.half_edges_ccw(v)? {
            set.insert(self.hedges[h.idx()].face);
        }
        Ok(set.into_iter().collect())
    }

    /// Lowest face id bordered by both vertices, if any.
    pub fn shared_face(&self, u: VertexId, v: VertexId) -> Result<Option<FaceId>, TopologyError> {
        let fu: BTreeSet<FaceId> = self.incident_faces(u)?.into_iter().collect();
        for f in self.incident_faces(v)? {
            if fu.contains(&f) {
                return Ok(Some(f));
            }
        }
        Ok(None)
    }

    pub fn same_component(&self, u: VertexId, v: VertexId) -> Result<bool, TopologyError> {
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        Ok(self.comp_root(u.0) == self.comp_root(v.0))
    }

    /// Inserts an undirected edge between distinct vertices, keeping the
    /// embedding planar: endpoints in different components are joined, and
    /// endpoints sharing a face split that face. Endpoints in the same
    /// component with no shared face cannot be connected without a
    /// crossing, which this primitive refuses to create.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> Result<(HedgeId, HedgeId), TopologyError> {
        self.add_edge_tagged(u, v, None)
    }

    /// [`Dcel::add_edge`] with an input-edge tag for polyline reassembly.
    pub fn add_edge_tagged(
        &mut self,
        u: VertexId,
        v: VertexId,
        orig: Option<usize>,
    ) -> Result<(HedgeId, HedgeId), TopologyError> {
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        if u == v {
            return Err(TopologyError::SelfLoop(u));
        }
        let u_empty = self.verts[u.idx()].first.is_none();
        let v_empty = self.verts[v.idx()].first.is_none();
        let pair = if u_empty && v_empty {
            self.link_isolated_pair(u, v, orig)
        } else if v_empty {
            let au = self.lowest_out(u);
            self.link_dangling(u, au, v, orig)
        } else if u_empty {
            let av = self.lowest_out(v);
            let (e, t) = self.link_dangling(v, av, u, orig);
            (t, e)
        } else if !self.same_component(u, v)? {
            let au = self.lowest_out(u);
            let av = self.lowest_out(v);
            self.link(u, au, v, av, orig)
        } else {
            let Some(f) = self.shared_face(u, v)? else {
                return Err(TopologyError::NoSharedFace { u, v });
            };
            let au = self.anchor_on_face(u, f).expect("shared face must touch u");
            let av = self.anchor_on_face(v, f).expect("shared face must touch v");
            self.link(u, au, v, av, orig)
        };
        Ok(pair)
    }

    /// Inserts an edge inside a specific face both endpoints border. Used
    /// by the planarizer, which picks the face from its dual-graph route
    /// instead of taking the lowest shared one.
    pub fn add_edge_in_face(
        &mut self,
        f: FaceId,
        u: VertexId,
        v: VertexId,
        orig: Option<usize>,
    ) -> Result<(HedgeId, HedgeId), TopologyError> {
        self.check_face(f)?;
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        if u == v {
            return Err(TopologyError::SelfLoop(u));
        }
        let Some(au) = self.anchor_on_face(u, f) else {
            return Err(TopologyError::NoSharedFace { u, v });
        };
        let Some(av) = self.anchor_on_face(v, f) else {
            return Err(TopologyError::NoSharedFace { u, v });
        };
        Ok(self.link(u, au, v, av, orig))
    }

    /// Splits the edge under `h` with a new vertex of the given kind and
    /// returns the vertex plus the half-edge continuing toward `h`'s
    /// original target. `h` keeps its id and now ends at the new vertex.
    pub fn split_edge(
        &mut self,
        h: HedgeId,
        kind: VertexKind,
    ) -> Result<(VertexId, HedgeId), TopologyError> {
        self.check_hedge(h)?;
        let t = self.hedges[h.idx()].twin;
        let f = self.hedges[h.idx()].face;
        let g = self.hedges[t.idx()].face;
        let u = self.hedges[h.idx()].origin;
        let hn = self.hedges[h.idx()].next;
        let tn = self.hedges[t.idx()].next;
        let old_edge = self.hedges[h.idx()].edge;
        let orig = self.edges[old_edge as usize].orig;

        let d = self.add_vertex(kind);
        let n1 = HedgeId(self.hedges.len() as u32);
        let n2 = HedgeId(n1.0 + 1);
        let new_edge = self.edges.len() as u32;
        self.hedges.push(HedgeRec {
            origin: d,
            twin: t,
            next: hn,
            pred: h,
            face: f,
            edge: new_edge,
        });
        self.hedges.push(HedgeRec {
            origin: d,
            twin: h,
            next: tn,
            pred: t,
            face: g,
            edge: old_edge,
        });
        self.edges.push(EdgeRec { orig, hedge: n1 });
        self.edges[old_edge as usize].hedge = h;

        self.hedges[h.idx()].twin = n2;
        self.hedges[h.idx()].next = n1;
        self.hedges[t.idx()].twin = n1;
        self.hedges[t.idx()].next = n2;
        self.hedges[t.idx()].edge = new_edge;
        self.hedges[hn.idx()].pred = n1;
        self.hedges[tn.idx()].pred = n2;

        self.faces[f.idx()].size += 1;
        self.faces[g.idx()].size += 1;
        self.verts[d.idx()].first = Some(n1);
        self.verts[d.idx()].degree = 2;
        self.union(u.0, d.0);
        Ok((d, n1))
    }

    /// Recomputes the face arena from scratch by walking every `next`
    /// cycle. Required after bulk pointer edits (rotation materialization,
    /// high-degree expansion); local inserts and splits keep faces live on
    /// their own. Invalidates all previous face handles.
    pub fn rebuild_faces(&mut self) {
        self.faces.clear();
        let mut assigned = vec![false; self.hedges.len()];
        for start in 0..self.hedges.len() {
            if assigned[start] {
                continue;
            }
            let fid = FaceId(self.faces.len() as u32);
            let mut size = 0u32;
            let mut h = HedgeId(start as u32);
            loop {
                assigned[h.idx()] = true;
                self.hedges[h.idx()].face = fid;
                size += 1;
                h = self.hedges[h.idx()].next;
                if h.idx() == start {
                    break;
                }
            }
            self.faces.push(FaceRec {
                start: HedgeId(start as u32),
                size,
                outer: false,
                alive: true,
            });
        }
        // One outer face per component: the largest boundary, ties to the
        // lowest face id.
        let mut best: std::collections::BTreeMap<u32, (u32, usize)> = std::collections::BTreeMap::new();
        for (idx, face) in self.faces.iter().enumerate() {
            let root = self.comp_root(self.hedges[face.start.idx()].origin.0);
            let entry = best.entry(root).or_insert((face.size, idx));
            if face.size > entry.0 {
                *entry = (face.size, idx);
            }
        }
        for (_, (_, idx)) in best {
            self.faces[idx].outer = true;
        }
    }

    /// Structural self-check: twin involution, next/pred inverse, face
    /// closure and sizes, rotation/degree agreement, and Euler's formula
    /// per connected component (isolated vertices count one implicit
    /// unbounded face).
    pub fn check_consistency(&self) -> Result<(), TopologyError> {
        for i in 0..self.hedges.len() {
            let h = HedgeId(i as u32);
            let rec = &self.hedges[i];
            self.check_hedge(rec.twin)?;
            self.check_hedge(rec.next)?;
            self.check_hedge(rec.pred)?;
            if self.hedges[rec.twin.idx()].twin != h {
                return Err(TopologyError::BrokenInvariant {
                    hedge: h,
                    invariant: "twin involution",
                });
            }
            if self.hedges[rec.next.idx()].pred != h {
                return Err(TopologyError::BrokenInvariant {
                    hedge: h,
                    invariant: "next/pred inversion",
                });
            }
            if self.hedges[rec.twin.idx()].origin == rec.origin {
                return Err(TopologyError::BrokenInvariant {
                    hedge: h,
                    invariant: "loop-free edge set",
                });
            }
            if rec.face.idx() >= self.faces.len() || !self.faces[rec.face.idx()].alive {
                return Err(TopologyError::UnknownFace(rec.face));
            }
        }
        for f in self.face_ids() {
            let boundary = self.face_hedges(f)?;
            if boundary.len() as u32 != self.faces[f.idx()].size {
                return Err(TopologyError::BrokenInvariant {
                    hedge: self.faces[f.idx()].start,
                    invariant: "face size agreement",
                });
            }
            for h in boundary {
                if self.hedges[h.idx()].face != f {
                    return Err(TopologyError::BrokenInvariant {
                        hedge: h,
                        invariant: "face-field agreement along boundary",
                    });
                }
            }
        }
        for v in 0..self.verts.len() {
            let vid = VertexId(v as u32);
            let rotation = self.half_edges_ccw(vid)?;
            if rotation.len() as u32 != self.verts[v].degree {
                let anchor = rotation.first().copied().unwrap_or(HedgeId(0));
                return Err(TopologyError::BrokenInvariant {
                    hedge: anchor,
                    invariant: "rotation/degree agreement",
                });
            }
        }
        self.check_euler()
    }

    fn check_euler(&self) -> Result<(), TopologyError> {
        use std::collections::BTreeMap;
        let mut verts_per: BTreeMap<u32, i64> = BTreeMap::new();
        let mut edges_per: BTreeMap<u32, i64> = BTreeMap::new();
        let mut faces_per: BTreeMap<u32, i64> = BTreeMap::new();
        for v in 0..self.verts.len() {
            *verts_per.entry(self.comp_root(v as u32)).or_insert(0) += 1;
        }
        for h in 0..self.hedges.len() {
            let root = self.comp_root(self.hedges[h].origin.0);
            *edges_per.entry(root).or_insert(0) += 1;
        }
        for f in self.face_ids() {
            let root = self.comp_root(self.hedges[self.faces[f.idx()].start.idx()].origin.0);
            *faces_per.entry(root).or_insert(0) += 1;
        }
        for (&root, &v) in &verts_per {
            let e = edges_per.get(&root).copied().unwrap_or(0) / 2;
            let mut f = faces_per.get(&root).copied().unwrap_or(0);
            if e == 0 {
                f += 1;
            }
            if v - e + f != 2 {
                return Err(TopologyError::BrokenInvariant {
                    hedge: self.verts[root as usize].first.unwrap_or(HedgeId(0)),
                    invariant: "Euler characteristic",
                });
            }
        }
        Ok(())
    }

    // ── Crate-internal hooks ────────────────────────────────────────────

    /// Raw twin-pair allocation for rotation materialization; the caller
    /// wires `next`/`pred` and rebuilds faces afterwards.
    pub(crate) fn alloc_edge_pair(
        &mut self,
        u: VertexId,
        v: VertexId,
        orig: Option<usize>,
    ) -> (HedgeId, HedgeId) {
        self.alloc_pair(u, v, orig)
    }

    /// Smallest vertex index in `v`'s connected component.
    pub(crate) fn component_root_of(&self, v: VertexId) -> u32 {
        self.comp_root(v.0)
    }

    // ── Internal surgery ────────────────────────────────────────────────

    fn walk_cycle(&self, start: HedgeId) -> Vec<HedgeId> {
        let mut out = Vec::new();
        let mut h = start;
        loop {
            out.push(h);
            h = self.hedges[h.idx()].next;
            if h == start {
                break;
            }
        }
        out
    }

    fn lowest_out(&self, v: VertexId) -> HedgeId {
        self.half_edges_ccw(v)
            .expect("vertex checked by caller")
            .into_iter()
            .min()
            .expect("caller guarantees incident edges")
    }

    fn anchor_on_face(&self, v: VertexId, f: FaceId) -> Option<HedgeId> {
        self.half_edges_ccw(v)
            .ok()?
            .into_iter()
            .filter(|h| self.hedges[h.idx()].face == f)
            .min()
    }

    fn alloc_pair(&mut self, u: VertexId, v: VertexId, orig: Option<usize>) -> (HedgeId, HedgeId) {
        let e = HedgeId(self.hedges.len() as u32);
        let t = HedgeId(e.0 + 1);
        let edge = self.edges.len() as u32;
        self.hedges.push(HedgeRec {
            origin: u,
            twin: t,
            next: t,
            pred: t,
            face: INVALID_FACE,
            edge,
        });
        self.hedges.push(HedgeRec {
            origin: v,
            twin: e,
            next: e,
            pred: e,
            face: INVALID_FACE,
            edge,
        });
        self.edges.push(EdgeRec { orig, hedge: e });
        self.verts[u.idx()].degree += 1;
        self.verts[v.idx()].degree += 1;
        if self.verts[u.idx()].first.is_none() {
            self.verts[u.idx()].first = Some(e);
        }
        if self.verts[v.idx()].first.is_none() {
            self.verts[v.idx()].first = Some(t);
        }
        self.union(u.0, v.0);
        (e, t)
    }

    fn alloc_face(&mut self, start: HedgeId, size: u32, outer: bool) -> FaceId {
        let f = FaceId(self.faces.len() as u32);
        self.faces.push(FaceRec {
            start,
            size,
            outer,
            alive: true,
        });
        f
    }

    fn link_isolated_pair(&mut self, u: VertexId, v: VertexId, orig: Option<usize>) -> (HedgeId, HedgeId) {
        let (e, t) = self.alloc_pair(u, v, orig);
        let f = self.alloc_face(e, 2, true);
        self.hedges[e.idx()].face = f;
        self.hedges[t.idx()].face = f;
        (e, t)
    }

    /// Attaches isolated `v` to anchored `u` inside the face of `au` and
    /// returns `(u→v, v→u)`.
    fn link_dangling(
        &mut self,
        u: VertexId,
        au: HedgeId,
        v: VertexId,
        orig: Option<usize>,
    ) -> (HedgeId, HedgeId) {
        let f = self.hedges[au.idx()].face;
        let pu = self.hedges[au.idx()].pred;
        let (e, t) = self.alloc_pair(u, v, orig);
        self.hedges[e.idx()].next = t;
        self.hedges[e.idx()].pred = pu;
        self.hedges[t.idx()].next = au;
        self.hedges[t.idx()].pred = e;
        self.hedges[pu.idx()].next = e;
        self.hedges[au.idx()].pred = t;
        self.hedges[e.idx()].face = f;
        self.hedges[t.idx()].face = f;
        self.faces[f.idx()].size += 2;
        (e, t)
    }

    /// Core insertion: both endpoints carry rotations. Splits the face
    /// when the anchors share one, merges two faces (component join)
    /// otherwise. Returns `(u→v, v→u)`.
    fn link(
        &mut self,
        u: VertexId,
        au: HedgeId,
        v: VertexId,
        av: HedgeId,
        orig: Option<usize>,
    ) -> (HedgeId, HedgeId) {
        let fu = self.hedges[au.idx()].face;
        let fv = self.hedges[av.idx()].face;
        let pu = self.hedges[au.idx()].pred;
        let pv = self.hedges[av.idx()].pred;
        let (e, t) = self.alloc_pair(u, v, orig);

        self.hedges[e.idx()].next = av;
        self.hedges[e.idx()].pred = pu;
        self.hedges[t.idx()].next = au;
        self.hedges[t.idx()].pred = pv;
        self.hedges[av.idx()].pred = e;
        self.hedges[au.idx()].pred = t;
        self.hedges[pu.idx()].next = e;
        self.hedges[pv.idx()].next = t;

        if fu == fv {
            // Face split: the cycle through e keeps fu and its outer flag,
            // the cycle through t gets a fresh bounded face.
            let side_e = self.walk_cycle(e);
            for &h in &side_e {
                self.hedges[h.idx()].face = fu;
            }
            self.faces[fu.idx()].start = e;
            self.faces[fu.idx()].size = side_e.len() as u32;
            let side_t = self.walk_cycle(t);
            let g = self.alloc_face(t, side_t.len() as u32, false);
            for &h in &side_t {
                self.hedges[h.idx()].face = g;
            }
        } else {
            // Component join: one merged face survives. It is unbounded
            // only if both sides were.
            let merged = self.walk_cycle(e);
            for &h in &merged {
                self.hedges[h.idx()].face = fu;
            }
            self.faces[fu.idx()].start = e;
            self.faces[fu.idx()].size = merged.len() as u32;
            self.faces[fu.idx()].outer =
                self.faces[fu.idx()].outer && self.faces[fv.idx()].outer;
            self.faces[fv.idx()].alive = false;
        }
        (e, t)
    }

    // ── Handle checks and components ────────────────────────────────────

    fn check_vertex(&self, v: VertexId) -> Result<(), TopologyError> {
        if v.idx() >= self.verts.len() {
            return Err(TopologyError::UnknownVertex(v));
        }
        Ok(())
    }

    fn check_hedge(&self, h: HedgeId) -> Result<(), TopologyError> {
        if h.idx() >= self.hedges.len() {
            return Err(TopologyError::UnknownHedge(h));
        }
        Ok(())
    }

    fn check_face(&self, f: FaceId) -> Result<(), TopologyError> {
        if f.idx() >= self.faces.len() || !self.faces[f.idx()].alive {
            return Err(TopologyError::UnknownFace(f));
        }
        Ok(())
    }

    fn comp_root(&self, mut v: u32) -> u32 {
        while self.comp[v as usize] != v {
            v = self.comp[v as usize];
        }
        v
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.comp_root(a);
        let rb = self.comp_root(b);
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.comp[hi as usize] = lo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(i: u32) -> VertexKind {
        VertexKind::Real { id: i }
    }

    fn triangle() -> (Dcel, [VertexId; 3]) {
        let mut dcel = Dcel::new();
        let a = dcel.add_vertex(real(0));
        let b = dcel.add_vertex(real(1));
        let c = dcel.add_vertex(real(2));
        dcel.add_edge(a, b).unwrap();
        dcel.add_edge(b, c).unwrap();
        dcel.add_edge(c, a).unwrap();
        (dcel, [a, b, c])
    }

    #[test]
    fn triangle_satisfies_euler() {
        let (dcel, _) = triangle();
        assert_eq!(dcel.num_vertices(), 3);
        assert_eq!(dcel.num_edges(), 3);
        assert_eq!(dcel.num_faces(), 2);
        dcel.check_consistency().unwrap();
    }

    #[test]
    fn twins_are_mutual_and_next_pred_invert() {
        let (dcel, _) = triangle();
        for i in 0..dcel.num_hedges() {
            let h = HedgeId(i as u32);
            assert_eq!(dcel.twin(dcel.twin(h).unwrap()).unwrap(), h);
            assert_eq!(dcel.pred(dcel.next(h).unwrap()).unwrap(), h);
        }
    }

    #[test]
    fn rotation_matches_degree() {
        let (dcel, [a, b, c]) = triangle();
        for v in [a, b, c] {
            assert_eq!(
                dcel.half_edges_ccw(v).unwrap().len() as u32,
                dcel.degree(v).unwrap()
            );
        }
    }

    #[test]
    fn split_edge_keeps_faces_and_tags() {
        let (mut dcel, _) = triangle();
        let h = HedgeId(0);
        let target = dcel.target(h).unwrap();
        let (d, cont) = dcel
            .split_edge(h, VertexKind::Dummy {
                kind: DummyKind::Subdivision,
                anchor: None,
            })
            .unwrap();
        assert_eq!(dcel.target(h).unwrap(), d);
        assert_eq!(dcel.origin(cont).unwrap(), d);
        assert_eq!(dcel.target(cont).unwrap(), target);
        assert_eq!(dcel.degree(d).unwrap(), 2);
        assert_eq!(dcel.num_faces(), 2);
        dcel.check_consistency().unwrap();
    }

    #[test]
    fn four_cycle_has_two_size_four_faces() {
        let mut dcel = Dcel::new();
        let vs: Vec<VertexId> = (0..4).map(|i| dcel.add_vertex(real(i))).collect();
        for i in 0..4u32 {
            dcel.add_edge(vs[i as usize], vs[((i + 1) % 4) as usize]).unwrap();
        }
        let mut sizes: Vec<u32> = dcel
            .face_ids()
            .into_iter()
            .map(|f| dcel.face_size(f).unwrap())
            .collect();
        sizes.sort();
        assert_eq!(sizes, vec![4, 4]);
        dcel.check_consistency().unwrap();
    }

    #[test]
    fn join_merges_components_into_one_face() {
        let mut dcel = Dcel::new();
        let a = dcel.add_vertex(real(0));
        let b = dcel.add_vertex(real(1));
        let c = dcel.add_vertex(real(2));
        let d = dcel.add_vertex(real(3));
        dcel.add_edge(a, b).unwrap();
        dcel.add_edge(c, d).unwrap();
        assert!(!dcel.same_component(a, c).unwrap());
        dcel.add_edge(b, c).unwrap();
        assert!(dcel.same_component(a, d).unwrap());
        assert_eq!(dcel.num_faces(), 1);
        assert_eq!(dcel.face_size(dcel.face(HedgeId(0)).unwrap()).unwrap(), 6);
        dcel.check_consistency().unwrap();
    }

    #[test]
    fn bad_handles_are_rejected() {
        let (mut dcel, [a, _, _]) = triangle();
        assert!(matches!(
            dcel.twin(HedgeId(99)),
            Err(TopologyError::UnknownHedge(HedgeId(99)))
        ));
        assert!(matches!(
            dcel.split_edge(HedgeId(99), real(9)),
            Err(TopologyError::UnknownHedge(HedgeId(99)))
        ));
        assert!(matches!(
            dcel.add_edge(a, a),
            Err(TopologyError::SelfLoop(_))
        ));
    }

    #[test]
    fn chord_insertion_splits_a_face() {
        let mut dcel = Dcel::new();
        let vs: Vec<VertexId> = (0..4).map(|i| dcel.add_vertex(real(i))).collect();
        for i in 0..4u32 {
            dcel.add_edge(vs[i as usize], vs[((i + 1) % 4) as usize]).unwrap();
        }
        dcel.add_edge(vs[0], vs[2]).unwrap();
        assert_eq!(dcel.num_faces(), 3);
        dcel.check_consistency().unwrap();
    }
}
