use thiserror::Error;

use crate::dcel::{FaceId, HedgeId, VertexId};

/// The DCEL was handed a handle it does not own, or an operation that
/// would corrupt the embedding. Recoverable: the caller fixes its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("vertex handle {0:?} is not owned by this embedding")]
    UnknownVertex(VertexId),
    #[error("half-edge handle {0:?} is not owned by this embedding")]
    UnknownHedge(HedgeId),
    #[error("face handle {0:?} is not owned by this embedding")]
    UnknownFace(FaceId),
    #[error("edge {edge} references vertex {vertex} which is not in the graph")]
    UnknownEndpoint { edge: usize, vertex: u32 },
    #[error("self-loops must be subdivided before insertion (vertex {0:?})")]
    SelfLoop(VertexId),
    #[error("anchor half-edge {hedge:?} does not leave vertex {vertex:?}")]
    BadAnchor { hedge: HedgeId, vertex: VertexId },
    #[error("vertices {u:?} and {v:?} share no face; a plain insertion would cross edges")]
    NoSharedFace { u: VertexId, v: VertexId },
    #[error("half-edge {hedge:?} violates {invariant}")]
    BrokenInvariant {
        hedge: HedgeId,
        invariant: &'static str,
    },
}

/// The input graph could not be turned into a planar embedding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanarizationError {
    #[error("rotation system at vertex {vertex} does not match its incident edges")]
    InvalidRotation { vertex: u32 },
    #[error("fixed rotation system is not planar (component containing vertex {vertex})")]
    NonPlanarRotation { vertex: u32 },
    #[error("no crossing-free route found for edge {edge} ({u} -- {v})")]
    NoRoute { edge: usize, u: u32, v: u32 },
}

/// Internal consistency failure while computing the orthogonal shape.
/// Always fatal: it indicates a bug in an earlier stage, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrthogonalizationError {
    #[error("vertex {vertex:?} has degree {degree}; orthogonal shapes require degree <= 4")]
    DegreeTooHigh { vertex: VertexId, degree: u32 },
    #[error("angle-assignment flow is infeasible; the embedding is inconsistent")]
    InfeasibleFlow,
    #[error("direction propagation reached half-edge {hedge:?} with two conflicting directions")]
    DirectionConflict { hedge: HedgeId },
}

/// Internal consistency failure while assigning coordinates.
/// Always fatal: a constraint cycle means the shape stage emitted
/// inconsistent directions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompactionError {
    #[error("{axis} constraint graph contains a cycle through segment {segment}")]
    ConstraintCycle { axis: Axis, segment: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Horizontal => f.write_str("horizontal"),
            Axis::Vertical => f.write_str("vertical"),
        }
    }
}

/// Top-level error surfaced by the pipeline. One variant per stage; the
/// pipeline aborts on the first failure and returns no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),
    #[error("planarization failed: {0}")]
    Planarization(#[from] PlanarizationError),
    #[error("orthogonalization failed: {0}")]
    Orthogonalization(#[from] OrthogonalizationError),
    #[error("compaction failed: {0}")]
    Compaction(#[from] CompactionError),
}
