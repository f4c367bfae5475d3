use std::path::Path;

use serde::{Deserialize, Serialize};

/// Knobs for one pipeline run. Everything defaults to the plain grid
/// drawing; callers override the fields they care about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Keep crossing/expansion vertices visible in the result instead of
    /// collapsing them into polyline points of the original edges.
    pub preserve_dummy_vertices: bool,
    /// Minimum grid units between parallel segments. Values below 1 are
    /// treated as 1; a zero separation would collapse adjacent segments
    /// onto each other.
    pub vertex_separation: u32,
    /// Reserved tie-break seed. The pipeline is fully deterministic on its
    /// own; the seed is carried so callers can pin future randomized
    /// heuristics without an API change.
    pub deterministic_seed: u64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            preserve_dummy_vertices: false,
            vertex_separation: 1,
            deterministic_seed: 0,
        }
    }
}

impl LayoutOptions {
    pub fn separation(&self) -> u32 {
        self.vertex_separation.max(1)
    }
}

/// Reads option overrides from a JSON file. `None` yields the defaults.
pub fn load_options(path: Option<&Path>) -> anyhow::Result<LayoutOptions> {
    let Some(path) = path else {
        return Ok(LayoutOptions::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let options: LayoutOptions = serde_json::from_str(&contents)?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_collapse_dummies_with_unit_separation() {
        let options = LayoutOptions::default();
        assert!(!options.preserve_dummy_vertices);
        assert_eq!(options.vertex_separation, 1);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let options: LayoutOptions =
            serde_json::from_str(r#"{"vertex_separation": 3}"#).expect("parse failed");
        assert_eq!(options.vertex_separation, 3);
        assert!(!options.preserve_dummy_vertices);
    }

    #[test]
    fn zero_separation_is_clamped() {
        let options = LayoutOptions {
            vertex_separation: 0,
            ..LayoutOptions::default()
        };
        assert_eq!(options.separation(), 1);
    }
}
