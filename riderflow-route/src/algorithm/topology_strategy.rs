use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// distance beyond which a gap or length disagreement is reported
pub const DEFAULT_SEAM_THRESHOLD_M: f64 = 500.0;

fn default_seam_threshold() -> f64 {
    DEFAULT_SEAM_THRESHOLD_M
}

/// selects how raw route shapes are reconstructed into an ordered backbone.
/// the graph diameter needs connected geometry while stitching needs spatial
/// locality of the chunks, so each fails differently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum TopologyStrategy {
    /// double-sweep diameter of the largest connected component
    GraphDiameter {
        #[serde(default = "default_seam_threshold")]
        seam_threshold_m: f64,
    },
    /// greedy nearest-neighbor stitching of pre-grouped chunks
    GreedyStitch {
        #[serde(default = "default_seam_threshold")]
        seam_threshold_m: f64,
    },
    /// graph diameter, cross-checked against stitching. disagreements are
    /// reported as geometry-quality warnings, never resolved silently.
    CrossChecked {
        #[serde(default = "default_seam_threshold")]
        seam_threshold_m: f64,
    },
}

impl Default for TopologyStrategy {
    fn default() -> Self {
        TopologyStrategy::CrossChecked {
            seam_threshold_m: DEFAULT_SEAM_THRESHOLD_M,
        }
    }
}

impl TopologyStrategy {
    pub fn seam_threshold_m(&self) -> f64 {
        match self {
            TopologyStrategy::GraphDiameter { seam_threshold_m } => *seam_threshold_m,
            TopologyStrategy::GreedyStitch { seam_threshold_m } => *seam_threshold_m,
            TopologyStrategy::CrossChecked { seam_threshold_m } => *seam_threshold_m,
        }
    }
}

impl Display for TopologyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyStrategy::GraphDiameter { .. } => write!(f, "graph diameter"),
            TopologyStrategy::GreedyStitch { .. } => write!(f, "greedy stitch"),
            TopologyStrategy::CrossChecked { .. } => write!(f, "cross-checked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tagged() {
        let s: TopologyStrategy = serde_json::from_str(r#"{"type": "greedy_stitch"}"#).unwrap();
        assert_eq!(
            s,
            TopologyStrategy::GreedyStitch {
                seam_threshold_m: 500.0
            }
        );
        let c: TopologyStrategy =
            serde_json::from_str(r#"{"type": "cross_checked", "seam_threshold_m": 250.0}"#)
                .unwrap();
        assert_eq!(c.seam_threshold_m(), 250.0);
    }
}
