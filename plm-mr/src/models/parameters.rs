//! Pipeline run options

use serde::{Deserialize, Serialize};

/// Default threshold for accepting a catalog match
pub const DEFAULT_MIN_CONFIDENCE: f64 = 70.0;

/// Options supplied with a batch submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Run the Resolve stage (default: true)
    #[serde(default = "default_fetch_metadata")]
    pub fetch_metadata: bool,

    /// Minimum score (0–100) for a catalog match to be accepted (default: 70.0)
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Download cover art during Apply (default: false)
    #[serde(default)]
    pub download_covers: bool,
}

fn default_fetch_metadata() -> bool {
    true
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            fetch_metadata: default_fetch_metadata(),
            min_confidence: default_min_confidence(),
            download_covers: false,
        }
    }
}
