use serde::{Deserialize, Serialize};

/// One `(text, image)` pair; an absent side is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub text: String,
    pub image: String,
}

/// Result of a completed job, also written to the job's output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutput {
    pub filename: String,
    pub output_dir: String,
    pub data: Vec<ExtractionRecord>,
}
