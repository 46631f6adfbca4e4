pub mod poppler;
pub mod types;

use crate::error::ExtractionError;
use async_trait::async_trait;
use std::path::Path;

pub use poppler::PopplerEngine;
pub use types::ToolDiag;

/// The two external PDF collaborators: a text-layout renderer that emits one
/// `\f`-delimited text stream, and a rasterizer that emits one image per page.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn doctor(&self) -> Vec<ToolDiag>;

    /// Renders the text layer of `input` into the file at `dest`.
    async fn render_text(&self, input: &Path, dest: &Path) -> Result<(), ExtractionError>;

    /// Renders every page of `input` to `<prefix>-<page>.png`.
    async fn rasterize(&self, input: &Path, prefix: &Path) -> Result<(), ExtractionError>;
}
