//! Format-specific extraction strategies.
//!
//! Every strategy yields two ordered lists, text units and image artifacts,
//! produced concurrently and joined before pairing.

mod archive;
pub mod docx;
pub mod pdf;
pub mod plain;
pub mod pptx;

use crate::{engine::PdfEngine, error::ExtractionError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An uploaded document. Fixed at enqueue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    path: PathBuf,
    original_name: String,
    declared_type: String,
}

impl DocumentRef {
    /// Declared type is taken from the original name's extension.
    pub fn new(path: impl Into<PathBuf>, original_name: impl Into<String>) -> Self {
        let original_name = original_name.into();
        let declared_type = Path::new(&original_name)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        Self {
            path: path.into(),
            original_name,
            declared_type,
        }
    }

    /// For callers that know the type out of band (e.g. an upload MIME type).
    pub fn with_declared_type(
        path: impl Into<PathBuf>,
        original_name: impl Into<String>,
        declared_type: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            original_name: original_name.into(),
            declared_type: declared_type.into().trim().to_ascii_lowercase(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    pub fn format(&self) -> Result<Format, ExtractionError> {
        Format::from_declared(&self.declared_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    Pdf,
    Docx,
    Pptx,
    PlainText,
}

/// How text units line up with images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// `text[i]` goes with `image[i]`.
    Indexed,
    /// The single text unit is repeated on every image.
    Replicated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExtraction {
    pub text_units: Vec<String>,
    pub images: Vec<PathBuf>,
    pub pairing: Pairing,
}

impl Format {
    /// Accepts a bare extension (`pdf`, `.PDF`) or one of the upload MIME types.
    pub fn from_declared(declared: &str) -> Result<Self, ExtractionError> {
        let norm = declared.trim().to_ascii_lowercase();
        let norm = norm.strip_prefix('.').unwrap_or(&norm);
        match norm {
            "pdf" | "application/pdf" => Ok(Format::Pdf),
            "docx"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Ok(Format::Docx)
            }
            "pptx"
            | "ppt"
            | "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            | "application/vnd.ms-powerpoint" => Ok(Format::Pptx),
            "txt" | "text/plain" => Ok(Format::PlainText),
            _ => Err(ExtractionError::UnsupportedFormat(declared.to_string())),
        }
    }

    pub fn pairing(self) -> Pairing {
        match self {
            Format::Docx => Pairing::Replicated,
            Format::Pdf | Format::Pptx | Format::PlainText => Pairing::Indexed,
        }
    }

    pub async fn extract_text(
        self,
        input: &Path,
        out_dir: &Path,
        engine: &dyn PdfEngine,
    ) -> Result<Vec<String>, ExtractionError> {
        match self {
            Format::Pdf => pdf::extract_text(engine, input, out_dir).await,
            Format::Docx => docx::extract_text(input).await.map(|t| vec![t]),
            Format::Pptx => pptx::extract_text(input).await,
            Format::PlainText => plain::extract_text(input).await.map(|t| vec![t]),
        }
    }

    pub async fn extract_images(
        self,
        input: &Path,
        out_dir: &Path,
        engine: &dyn PdfEngine,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        match self {
            Format::Pdf => pdf::extract_images(engine, input, out_dir).await,
            Format::Docx => docx::extract_images(input, out_dir).await,
            Format::Pptx => pptx::extract_images(input, out_dir).await,
            Format::PlainText => Ok(Vec::new()),
        }
    }

    /// Runs both branches to completion, then reports the first failure.
    pub async fn extract(
        self,
        input: &Path,
        out_dir: &Path,
        engine: &dyn PdfEngine,
    ) -> Result<RawExtraction, ExtractionError> {
        let (text_units, images) = tokio::join!(
            self.extract_text(input, out_dir, engine),
            self.extract_images(input, out_dir, engine),
        );
        Ok(RawExtraction {
            text_units: text_units?,
            images: images?,
            pairing: self.pairing(),
        })
    }
}

/// Runs archive and file work on the blocking pool.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ExtractionError>
where
    F: FnOnce() -> Result<T, ExtractionError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExtractionError::Io(std::io::Error::other(e.to_string())))?
}
