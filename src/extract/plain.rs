use crate::error::ExtractionError;
use std::path::Path;

/// The whole file is one text unit, unmodified.
pub async fn extract_text(input: &Path) -> Result<String, ExtractionError> {
    let bytes = tokio::fs::read(input).await?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
