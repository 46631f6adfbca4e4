//! Zip access shared by the DOCX and PPTX strategies.

use crate::error::ExtractionError;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

/// Upper bound on the buffer pre-allocated from an entry's declared size.
/// The header is untrusted; `read_to_end` grows past this from real bytes.
const SIZE_HINT_CAP: u64 = 1 << 20;

fn entry_buffer(declared: u64) -> Vec<u8> {
    Vec::with_capacity(declared.min(SIZE_HINT_CAP) as usize)
}

pub(crate) fn open(path: &Path) -> Result<ZipArchive<File>, ExtractionError> {
    let file = File::open(path)?;
    ZipArchive::new(file).map_err(|e| ExtractionError::archive(path.display(), e))
}

/// Reads an entry that must exist for the document to be usable.
pub(crate) fn read_required(
    archive: &mut ZipArchive<File>,
    path: &Path,
    entry: &str,
) -> Result<Vec<u8>, ExtractionError> {
    let mut file = archive.by_name(entry).map_err(|e| match e {
        ZipError::FileNotFound => {
            ExtractionError::archive(path.display(), format!("missing entry {entry}"))
        }
        other => ExtractionError::archive(path.display(), other),
    })?;
    let mut buf = entry_buffer(file.size());
    file.read_to_end(&mut buf)
        .map_err(|e| ExtractionError::archive(path.display(), format!("{entry}: {e}")))?;
    Ok(buf)
}

/// Writes every file entry under `media_prefix`, in archive order, to
/// `<out_dir>/<file_prefix>-<n><ext>` with `n` counting from 1.
pub(crate) fn extract_media(
    path: &Path,
    media_prefix: &str,
    out_dir: &Path,
    file_prefix: &str,
) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut archive = open(path)?;
    let mut written = Vec::new();
    for idx in 0..archive.len() {
        let (name, bytes) = {
            let mut file = archive
                .by_index(idx)
                .map_err(|e| ExtractionError::archive(path.display(), e))?;
            if file.is_dir() || !file.name().starts_with(media_prefix) {
                continue;
            }
            let name = file.name().to_string();
            let mut buf = entry_buffer(file.size());
            file.read_to_end(&mut buf)
                .map_err(|e| ExtractionError::archive(path.display(), format!("{name}: {e}")))?;
            (name, buf)
        };
        let n = written.len() + 1;
        let out_path = out_dir.join(format!("{}-{}{}", file_prefix, n, extension_of(&name)));
        std::fs::write(&out_path, &bytes)?;
        debug!("media {} -> {} ({} bytes)", name, out_path.display(), bytes.len());
        written.push(out_path);
    }
    Ok(written)
}

/// Extension of the last path component including the dot, or "".
fn extension_of(entry: &str) -> &str {
    let file = entry.rsplit('/').next().unwrap_or(entry);
    match file.rfind('.') {
        Some(idx) if idx > 0 => &file[idx..],
        _ => "",
    }
}
