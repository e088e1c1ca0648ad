//! Format detection for input files.

use std::path::Path;
use tracing::debug;

use super::error::ConverterError;
use super::types::{DocumentFormat, FileInfo};
use crate::fs::FileSystem;

/// Bytes read from the head of a file when the extension is inconclusive.
const SNIFF_LEN: usize = 512;

/// Returns file information with a best-effort format classification.
///
/// A `format_hint` wins over detection. Otherwise the extension decides,
/// falling back to content sniffing for unknown extensions.
pub async fn probe_file<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    format_hint: Option<&DocumentFormat>,
) -> Result<FileInfo, ConverterError> {
    let stat = fs.get_file_info(path).await?;
    if !stat.exists || !stat.is_file {
        return Err(ConverterError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let format = match format_hint {
        Some(hint) => hint.clone(),
        None => detect_format(fs, path).await,
    };

    Ok(FileInfo {
        path: path.to_path_buf(),
        format,
        size: stat.size,
        modified: stat.modified,
    })
}

async fn detect_format<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> DocumentFormat {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let by_extension = DocumentFormat::from_extension(extension);

    if !matches!(by_extension, DocumentFormat::Other(_)) {
        return by_extension;
    }

    match fs.read_bytes(path).await {
        Ok(bytes) => match sniff_format(&bytes) {
            Some(format) => {
                debug!("Sniffed {} as {}", path.display(), format);
                format
            }
            None => by_extension,
        },
        Err(e) => {
            debug!("Could not sniff {}: {}", path.display(), e);
            by_extension
        }
    }
}

/// Classifies a document by its leading bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<DocumentFormat> {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];

    if head.starts_with(b"%PDF") {
        return Some(DocumentFormat::Pdf);
    }
    if head.starts_with(b"PK\x03\x04") {
        return Some(DocumentFormat::Docx);
    }

    let text = String::from_utf8_lossy(head).trim_start().to_ascii_lowercase();
    if text.starts_with("<!doctype html") || text.starts_with("<html") {
        return Some(DocumentFormat::Html);
    }

    None
}
