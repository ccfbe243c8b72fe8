//! Photo file storage.
//!
//! Uploaded bytes land under `<uploads_dir>/photos/` with a generated
//! filename; the returned URL is what the static `/uploads` route serves.
//! Deleting a photo record does not remove the stored file here.

use std::path::Path;

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of persisting an uploaded file.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub url: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

/// Write uploaded photo bytes to disk and return the stable reference.
pub fn save_photo(
    uploads_dir: &Path,
    original_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Result<StoredUpload, StorageError> {
    let dir = uploads_dir.join("photos");
    std::fs::create_dir_all(&dir)?;

    let file_name = format!("{}.{}", Uuid::new_v4(), file_extension(original_name, content_type));
    std::fs::write(dir.join(&file_name), bytes)?;

    Ok(StoredUpload {
        url: format!("/uploads/photos/{file_name}"),
        original_name: original_name.to_string(),
        content_type: content_type.to_string(),
        size_bytes: bytes.len() as u64,
    })
}

/// Best-guess content type for a filename (used when the client omits one).
pub fn content_type_for(original_name: &str) -> String {
    mime_guess::from_path(original_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Extension for the stored file: the original filename's extension when
/// present, otherwise derived from the content type, otherwise `bin`.
fn file_extension(original_name: &str, content_type: &str) -> String {
    if let Some(ext) = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
    {
        return ext.to_ascii_lowercase();
    }
    mime_guess::get_mime_extensions_str(content_type)
        .and_then(|exts| exts.last())
        .map(|e| e.to_string())
        .unwrap_or_else(|| "bin".to_string())
}
