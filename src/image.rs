use crate::models::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::path::Path;

/// Decode a base64 image payload and write it to `path`. Returns the byte count.
pub fn save_base64_image(data: &str, path: &Path) -> Result<usize> {
    let bytes = STANDARD.decode(data.trim())?;
    fs::write(path, &bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "image saved");
    Ok(bytes.len())
}
