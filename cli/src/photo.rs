use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Read an image file into a self-contained `data:` URL. An empty file
/// attaches no photo.
pub fn file_to_data_url(path: &Path) -> Result<Option<String>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read photo: {}", path.display()))?;
    if bytes.is_empty() {
        tracing::warn!(path = %path.display(), "photo file is empty, skipping");
        return Ok(None);
    }
    let mime = image_mime(path);
    Ok(Some(format!("data:{mime};base64,{}", STANDARD.encode(bytes))))
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
