use chrono::Utc;
use rand::RngCore;
use std::path::Path;

/// Validate a filename before it is allowed anywhere near a filesystem join.
/// Rejects empty names, traversal sequences, absolute paths and backslashes;
/// accepts only `[a-zA-Z0-9._-]+`.
pub fn validate_filename(filename: &str) -> bool {
    if filename.is_empty()
        || filename.contains("..")
        || filename.starts_with('/')
        || filename.contains('\\')
    {
        return false;
    }
    filename
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}

/// Generate a unique filename with timestamp and random suffix. The original
/// name contributes only its extension; everything else is discarded so no
/// client-controlled bytes reach storage.
pub fn generate_secure_filename(original_name: &str) -> String {
    let ext = original_name.rsplit('.').next().unwrap_or("");
    let timestamp = Utc::now().timestamp_millis();
    let mut random = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut random);
    format!("{}_{}.{}", timestamp, hex::encode(random), ext)
}

/// Sniff the magic-number signature of an uploaded buffer against the
/// allow-list (JPEG/PNG/GIF/WEBP/PDF). Returns the short type tag or None
/// for anything else.
pub fn detect_file_type(buf: &[u8]) -> Option<&'static str> {
    let kind = infer::get(buf)?;
    match kind.extension() {
        "jpg" => Some("jpg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        "pdf" => Some("pdf"),
        _ => None,
    }
}

/// Content-Type for a download, derived from the stored filename's extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
