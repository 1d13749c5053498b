//! Content type detection for served files.

use std::path::Path;

/// Content type for `path`, from its extension first and its leading bytes otherwise.
pub fn detect(path: &Path, content: &[u8]) -> &'static str {
    from_extension(path).unwrap_or_else(|| sniff(content))
}

/// Content type registered for the file extension, if known.
pub fn from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "xml" => "text/xml; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/vnd.microsoft.icon",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "wasm" => "application/wasm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        _ => return None,
    };
    Some(mime)
}

/// Guess a content type from the first bytes of a file.
pub fn sniff(content: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x00asm", "application/wasm"),
    ];

    let head = &content[..content.len().min(512)];
    if let Some(mime) = SIGNATURES
        .iter()
        .find(|&&(magic, _)| head.starts_with(magic))
        .map(|&(_, mime)| mime)
    {
        return mime;
    }

    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start().to_ascii_lowercase();
    if trimmed.starts_with("<!doctype html") || trimmed.starts_with("<html") {
        return "text/html; charset=utf-8";
    }
    // A multi-byte character may be cut at the 512-byte boundary.
    let valid_prefix = match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };
    if valid_prefix && !head.iter().any(|b| matches!(b, 0x00..=0x08 | 0x0e..=0x1a | 0x1c..=0x1f)) {
        return "text/plain; charset=utf-8";
    }
    "application/octet-stream"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_wins() {
        assert_eq!(detect(Path::new("config/app.JSON"), b""), "application/json");
        assert_eq!(detect(Path::new("index.html"), b"{}"), "text/html; charset=utf-8");
    }

    #[test]
    fn test_sniff_fallback() {
        assert_eq!(detect(Path::new("logo"), b"\x89PNG\r\n\x1a\nrest"), "image/png");
        assert_eq!(detect(Path::new("README"), b"plain words"), "text/plain; charset=utf-8");
        assert_eq!(detect(Path::new("page"), b"  <!DOCTYPE html><html>"), "text/html; charset=utf-8");
        assert_eq!(detect(Path::new("blob"), b"\x00\x01\x02"), "application/octet-stream");
    }
}
