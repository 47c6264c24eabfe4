//! Media type detection for uploaded lease files.
//!
//! The CLI and other front ends use this to label a file before text
//! recovery when the caller does not declare a type.

use std::path::Path;

use tenantlens_core::MediaType;

/// Detect the media type by file extension.
pub fn detect_media_type(path: &Path) -> Option<MediaType> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "pdf"          => Some(MediaType::Pdf),
        "jpg" | "jpeg" => Some(MediaType::Jpeg),
        "png"          => Some(MediaType::Png),
        "tiff" | "tif" => Some(MediaType::Tiff),
        _              => None,
    }
}

/// Detect the media type from the leading magic bytes.
pub fn sniff_media_type(bytes: &[u8]) -> Option<MediaType> {
    if bytes.starts_with(b"%PDF-") {
        Some(MediaType::Pdf)
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(MediaType::Png)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(MediaType::Jpeg)
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some(MediaType::Tiff)
    } else {
        None
    }
}

/// Content sniffing first, falling back to the extension.
pub fn detect(path: &Path, bytes: &[u8]) -> Option<MediaType> {
    sniff_media_type(bytes).or_else(|| detect_media_type(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection() {
        assert_eq!(detect_media_type(Path::new("lease.PDF")), Some(MediaType::Pdf));
        assert_eq!(detect_media_type(Path::new("scan.jpg")), Some(MediaType::Jpeg));
        assert_eq!(detect_media_type(Path::new("scan.tif")), Some(MediaType::Tiff));
        assert_eq!(detect_media_type(Path::new("notes.txt")), None);
        assert_eq!(detect_media_type(Path::new("noext")), None);
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(sniff_media_type(b"%PDF-1.7\n..."), Some(MediaType::Pdf));
        assert_eq!(sniff_media_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(MediaType::Jpeg));
        assert_eq!(sniff_media_type(b"II*\0rest"), Some(MediaType::Tiff));
        assert_eq!(sniff_media_type(b"GIF89a"), None);
    }

    #[test]
    fn test_content_wins_over_extension() {
        assert_eq!(detect(Path::new("lease.png"), b"%PDF-1.4"), Some(MediaType::Pdf));
        assert_eq!(detect(Path::new("lease.png"), b"????"), Some(MediaType::Png));
    }
}
