//! MIME type detection and categorization.

/// How the pipeline treats a media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Already a PDF; text can be read directly.
    Pdf,
    /// A photo or scan that needs OCR first.
    Image,
    /// Anything else; not accepted for intake.
    Other,
}

/// Categorize a MIME type.
pub fn media_kind(mime: &str) -> MediaKind {
    let mime_lower = mime.trim().to_lowercase();
    // Drop parameters such as "; charset=binary"
    let essence = mime_lower.split(';').next().unwrap_or("").trim();

    if essence == "application/pdf" || essence == "application/x-pdf" {
        MediaKind::Pdf
    } else if essence.starts_with("image/") {
        MediaKind::Image
    } else {
        MediaKind::Other
    }
}

/// Guess MIME type from a filename extension.
pub fn guess_mime_from_filename(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Resolve the effective MIME type of an upload.
///
/// A specific declared type wins. Blank or `application/octet-stream`
/// declarations (common from browsers and chat attachments) are replaced by
/// content sniffing, then by the filename extension.
pub fn detect_mime(content: &[u8], filename: &str, declared: Option<&str>) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|d| !d.is_empty()) {
        if !declared.eq_ignore_ascii_case("application/octet-stream") {
            return declared.to_lowercase();
        }
    }

    if let Some(kind) = infer::get(content) {
        return kind.mime_type().to_string();
    }

    guess_mime_from_filename(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind() {
        assert_eq!(media_kind("application/pdf"), MediaKind::Pdf);
        assert_eq!(media_kind("APPLICATION/PDF"), MediaKind::Pdf);
        assert_eq!(media_kind("image/jpeg"), MediaKind::Image);
        assert_eq!(media_kind("image/png; foo=bar"), MediaKind::Image);
        assert_eq!(media_kind("text/plain"), MediaKind::Other);
        assert_eq!(media_kind(""), MediaKind::Other);
    }

    #[test]
    fn test_guess_mime_from_filename() {
        assert_eq!(guess_mime_from_filename("recibo.pdf"), "application/pdf");
        assert_eq!(guess_mime_from_filename("FOTO.JPG"), "image/jpeg");
        assert_eq!(guess_mime_from_filename("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_detect_mime_prefers_declared() {
        assert_eq!(
            detect_mime(b"whatever", "x.bin", Some("image/png")),
            "image/png"
        );
    }

    #[test]
    fn test_detect_mime_sniffs_octet_stream() {
        let pdf = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n";
        assert_eq!(
            detect_mime(pdf, "upload", Some("application/octet-stream")),
            "application/pdf"
        );

        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(detect_mime(&png, "upload", None), "image/png");
    }

    #[test]
    fn test_detect_mime_falls_back_to_filename() {
        assert_eq!(detect_mime(b"no magic here", "scan.jpeg", Some("")), "image/jpeg");
    }
}
