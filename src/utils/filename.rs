//! Safe names for files stored in the document tree.

/// Default stem when an upload has no usable name.
const FALLBACK_STEM: &str = "documento";

/// Maximum stem length in characters.
const MAX_STEM_CHARS: usize = 100;

/// Replace path separators and reserved characters, trim, and cap the length.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('_').trim();
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.chars().take(MAX_STEM_CHARS).collect()
    }
}

/// Name under which a document is stored: the sanitized stem of the original
/// filename with a `.pdf` extension.
pub fn pdf_file_name(original: &str) -> String {
    // Keep only the last path component; uploads sometimes carry client paths
    let base = original
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(original);

    let stem = match base.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => base,
    };

    format!("{}.pdf", sanitize_filename(stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("recibo: março?"), "recibo_ março");
        assert_eq!(sanitize_filename("  a/b  "), "a_b");
        assert_eq!(sanitize_filename("___"), "documento");
        assert_eq!(sanitize_filename(""), "documento");
    }

    #[test]
    fn test_sanitize_filename_truncates_on_char_boundary() {
        let long = "é".repeat(150);
        let result = sanitize_filename(&long);
        assert_eq!(result.chars().count(), 100);
    }

    #[test]
    fn test_pdf_file_name() {
        assert_eq!(pdf_file_name("foto_recibo.jpg"), "foto_recibo.pdf");
        assert_eq!(pdf_file_name("informe.PDF"), "informe.pdf");
        assert_eq!(pdf_file_name("C:\\Users\\ana\\IPTU 2024.png"), "IPTU 2024.pdf");
        assert_eq!(pdf_file_name("semextensao"), "semextensao.pdf");
        assert_eq!(pdf_file_name(".hidden"), ".hidden.pdf");
        assert_eq!(pdf_file_name(""), "documento.pdf");
    }
}
