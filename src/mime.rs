//! Fixed allow-list of image content types and their conventional extensions.

const ALLOWED_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/svg+xml",
];

/// Strip MIME parameters (`; charset=...`) and normalize case.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// True iff the declared content type is on the image allow-list.
/// Empty or missing types are rejected.
pub fn is_allowed(content_type: &str) -> bool {
    let essence = essence(content_type);
    ALLOWED_TYPES.contains(&essence.as_str())
}

/// Conventional file extension for an allow-listed content type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match essence(content_type).as_str() {
        "image/jpeg" | "image/jpg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/gif" => Some(".gif"),
        "image/webp" => Some(".webp"),
        "image/bmp" => Some(".bmp"),
        "image/svg+xml" => Some(".svg"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_listed_types_case_insensitive() {
        assert!(is_allowed("image/png"));
        assert!(is_allowed("IMAGE/PNG"));
        assert!(is_allowed("Image/Svg+Xml"));
        assert!(is_allowed("image/jpeg; charset=binary"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!is_allowed(""));
        assert!(!is_allowed("application/pdf"));
        assert!(!is_allowed("text/html; charset=utf-8"));
        assert!(!is_allowed("image/tiff"));
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(extension_for("image/png"), Some(".png"));
        assert_eq!(extension_for("image/jpeg; charset=binary"), Some(".jpg"));
        assert_eq!(extension_for("application/pdf"), None);
    }
}
