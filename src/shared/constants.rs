/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// UPLOAD LIMITS
// =============================================================================

/// Maximum size per uploaded image (5MB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// MIME types accepted for image uploads
pub const ALLOWED_IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Check whether a content type is an accepted image type
pub fn is_image_mime_allowed(content_type: &str) -> bool {
    ALLOWED_IMAGE_MIME_TYPES.contains(&content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mime_allowed() {
        assert!(is_image_mime_allowed("image/jpeg"));
        assert!(is_image_mime_allowed("image/png"));
        assert!(!is_image_mime_allowed("application/pdf"));
        assert!(!is_image_mime_allowed("image/svg+xml"));
        assert!(!is_image_mime_allowed(""));
    }
}
