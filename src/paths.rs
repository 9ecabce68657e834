//! Helpers for public image paths as they appear in site source.

use crate::optimize::DerivativeFormat;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif", "svg"];
const DERIVABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

fn extension_of(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext)
}

/// Whether `path` looks like a servable image path under `prefix`.
pub fn is_valid_image_path(path: &str, prefix: &str) -> bool {
    if !path.starts_with(prefix) {
        return false;
    }
    extension_of(path).is_some_and(|ext| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    })
}

/// Whether the optimizer produces derivatives for this path.
pub fn is_derivable(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| {
        DERIVABLE_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    })
}

/// Path of the `format` derivative that sits beside `path`.
///
/// Paths that are not JPEG/PNG come back unchanged.
pub fn derivative_public_path(path: &str, format: DerivativeFormat) -> String {
    if !is_derivable(path) {
        return path.to_string();
    }
    match path.rsplit_once('.') {
        Some((base, _)) => format!("{base}.{}", format.extension()),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_image_path() {
        assert!(is_valid_image_path("/images/a.jpg", "/images/"));
        assert!(is_valid_image_path("/images/logo.SVG", "/images/"));
        assert!(!is_valid_image_path("/images/readme.txt", "/images/"));
        assert!(!is_valid_image_path("/static/a.jpg", "/images/"));
        assert!(!is_valid_image_path("/images/.jpg", "/images/"));
    }

    #[test]
    fn test_derivative_public_path() {
        assert_eq!(
            derivative_public_path("/images/gallery/photo.JPG", DerivativeFormat::Webp),
            "/images/gallery/photo.webp"
        );
        assert_eq!(
            derivative_public_path("/images/a.b.png", DerivativeFormat::Avif),
            "/images/a.b.avif"
        );
        assert_eq!(
            derivative_public_path("/images/logo.svg", DerivativeFormat::Webp),
            "/images/logo.svg"
        );
    }
}
