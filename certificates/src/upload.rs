//! Validation of uploaded templates and fonts.

use ab_glyph::FontRef;
use eventdesk_core::{DeskError, Result};
use image::ImageFormat;
use std::path::Path;

/// MIME type templates must be uploaded with.
pub const TEMPLATE_MIME: &str = "image/png";

/// Check an uploaded template: declared as `image/png` and decodable as PNG.
///
/// # Errors
///
/// Returns [`DeskError::Validation`] describing the first problem found.
pub fn validate_template(content_type: Option<&str>, bytes: &[u8]) -> Result<()> {
    let declared = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or_default();
    if !declared.eq_ignore_ascii_case(TEMPLATE_MIME) {
        return Err(DeskError::validation(
            "Invalid file type. Only PNG templates are allowed",
        ));
    }

    if bytes.is_empty() {
        return Err(DeskError::validation("Template file is empty"));
    }
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|_| DeskError::validation("Template is not a valid PNG image"))?;
    Ok(())
}

/// Check an uploaded font: a `.ttf` or `.otf` file name and parseable outlines.
///
/// # Errors
///
/// Returns [`DeskError::Validation`] describing the first problem found.
pub fn validate_font(file_name: Option<&str>, bytes: &[u8]) -> Result<()> {
    let extension = file_name
        .map(Path::new)
        .and_then(Path::extension)
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    if !matches!(extension.as_deref(), Some("ttf" | "otf")) {
        return Err(DeskError::validation(
            "Invalid file type. Only .ttf and .otf fonts are allowed",
        ));
    }

    FontRef::try_from_slice(bytes)
        .map_err(|_| DeskError::validation("Font file could not be parsed"))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png() -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_png_template_is_accepted() {
        validate_template(Some("image/png"), &png()).unwrap();
        validate_template(Some("IMAGE/PNG; charset=binary"), &png()).unwrap();
    }

    #[test]
    fn test_template_mime_must_be_png() {
        let err = validate_template(Some("image/jpeg"), &png()).unwrap_err();
        assert_eq!(
            err,
            DeskError::validation("Invalid file type. Only PNG templates are allowed")
        );
        assert!(validate_template(None, &png()).is_err());
    }

    #[test]
    fn test_template_bytes_must_decode() {
        let err = validate_template(Some("image/png"), b"GIF89a....").unwrap_err();
        assert_eq!(err, DeskError::validation("Template is not a valid PNG image"));
    }

    #[test]
    fn test_font_extension_is_checked() {
        for name in [None, Some("font.woff"), Some("font"), Some("ttf")] {
            let err = validate_font(name, b"irrelevant").unwrap_err();
            assert_eq!(
                err,
                DeskError::validation("Invalid file type. Only .ttf and .otf fonts are allowed")
            );
        }
    }

    #[test]
    fn test_font_bytes_must_parse() {
        let err = validate_font(Some("Brand.TTF"), b"definitely not a font").unwrap_err();
        assert_eq!(err, DeskError::validation("Font file could not be parsed"));
    }
}
