//! Text compositing onto a certificate template.

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use eventdesk_core::{DeskError, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbaImage};
use std::io::Cursor;

/// Where and how the name is drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Pixel height of the font.
    pub font_size: f32,
    /// Fill colour.
    pub color: Rgb<u8>,
    /// Left edge of the text; `None` centres it horizontally.
    pub x: Option<f32>,
    /// Baseline of the text.
    pub y: f32,
}

/// A decoded template plus font, ready to stamp names.
///
/// Rendering is CPU bound; async callers should run [`render`](Self::render)
/// on the blocking pool.
#[derive(Clone)]
pub struct CertificateRenderer {
    template: RgbaImage,
    font: FontArc,
}

impl std::fmt::Debug for CertificateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateRenderer")
            .field("width", &self.template.width())
            .field("height", &self.template.height())
            .finish_non_exhaustive()
    }
}

impl CertificateRenderer {
    /// Decode a PNG template and parse a TrueType/OpenType font.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Rendering`] if either asset is unusable.
    pub fn from_assets(template_png: &[u8], font: Vec<u8>) -> Result<Self> {
        let template = image::load_from_memory_with_format(template_png, ImageFormat::Png)
            .map_err(|e| DeskError::Rendering(format!("Template could not be decoded: {e}")))?
            .to_rgba8();
        let font = FontArc::try_from_vec(font)
            .map_err(|e| DeskError::Rendering(format!("Font could not be parsed: {e}")))?;

        Ok(Self { template, font })
    }

    /// Template size in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.template.dimensions()
    }

    /// Advance width of `text` at `font_size`, kerning included.
    #[must_use]
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(font_size));
        let mut width = 0.0;
        let mut previous: Option<GlyphId> = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }

    /// Check that `style` fits this template.
    ///
    /// Glyphs are rasterized whole before clipping, so the font size is
    /// bounded by the template height.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Validation`] for a non-positive font size or one
    /// larger than the template is tall.
    pub fn check_style(&self, style: &TextStyle) -> Result<()> {
        if !(style.font_size.is_finite() && style.font_size > 0.0) {
            return Err(DeskError::validation("fontSize must be a positive number"));
        }
        #[allow(clippy::cast_precision_loss)] // template heights are far below 2^24
        let height = self.template.height() as f32;
        if style.font_size > height {
            return Err(DeskError::validation(format!(
                "fontSize must not exceed the template height of {height} px"
            )));
        }
        Ok(())
    }

    /// Draw `name` onto a copy of the template and encode it as PNG.
    ///
    /// # Errors
    ///
    /// As [`check_style`](Self::check_style), plus [`DeskError::Rendering`]
    /// if PNG encoding fails.
    pub fn render(&self, name: &str, style: &TextStyle) -> Result<Vec<u8>> {
        self.check_style(style)?;

        let mut canvas = self.template.clone();
        #[allow(clippy::cast_precision_loss)] // template widths are far below 2^24
        let width = canvas.width() as f32;
        let x = style
            .x
            .unwrap_or_else(|| (width - self.text_width(name, style.font_size)) / 2.0);

        self.draw_text(&mut canvas, name, style, x);

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| DeskError::Rendering(format!("PNG encoding failed: {e}")))?;
        Ok(png)
    }

    fn draw_text(&self, canvas: &mut RgbaImage, text: &str, style: &TextStyle, x: f32) {
        let scale = PxScale::from(style.font_size);
        let scaled = self.font.as_scaled(scale);
        let (width, height) = canvas.dimensions();
        let mut caret = point(x, style.y);
        let mut previous: Option<GlyphId> = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret.x += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, caret);
            caret.x += scaled.h_advance(id);
            previous = Some(id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                // Whitespace has no outline.
                continue;
            };
            let bounds = outlined.px_bounds();
            #[allow(clippy::cast_precision_loss)]
            let off_canvas = bounds.max.x <= 0.0
                || bounds.max.y <= 0.0
                || bounds.min.x >= width as f32
                || bounds.min.y >= height as f32;
            if off_canvas {
                continue;
            }

            outlined.draw(|gx, gy, coverage| {
                #[allow(clippy::cast_possible_truncation)] // bounds are pixel coordinates
                let px = bounds.min.x as i64 + i64::from(gx);
                #[allow(clippy::cast_possible_truncation)]
                let py = bounds.min.y as i64 + i64::from(gy);
                let (Ok(px), Ok(py)) = (u32::try_from(px), u32::try_from(py)) else {
                    return;
                };
                if px < width && py < height {
                    blend(canvas.get_pixel_mut(px, py), style.color, coverage);
                }
            });
        }
    }
}

/// Source-over blend of `color` at `coverage` onto `pixel`.
fn blend(pixel: &mut image::Rgba<u8>, color: Rgb<u8>, coverage: f32) {
    let alpha = coverage.clamp(0.0, 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // result in 0.0..=255.0
    let mix = |under: u8, over: u8| {
        (f32::from(over) * alpha + f32::from(under) * (1.0 - alpha)).round() as u8
    };

    for channel in 0..3 {
        pixel[channel] = mix(pixel[channel], color[channel]);
    }
    pixel[3] = mix(pixel[3], u8::MAX);
}
