//! Request bodies for sample and batch rendering.
//!
//! Fields are optional at the serde level so that a missing field becomes a
//! validation error naming it, rather than a generic decode failure.

use crate::color::ColorSpec;
use crate::render::TextStyle;
use eventdesk_core::{DeskError, Result};
use serde::Deserialize;

/// Largest accepted `fontSize`, whatever the template size.
pub const MAX_FONT_SIZE: f32 = 1000.0;

/// Text placement and appearance, shared by sample and batch rendering.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRequest {
    /// Font size in pixels.
    pub font_size: Option<f32>,
    /// Text colour.
    pub color: Option<ColorSpec>,
    /// Left edge; omitted to centre.
    pub text_x: Option<f32>,
    /// Baseline.
    pub text_y: Option<f32>,
}

impl StyleRequest {
    /// Check required fields and resolve the colour.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Validation`] for a missing `fontSize`, `color` or
    /// `textY`, a font size outside `(0, MAX_FONT_SIZE]` or an unparseable
    /// colour.
    pub fn resolve(&self) -> Result<TextStyle> {
        let font_size = self.font_size.ok_or_else(|| missing("fontSize"))?;
        let color = self.color.as_ref().ok_or_else(|| missing("color"))?;
        let y = self.text_y.ok_or_else(|| missing("textY"))?;

        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(DeskError::validation("fontSize must be a positive number"));
        }
        if font_size > MAX_FONT_SIZE {
            return Err(DeskError::validation(format!(
                "fontSize must not exceed {MAX_FONT_SIZE}"
            )));
        }

        Ok(TextStyle {
            font_size,
            color: color.to_rgb()?,
            x: self.text_x,
            y,
        })
    }
}

/// Body of a sample render.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SampleRequest {
    /// Name to draw.
    pub name: Option<String>,
    /// Placement and appearance.
    #[serde(flatten)]
    pub style: StyleRequest,
}

impl SampleRequest {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// As [`StyleRequest::resolve`], plus a missing or blank `name`.
    pub fn resolve(&self) -> Result<(String, TextStyle)> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| missing("name"))?;
        Ok((name.to_string(), self.style.resolve()?))
    }
}

fn missing(field: &str) -> DeskError {
    DeskError::validation(format!("Missing required field: {field}"))
}
