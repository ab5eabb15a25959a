//! Text colour parsing.
//!
//! Organizers pick a colour either as an `[r, g, b]` array or as a CSS-like
//! string: `#rrggbb`, `#rgb`, `rgb(r, g, b)` or `hsl(h, s%, l%)`.

use eventdesk_core::{DeskError, Result};
use image::Rgb;
use serde::{Deserialize, Serialize};

/// A colour as submitted in a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    /// `[r, g, b]`, each 0-255.
    Channels(Vec<i64>),
    /// Hex, `rgb()` or `hsl()` notation.
    Text(String),
}

impl ColorSpec {
    /// Resolve to an RGB triple.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Validation`] for anything that is not one of the
    /// accepted formats or has out-of-range components.
    pub fn to_rgb(&self) -> Result<Rgb<u8>> {
        match self {
            Self::Channels(channels) => match channels.as_slice() {
                [r, g, b] => Ok(Rgb([channel(*r)?, channel(*g)?, channel(*b)?])),
                _ => Err(invalid("RGB color must be a list of 3 values")),
            },
            Self::Text(text) => parse_color(text),
        }
    }
}

impl From<[u8; 3]> for ColorSpec {
    fn from(rgb: [u8; 3]) -> Self {
        Self::Channels(rgb.iter().map(|c| i64::from(*c)).collect())
    }
}

/// Parse a colour string.
///
/// # Errors
///
/// Returns [`DeskError::Validation`] when the string is not a recognised format.
pub fn parse_color(input: &str) -> Result<Rgb<u8>> {
    let input = input.trim();
    let lower = input.to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| invalid(&format!("Invalid HEX color: {input}")));
    }
    if let Some(args) = function_args(&lower, "rgb") {
        return parse_rgb_fn(args).ok_or_else(|| invalid(&format!("Invalid RGB color: {input}")));
    }
    if let Some(args) = function_args(&lower, "hsl") {
        return parse_hsl_fn(args).ok_or_else(|| invalid(&format!("Invalid HSL color: {input}")));
    }

    Err(invalid("Unsupported color format"))
}

fn invalid(detail: &str) -> DeskError {
    DeskError::validation(format!("Invalid color format: {detail}"))
}

fn channel(value: i64) -> Result<u8> {
    u8::try_from(value).map_err(|_| invalid(&format!("channel {value} is outside 0-255")))
}

fn parse_hex(hex: &str) -> Option<Rgb<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Rgb([byte(0)?, byte(2)?, byte(4)?]))
        },
        3 => {
            // #abc is shorthand for #aabbcc
            let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|n| n * 17);
            Some(Rgb([nibble(0)?, nibble(1)?, nibble(2)?]))
        },
        _ => None,
    }
}

/// `"rgb(1, 2, 3)"` with `name == "rgb"` gives `Some("1, 2, 3")`.
fn function_args<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    input
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn split_args(args: &str) -> Vec<&str> {
    args.split(',').map(str::trim).collect()
}

fn parse_rgb_fn(args: &str) -> Option<Rgb<u8>> {
    match split_args(args).as_slice() {
        [r, g, b] => Some(Rgb([r.parse().ok()?, g.parse().ok()?, b.parse().ok()?])),
        _ => None,
    }
}

fn parse_hsl_fn(args: &str) -> Option<Rgb<u8>> {
    let parts = split_args(args);
    let [h, s, l] = parts.as_slice() else {
        return None;
    };
    let hue: i64 = h.strip_suffix("deg").unwrap_or(h).trim().parse().ok()?;
    let percent = |v: &str| -> Option<f64> {
        let value: u8 = v.strip_suffix('%')?.trim().parse().ok()?;
        (value <= 100).then(|| f64::from(value) / 100.0)
    };
    let saturation = percent(s)?;
    let lightness = percent(l)?;

    #[allow(clippy::cast_precision_loss)] // hue.rem_euclid(360) < 360
    let hue = hue.rem_euclid(360) as f64 / 360.0;
    Some(hsl_to_rgb(hue, saturation, lightness))
}

/// HSL to RGB, all inputs in `0.0..=1.0`; channels are truncated, not rounded.
fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb<u8> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // v in 0.0..=1.0
    let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0) as u8;

    if s == 0.0 {
        let gray = to_u8(l);
        return Rgb([gray, gray, gray]);
    }

    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    let component = |hue: f64| {
        let hue = hue.rem_euclid(1.0);
        if hue < 1.0 / 6.0 {
            m1 + (m2 - m1) * hue * 6.0
        } else if hue < 0.5 {
            m2
        } else if hue < 2.0 / 3.0 {
            m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
        } else {
            m1
        }
    };

    Rgb([
        to_u8(component(h + 1.0 / 3.0)),
        to_u8(component(h)),
        to_u8(component(h - 1.0 / 3.0)),
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepted_formats() {
        assert_eq!(parse_color("#1e90ff").unwrap(), Rgb([30, 144, 255]));
        assert_eq!(parse_color("#FFF").unwrap(), Rgb([255, 255, 255]));
        assert_eq!(parse_color("rgb(10, 20, 30)").unwrap(), Rgb([10, 20, 30]));
        assert_eq!(parse_color("hsl(0, 100%, 50%)").unwrap(), Rgb([255, 0, 0]));
        assert_eq!(parse_color("hsl(120, 100%, 25%)").unwrap(), Rgb([0, 127, 0]));
        assert_eq!(parse_color("hsl(240, 0%, 100%)").unwrap(), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_channel_arrays() {
        let spec = ColorSpec::Channels(vec![0, 128, 255]);
        assert_eq!(spec.to_rgb().unwrap(), Rgb([0, 128, 255]));

        assert!(ColorSpec::Channels(vec![0, 0]).to_rgb().is_err());
        assert!(ColorSpec::Channels(vec![0, 0, 256]).to_rgb().is_err());
        assert!(ColorSpec::Channels(vec![-1, 0, 0]).to_rgb().is_err());
    }

    #[test]
    fn test_junk_is_rejected() {
        for junk in ["", "blue", "#12", "#gggggg", "rgb(1,2)", "rgb(1,2,300)", "hsl(10, 50, 50)", "hsl(10, 150%, 50%)"] {
            let err = parse_color(junk).unwrap_err();
            assert!(
                err.to_string().starts_with("Invalid color format"),
                "{junk:?} gave {err}"
            );
        }
    }

    #[test]
    fn test_deserializes_both_shapes() {
        let array: ColorSpec = serde_json::from_str("[1, 2, 3]").unwrap();
        let text: ColorSpec = serde_json::from_str("\"#010203\"").unwrap();
        assert_eq!(array.to_rgb().unwrap(), text.to_rgb().unwrap());
    }

    proptest! {
        #[test]
        fn hex_and_rgb_notations_agree(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let hex = parse_color(&format!("#{r:02x}{g:02x}{b:02x}")).unwrap();
            let func = parse_color(&format!("rgb({r}, {g}, {b})")).unwrap();
            let array = ColorSpec::from([r, g, b]).to_rgb().unwrap();
            prop_assert_eq!(hex, Rgb([r, g, b]));
            prop_assert_eq!(func, hex);
            prop_assert_eq!(array, hex);
        }

        #[test]
        fn unsaturated_hsl_is_gray(h in 0i64..720, l in 0u8..=100) {
            let Rgb([r, g, b]) = parse_color(&format!("hsl({h}, 0%, {l}%)")).unwrap();
            prop_assert_eq!(r, g);
            prop_assert_eq!(g, b);
        }
    }
}
