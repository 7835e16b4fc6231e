use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{AstroError, Result};

/// `32n43`, `117w09`, `51n30.5`: degrees, hemisphere letter, minutes
static DIRECTIONAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)([nsew])(\d+(?:\.\d+)?)$").expect("static coordinate pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn limit(&self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }
}

/// A coordinate as supplied by a caller: decimal degrees or text
#[derive(Debug, Clone, PartialEq, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum CoordinateInput {
    Decimal(f64),
    Text(String),
}

impl From<f64> for CoordinateInput {
    fn from(value: f64) -> Self {
        CoordinateInput::Decimal(value)
    }
}

impl From<&str> for CoordinateInput {
    fn from(value: &str) -> Self {
        CoordinateInput::Text(value.to_string())
    }
}

/// Convert a raw coordinate into signed decimal degrees for `axis`.
///
/// The text form is `degrees + minutes / 60`, negative for south and west.
/// A hemisphere letter must belong to the axis (`n`/`s` for latitude, `e`/`w`
/// for longitude).
pub fn normalize_coordinate(raw: &CoordinateInput, axis: Axis) -> Result<f64> {
    let value = match raw {
        CoordinateInput::Decimal(value) => *value,
        CoordinateInput::Text(text) => parse_text(text, axis)?,
    };

    if !value.is_finite() {
        return Err(AstroError::InvalidCoordinate(format!(
            "{} must be a finite number",
            axis.name()
        )));
    }
    if value.abs() > axis.limit() {
        return Err(AstroError::InvalidCoordinate(format!(
            "{} {} is outside -{limit}..{limit}",
            axis.name(),
            value,
            limit = axis.limit()
        )));
    }
    Ok(value)
}

fn parse_text(text: &str, axis: Axis) -> Result<f64> {
    let cleaned = text.trim().to_ascii_lowercase();

    if let Some(caps) = DIRECTIONAL.captures(&cleaned) {
        let degrees: f64 = caps[1]
            .parse()
            .map_err(|_| AstroError::InvalidCoordinate(text.to_string()))?;
        let minutes: f64 = caps[3]
            .parse()
            .map_err(|_| AstroError::InvalidCoordinate(text.to_string()))?;

        let (sign, direction_axis) = match &caps[2] {
            "n" => (1.0, Axis::Latitude),
            "s" => (-1.0, Axis::Latitude),
            "e" => (1.0, Axis::Longitude),
            _ => (-1.0, Axis::Longitude),
        };
        if direction_axis != axis {
            return Err(AstroError::InvalidCoordinate(format!(
                "{}: hemisphere does not apply to {}",
                text,
                axis.name()
            )));
        }
        return Ok(sign * (degrees + minutes / 60.0));
    }

    cleaned
        .parse::<f64>()
        .map_err(|_| AstroError::InvalidCoordinate(text.to_string()))
}
