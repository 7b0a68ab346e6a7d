use crate::engine::assets::bounds::RawBounds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DimensionError {
    #[error("unknown length unit '{0}'")]
    UnknownUnit(String),
    #[error("cannot parse length '{0}'")]
    InvalidLength(String),
}

/// Unit a length is displayed in, or a model file is assumed to be authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Mm,
    Cm,
    M,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 3] = [LengthUnit::Mm, LengthUnit::Cm, LengthUnit::M];

    /// Millimetres per one of this unit.
    pub fn mm_factor(self) -> f64 {
        match self {
            LengthUnit::Mm => 1.0,
            LengthUnit::Cm => 10.0,
            LengthUnit::M => 1000.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Mm => "mm",
            LengthUnit::Cm => "cm",
            LengthUnit::M => "m",
        }
    }

    pub fn next(self) -> Self {
        match self {
            LengthUnit::Mm => LengthUnit::Cm,
            LengthUnit::Cm => LengthUnit::M,
            LengthUnit::M => LengthUnit::Mm,
        }
    }

    pub fn to_mm(self, value: f64) -> f64 {
        value * self.mm_factor()
    }

    pub fn from_mm(self, value_mm: f64) -> f64 {
        value_mm / self.mm_factor()
    }

    /// Format a millimetre length for display: mm as an integer, cm to one
    /// decimal, m to three decimals.
    pub fn format_mm(self, value_mm: f64) -> String {
        let value = self.from_mm(value_mm);
        match self {
            LengthUnit::Mm => format!("{:.0} mm", value),
            LengthUnit::Cm => format!("{:.1} cm", value),
            LengthUnit::M => format!("{:.3} m", value),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for LengthUnit {
    type Err = DimensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => {
                Ok(LengthUnit::Mm)
            }
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => {
                Ok(LengthUnit::Cm)
            }
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(LengthUnit::M),
            other => Err(DimensionError::UnknownUnit(other.to_string())),
        }
    }
}

/// Parse a displayed length such as `"1234 mm"` or `"1.234 m"` back to millimetres.
pub fn parse_length_mm(text: &str) -> Result<f64, DimensionError> {
    let trimmed = text.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(|| DimensionError::InvalidLength(text.to_string()))?;
    let (number, unit) = trimmed.split_at(split);
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| DimensionError::InvalidLength(text.to_string()))?;
    let unit: LengthUnit = unit.parse()?;
    Ok(unit.to_mm(value))
}

/// Product dimensions as supplied by the caller, in any unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductDimensions {
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
    #[serde(default)]
    pub units: LengthUnit,
}

impl ProductDimensions {
    pub fn to_mm(&self) -> Dimensions {
        Dimensions {
            width_mm: self.units.to_mm(self.width),
            height_mm: self.units.to_mm(self.height),
            thickness_mm: self.units.to_mm(self.thickness),
        }
    }

    fn is_usable(&self) -> bool {
        [self.width, self.height, self.thickness]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Width (x), height (y) and thickness (z) in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dimensions {
    pub width_mm: f64,
    pub height_mm: f64,
    pub thickness_mm: f64,
}

impl Dimensions {
    /// Raw model extent interpreted in the assumed authoring unit.
    pub fn from_bounds(bounds: &RawBounds, assumed: LengthUnit) -> Self {
        let size = bounds.size();
        Self {
            width_mm: assumed.to_mm(size.x as f64),
            height_mm: assumed.to_mm(size.y as f64),
            thickness_mm: assumed.to_mm(size.z as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionSource {
    Authoritative,
    Computed(LengthUnit),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedDimensions {
    pub dimensions: Dimensions,
    pub source: DimensionSource,
}

/// Caller-supplied dimensions always win over values derived from geometry.
pub fn resolve_dimensions(
    authoritative: Option<&ProductDimensions>,
    raw_bounds: &RawBounds,
    assumed: LengthUnit,
) -> ResolvedDimensions {
    match authoritative.filter(|dims| dims.is_usable()) {
        Some(dims) => ResolvedDimensions {
            dimensions: dims.to_mm(),
            source: DimensionSource::Authoritative,
        },
        None => ResolvedDimensions {
            dimensions: Dimensions::from_bounds(raw_bounds, assumed),
            source: DimensionSource::Computed(assumed),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec3;

    #[test]
    fn test_format_per_unit() {
        assert_eq!(LengthUnit::Mm.format_mm(2040.4), "2040 mm");
        assert_eq!(LengthUnit::Cm.format_mm(2040.4), "204.0 cm");
        assert_eq!(LengthUnit::M.format_mm(2040.4), "2.040 m");
    }

    #[test]
    fn test_format_parse_round_trip_within_rounding() {
        let samples = [0.0, 0.4, 12.5, 899.99, 2040.4, 15_321.7];
        for value in samples {
            for unit in LengthUnit::ALL {
                let parsed = parse_length_mm(&unit.format_mm(value)).unwrap();
                assert!(
                    (parsed - value).abs() <= 0.5 + 1e-9,
                    "{value} via {unit} came back as {parsed}"
                );
            }
        }
    }

    #[test]
    fn test_unit_parsing_accepts_long_names() {
        assert_eq!("Metres".parse::<LengthUnit>(), Ok(LengthUnit::M));
        assert_eq!(" cm ".parse::<LengthUnit>(), Ok(LengthUnit::Cm));
        assert!(matches!(
            "inch".parse::<LengthUnit>(),
            Err(DimensionError::UnknownUnit(_))
        ));
        assert!(parse_length_mm("mm").is_err());
    }

    #[test]
    fn test_computed_dimensions_use_assumed_unit() {
        let bounds = RawBounds::new(Vec3::new(-45.0, 0.0, -2.0), Vec3::new(45.0, 210.0, 2.0));
        let resolved = resolve_dimensions(None, &bounds, LengthUnit::Cm);
        assert_eq!(resolved.source, DimensionSource::Computed(LengthUnit::Cm));
        assert!((resolved.dimensions.width_mm - 900.0).abs() < 1e-3);
        assert!((resolved.dimensions.height_mm - 2100.0).abs() < 1e-3);
        assert!((resolved.dimensions.thickness_mm - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_authoritative_wins_regardless_of_bounds() {
        let bounds = RawBounds::new(Vec3::ZERO, Vec3::new(3.0, 7.0, 0.1));
        let given = ProductDimensions {
            width: 0.9,
            height: 2.1,
            thickness: 0.04,
            units: LengthUnit::M,
        };
        for assumed in LengthUnit::ALL {
            let resolved = resolve_dimensions(Some(&given), &bounds, assumed);
            assert_eq!(resolved.source, DimensionSource::Authoritative);
            assert!((resolved.dimensions.width_mm - 900.0).abs() < 1e-9);
            assert!((resolved.dimensions.height_mm - 2100.0).abs() < 1e-9);
            assert!((resolved.dimensions.thickness_mm - 40.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unusable_authoritative_falls_back() {
        let bounds = RawBounds::new(Vec3::ZERO, Vec3::ONE);
        let given = ProductDimensions {
            width: f64::NAN,
            height: 1.0,
            thickness: 1.0,
            units: LengthUnit::Mm,
        };
        let resolved = resolve_dimensions(Some(&given), &bounds, LengthUnit::Mm);
        assert_eq!(resolved.source, DimensionSource::Computed(LengthUnit::Mm));
    }
}
