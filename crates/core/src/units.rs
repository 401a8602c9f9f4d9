//! Display units and their millimeter conversion factors.

use crate::error::{PosterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// PDF points per millimeter.
pub const POINTS_PER_MM: f64 = 72.0 / MM_PER_INCH;

/// Convert millimeters to PDF points (1/72 inch).
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * POINTS_PER_MM
}

/// Convert millimeters to device pixels at the given DPI.
pub fn mm_to_px(mm: f64, dpi: f64) -> f64 {
    mm / MM_PER_INCH * dpi
}

/// A user-facing length unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Mm,
    #[default]
    Cm,
    M,
    In,
    Ft,
    Pt,
    Px,
}

impl Unit {
    /// All supported units, in display order.
    pub const ALL: [Unit; 7] = [
        Unit::Mm,
        Unit::Cm,
        Unit::M,
        Unit::In,
        Unit::Ft,
        Unit::Pt,
        Unit::Px,
    ];

    /// Millimeters per one of this unit.
    pub fn factor(self) -> f64 {
        match self {
            Unit::Mm => 1.0,
            Unit::Cm => 10.0,
            Unit::M => 1000.0,
            Unit::In => 25.4,
            Unit::Ft => 304.8,
            // Truncated to four digits, not 25.4/72 and 25.4/96.
            Unit::Pt => 0.3527,
            Unit::Px => 0.2645,
        }
    }

    /// Short symbol used for parsing and display.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::M => "m",
            Unit::In => "in",
            Unit::Ft => "ft",
            Unit::Pt => "pt",
            Unit::Px => "px",
        }
    }

    /// Convert a value in this unit to millimeters.
    pub fn to_mm(self, value: f64) -> f64 {
        value * self.factor()
    }

    /// Convert millimeters to this unit.
    pub fn from_mm(self, mm: f64) -> f64 {
        mm / self.factor()
    }
}

/// Millimeters per unit for a unit symbol.
///
/// Unknown symbols are a configuration error; callers are expected to
/// restrict input to [`Unit::ALL`].
pub fn unit_factor(unit: &str) -> Result<f64> {
    unit.parse::<Unit>().map(Unit::factor)
}

impl FromStr for Unit {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Unit::ALL
            .into_iter()
            .find(|u| u.symbol() == lower)
            .ok_or_else(|| PosterError::UnknownUnit(s.to_string()))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_factors() {
        assert_eq!(Unit::Mm.factor(), 1.0);
        assert_eq!(Unit::Cm.factor(), 10.0);
        assert_eq!(Unit::M.factor(), 1000.0);
        assert_eq!(Unit::In.factor(), 25.4);
        assert_eq!(Unit::Ft.factor(), 304.8);
        assert_eq!(Unit::Pt.factor(), 0.3527);
        assert_eq!(Unit::Px.factor(), 0.2645);
    }

    #[test]
    fn test_unit_factor_by_symbol() {
        assert_eq!(unit_factor("in").unwrap(), 25.4);
        assert_eq!(unit_factor("CM").unwrap(), 10.0);
    }

    #[test]
    fn test_unit_factor_unknown_fails_fast() {
        match unit_factor("yd") {
            Err(PosterError::UnknownUnit(u)) => assert_eq!(u, "yd"),
            other => panic!("Expected UnknownUnit, got {:?}", other),
        }
    }

    #[test]
    fn test_unit_display_round_trip() {
        for unit in Unit::ALL {
            assert_eq!(unit.to_string().parse::<Unit>().unwrap(), unit);
        }
    }

    #[test]
    fn test_mm_conversions() {
        assert!((Unit::In.to_mm(2.0) - 50.8).abs() < 1e-9);
        assert!((Unit::Cm.from_mm(297.0) - 29.7).abs() < 1e-9);
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-9);
        assert!((mm_to_px(25.4, 300.0) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_unit_is_cm() {
        assert_eq!(Unit::default(), Unit::Cm);
    }
}
