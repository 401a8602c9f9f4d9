//! Paper presets, orientation, margins and the printable area.

use crate::error::{PosterError, Result};
use crate::geometry::{Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the placeholder preset overridden by user dimensions.
pub const CUSTOM_PAPER: &str = "Custom";

/// Named paper sizes in millimeters (portrait width, height).
pub const PAPER_PRESETS: &[(&str, f64, f64)] = &[
    ("A0", 841.0, 1189.0),
    ("A1", 594.0, 841.0),
    ("A2", 420.0, 594.0),
    ("A3", 297.0, 420.0),
    ("A4", 210.0, 297.0),
    ("A5", 148.0, 210.0),
    ("A6", 105.0, 148.0),
    ("A7", 74.0, 105.0),
    ("A8", 52.0, 74.0),
    ("B0", 1000.0, 1414.0),
    ("B1", 707.0, 1000.0),
    ("B2", 500.0, 707.0),
    ("B3", 353.0, 500.0),
    ("B4", 250.0, 353.0),
    ("B5", 176.0, 250.0),
    ("Letter", 215.9, 279.4),
    ("Legal", 215.9, 355.6),
    ("Tabloid", 279.4, 431.8),
    ("Ledger", 431.8, 279.4),
    ("Junior Legal", 127.0, 203.2),
    ("Half Letter", 139.7, 215.9),
    ("Executive", 184.1, 266.7),
    ("Folio", 215.9, 330.2),
    ("Statement", 139.7, 215.9),
    ("Government Letter", 203.2, 266.7),
    ("Government Legal", 215.9, 330.2),
    (CUSTOM_PAPER, 0.0, 0.0),
];

/// Look up a preset by name (case-insensitive).
pub fn find_preset(name: &str) -> Option<(&'static str, f64, f64)> {
    PAPER_PRESETS
        .iter()
        .copied()
        .find(|(preset, _, _)| preset.eq_ignore_ascii_case(name.trim()))
}

/// Check whether a paper name is recognized.
pub fn is_known_paper(name: &str) -> bool {
    find_preset(name).is_some()
}

/// Sheet orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" | "port" | "p" => Ok(Orientation::Portrait),
            "landscape" | "land" | "l" => Ok(Orientation::Landscape),
            _ => Err(PosterError::UnknownOrientation(s.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("portrait"),
            Orientation::Landscape => f.write_str("landscape"),
        }
    }
}

/// User-entered custom paper, in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomPaper {
    pub width_cm: f64,
    pub height_cm: f64,
}

impl Default for CustomPaper {
    fn default() -> Self {
        Self {
            width_cm: 21.0,
            height_cm: 29.7,
        }
    }
}

impl CustomPaper {
    pub fn new(width_cm: f64, height_cm: f64) -> Self {
        Self {
            width_cm,
            height_cm,
        }
    }
}

/// Where a paper size came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PaperSource {
    Preset(String),
    Custom,
}

/// Resolved sheet dimensions in millimeters, orientation already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSpec {
    pub width_mm: f64,
    pub height_mm: f64,
    pub orientation: Orientation,
    pub source: PaperSource,
}

impl PaperSpec {
    pub fn size(&self) -> Size {
        Size::new(self.width_mm, self.height_mm)
    }

    /// Display name: the preset name or "Custom".
    pub fn name(&self) -> &str {
        match &self.source {
            PaperSource::Preset(name) => name,
            PaperSource::Custom => CUSTOM_PAPER,
        }
    }
}

/// Resolve a paper preset (or custom dimensions) into a [`PaperSpec`].
///
/// Custom dimensions are always entered in centimeters. Landscape swaps
/// width and height after lookup. An unknown preset name fails instead of
/// falling back to a default.
pub fn resolve_paper(
    name: &str,
    custom: Option<CustomPaper>,
    orientation: Orientation,
) -> Result<PaperSpec> {
    let (preset, w, h) =
        find_preset(name).ok_or_else(|| PosterError::UnknownPaper(name.to_string()))?;

    let (mut width, mut height, source) = if preset == CUSTOM_PAPER {
        let custom = custom.ok_or(PosterError::MissingCustomDimensions)?;
        (
            custom.width_cm * 10.0,
            custom.height_cm * 10.0,
            PaperSource::Custom,
        )
    } else {
        (w, h, PaperSource::Preset(preset.to_string()))
    };

    if orientation == Orientation::Landscape {
        std::mem::swap(&mut width, &mut height);
    }

    Ok(PaperSpec {
        width_mm: width,
        height_mm: height,
        orientation,
        source,
    })
}

/// Page margins in millimeters, applied identically to every sheet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Margins {
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Same margin on all four sides.
    pub fn uniform(mm: f64) -> Self {
        Self::new(mm, mm, mm, mm)
    }

    /// Build from centimeter inputs.
    pub fn from_cm(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self::new(top * 10.0, bottom * 10.0, left * 10.0, right * 10.0)
    }

    /// Copy with negative or non-finite values replaced by zero.
    pub fn clamped(&self) -> Self {
        let fix = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        Self::new(fix(self.top), fix(self.bottom), fix(self.left), fix(self.right))
    }

    /// Printable area of a sheet: paper minus margins, never below 1 mm per side.
    pub fn printable_area(&self, paper: Size) -> Size {
        Size::new(
            (paper.width - self.left - self.right).max(1.0),
            (paper.height - self.top - self.bottom).max(1.0),
        )
    }

    /// Printable rectangle in page coordinates.
    pub fn printable_rect(&self, paper: Size) -> Rect {
        let area = self.printable_area(paper);
        Rect::new(self.left, self.top, area.width, area.height)
    }

    /// The opaque bands covering each non-zero margin, full page width/height.
    pub fn bands(&self, paper: Size) -> Vec<Rect> {
        let mut bands = Vec::with_capacity(4);
        if self.top > 0.0 {
            bands.push(Rect::new(0.0, 0.0, paper.width, self.top));
        }
        if self.bottom > 0.0 {
            bands.push(Rect::new(
                0.0,
                paper.height - self.bottom,
                paper.width,
                self.bottom,
            ));
        }
        if self.left > 0.0 {
            bands.push(Rect::new(0.0, 0.0, self.left, paper.height));
        }
        if self.right > 0.0 {
            bands.push(Rect::new(
                paper.width - self.right,
                0.0,
                self.right,
                paper.height,
            ));
        }
        bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_a4_portrait() {
        let paper = resolve_paper("A4", None, Orientation::Portrait).unwrap();
        assert_eq!(paper.width_mm, 210.0);
        assert_eq!(paper.height_mm, 297.0);
        assert_eq!(paper.name(), "A4");
    }

    #[test]
    fn test_resolve_landscape_swaps() {
        let paper = resolve_paper("A3", None, Orientation::Landscape).unwrap();
        assert_eq!(paper.width_mm, 420.0);
        assert_eq!(paper.height_mm, 297.0);
    }

    #[test]
    fn test_resolve_ledger_is_already_wide() {
        let paper = resolve_paper("Ledger", None, Orientation::Portrait).unwrap();
        assert!(paper.width_mm > paper.height_mm);
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let paper = resolve_paper("letter", None, Orientation::Portrait).unwrap();
        assert_eq!(paper.name(), "Letter");
        assert_eq!(paper.width_mm, 215.9);
    }

    #[test]
    fn test_resolve_custom_uses_centimeters() {
        let paper = resolve_paper(
            "Custom",
            Some(CustomPaper::new(50.0, 70.0)),
            Orientation::Landscape,
        )
        .unwrap();
        assert_eq!(paper.width_mm, 700.0);
        assert_eq!(paper.height_mm, 500.0);
        assert_eq!(paper.source, PaperSource::Custom);
    }

    #[test]
    fn test_resolve_custom_without_dims_fails() {
        assert!(matches!(
            resolve_paper("Custom", None, Orientation::Portrait),
            Err(PosterError::MissingCustomDimensions)
        ));
    }

    #[test]
    fn test_resolve_unknown_preset_fails() {
        match resolve_paper("A9", None, Orientation::Portrait) {
            Err(PosterError::UnknownPaper(name)) => assert_eq!(name, "A9"),
            other => panic!("Expected UnknownPaper, got {:?}", other),
        }
    }

    #[test]
    fn test_preset_table_contains_iso_and_us() {
        for name in ["A0", "A8", "B0", "B5", "Letter", "Legal", "Tabloid", "Ledger"] {
            assert!(is_known_paper(name), "{} missing", name);
        }
        assert!(!is_known_paper("B6"));
    }

    #[test]
    fn test_orientation_parse() {
        assert_eq!("land".parse::<Orientation>().unwrap(), Orientation::Landscape);
        assert_eq!("Portrait".parse::<Orientation>().unwrap(), Orientation::Portrait);
        assert!("sideways".parse::<Orientation>().is_err());
    }

    // ========== Margins ==========

    #[test]
    fn test_printable_area_a4_10mm() {
        let area = Margins::uniform(10.0).printable_area(Size::new(210.0, 297.0));
        assert_eq!(area, Size::new(190.0, 277.0));
    }

    #[test]
    fn test_printable_area_never_below_one() {
        let area = Margins::new(200.0, 200.0, 150.0, 150.0).printable_area(Size::new(210.0, 297.0));
        assert_eq!(area, Size::new(1.0, 1.0));
    }

    #[test]
    fn test_margins_from_cm() {
        let m = Margins::from_cm(1.0, 1.5, 0.5, 2.0);
        assert_eq!(m, Margins::new(10.0, 15.0, 5.0, 20.0));
    }

    #[test]
    fn test_margins_clamped() {
        let m = Margins::new(-5.0, f64::NAN, 3.0, 0.0).clamped();
        assert_eq!(m, Margins::new(0.0, 0.0, 3.0, 0.0));
    }

    #[test]
    fn test_margin_bands_only_for_nonzero_sides() {
        let paper = Size::new(210.0, 297.0);
        assert!(Margins::default().bands(paper).is_empty());

        let bands = Margins::new(10.0, 0.0, 0.0, 5.0).bands(paper);
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0], Rect::new(0.0, 0.0, 210.0, 10.0));
        assert_eq!(bands[1], Rect::new(205.0, 0.0, 5.0, 297.0));
    }

    #[test]
    fn test_printable_rect_offset_by_margins() {
        let r = Margins::new(10.0, 20.0, 5.0, 15.0).printable_rect(Size::new(210.0, 297.0));
        assert_eq!(r, Rect::new(5.0, 10.0, 190.0, 267.0));
    }
}
