//! Error types for poster layout and export.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the posterforge library.
#[derive(Error, Debug)]
pub enum PosterError {
    /// Paper preset name is not in the preset table.
    #[error("Unknown paper format '{0}'")]
    UnknownPaper(String),

    /// Display unit is not one of mm, cm, m, in, ft, pt, px.
    #[error("Unknown unit '{0}'. Supported: mm, cm, m, in, ft, pt, px")]
    UnknownUnit(String),

    /// Alignment code is not one of the nine grid positions.
    #[error("Unknown alignment '{0}'. Supported: TL, TC, TR, ML, C, MR, BL, BC, BR")]
    UnknownAlignment(String),

    /// Orientation is neither portrait nor landscape.
    #[error("Unknown orientation '{0}'. Supported: portrait, landscape")]
    UnknownOrientation(String),

    /// The Custom paper preset was selected without dimensions.
    #[error("Custom paper requires a width and height in centimeters")]
    MissingCustomDimensions,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Layout or export was requested before an image was loaded.
    #[error("No image loaded")]
    NoImage,

    /// Input image not found.
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// Unsupported image format.
    #[error("Unsupported image format: {extension}. Supported: png, jpg, jpeg, gif, bmp, webp, tif, tiff")]
    UnsupportedFormat { extension: String },

    /// Image decoding failed.
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    /// Decoded image has no pixels.
    #[error("Image has zero width or height ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// A rendering backend rejected a draw command.
    #[error("Render error: {0}")]
    Render(String),

    /// PDF serialization failed.
    #[error("PDF write failed: {0}")]
    PdfWrite(String),

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncoding(String),

    /// Writing an output file or directory failed.
    #[error("Failed to write output '{path}': {message}")]
    OutputError { path: PathBuf, message: String },

    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, PosterError>;

impl From<image::ImageError> for PosterError {
    fn from(err: image::ImageError) -> Self {
        PosterError::ImageDecode(err.to_string())
    }
}

impl PosterError {
    /// Whether this error belongs to the configuration class (unknown
    /// preset, unit or code). These are never retried.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PosterError::UnknownPaper(_)
                | PosterError::UnknownUnit(_)
                | PosterError::UnknownAlignment(_)
                | PosterError::UnknownOrientation(_)
                | PosterError::MissingCustomDimensions
                | PosterError::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_paper() {
        let err = PosterError::UnknownPaper("A9".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("A9"));
        assert!(msg.contains("paper"));
    }

    #[test]
    fn test_error_display_unknown_unit() {
        let err = PosterError::UnknownUnit("yd".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("yd"));
        assert!(msg.contains("Supported"));
    }

    #[test]
    fn test_error_display_no_image() {
        let msg = format!("{}", PosterError::NoImage);
        assert!(msg.contains("No image"));
    }

    #[test]
    fn test_error_display_unsupported_format() {
        let err = PosterError::UnsupportedFormat {
            extension: "svg".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("svg"));
        assert!(msg.contains("png"));
    }

    #[test]
    fn test_error_display_output_error() {
        let err = PosterError::OutputError {
            path: PathBuf::from("/readonly/poster.pdf"),
            message: "Permission denied".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("/readonly/poster.pdf"));
        assert!(msg.contains("Permission denied"));
    }

    #[test]
    fn test_error_display_empty_image() {
        let err = PosterError::EmptyImage {
            width: 0,
            height: 10,
        };
        assert!(format!("{}", err).contains("0x10"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PosterError = io_err.into();
        match err {
            PosterError::Io(_) => (),
            _ => panic!("Expected Io"),
        }
    }

    #[test]
    fn test_config_error_classification() {
        assert!(PosterError::UnknownPaper("x".into()).is_config_error());
        assert!(PosterError::UnknownUnit("x".into()).is_config_error());
        assert!(PosterError::MissingCustomDimensions.is_config_error());
        assert!(!PosterError::NoImage.is_config_error());
        assert!(!PosterError::PdfWrite("x".into()).is_config_error());
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);

        fn returns_error() -> Result<i32> {
            Err(PosterError::NoImage)
        }
        assert!(returns_error().is_err());
    }
}
