//! # posterforge-core
//!
//! Poster tiling and layout engine.
//!
//! Splits one raster image across several sheets of paper so it can be
//! printed as an oversized poster. The pipeline is a chain of pure
//! functions:
//!
//! - **Paper**: preset or custom sheet size, orientation, margins
//! - **Sizing**: the poster's physical footprint (native, total size,
//!   page grid or percentage), always aspect-preserving
//! - **Tiling**: page grid and alignment placement
//! - **Pages**: one drawing instruction per sheet, shared by the preview
//!   and both exporters
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use posterforge_core::{load_image, PdfExporter, PosterLayout, PosterSettings};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let image = load_image(Path::new("photo.jpg"))?;
//!     let settings = PosterSettings::default().paper("A4").page_grid(3, 2);
//!
//!     let layout = PosterLayout::compute(Some(&image.descriptor), &settings)?;
//!     println!("{} pages", layout.page_count());
//!
//!     PdfExporter::new().export(&layout, &image.pixels, Path::new("poster.pdf"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Interactive Use
//!
//! ```rust,no_run
//! use posterforge_core::{Alignment, PosterSession, PreviewRenderer, Viewport};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut session = PosterSession::default();
//!     session.load_image(Path::new("photo.png"))?;
//!     session.set_percentage(150.0)?;
//!     session.set_alignment(Alignment::Center)?;
//!
//!     let preview = session.render_preview(&PreviewRenderer::default(), Viewport::new(800, 600))?;
//!     preview.save("preview.png")?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod image_source;
pub mod layout;
pub mod pages;
pub mod paper;
pub mod preview;
pub mod render;
pub mod session;
pub mod sizing;
pub mod tiling;
pub mod units;

// Re-export main types for convenience
pub use config::{PosterSettings, PreviewConfig, RenderConfig, SizeModeKind};
pub use error::{PosterError, Result};
pub use export::{default_pdf_name, ExportResult, PdfExporter, TileExporter};
pub use geometry::{Rect, Size};
pub use image_source::{load_image, ImageDescriptor, LoadedImage, SUPPORTED_EXTENSIONS};
pub use layout::{LayoutSummary, PosterLayout, MAX_PAGE_COUNT};
pub use pages::{emit_pages, PageInstruction};
pub use paper::{resolve_paper, CustomPaper, Margins, Orientation, PaperSpec, PAPER_PRESETS};
pub use preview::{fit_preview, PreviewRenderer, Viewport};
pub use session::PosterSession;
pub use sizing::{resolve_footprint, Footprint, SizeMode};
pub use tiling::{compute_tiling, Alignment, Placement, TileGrid, Tiling};
pub use units::{unit_factor, Unit};

/// Initialize the library's logging.
/// Call this once at application startup if you want to see logs.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}

/// Initialize logging with a fallback filter used when `RUST_LOG` is unset.
pub fn init_logging_with_default(default_filter: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
