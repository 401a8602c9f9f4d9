//! `posterforge` command line tool.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use posterforge_core::render::Color;
use posterforge_core::{
    default_pdf_name, Alignment, LoadedImage, Margins, Orientation, PdfExporter, PosterError,
    PosterSession, PosterSettings, PreviewConfig, PreviewRenderer, RenderConfig, SizeModeKind,
    Unit, Viewport, PAPER_PRESETS,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

fn parse_color(value: &str) -> std::result::Result<Color, String> {
    Color::from_hex(value)
        .ok_or_else(|| format!("'{}' is not a hex color (#RGB, #RRGGBB or #RRGGBBAA)", value))
}

#[derive(Debug, Parser)]
#[command(name = "posterforge", version, about = "Split an image across printable sheets")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the layout and print a summary
    Plan(LayoutArgs),

    /// Write the poster as a multi-page PDF
    Export {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Output PDF path (default: poster_<timestamp>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write one PNG per sheet
    Tiles {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// File name prefix (default: input file stem)
        #[arg(long)]
        prefix: Option<String>,

        /// Raster resolution
        #[arg(long, default_value_t = 150)]
        dpi: u32,

        /// Render threads (default: number of CPUs)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Render the preview of all sheets to a PNG
    Preview {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Output PNG path
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,

        /// Viewport width in pixels
        #[arg(long, default_value_t = 1200)]
        view_width: u32,

        /// Viewport height in pixels
        #[arg(long, default_value_t = 800)]
        view_height: u32,

        /// Hide page borders, margin guides and image bounds
        #[arg(long)]
        no_guides: bool,
    },

    /// List the paper presets
    Papers,
}

#[derive(Debug, Args)]
struct LayoutArgs {
    /// Input image
    input: PathBuf,

    /// Paper preset name, or "Custom"
    #[arg(long, default_value = "A4")]
    paper: String,

    #[arg(long, default_value = "portrait")]
    orientation: Orientation,

    /// Custom paper width in cm
    #[arg(long, requires = "custom_height")]
    custom_width: Option<f64>,

    /// Custom paper height in cm
    #[arg(long, requires = "custom_width")]
    custom_height: Option<f64>,

    /// Margin on all sides in cm
    #[arg(long, default_value_t = 0.0)]
    margin: f64,

    #[arg(long)]
    margin_top: Option<f64>,
    #[arg(long)]
    margin_bottom: Option<f64>,
    #[arg(long)]
    margin_left: Option<f64>,
    #[arg(long)]
    margin_right: Option<f64>,

    /// Display unit for --width/--height
    #[arg(long, default_value = "cm")]
    unit: Unit,

    /// Sizing mode: native, total, pages or percent (inferred when omitted)
    #[arg(long)]
    mode: Option<SizeModeKind>,

    /// Poster width in the display unit
    #[arg(long)]
    width: Option<f64>,

    /// Poster height in the display unit
    #[arg(long)]
    height: Option<f64>,

    /// Pages across
    #[arg(long)]
    cols: Option<u32>,

    /// Pages down
    #[arg(long)]
    rows: Option<u32>,

    /// Scale of the native size in percent
    #[arg(long)]
    percent: Option<f64>,

    /// Alignment code: TL, TC, TR, ML, C, MR, BL, BC, BR
    #[arg(long, default_value = "TL")]
    align: Alignment,

    /// Override the DPI recorded in the image
    #[arg(long)]
    image_dpi: Option<f64>,

    /// Fill painted over the page margins, as hex
    #[arg(long, default_value = "#ffffff", value_parser = parse_color)]
    margin_color: Color,
}

impl LayoutArgs {
    /// Settings that do not depend on the image.
    fn base_settings(&self) -> PosterSettings {
        let mut settings = PosterSettings::default()
            .paper(self.paper.clone())
            .orientation(self.orientation)
            .unit(self.unit)
            .alignment(self.align);
        if let (Some(w), Some(h)) = (self.custom_width, self.custom_height) {
            settings = settings.custom_paper(w, h);
        }
        let side = |v: Option<f64>| v.unwrap_or(self.margin);
        settings.margins(Margins::from_cm(
            side(self.margin_top),
            side(self.margin_bottom),
            side(self.margin_left),
            side(self.margin_right),
        ))
    }

    /// Active mode: explicit, or implied by which size flags were given.
    fn mode(&self) -> SizeModeKind {
        if let Some(mode) = self.mode {
            return mode;
        }
        if self.cols.is_some() || self.rows.is_some() {
            SizeModeKind::Pages
        } else if self.width.is_some() || self.height.is_some() {
            SizeModeKind::Total
        } else if self.percent.is_some() {
            SizeModeKind::Percent
        } else {
            SizeModeKind::Native
        }
    }

    /// Load the image and apply the size flags on top of the seeded values.
    fn session(&self) -> Result<PosterSession> {
        let mut session =
            PosterSession::new(self.base_settings()).context("invalid poster settings")?;

        let mut image = posterforge_core::load_image(&self.input)
            .with_context(|| format!("failed to load {}", self.input.display()))?;
        if let Some(dpi) = self.image_dpi {
            image = LoadedImage::from_rgba(image.pixels, dpi)?;
        }
        session.set_image(image)?;

        let seeded = session.settings().clone();
        if self.width.is_some() || self.height.is_some() {
            session.set_total_size(
                self.width.unwrap_or(seeded.total_size.width),
                self.height.unwrap_or(seeded.total_size.height),
            )?;
        }
        if self.cols.is_some() || self.rows.is_some() {
            session.set_page_grid(
                self.cols.unwrap_or(seeded.page_grid.cols),
                self.rows.unwrap_or(seeded.page_grid.rows),
            )?;
        }
        if let Some(percent) = self.percent {
            session.set_percentage(percent)?;
        }
        session.set_mode(self.mode())?;
        Ok(session)
    }

    fn default_prefix(&self) -> String {
        self.input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("poster")
            .to_string()
    }
}

fn print_plan(session: &PosterSession, json: bool) -> Result<()> {
    let summary = session.summary()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Paper:      {} {} ({:.1} x {:.1} mm, printable {:.1} x {:.1} mm)",
        summary.paper,
        summary.orientation,
        summary.paper_mm.width,
        summary.paper_mm.height,
        summary.printable_mm.width,
        summary.printable_mm.height
    );
    println!(
        "Poster:     {:.2} x {:.2} {} ({} mode)",
        summary.footprint_in_unit.width, summary.footprint_in_unit.height, summary.unit, summary.mode
    );
    println!(
        "Pages:      {} x {} = {}",
        summary.cols, summary.rows, summary.page_count
    );
    println!(
        "Offset:     {:.2} mm, {:.2} mm",
        summary.offset_x_mm, summary.offset_y_mm
    );
    if summary.overflows {
        println!(
            "Warning:    image needs {} x {} pages and is clipped",
            summary.minimum_cols, summary.minimum_rows
        );
    }
    Ok(())
}

fn print_outputs(paths: &[PathBuf], pages: usize, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "page_count": pages,
            "outputs": paths,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for path in paths {
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn print_papers(json: bool) -> Result<()> {
    if json {
        let presets: Vec<_> = PAPER_PRESETS
            .iter()
            .map(|(name, w, h)| serde_json::json!({ "name": name, "width_mm": w, "height_mm": h }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&presets)?);
    } else {
        for (name, w, h) in PAPER_PRESETS {
            if *w > 0.0 {
                println!("{:<18} {:>7.1} x {:>7.1} mm", name, w, h);
            } else {
                println!("{:<18} (use --custom-width/--custom-height in cm)", name);
            }
        }
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Plan(layout) => {
            let session = layout.session()?;
            print_plan(&session, cli.json)
        }
        Command::Export { layout, output } => {
            let session = layout.session()?;
            let output = output.unwrap_or_else(|| PathBuf::from(default_pdf_name()));
            let exporter = PdfExporter::new().with_margin_color(layout.margin_color);
            let result = session
                .export_pdf_with(&exporter, &output)
                .with_context(|| format!("failed to export {}", output.display()))?;
            info!("Exported {} pages in {:?}", result.page_count, result.duration);
            print_outputs(&result.output_paths, result.page_count, cli.json)
        }
        Command::Tiles {
            layout,
            output_dir,
            prefix,
            dpi,
            threads,
        } => {
            let session = layout.session()?;
            let mut config = RenderConfig::with_dpi(dpi).margin_color(layout.margin_color);
            if let Some(threads) = threads {
                config = config.render_threads(threads);
            }
            let prefix = prefix.unwrap_or_else(|| layout.default_prefix());
            let result = session
                .export_tiles(config, &output_dir, &prefix)
                .context("failed to export tiles")?;
            print_outputs(&result.output_paths, result.page_count, cli.json)
        }
        Command::Preview {
            layout,
            output,
            view_width,
            view_height,
            no_guides,
        } => {
            if view_width == 0 || view_height == 0 {
                bail!("preview size must be at least 1x1 pixels");
            }
            let session = layout.session()?;
            let config = PreviewConfig::default()
                .guides(!no_guides)
                .margin_color(layout.margin_color);
            let renderer = PreviewRenderer::new(config)?;
            let image = session.render_preview(&renderer, Viewport::new(view_width, view_height))?;
            ensure_parent(&output)?;
            image
                .save(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            print_outputs(&[output], session.layout()?.page_count(), cli.json)
        }
        Command::Papers => print_papers(cli.json),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    posterforge_core::init_logging_with_default(default_filter);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            // Bad input gets the usage exit code
            let config_error = e
                .downcast_ref::<PosterError>()
                .is_some_and(PosterError::is_config_error);
            if config_error {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
