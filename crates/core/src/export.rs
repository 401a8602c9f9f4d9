//! Exporters: a multi-page PDF document and per-page PNG tiles.
//!
//! Both draw every page from its [`PageInstruction`]; the PDF in
//! millimeter user space, the tiles at `RenderConfig::dpi`.

use crate::config::RenderConfig;
use crate::error::{PosterError, Result};
use crate::layout::PosterLayout;
use crate::pages::PageInstruction;
use crate::render::{
    encode_png, media_box, source_pixmap, Color, DrawCommand, PdfPageBackend, RasterBackend,
    RenderBackend,
};
use image::RgbaImage;
use lopdf::{Dictionary, Document, Object, Stream};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tiny_skia::Pixmap;
use tracing::{debug, info};

/// Resource name of the shared image XObject.
const IMAGE_RESOURCE: &str = "Im0";

/// Outcome of an export.
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Number of pages written.
    pub page_count: usize,

    /// Files written (one PDF, or one PNG per page).
    pub output_paths: Vec<PathBuf>,

    /// Processing time.
    pub duration: Duration,
}

/// Default document name: `poster_<unix millis>.pdf`.
pub fn default_pdf_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("poster_{}.pdf", millis)
}

/// File name of one PNG tile.
pub fn tile_file_name(prefix: &str, page_number: usize) -> String {
    format!("{}_page_{:04}.png", prefix, page_number)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let output_error = |e: std::io::Error| PosterError::OutputError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(output_error)?;
    }
    std::fs::write(path, bytes).map_err(output_error)
}

/// Image XObject: RGB with alpha composited on white, FlateDecode.
fn image_xobject(image: &RgbaImage) -> Result<Stream> {
    let mut rgb = Vec::with_capacity((image.width() * image.height() * 3) as usize);
    for pixel in image.pixels() {
        let alpha = pixel[3] as f32 / 255.0;
        for c in 0..3 {
            rgb.push((pixel[c] as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8);
        }
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&rgb)?;
    let data = encoder.finish()?;

    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", image.width() as i64);
    dict.set("Height", image.height() as i64);
    dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    dict.set("BitsPerComponent", 8_i64);
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    dict.set("Length", data.len() as i64);

    Ok(Stream::new(dict, data))
}

/// Writes a layout as a multi-page PDF.
#[derive(Debug, Clone)]
pub struct PdfExporter {
    margin_color: Color,
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self {
            margin_color: Color::WHITE,
        }
    }
}

impl PdfExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill used for the margin bands.
    pub fn with_margin_color(mut self, color: Color) -> Self {
        self.margin_color = color;
        self
    }

    /// Content stream of one page.
    pub fn page_content(&self, page: &PageInstruction) -> Result<Vec<u8>> {
        let mut backend = PdfPageBackend::new(page.page_size, IMAGE_RESOURCE);
        backend.execute_commands(&page.draw_commands(self.margin_color))?;
        backend.finish()
    }

    /// Build the document: one page per instruction, row-major, all
    /// referencing a single embedded image.
    pub fn build_document(&self, layout: &PosterLayout, image: &RgbaImage) -> Result<Document> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let image_id = doc.add_object(image_xobject(image)?);

        let mut page_refs = Vec::with_capacity(layout.pages.len());
        for page in &layout.pages {
            let (width_pt, height_pt) = media_box(page.page_size);
            let content_id = doc.add_object(Stream::new(Dictionary::new(), self.page_content(page)?));

            let xobjects = Dictionary::from_iter(vec![(IMAGE_RESOURCE, Object::Reference(image_id))]);
            let resources = Dictionary::from_iter(vec![("XObject", Object::Dictionary(xobjects))]);
            let page_dict = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(width_pt as f32),
                        Object::Real(height_pt as f32),
                    ]),
                ),
                ("Resources", Object::Dictionary(resources)),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_refs.push(Object::Reference(doc.add_object(page_dict)));
        }

        let count = page_refs.len() as i64;
        let pages_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(page_refs)),
            ("Count", Object::Integer(count)),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", catalog_id);

        Ok(doc)
    }

    /// Serialize the document to bytes.
    pub fn render_to_bytes(&self, layout: &PosterLayout, image: &RgbaImage) -> Result<Vec<u8>> {
        let mut doc = self.build_document(layout, image)?;
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| PosterError::PdfWrite(e.to_string()))?;
        Ok(bytes)
    }

    /// Write the document to `path`, creating parent directories.
    pub fn export(&self, layout: &PosterLayout, image: &RgbaImage, path: &Path) -> Result<ExportResult> {
        let start = Instant::now();
        info!("Exporting {} page PDF to {:?}", layout.page_count(), path);

        let bytes = self.render_to_bytes(layout, image)?;
        write_output(path, &bytes)?;

        let duration = start.elapsed();
        info!("Wrote {:?} ({} bytes) in {:?}", path, bytes.len(), duration);
        Ok(ExportResult {
            page_count: layout.page_count(),
            output_paths: vec![path.to_path_buf()],
            duration,
        })
    }
}

/// Renders each page to a PNG tile in parallel.
pub struct TileExporter {
    config: RenderConfig,
    thread_pool: rayon::ThreadPool,
}

impl TileExporter {
    /// Create a tile exporter.
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.render_threads)
            .build()
            .map_err(|e| {
                PosterError::InvalidConfig(format!("Failed to create thread pool: {}", e))
            })?;

        info!(
            "Tile exporter initialized with {} threads, {} DPI",
            config.render_threads, config.dpi
        );

        Ok(Self {
            config,
            thread_pool,
        })
    }

    /// Get the configured DPI.
    pub fn dpi(&self) -> u32 {
        self.config.dpi
    }

    /// Pixel size of one tile.
    pub fn tile_dimensions(&self, page: &PageInstruction) -> (u32, u32) {
        let px_per_mm = self.config.px_per_mm();
        (
            ((page.page_size.width * px_per_mm).round() as u32).max(1),
            ((page.page_size.height * px_per_mm).round() as u32).max(1),
        )
    }

    /// Rasterize one page.
    pub fn render_page(&self, page: &PageInstruction, image: &RgbaImage) -> Result<RgbaImage> {
        let source = source_pixmap(image)?;
        self.render_page_from(page, &source)
    }

    /// Rasterize one page from an already premultiplied source.
    fn render_page_from(&self, page: &PageInstruction, source: &Pixmap) -> Result<RgbaImage> {
        let (width, height) = self.tile_dimensions(page);
        let mut backend = RasterBackend::new(width, height)?.with_source(source);
        backend.execute_commands(&[
            DrawCommand::Clear(self.config.background),
            DrawCommand::Scale(self.config.px_per_mm()),
        ])?;
        backend.execute_commands(&page.draw_commands(self.config.margin_color))?;
        Ok(backend.into_image())
    }

    /// Render and encode every page without writing files, in page order.
    pub fn render_all(&self, layout: &PosterLayout, image: &RgbaImage) -> Result<Vec<Vec<u8>>> {
        let dpi = Some(self.config.dpi as f64);
        let compression = self.config.png_compression;
        let source = source_pixmap(image)?;
        self.thread_pool.install(|| {
            layout
                .pages
                .par_iter()
                .map(|page| {
                    let tile = self.render_page_from(page, &source)?;
                    encode_png(&tile, compression, dpi)
                })
                .collect()
        })
    }

    /// Write `<prefix>_page_NNNN.png` for every page into `output_dir`.
    pub fn export(
        &self,
        layout: &PosterLayout,
        image: &RgbaImage,
        output_dir: &Path,
        prefix: &str,
    ) -> Result<ExportResult> {
        let start = Instant::now();
        info!(
            "Exporting {} tiles at {} DPI to {:?}",
            layout.page_count(),
            self.config.dpi,
            output_dir
        );

        std::fs::create_dir_all(output_dir).map_err(|e| PosterError::OutputError {
            path: output_dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let dpi = Some(self.config.dpi as f64);
        let compression = self.config.png_compression;
        let source = source_pixmap(image)?;
        let written: Vec<Result<PathBuf>> = self.thread_pool.install(|| {
            layout
                .pages
                .par_iter()
                .map(|page| {
                    let tile = self.render_page_from(page, &source)?;
                    let png = encode_png(&tile, compression, dpi)?;
                    let path = output_dir.join(tile_file_name(prefix, page.number()));
                    write_output(&path, &png)?;
                    debug!("Wrote tile {} to {:?}", page.number(), path);
                    Ok(path)
                })
                .collect()
        });

        let output_paths = written.into_iter().collect::<Result<Vec<_>>>()?;
        let duration = start.elapsed();
        info!("Wrote {} tiles in {:?}", output_paths.len(), duration);

        Ok(ExportResult {
            page_count: output_paths.len(),
            output_paths,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PosterSettings;
    use crate::image_source::ImageDescriptor;
    use image::Rgba;

    fn layout(settings: &PosterSettings, w: u32, h: u32) -> PosterLayout {
        let image = ImageDescriptor::new(w, h).with_dpi(10.0);
        PosterLayout::compute(Some(&image), settings).unwrap()
    }

    #[test]
    fn test_default_pdf_name() {
        let name = default_pdf_name();
        assert!(name.starts_with("poster_"));
        assert!(name.ends_with(".pdf"));
        assert!(name["poster_".len()..name.len() - 4].parse::<u128>().is_ok());
    }

    #[test]
    fn test_tile_file_name() {
        assert_eq!(tile_file_name("poster", 3), "poster_page_0003.png");
        assert_eq!(tile_file_name("x", 12345), "x_page_12345.png");
    }

    #[test]
    fn test_image_xobject_composites_alpha_on_white() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        let stream = image_xobject(&img).unwrap();
        let mut decoder = flate2::read::ZlibDecoder::new(&stream.content[..]);
        let mut raw = Vec::new();
        std::io::Read::read_to_end(&mut decoder, &mut raw).unwrap();
        assert_eq!(raw, vec![255; 6]);
    }

    #[test]
    fn test_pdf_page_count_matches_grid() {
        // 100x80 px at 10 DPI -> 254 x 203.2 mm on A4 portrait: 2x1
        let l = layout(&PosterSettings::default(), 100, 80);
        let img = RgbaImage::from_pixel(100, 80, Rgba([10, 20, 30, 255]));
        let bytes = PdfExporter::new().render_to_bytes(&l, &img).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), l.page_count());
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_page_content_draws_image_then_margins() {
        let settings = PosterSettings::default().margins_cm(1.0, 1.0, 1.0, 1.0);
        let l = layout(&settings, 100, 80);
        let bytes = PdfExporter::new().page_content(&l.pages[0]).unwrap();
        let ops = lopdf::content::Content::decode(&bytes).unwrap().operations;
        let position = |operator: &str| ops.iter().position(|op| op.operator == operator).unwrap();
        assert!(position("Do") < position("f"));

        let clip = &ops[position("W") - 1];
        assert_eq!(clip.operator, "re");
        let operands: Vec<f32> = clip.operands.iter().map(|o| o.as_float().unwrap()).collect();
        assert_eq!(operands, vec![10.0, 10.0, 190.0, 277.0]);
    }

    #[test]
    fn test_tile_render_page_geometry() {
        let l = layout(&PosterSettings::default(), 100, 80);
        let img = RgbaImage::from_pixel(100, 80, Rgba([255, 0, 0, 255]));
        let exporter = TileExporter::new(RenderConfig::with_dpi(10).render_threads(1)).unwrap();
        let tile = exporter.render_page(&l.pages[1], &img).unwrap();
        // A4 at 10 DPI: 83 x 117 px
        assert_eq!(tile.dimensions(), (83, 117));
        // Page 2 shows 44 mm of image (254 - 210) then white
        assert_eq!(tile.get_pixel(5, 5), &Rgba([255, 0, 0, 255]));
        assert_eq!(tile.get_pixel(50, 5), &Rgba([255, 255, 255, 255]));
        assert_eq!(tile.get_pixel(5, 100), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_tile_exporter_rejects_invalid_config() {
        assert!(TileExporter::new(RenderConfig::with_dpi(0)).is_err());
    }

    #[test]
    fn test_tile_export_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let l = layout(&PosterSettings::default(), 100, 80);
        let img = RgbaImage::from_pixel(100, 80, Rgba([0, 0, 255, 255]));
        let exporter = TileExporter::new(RenderConfig::with_dpi(10).render_threads(2)).unwrap();
        let result = exporter.export(&l, &img, dir.path(), "poster").unwrap();

        assert_eq!(result.page_count, 2);
        assert_eq!(
            result.output_paths,
            vec![
                dir.path().join("poster_page_0001.png"),
                dir.path().join("poster_page_0002.png"),
            ]
        );
        for path in &result.output_paths {
            assert!(path.exists());
        }
    }

    #[test]
    fn test_pdf_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.pdf");
        let l = layout(&PosterSettings::default(), 20, 20);
        let img = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        let result = PdfExporter::new().export(&l, &img, &path).unwrap();
        assert_eq!(result.page_count, 1);
        assert!(path.exists());
    }
}
