use crate::config::toml_config::IconConfig;
use crate::utils::error::{Result, ToolingError};
use image::codecs::ico::{IcoEncoder, IcoFrame};
use image::{ExtendedColorType, ImageFormat, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use serde::Serialize;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a rasterizer run produced.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IconReport {
    pub generated: Vec<PathBuf>,
    /// `"<file>: <reason>"` for every size that could not be rendered.
    pub failed: Vec<String>,
    pub ico: Option<PathBuf>,
    pub android: Vec<PathBuf>,
}

/// Renders the application icon set from its SVG sources.
pub struct IconRasterizer {
    config: IconConfig,
    base_dir: PathBuf,
}

impl IconRasterizer {
    pub fn new(config: IconConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
        }
    }

    pub fn with_dirs(mut self, source_dir: Option<String>, output_dir: Option<String>) -> Self {
        if let Some(dir) = source_dir {
            self.config.source_dir = dir;
        }
        if let Some(dir) = output_dir {
            self.config.output_dir = dir;
        }
        self
    }

    pub fn source_dir(&self) -> PathBuf {
        self.base_dir.join(&self.config.source_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(&self.config.output_dir)
    }

    /// Paths of the three SVG sources, in full/simple/adaptive order.
    pub fn source_paths(&self) -> [PathBuf; 3] {
        let dir = self.source_dir();
        [
            dir.join(&self.config.full_source),
            dir.join(&self.config.simple_source),
            dir.join(&self.config.adaptive_source),
        ]
    }

    /// Fails on the first SVG source that does not exist.
    pub fn check_sources(&self) -> Result<()> {
        for path in self.source_paths() {
            if !path.is_file() {
                return Err(ToolingError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("SVG source not found: {}", path.display()),
                )));
            }
        }
        Ok(())
    }

    pub fn run(&self) -> Result<IconReport> {
        self.check_sources()?;
        let options = svg_options();
        let output_dir = self.output_dir();
        fs::create_dir_all(&output_dir)?;

        let mut report = IconReport::default();
        let [full, simple, adaptive] = self.source_paths();
        let batches = [
            ("full", full, &self.config.full_sizes, "faturix"),
            ("simple", simple, &self.config.simple_sizes, "faturix"),
            (
                "adaptive",
                adaptive,
                &self.config.adaptive_sizes,
                "faturix_adaptive",
            ),
        ];

        for (label, source, sizes, prefix) in batches {
            tracing::info!("🖼️ Rendering {} icon at {} size(s)", label, sizes.len());
            let tree = match parse_svg(&source, &options) {
                Ok(tree) => tree,
                Err(e) => {
                    tracing::warn!("❌ Failed to parse {}: {}", file_name(&source), e);
                    for size in sizes {
                        let png = format!("{}_{}.png", prefix, size);
                        report.failed.push(format!("{}: {}", png, e));
                    }
                    continue;
                }
            };

            for &size in sizes {
                let path = output_dir.join(format!("{}_{}.png", prefix, size));
                match render_png(&tree, size, &path) {
                    Ok(()) => {
                        tracing::info!("✅ {} - {}x{}px", file_name(&path), size, size);
                        report.generated.push(path);
                    }
                    Err(e) => {
                        tracing::warn!("❌ Failed to render {}: {}", file_name(&path), e);
                        report.failed.push(format!("{}: {}", file_name(&path), e));
                    }
                }
            }
        }

        let ico_path = output_dir.join(&self.config.ico_name);
        match self.write_ico(&ico_path) {
            Ok(frames) => {
                tracing::info!("✅ {} created with {} size(s)", file_name(&ico_path), frames);
                report.ico = Some(ico_path);
            }
            Err(e) => tracing::error!("❌ Failed to create {}: {}", file_name(&ico_path), e),
        }

        report.android = self.organize_android(&output_dir)?;
        tracing::info!("✨ Icons written to {}", output_dir.display());
        Ok(report)
    }

    /// Packs the configured `faturix_<n>.png` files into one ICO container.
    fn write_ico(&self, path: &Path) -> Result<usize> {
        let output_dir = self.output_dir();
        let mut pngs = Vec::with_capacity(self.config.ico_sizes.len());
        for size in &self.config.ico_sizes {
            let png_path = output_dir.join(format!("faturix_{}.png", size));
            let (width, height) = image::image_dimensions(&png_path)?;
            pngs.push((fs::read(&png_path)?, width, height));
        }

        let frames = pngs
            .iter()
            .map(|(bytes, width, height)| {
                IcoFrame::as_png(bytes, *width, *height, ExtendedColorType::Rgba8)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let file = fs::File::create(path)?;
        IcoEncoder::new(BufWriter::new(file)).encode_images(&frames)?;
        Ok(frames.len())
    }

    fn organize_android(&self, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let android_dir = output_dir.join("android");
        let mut copied = Vec::new();

        for density in &self.config.android_densities {
            let density_dir = android_dir.join(format!("mipmap-{}", density.name));
            fs::create_dir_all(&density_dir)?;

            let pairs = [
                (format!("faturix_{}.png", density.size), "ic_launcher.png"),
                (
                    format!("faturix_adaptive_{}.png", density.size),
                    "ic_launcher_foreground.png",
                ),
            ];
            for (source, target) in pairs {
                let source = output_dir.join(source);
                if !source.is_file() {
                    tracing::debug!("Skipping missing {}", source.display());
                    continue;
                }
                let target = density_dir.join(target);
                fs::copy(&source, &target)?;
                tracing::info!("  ✅ mipmap-{}/{}", density.name, file_name(&target));
                copied.push(target);
            }
        }
        Ok(copied)
    }
}

fn svg_options() -> Options<'static> {
    let mut fontdb = resvg::usvg::fontdb::Database::new();
    fontdb.load_system_fonts();
    Options {
        fontdb: Arc::new(fontdb),
        ..Options::default()
    }
}

fn parse_svg(path: &Path, options: &Options) -> Result<Tree> {
    let data = fs::read(path)?;
    Ok(Tree::from_data(&data, options)?)
}

/// Scales the whole SVG canvas onto a `size` × `size` RGBA image.
pub fn render_image(tree: &Tree, size: u32) -> Result<RgbaImage> {
    let mut pixmap = Pixmap::new(size, size).ok_or_else(|| ToolingError::RenderError {
        message: format!("cannot allocate a {}x{} canvas", size, size),
    })?;

    let svg_size = tree.size();
    let transform = Transform::from_scale(
        size as f32 / svg_size.width(),
        size as f32 / svg_size.height(),
    );
    resvg::render(tree, transform, &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha
    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
        .collect();

    RgbaImage::from_raw(size, size, data).ok_or_else(|| ToolingError::RenderError {
        message: format!("pixel buffer does not match {}x{}", size, size),
    })
}

fn render_png(tree: &Tree, size: u32, path: &Path) -> Result<()> {
    render_image(tree, size)?.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
