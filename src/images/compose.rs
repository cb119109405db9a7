use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use log::debug;
use rusttype::{point, Font, Scale};
use thiserror::Error;

use crate::config::CompositorConfig;
use crate::images::layout::{wrap_text, TextBlock};

const CAPTION_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    #[error("Failed to load font {path}: {reason}")]
    Font { path: String, reason: String },

    #[error("JPEG encoding failed: {0}")]
    Encode(String),

    #[error("Compositing task failed: {0}")]
    Task(String),
}

/// Builds the branded JPEG from a photo, a logo and a caption.
pub struct Compositor {
    config: CompositorConfig,
}

impl Compositor {
    pub fn new(config: CompositorConfig) -> Self {
        Self { config }
    }

    /// Runs the whole pipeline on the blocking pool.
    pub async fn compose(
        &self,
        source: Vec<u8>,
        logo: Vec<u8>,
        caption: String,
    ) -> Result<Vec<u8>, ComposeError> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let font = load_font(&config.font_path)?;
            render(&config, &source, &logo, &caption, &font)
        })
        .await
        .map_err(|e| ComposeError::Task(e.to_string()))?
    }
}

pub fn load_font(path: &str) -> Result<Font<'static>, ComposeError> {
    let bytes = std::fs::read(path).map_err(|e| ComposeError::Font {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    Font::try_from_vec(bytes).ok_or_else(|| ComposeError::Font {
        path: path.to_string(),
        reason: "not a valid TrueType/OpenType font".to_string(),
    })
}

pub fn render(
    config: &CompositorConfig,
    source: &[u8],
    logo: &[u8],
    caption: &str,
    font: &Font<'static>,
) -> Result<Vec<u8>, ComposeError> {
    let canvas = render_canvas(config, source, logo, caption, font)?;
    encode_jpeg(canvas, config.jpeg_quality)
}

/// Finished composite before JPEG encoding.
pub fn render_canvas(
    config: &CompositorConfig,
    source: &[u8],
    logo: &[u8],
    caption: &str,
    font: &Font<'static>,
) -> Result<RgbaImage, ComposeError> {
    let mut canvas = compose_background(config, source, logo)?;
    draw_caption(&mut canvas, config, caption, font);
    Ok(canvas)
}

/// Canvas with the resized photo, footer gradient and logo, but no text yet.
pub fn compose_background(
    config: &CompositorConfig,
    source: &[u8],
    logo: &[u8],
) -> Result<RgbaImage, ComposeError> {
    // Drop any source alpha before resizing, the canvas is opaque.
    let photo = DynamicImage::ImageRgb8(decode(source, "source image")?.into_rgb8());
    let mut canvas = photo
        .resize_exact(config.canvas_width, config.canvas_height, FilterType::Lanczos3)
        .into_rgba8();

    apply_gradient(&mut canvas, config.gradient_height(), config.gradient_max_alpha);

    let logo = decode(logo, "logo")?
        .resize_exact(config.logo_width, config.logo_height, FilterType::Lanczos3)
        .into_rgba8();
    imageops::overlay(
        &mut canvas,
        &logo,
        config.logo_padding as i64,
        config.logo_padding as i64,
    );

    Ok(canvas)
}

fn decode(data: &[u8], what: &'static str) -> Result<DynamicImage, ComposeError> {
    image::load_from_memory(data).map_err(|e| ComposeError::Decode {
        what,
        reason: e.to_string(),
    })
}

/// Alpha of the black overlay on `row`, counted from the top of the gradient.
pub fn gradient_alpha(row: u32, gradient_height: u32, max_alpha: u8) -> u8 {
    if gradient_height <= 1 {
        return max_alpha;
    }
    let row = row.min(gradient_height - 1);
    (max_alpha as u32 * row / (gradient_height - 1)) as u8
}

/// Darkens the bottom `gradient_height` rows with a black ramp from transparent
/// to `max_alpha`.
pub fn apply_gradient(canvas: &mut RgbaImage, gradient_height: u32, max_alpha: u8) {
    let (width, height) = canvas.dimensions();
    let gradient_height = gradient_height.min(height);
    let start = height - gradient_height;

    for row in 0..gradient_height {
        let alpha = gradient_alpha(row, gradient_height, max_alpha) as u32;
        if alpha == 0 {
            continue;
        }
        for x in 0..width {
            let pixel = canvas.get_pixel_mut(x, start + row);
            for channel in pixel.0.iter_mut().take(3) {
                *channel = ((*channel as u32 * (255 - alpha) + 127) / 255) as u8;
            }
        }
    }
}

fn draw_caption(canvas: &mut RgbaImage, config: &CompositorConfig, caption: &str, font: &Font<'static>) {
    let scale = font_scale(font, config.font_size);
    let lines = wrap_text(caption, |s| text_width(font, scale, s), config.max_text_width());
    let block = TextBlock::anchored(
        config.canvas_height,
        config.text_padding,
        config.bottom_padding,
        line_height(font, scale),
        lines.len(),
    );

    debug!("Drawing caption as {} line(s) from y={}", lines.len(), block.top);

    for (line, y) in lines.iter().zip(block.line_tops(lines.len())) {
        draw_text_mut(canvas, CAPTION_COLOR, block.x, y, scale, font, line);
    }
}

/// Scale at which one em of `font` spans `size` pixels.
///
/// rusttype scales so that ascent minus descent equals the given height, which
/// is taller than an em for most fonts.
pub fn font_scale(font: &Font<'_>, size: f32) -> Scale {
    let metrics = font.v_metrics_unscaled();
    let units_per_em = font.units_per_em() as f32;
    Scale::uniform(size * (metrics.ascent - metrics.descent) / units_per_em)
}

/// Rendered pixel width of `text`, measured to the right edge of its last glyph.
pub fn text_width(font: &Font<'_>, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .filter_map(|glyph| glyph.pixel_bounding_box())
        .map(|bb| bb.max.x as f32)
        .fold(0.0, f32::max)
}

/// Bottom of the ink of `"Ay"` drawn with its top at y = 0.
pub fn line_height(font: &Font<'_>, scale: Scale) -> i32 {
    let ascent = font.v_metrics(scale).ascent;
    font.layout("Ay", scale, point(0.0, ascent))
        .filter_map(|glyph| glyph.pixel_bounding_box())
        .map(|bb| bb.max.y)
        .max()
        .unwrap_or_else(|| ascent.ceil() as i32)
}

pub fn encode_jpeg(canvas: RgbaImage, quality: u8) -> Result<Vec<u8>, ComposeError> {
    let rgb = DynamicImage::ImageRgba8(canvas).into_rgb8();
    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100));
    encoder
        .encode_image(&rgb)
        .map_err(|e| ComposeError::Encode(e.to_string()))?;

    Ok(output)
}
