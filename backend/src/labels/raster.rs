//! Draws a label (barcode plus text) onto an in-memory RGB canvas.

use crate::labels::barcode::Code128;
use crate::labels::{RenderError, LABEL_HEIGHT_PX, LABEL_WIDTH_PX};
use common::model::label::{LabelData, LabelTemplate};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use log::debug;
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};
use rusttype::{point, Font, Scale};
use std::fs;
use std::path::Path;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Minimum blank margin left and right of the bars.
const QUIET_ZONE_PX: u32 = 40;

/// Produces the image printed on one label.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, template: LabelTemplate, label: &LabelData) -> Result<LabelImage, RenderError>;
}

/// A rasterized label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelImage {
    pixels: RgbImage,
}

impl LabelImage {
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Packed 8-bit RGB samples, row by row.
    pub fn as_rgb(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let (w, h) = self.pixels.dimensions();
        let mut out = Vec::new();
        {
            let mut encoder = PngEncoder::new(&mut out, w, h);
            encoder.set_color(PngColorType::Rgb);
            encoder.set_depth(PngBitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| RenderError::Png(e.to_string()))?;
            writer
                .write_image_data(self.pixels.as_raw())
                .map_err(|e| RenderError::Png(e.to_string()))?;
        }
        Ok(out)
    }
}

/// Regular and bold faces of one family.
pub struct Fonts {
    regular: Font<'static>,
    bold: Font<'static>,
}

impl Fonts {
    /// Loads `{family}-Regular.ttf` and, if present, `{family}-Bold.ttf` from `dir`.
    pub fn load(dir: &Path, family: &str) -> Result<Self, RenderError> {
        let regular = read_font(&dir.join(format!("{family}-Regular.ttf")))?;
        let bold = match read_font(&dir.join(format!("{family}-Bold.ttf"))) {
            Ok(font) => font,
            Err(e) => {
                debug!("Bold face unavailable, using regular: {}", e);
                regular.clone()
            }
        };
        Ok(Self { regular, bold })
    }
}

fn read_font(path: &Path) -> Result<Font<'static>, RenderError> {
    let bytes = fs::read(path).map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
    Font::try_from_vec(bytes)
        .ok_or_else(|| RenderError::Font(format!("{} is not a usable TrueType font", path.display())))
}

/// Text printed under the rack barcode: `"{rack} {style}-{color}-{size}"`.
pub fn rack_caption(label: &LabelData) -> String {
    let mut parts = label.sku.split('-');
    let first = parts.next().unwrap_or_default();
    let second = parts.next().unwrap_or_default();
    format!("{} {}-{}-{}", label.rack_space, first, label.color, second)
}

/// Text lines above the barcode on a detailed label.
pub fn detail_lines(label: &LabelData) -> [String; 5] {
    [
        label.name.clone(),
        format!("Brand: {}", label.brand),
        format!("Color: {} | Size: {}", label.color, label.size),
        format!("MRP: \u{20B9}{} | Unit: {}", label.mrp, label.unit),
        format!("SKU: {}", label.sku),
    ]
}

/// Rasterizer drawing with `imageproc` onto a 300 dpi canvas.
pub struct CanvasRasterizer {
    fonts: Fonts,
}

impl CanvasRasterizer {
    pub fn new(fonts: Fonts) -> Self {
        Self { fonts }
    }

    fn rack_barcode(&self, label: &LabelData) -> Result<RgbImage, RenderError> {
        let mut canvas = blank_canvas();
        let code = Code128::encode(&label.sku)?;
        draw_barcode(&mut canvas, &code, 6, 150, 200)?;
        draw_centered(
            &mut canvas,
            &self.fonts.regular,
            Scale::uniform(60.0),
            &rack_caption(label),
            LABEL_HEIGHT_PX as i32 - 150,
        );
        Ok(canvas)
    }

    fn detailed(&self, label: &LabelData) -> Result<RgbImage, RenderError> {
        let padding = 47;
        let mut canvas = blank_canvas();
        let code = Code128::encode(&label.sku)?;

        let line_height = 40;
        for (i, line) in detail_lines(label).iter().enumerate() {
            let (font, size) = if i == 0 {
                (&self.fonts.bold, 36.0)
            } else {
                (&self.fonts.regular, 32.0)
            };
            let baseline = padding + 32 + line_height * i as i32;
            draw_centered(&mut canvas, font, Scale::uniform(size), line, baseline);
        }

        draw_barcode(&mut canvas, &code, 3, 262, 90)?;

        if !label.custom_text.is_empty() {
            draw_centered(
                &mut canvas,
                &self.fonts.regular,
                Scale::uniform(26.0),
                &label.custom_text,
                LABEL_HEIGHT_PX as i32 - padding,
            );
        }
        Ok(canvas)
    }
}

impl Rasterizer for CanvasRasterizer {
    fn rasterize(&self, template: LabelTemplate, label: &LabelData) -> Result<LabelImage, RenderError> {
        let pixels = match template {
            LabelTemplate::RackBarcode => self.rack_barcode(label)?,
            LabelTemplate::Detailed => self.detailed(label)?,
        };
        Ok(LabelImage::new(pixels))
    }
}

fn blank_canvas() -> RgbImage {
    RgbImage::from_pixel(LABEL_WIDTH_PX, LABEL_HEIGHT_PX, WHITE)
}

/// Draws `code` horizontally centered with its top edge at `top`.
pub fn draw_barcode(
    canvas: &mut RgbImage,
    code: &Code128,
    preferred_module_px: u32,
    top: i32,
    height: u32,
) -> Result<(), RenderError> {
    let available = canvas.width().saturating_sub(2 * QUIET_ZONE_PX);
    let module_px = code.module_width(preferred_module_px, available)?;
    let modules = code.modules();
    let total = modules.len() as u32 * module_px;
    let left = ((canvas.width() - total) / 2) as i32;

    let mut start = 0usize;
    while start < modules.len() {
        let bar = modules[start];
        let mut end = start;
        while end < modules.len() && modules[end] == bar {
            end += 1;
        }
        if bar {
            let x = left + (start as u32 * module_px) as i32;
            let width = (end - start) as u32 * module_px;
            draw_filled_rect_mut(canvas, Rect::at(x, top).of_size(width, height), BLACK);
        }
        start = end;
    }
    Ok(())
}

fn text_width(font: &Font<'_>, scale: Scale, text: &str) -> i32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
        .ceil() as i32
}

fn draw_centered(canvas: &mut RgbImage, font: &Font<'_>, scale: Scale, text: &str, baseline: i32) {
    if text.is_empty() {
        return;
    }
    let x = (canvas.width() as i32 - text_width(font, scale, text)) / 2;
    let top = baseline - font.v_metrics(scale).ascent.round() as i32;
    draw_text_mut(canvas, BLACK, x, top, scale, font, text);
}
