use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{imageops::FilterType, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::io::Cursor;

use crate::application::ports::RendererPort;
use crate::domain::detection::{BoundingBox, DetectionSet};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::RenderParams;

/// Draws retained detections as hollow boxes, with an optional
/// "<class> <score>%" legend when a TrueType font is configured.
pub struct BoxRenderer {
    params: RenderParams,
    label: String,
    font: Option<FontVec>,
}

impl BoxRenderer {
    pub fn new(params: RenderParams) -> DomainResult<Self> {
        let font = match &params.font_path {
            Some(path) => Some(load_font(path).map_err(|e| DomainError::OperationFailed(format!("{e:#}")))?),
            None => None,
        };
        Ok(Self { params, label: "tumor".into(), font })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    fn draw(&self, image: &RgbImage, detections: &DetectionSet) -> Result<RgbImage> {
        let scale = if self.params.scale.is_finite() && self.params.scale > 0.0 { self.params.scale } else { 1.0 };
        let mut canvas = if (scale - 1.0).abs() > f32::EPSILON {
            let w = ((image.width() as f32 * scale).round() as u32).max(1);
            let h = ((image.height() as f32 * scale).round() as u32).max(1);
            image::imageops::resize(image, w, h, FilterType::Triangle)
        } else {
            image.clone()
        };

        let color = Rgb(self.params.box_color);
        for det in detections {
            let b = det.bbox();
            let scaled = BoundingBox {
                x_min: b.x_min * scale,
                y_min: b.y_min * scale,
                x_max: b.x_max * scale,
                y_max: b.y_max * scale,
            };
            let x = scaled.x_min.round() as i32;
            let y = scaled.y_min.round() as i32;
            let w = (scaled.width().round() as u32).max(1);
            let h = (scaled.height().round() as u32).max(1);

            for i in 0..self.params.border_width.max(1) {
                let rect = Rect::at(x - i as i32, y - i as i32).of_size(w + 2 * i, h + 2 * i);
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }

            if let Some(font) = &self.font {
                let px = PxScale::from(self.params.font_size);
                let legend = format!("{} {:.0}%", self.label, det.score() * 100.0);
                let (tw, th) = text_size(px, font, &legend);
                let top = (y - th as i32 - 2).max(0);
                draw_filled_rect_mut(&mut canvas, Rect::at(x, top).of_size(tw.max(1) + 4, th.max(1) + 2), color);
                draw_text_mut(&mut canvas, Rgb([255, 255, 255]), x + 2, top, px, font, &legend);
            }
        }
        Ok(canvas)
    }
}

fn load_font(path: &std::path::Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontVec::try_from_vec(bytes).with_context(|| format!("invalid TrueType font {}", path.display()))
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

impl RendererPort for BoxRenderer {
    fn render(&self, image: &RgbImage, detections: &DetectionSet) -> DomainResult<Vec<u8>> {
        self.draw(image, detections)
            .and_then(|canvas| encode_png(&canvas))
            .map_err(|e| DomainError::OperationFailed(format!("render: {e:#}")))
    }

    fn encode(&self, image: &RgbImage) -> DomainResult<Vec<u8>> {
        encode_png(image).map_err(|e| DomainError::OperationFailed(format!("encode: {e:#}")))
    }
}
