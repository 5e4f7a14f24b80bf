use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::detection::Threshold;

/// The two files the detector needs before the service can start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResources {
    pub config_path: PathBuf,   // TOML descriptor
    pub weights_path: PathBuf,  // ONNX graph with weights
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PixelFormat { Bgr, Rgb }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference { Auto, Cpu, Cuda }

/// Device the session actually ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device { Cpu, Cuda }

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    pub input_name: Option<String>,  // first graph input when unset
    pub boxes_output: String,
    pub scores_output: String,
    pub pixel_format: PixelFormat,
    pub min_size: u32,               // shortest edge after resize
    pub max_size: u32,               // cap for the longest edge
    pub device: DevicePreference,
    pub intra_threads: usize,
    pub class_names: Vec<String>,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            input_name: None,
            boxes_output: "boxes".into(),
            scores_output: "scores".into(),
            pixel_format: PixelFormat::Bgr,
            min_size: 800,
            max_size: 1333,
            device: DevicePreference::Auto,
            intra_threads: 4,
            class_names: vec!["tumor".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderParams {
    pub scale: f32,
    pub border_width: u32,
    pub box_color: [u8; 3],
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            scale: 1.1,
            border_width: 3,
            box_color: [46, 204, 113],
            font_path: None,
            font_size: 18.0,
        }
    }
}

/// Parsed contents of the model configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDescriptor {
    pub model: DetectorParams,
    pub render: RenderParams,
}

impl ModelDescriptor {
    pub fn primary_class(&self) -> &str {
        self.model.class_names.first().map(String::as_str).unwrap_or("tumor")
    }
}

/// Bounds of the confidence slider shown to the user.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThresholdControl {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

impl Default for ThresholdControl {
    fn default() -> Self {
        Self { min: 0.05, max: 0.95, step: 0.05, default: 0.50 }
    }
}

impl ThresholdControl {
    /// Turns a raw slider value into a threshold: missing or non-finite
    /// values fall back to the default, others are clamped into range and
    /// snapped to the step grid.
    pub fn resolve(&self, requested: Option<f32>) -> Threshold {
        let raw = match requested {
            Some(v) if v.is_finite() => v,
            _ => self.default,
        };
        let (min, max, step) = (self.min as f64, self.max as f64, self.step as f64);
        let clamped = (raw as f64).clamp(min, max);
        let snapped = (min + ((clamped - min) / step).round() * step).clamp(min, max);
        // Snap to 4 decimals so 0.05 * 10 lands on the same f32 as the literal 0.5.
        let value = ((snapped * 10_000.0).round() / 10_000.0) as f32;
        Threshold::new(value).unwrap_or(Threshold::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_descriptor_uses_defaults() {
        let d: ModelDescriptor = toml::from_str("").unwrap();
        assert_eq!(d.model.boxes_output, "boxes");
        assert_eq!(d.model.pixel_format, PixelFormat::Bgr);
        assert_eq!(d.primary_class(), "tumor");
        assert!((d.render.scale - 1.1).abs() < 1e-6);
    }

    #[test]
    fn descriptor_overrides_parse() {
        let d: ModelDescriptor = toml::from_str(
            r#"
            [model]
            input_name = "input"
            pixel_format = "RGB"
            device = "cpu"
            min_size = 640

            [render]
            box_color = [255, 0, 0]
            "#,
        )
        .unwrap();
        assert_eq!(d.model.input_name.as_deref(), Some("input"));
        assert_eq!(d.model.pixel_format, PixelFormat::Rgb);
        assert_eq!(d.model.device, DevicePreference::Cpu);
        assert_eq!(d.model.min_size, 640);
        assert_eq!(d.model.max_size, 1333);
        assert_eq!(d.render.box_color, [255, 0, 0]);
    }

    #[test]
    fn control_defaults_and_clamps() {
        let c = ThresholdControl::default();
        assert_eq!(c.resolve(None).value(), 0.5);
        assert_eq!(c.resolve(Some(f32::NAN)).value(), 0.5);
        assert_eq!(c.resolve(Some(0.0)).value(), 0.05);
        assert_eq!(c.resolve(Some(2.0)).value(), 0.95);
    }

    #[test]
    fn control_snaps_to_grid() {
        let c = ThresholdControl::default();
        assert_eq!(c.resolve(Some(0.5)).value(), 0.5);
        assert_eq!(c.resolve(Some(0.52)).value(), 0.5);
        assert_eq!(c.resolve(Some(0.53)).value(), 0.55);
        assert_eq!(c.resolve(Some(0.35)).value(), 0.35);
    }
}
