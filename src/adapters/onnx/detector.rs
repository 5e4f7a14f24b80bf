use anyhow::{anyhow, bail, Context, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;
use once_cell::sync::OnceCell;
use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use ort::session::Session;
use ort::value::Tensor;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::application::ports::DetectorPort;
use crate::domain::detection::{BoundingBox, Detection, DetectionSet};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{DetectorParams, Device, DevicePreference, PixelFormat};

static SHARED: OnceCell<Arc<OnnxDetector>> = OnceCell::new();

/// Tumor detector backed by an ONNX export of the trained model.
/// The graph takes a `[1, 3, H, W]` float tensor in the 0..255 range and
/// returns `boxes` (`[N, 4]`, xyxy in input pixels) and `scores` (`[N]`).
pub struct OnnxDetector {
    session: Mutex<Session>,
    params: DetectorParams,
    input_name: String,
    device: Device,
}

impl OnnxDetector {
    /// Process-wide detector. The first call loads the model; later calls
    /// return the same handle and never reload it.
    pub fn shared(weights: &Path, params: &DetectorParams) -> DomainResult<Arc<OnnxDetector>> {
        SHARED
            .get_or_try_init(|| Self::load(weights, params).map(Arc::new))
            .cloned()
            .map_err(|e| DomainError::OperationFailed(format!("loading {}: {e:#}", weights.display())))
    }

    pub fn load(weights: &Path, params: &DetectorParams) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(params.intra_threads.max(1))?;
        let mut device = Device::Cpu;

        if params.device != DevicePreference::Cpu {
            let cuda = CUDAExecutionProvider::default();
            if cuda.is_available().unwrap_or(false) {
                if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda.build()]) {
                    builder = builder_with_cuda;
                    device = Device::Cuda;
                }
            } else if params.device == DevicePreference::Cuda {
                bail!("CUDA requested in model config but not available");
            } else {
                warn!("CUDA not available, running the detector on CPU");
            }
        }

        let model_bytes = fs::read(weights).with_context(|| format!("reading {}", weights.display()))?;
        let session = builder.commit_from_memory(&model_bytes)?;

        let input_name = match &params.input_name {
            Some(name) => name.clone(),
            None => session
                .inputs
                .first()
                .map(|i| i.name.clone())
                .ok_or_else(|| anyhow!("model graph declares no inputs"))?,
        };

        info!("Detector loaded from {} on {device} (input '{input_name}')", weights.display());
        Ok(Self { session: Mutex::new(session), params: params.clone(), input_name, device })
    }

    fn infer(&self, rgb: &RgbImage) -> Result<DetectionSet> {
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            bail!("empty image");
        }
        let (new_w, new_h) = resize_dims(width, height, self.params.min_size, self.params.max_size);
        let resized = image::imageops::resize(rgb, new_w, new_h, FilterType::Triangle);
        let input = to_tensor(&resized, self.params.pixel_format);

        let input_shape = vec![1, 3, new_h as i64, new_w as i64];
        let input_tensor = Tensor::from_array((input_shape, input.into_raw_vec()))?;

        let mut session = self.session.lock().map_err(|_| anyhow!("detector session lock poisoned"))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let boxes_value = outputs
            .get(self.params.boxes_output.as_str())
            .ok_or_else(|| anyhow!("model has no output named '{}'", self.params.boxes_output))?;
        let scores_value = outputs
            .get(self.params.scores_output.as_str())
            .ok_or_else(|| anyhow!("model has no output named '{}'", self.params.scores_output))?;

        let (boxes_shape, boxes) = boxes_value.try_extract_tensor::<f32>()?;
        let (_, scores) = scores_value.try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = boxes_shape.iter().map(|&x| x.max(0) as usize).collect();

        let scale = (new_w as f32 / width as f32, new_h as f32 / height as f32);
        decode_candidates(&dims, boxes, scores, scale, (width, height))
    }
}

impl DetectorPort for OnnxDetector {
    fn detect(&self, image: &RgbImage) -> DomainResult<DetectionSet> {
        self.infer(image).map_err(|e| DomainError::Inference(format!("{e:#}")))
    }

    fn device(&self) -> Device {
        self.device
    }
}

/// Shortest-edge resize to `min_size`, shrunk further when the long edge
/// would exceed `max_size`.
pub(crate) fn resize_dims(width: u32, height: u32, min_size: u32, max_size: u32) -> (u32, u32) {
    let (w, h) = (width as f32, height as f32);
    let mut scale = min_size as f32 / w.min(h);
    if max_size > 0 && w.max(h) * scale > max_size as f32 {
        scale = max_size as f32 / w.max(h);
    }
    (((w * scale).round() as u32).max(1), ((h * scale).round() as u32).max(1))
}

pub(crate) fn to_tensor(img: &RgbImage, format: PixelFormat) -> Array4<f32> {
    let (w, h) = img.dimensions();
    let order = match format {
        PixelFormat::Bgr => [2, 1, 0],
        PixelFormat::Rgb => [0, 1, 2],
    };
    let mut input = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
    for (x, y, pixel) in img.enumerate_pixels() {
        for (c, &src) in order.iter().enumerate() {
            input[[0, c, y as usize, x as usize]] = pixel[src] as f32;
        }
    }
    input
}

/// Maps raw graph outputs back to original-image detections. Candidates
/// with non-finite values are dropped; no score cutoff is applied.
pub(crate) fn decode_candidates(
    boxes_dims: &[usize],
    boxes: &[f32],
    scores: &[f32],
    scale: (f32, f32),
    original: (u32, u32),
) -> Result<DetectionSet> {
    if boxes_dims.last() != Some(&4) && !boxes.is_empty() {
        bail!("boxes output must end in a dimension of 4, got {boxes_dims:?}");
    }
    let count = boxes.len() / 4;
    if count != scores.len() {
        bail!("{count} boxes but {} scores", scores.len());
    }

    let (sx, sy) = scale;
    let mut detections = Vec::with_capacity(count);
    for (corners, &score) in boxes.chunks_exact(4).zip(scores) {
        if !score.is_finite() || corners.iter().any(|c| !c.is_finite()) {
            continue;
        }
        let bbox = BoundingBox::from_corners(
            corners[0] / sx,
            corners[1] / sy,
            corners[2] / sx,
            corners[3] / sy,
        )
        .clip(original.0, original.1);
        if let Ok(det) = Detection::new(score.clamp(0.0, 1.0), bbox) {
            detections.push(det);
        }
    }
    Ok(DetectionSet::new(detections))
}
