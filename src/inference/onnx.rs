//! ONNX Runtime classifier adapter.

use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::inference::classifier::{Classification, ImageClassifier, rank_scores, softmax};
use crate::utils::labels::read_labels;
use image::{DynamicImage, imageops::FilterType};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier backed by an ONNX model and a labels file.
///
/// The session is created on first use. A failed load is reported as
/// [`Error::ModelUnavailable`] and retried on the next call.
pub struct OnnxClassifier {
    model_path: PathBuf,
    labels_path: PathBuf,
    input_size: u32,
    apply_softmax: bool,
    top_k: usize,
    state: Mutex<Option<LoadedModel>>,
}

struct LoadedModel {
    session: Session,
    labels: Vec<String>,
}

impl OnnxClassifier {
    /// Build a classifier from model configuration.
    pub fn from_config(model_config: &ModelConfig, top_k: usize) -> Self {
        Self {
            model_path: model_config.path.clone(),
            labels_path: model_config.labels.clone(),
            input_size: model_config.input_size,
            apply_softmax: model_config.softmax,
            top_k,
            state: Mutex::new(None),
        }
    }

    fn load(&self) -> Result<LoadedModel> {
        if !self.model_path.exists() {
            return Err(Error::ModelUnavailable {
                reason: format!("model file does not exist: {}", self.model_path.display()),
            });
        }

        let labels = read_labels(&self.labels_path).map_err(|e| Error::ModelUnavailable {
            reason: e.to_string(),
        })?;

        let session = Session::builder()
            .map_err(unavailable)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(unavailable)?
            .commit_from_file(&self.model_path)
            .map_err(unavailable)?;

        info!(
            "Loaded model: {} ({} labels)",
            self.model_path.display(),
            labels.len()
        );

        Ok(LoadedModel { session, labels })
    }

    /// Convert an image into a `[1, 3, size, size]` tensor scaled to `[0, 1]`.
    fn preprocess(&self, image: &DynamicImage) -> Vec<f32> {
        let size = self.input_size;
        let resized = image.resize_exact(size, size, FilterType::Triangle);
        let rgb = resized.to_rgb8();

        let plane = (size as usize) * (size as usize);
        let mut data = vec![0.0_f32; 3 * plane];
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let offset = (y as usize) * (size as usize) + x as usize;
            for channel in 0..3 {
                data[channel * plane + offset] = f32::from(pixel[channel]) / 255.0;
            }
        }
        data
    }
}

fn unavailable(e: impl std::fmt::Display) -> Error {
    Error::ModelUnavailable {
        reason: e.to_string(),
    }
}

fn inference_failed(e: impl std::fmt::Display) -> Error {
    Error::Inference {
        reason: e.to_string(),
    }
}

impl ImageClassifier for OnnxClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Classification>> {
        let mut guard = self.state.lock().map_err(|_| Error::Internal {
            message: "classifier state lock poisoned".to_string(),
        })?;

        if guard.is_none() {
            *guard = Some(self.load()?);
        }
        let Some(model) = guard.as_mut() else {
            return Err(Error::ModelUnavailable {
                reason: "model not loaded".to_string(),
            });
        };

        let size = self.input_size as usize;
        let input = Tensor::from_array(([1_usize, 3, size, size], self.preprocess(image)))
            .map_err(inference_failed)?;

        let outputs = model
            .session
            .run(ort::inputs![input])
            .map_err(inference_failed)?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(inference_failed)?;

        let scores = if self.apply_softmax {
            softmax(raw)
        } else {
            raw.to_vec()
        };
        debug!("Model produced {} scores", scores.len());

        Ok(rank_scores(&scores, &model.labels, self.top_k))
    }
}
