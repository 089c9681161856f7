use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use rten::Model;
use std::path::Path;
use tracing::{debug, info};

use crate::config::NeuralOcrConfig;
use crate::error::{BetterOcrError, Result};
use crate::models::{BoundingBox, DetectOptions, Detection, TextOutput};
use crate::parsing::rectangle_corners;

use super::OcrEngine;

/// Line-level OCR with the `ocrs` neural models.
///
/// Models are loaded from disk on every call. The recognition model covers
/// Latin script only; other requested languages are still passed to the
/// LLM stage, which leans on the Tesseract result for them.
#[derive(Debug, Clone)]
pub struct NeuralEngine {
    config: NeuralOcrConfig,
}

fn load_model(path: &Path, kind: &str) -> Result<Model> {
    if !path.exists() {
        return Err(BetterOcrError::OcrUnavailable(format!(
            "{kind} model not found at {}",
            path.display()
        )));
    }

    Model::load_file(path)
        .map_err(|e| BetterOcrError::Ocr(format!("Failed to load {kind} model: {e}")))
}

impl NeuralEngine {
    pub fn new(config: &NeuralOcrConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn create_engine(&self) -> Result<OcrsEngine> {
        let detection_model = load_model(&self.config.detection_model, "detection")?;
        let recognition_model = load_model(&self.config.recognition_model, "recognition")?;

        OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| BetterOcrError::Ocr(format!("Failed to create OCR engine: {e}")))
    }

    fn recognize_lines(&self, options: &DetectOptions) -> Result<Vec<Detection>> {
        let engine = self.create_engine()?;

        let image = image::open(&options.image_path)
            .map_err(|e| BetterOcrError::Ocr(format!("Failed to open image: {e}")))?
            .into_rgb8();

        let source = ImageSource::from_bytes(image.as_raw(), image.dimensions())
            .map_err(|e| BetterOcrError::Ocr(format!("Unsupported image layout: {e}")))?;
        let input = engine
            .prepare_input(source)
            .map_err(|e| BetterOcrError::Ocr(format!("Failed to prepare image: {e}")))?;

        let words = engine
            .detect_words(&input)
            .map_err(|e| BetterOcrError::Ocr(format!("Word detection failed: {e}")))?;
        let lines = engine.find_text_lines(&input, &words);
        let recognized = engine
            .recognize_text(&input, &lines)
            .map_err(|e| BetterOcrError::Ocr(format!("Text recognition failed: {e}")))?;

        debug!(words = words.len(), lines = lines.len(), "ocrs layout analysed");

        let detections = recognized
            .into_iter()
            .flatten()
            .filter_map(|line| {
                let text = line.to_string();
                if text.trim().is_empty() {
                    return None;
                }

                let rect = line.bounding_rect();
                let corners = rectangle_corners(
                    i64::from(rect.left()),
                    i64::from(rect.top()),
                    i64::from(rect.width()),
                    i64::from(rect.height()),
                )?;

                Some(Detection {
                    bbox: BoundingBox::Corners(corners),
                    text,
                    confidence: None,
                })
            })
            .collect();

        Ok(detections)
    }
}

impl OcrEngine for NeuralEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn recognize_text(&self, options: &DetectOptions) -> Result<TextOutput> {
        let detections = self.recognize_lines(options)?;
        let text: String = detections.iter().map(|d| d.text.as_str()).collect();

        info!(lines = detections.len(), "ocrs text recognized");
        Ok(TextOutput::new(text).with_raw(serde_json::to_value(&detections)?))
    }

    fn recognize_boxes(&self, options: &DetectOptions) -> Result<Vec<Detection>> {
        let detections = self.recognize_lines(options)?;
        info!(boxes = detections.len(), "ocrs boxes recognized");
        Ok(detections)
    }
}
