//! OCR engine adapters
//!
//! Each adapter wraps one third-party OCR library and reshapes its output
//! into the shared [`TextOutput`] / [`Detection`] types consumed by the
//! detection pipeline.
//!
//! # Architecture
//!
//! - `OcrEngine` trait defines the blocking interface both adapters expose
//! - `NeuralEngine` runs the embedded `ocrs` detection + recognition models
//! - `TesseractEngine` runs a local Tesseract install via leptess
//!
//! Adapters are stateless between calls: models and Tesseract handles are
//! created per call, so one engine value can be shared across threads.
//! An image with no text yields an empty result, never an error.

mod neural;
mod tesseract;

pub use neural::NeuralEngine;
pub use tesseract::{parse_tsv, tesseract_languages, TesseractEngine};

use crate::error::Result;
use crate::models::{DetectOptions, Detection, TextOutput};

pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Recognize the full text of `options.image_path`.
    fn recognize_text(&self, options: &DetectOptions) -> Result<TextOutput>;

    /// Recognize individual regions with their bounding boxes.
    fn recognize_boxes(&self, options: &DetectOptions) -> Result<Vec<Detection>>;
}
