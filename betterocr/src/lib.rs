//! Better OCR results by combining two OCR engines with an LLM.
//!
//! An image is read by the embedded `ocrs` engine and by Tesseract at the
//! same time. Both results go into a single prompt and a chat-completion
//! model merges and corrects them, either as plain text
//! ([`detect_text`]) or as text boxes with four-corner coordinates
//! ([`detect_boxes`]).
//!
//! ```rust,ignore
//! let options = DetectOptions::new("demo.png", ["ko", "en"])
//!     .with_context("소주, 맥주")
//!     .with_llm(LlmOptions::new("gpt-4o"));
//! let text = betterocr::detect_text(&options).await?;
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod parsing;

pub use config::Config;
pub use detect::{blocking, detect, detect_boxes, detect_text, Detector};
pub use error::{BetterOcrError, Result};
pub use models::{
    BoundingBox, DetectOptions, Detection, LlmOptions, Quad, TesseractOptions, TextBox, TextOutput,
};
