use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BetterOcrError {
    #[error("No text detected")]
    NoTextDetected,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    #[error("OCR engines did not finish within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0} is not implemented")]
    Unimplemented(&'static str),
}

pub type Result<T> = std::result::Result<T, BetterOcrError>;
