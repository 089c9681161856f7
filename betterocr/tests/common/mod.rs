#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use serde_json::json;

use betterocr::config::{Config, LlmConfig, NeuralOcrConfig, TesseractConfig};
use betterocr::error::{BetterOcrError, Result};
use betterocr::models::{DetectOptions, Detection, TextOutput};
use betterocr::ocr::OcrEngine;

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Config pointing the LLM client at a mock server
pub fn test_config(base_url: String, api_key: Option<&str>) -> Config {
    Config {
        llm: LlmConfig {
            api_key: api_key.map(String::from),
            base_url,
            timeout_secs: 5,
        },
        tesseract: TesseractConfig::default(),
        neural: NeuralOcrConfig::default(),
        timeout_secs: 5,
    }
}

pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

pub fn api_error_body(message: &str, error_type: &str, code: &str) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "param": serde_json::Value::Null,
            "code": code
        }
    })
}

pub enum Behavior {
    Succeed {
        text: TextOutput,
        boxes: Vec<Detection>,
    },
    Fail(&'static str),
    Panic,
    Stall(Duration),
}

/// Scripted stand-in for a real OCR engine
pub struct FakeEngine {
    name: &'static str,
    behavior: Behavior,
}

impl FakeEngine {
    pub fn new(name: &'static str, behavior: Behavior) -> Self {
        Self { name, behavior }
    }

    pub fn text(name: &'static str, text: &str) -> Self {
        Self::new(
            name,
            Behavior::Succeed {
                text: TextOutput::new(text),
                boxes: Vec::new(),
            },
        )
    }

    pub fn boxes(name: &'static str, boxes: Vec<Detection>) -> Self {
        Self::new(
            name,
            Behavior::Succeed {
                text: TextOutput::default(),
                boxes,
            },
        )
    }

    pub fn empty(name: &'static str) -> Self {
        Self::boxes(name, Vec::new())
    }

    fn act<T>(&self, success: impl FnOnce(&Behavior) -> T) -> Result<T> {
        match &self.behavior {
            Behavior::Fail(message) => Err(BetterOcrError::Ocr(message.to_string())),
            Behavior::Panic => panic!("{} crashed", self.name),
            Behavior::Stall(delay) => {
                std::thread::sleep(*delay);
                Err(BetterOcrError::Ocr("stalled engine woke up".to_string()))
            }
            behavior => Ok(success(behavior)),
        }
    }
}

impl OcrEngine for FakeEngine {
    fn name(&self) -> &'static str {
        self.name
    }

    fn recognize_text(&self, _options: &DetectOptions) -> Result<TextOutput> {
        self.act(|behavior| match behavior {
            Behavior::Succeed { text, .. } => text.clone(),
            _ => unreachable!(),
        })
    }

    fn recognize_boxes(&self, _options: &DetectOptions) -> Result<Vec<Detection>> {
        self.act(|behavior| match behavior {
            Behavior::Succeed { boxes, .. } => boxes.clone(),
            _ => unreachable!(),
        })
    }
}

// Re-export commonly used crates for convenience
pub use serial_test::serial;
pub use tempfile;
pub use wiremock;
