use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parsing::rectangle_corners;

pub type Point = [i64; 2];

/// Four corners in order top-left, top-right, bottom-right, bottom-left.
pub type Quad = [Point; 4];

/// A region as reported by an OCR engine.
///
/// Serializes to the bare array form engines and the LLM exchange:
/// `[[x,y],[x,y],[x,y],[x,y]]` for corners, `[x,y,w,h]` for rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundingBox {
    Corners(Quad),
    Rect([i64; 4]),
}

impl BoundingBox {
    pub fn from_rect(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self::Rect([x, y, width, height])
    }

    /// Four-corner form; `None` if a rectangle's far corner overflows.
    pub fn to_corners(&self) -> Option<Quad> {
        match *self {
            Self::Corners(quad) => Some(quad),
            Self::Rect([x, y, w, h]) => rectangle_corners(x, y, w, h),
        }
    }
}

/// One recognized region from a single OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Final corrected region returned from box-mode detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBox {
    #[serde(rename = "box")]
    pub bbox: Quad,
    pub text: String,
}

/// Text-mode output of a single OCR engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextOutput {
    pub text: String,
    /// Engine-specific structured result, `Null` when the engine has none.
    #[serde(default)]
    pub raw: Value,
}

impl TextOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raw: Value::Null,
        }
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = raw;
        self
    }

    /// How this output is embedded in the correction prompt.
    pub fn prompt_repr(&self) -> String {
        if self.raw.is_null() {
            return self.text.clone();
        }
        Value::Array(vec![Value::String(self.text.clone()), self.raw.clone()]).to_string()
    }
}
