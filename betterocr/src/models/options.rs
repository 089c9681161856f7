use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Key under which callers may pass an explicit LLM API key.
pub const API_KEY_OPTION: &str = "API_KEY";

pub const DEFAULT_LLM_MODEL: &str = "gpt-4";

/// Per-call inputs shared by both OCR engines and the LLM stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectOptions {
    pub image_path: PathBuf,
    pub languages: Vec<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub tesseract: TesseractOptions,
    #[serde(default)]
    pub llm: LlmOptions,
}

impl DetectOptions {
    pub fn new<P, I, S>(image_path: P, languages: I) -> Self
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image_path: image_path.as_ref().to_path_buf(),
            languages: languages.into_iter().map(Into::into).collect(),
            context: None,
            tesseract: TesseractOptions::default(),
            llm: LlmOptions::default(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_tesseract(mut self, tesseract: TesseractOptions) -> Self {
        self.tesseract = tesseract;
        self
    }

    pub fn with_llm(mut self, llm: LlmOptions) -> Self {
        self.llm = llm;
        self
    }

    /// The context hint, treating blank strings as absent.
    pub fn context(&self) -> Option<&str> {
        self.context
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Language codes joined the way the prompts present them, e.g. `ko+en`.
    pub fn joined_languages(&self) -> String {
        self.languages.join("+")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesseractOptions {
    /// Overrides the configured tessdata directory for this call.
    #[serde(default)]
    pub data_path: Option<String>,
    /// Page segmentation mode (`--psm`).
    #[serde(default)]
    pub page_seg_mode: Option<u32>,
    #[serde(default)]
    pub char_whitelist: Option<String>,
}

/// Chat-completion parameters forwarded verbatim to the LLM request.
///
/// Holds arbitrary JSON (`model`, `temperature`, `max_tokens`, ...). The
/// optional [`API_KEY_OPTION`] entry is consumed by the client and never
/// forwarded.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LlmOptions(Map<String, Value>);

impl Default for LlmOptions {
    fn default() -> Self {
        Self::new(DEFAULT_LLM_MODEL)
    }
}

impl LlmOptions {
    pub fn new(model: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("model".to_string(), Value::String(model.into()));
        Self(map)
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn with_api_key(self, api_key: impl Into<String>) -> Self {
        self.with(API_KEY_OPTION, Value::String(api_key.into()))
    }

    pub fn model(&self) -> Option<&str> {
        self.0.get("model").and_then(Value::as_str)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.0.get(API_KEY_OPTION).and_then(Value::as_str)
    }

    /// Parameters for the completion request, without the API key.
    pub fn forwarded(&self) -> Map<String, Value> {
        let mut params = self.0.clone();
        params.remove(API_KEY_OPTION);
        params
    }
}

impl fmt::Debug for LlmOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut redacted = self.forwarded();
        if self.0.contains_key(API_KEY_OPTION) {
            redacted.insert(API_KEY_OPTION.to_string(), Value::String("<redacted>".into()));
        }
        f.debug_tuple("LlmOptions").field(&redacted).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_llm_options_use_gpt4() {
        let options = LlmOptions::default();
        assert_eq!(options.model(), Some("gpt-4"));
        assert!(options.api_key().is_none());
    }

    #[test]
    fn test_forwarded_strips_api_key() {
        let options = LlmOptions::new("gpt-4o")
            .with("temperature", 0.2)
            .with_api_key("sk-explicit");

        assert_eq!(options.api_key(), Some("sk-explicit"));

        let forwarded = options.forwarded();
        assert!(!forwarded.contains_key(API_KEY_OPTION));
        assert_eq!(forwarded.get("model"), Some(&json!("gpt-4o")));
        assert_eq!(forwarded.get("temperature"), Some(&json!(0.2)));

        // the caller's options keep their key
        assert_eq!(options.api_key(), Some("sk-explicit"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let options = LlmOptions::default().with_api_key("sk-secret");
        let printed = format!("{options:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_blank_context_is_absent() {
        let options = DetectOptions::new("demo.png", ["ko", "en"]).with_context("   ");
        assert!(options.context().is_none());
        assert_eq!(options.joined_languages(), "ko+en");
    }

    #[test]
    fn test_detect_options_deserialize_with_defaults() {
        let options: DetectOptions = serde_json::from_value(json!({
            "image_path": "demo.png",
            "languages": ["en"],
            "llm": {"model": "gpt-4o-mini", "API_KEY": "sk-test"}
        }))
        .unwrap();

        assert_eq!(options.tesseract, TesseractOptions::default());
        assert_eq!(options.llm.model(), Some("gpt-4o-mini"));
        assert_eq!(options.llm.api_key(), Some("sk-test"));
    }
}
