use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

/// Directory where the `ocrs` CLI caches its downloaded models.
fn default_model_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ocrs")
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub tesseract: TesseractConfig,
    pub neural: NeuralOcrConfig,
    /// Upper bound on the concurrent OCR run, in seconds.
    pub timeout_secs: u64,
}

/// Chat-completion client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Fallback key used when the per-call options carry no `API_KEY`.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TesseractConfig {
    /// tessdata directory; `None` lets Tesseract use its compiled-in default.
    pub data_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NeuralOcrConfig {
    pub detection_model: PathBuf,
    pub recognition_model: PathBuf,
}

impl Default for NeuralOcrConfig {
    fn default() -> Self {
        let dir = default_model_dir();
        Self {
            detection_model: dir.join("text-detection.rten"),
            recognition_model: dir.join("text-recognition.rten"),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OPENAI_BASE_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let neural_defaults = NeuralOcrConfig::default();

        Self {
            llm: LlmConfig {
                api_key: parse_env_opt("OPENAI_API_KEY"),
                base_url: parse_env_opt("OPENAI_BASE_URL")
                    .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 60),
            },
            tesseract: TesseractConfig {
                data_path: parse_env_opt("TESSDATA_PREFIX"),
            },
            neural: NeuralOcrConfig {
                detection_model: parse_env_opt("OCRS_DETECTION_MODEL")
                    .map(PathBuf::from)
                    .unwrap_or(neural_defaults.detection_model),
                recognition_model: parse_env_opt("OCRS_RECOGNITION_MODEL")
                    .map(PathBuf::from)
                    .unwrap_or(neural_defaults.recognition_model),
            },
            timeout_secs: parse_env_or("OCR_TIMEOUT", 120),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
