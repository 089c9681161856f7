use std::time::Duration;

use serde_json::{json, Map, Value};

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{CreateChatCompletionRequest, CreateChatCompletionResponse},
    Client,
};

use crate::{
    config::LlmConfig,
    error::{BetterOcrError, Result},
    models::{LlmOptions, DEFAULT_LLM_MODEL},
};

/// Single-shot chat-completion client.
///
/// The API key is resolved per call: an `API_KEY` entry in the call's
/// [`LlmOptions`] wins over the configured (environment) key. The key is
/// sent only as the bearer token and never as part of the request body.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn resolve_api_key(&self, options: &LlmOptions) -> Result<String> {
        options
            .api_key()
            .map(str::to_string)
            .or_else(|| self.config.api_key.clone())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                BetterOcrError::LlmUnavailable(
                    "no API key: pass API_KEY in the LLM options or set OPENAI_API_KEY"
                        .to_string(),
                )
            })
    }

    /// Send `prompt` as a single user message and return the reply text.
    pub async fn complete(&self, prompt: &str, options: &LlmOptions) -> Result<String> {
        let api_key = self.resolve_api_key(options)?;
        let request = Self::build_request(prompt, options)?;
        let client = self.build_client(api_key)?;

        let model = request.get("model").and_then(Value::as_str).unwrap_or_default();
        tracing::debug!(%model, prompt_len = prompt.len(), "Sending LLM request");

        let response: CreateChatCompletionResponse = client
            .chat()
            .create_byot(&request)
            .await
            .map_err(Self::map_openai_error)?;

        let content = Self::extract_content(response)?;
        tracing::debug!(response_len = content.len(), output = %content, "LLM response received");
        Ok(content)
    }

    /// Merge the caller's options with the prompt into a completion request
    /// body.
    ///
    /// Options are forwarded verbatim (minus `API_KEY`), including keys the
    /// typed request does not model; `messages` is always replaced by the
    /// single prompt message. Known fields must still have the types the
    /// chat API expects, and streaming is rejected.
    pub fn build_request(prompt: &str, options: &LlmOptions) -> Result<Map<String, Value>> {
        if prompt.trim().is_empty() {
            return Err(BetterOcrError::Validation("Prompt cannot be empty".to_string()));
        }

        let mut params = options.forwarded();
        params
            .entry("model")
            .or_insert_with(|| Value::String(DEFAULT_LLM_MODEL.to_string()));
        params.insert(
            "messages".to_string(),
            json!([{ "role": "user", "content": prompt }]),
        );

        if params.get("stream").and_then(Value::as_bool) == Some(true) {
            return Err(BetterOcrError::Validation(
                "Streaming responses are not supported".to_string(),
            ));
        }

        serde_json::from_value::<CreateChatCompletionRequest>(Value::Object(params.clone()))
            .map_err(|error| BetterOcrError::Validation(format!("Invalid LLM options: {error}")))?;

        Ok(params)
    }

    fn build_client(&self, api_key: String) -> Result<Client<OpenAIConfig>> {
        let openai_config = OpenAIConfig::new()
            .with_api_base(self.config.base_url.clone())
            .with_api_key(api_key);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|error| {
                BetterOcrError::Llm(format!("Failed to create LLM HTTP client: {error}"))
            })?;

        // A zero elapsed-time budget turns off async-openai's built-in
        // rate-limit retries: one request per call.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::ZERO),
            ..Default::default()
        };

        Ok(Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff))
    }

    fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
        let message = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BetterOcrError::Llm("LLM response contained no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        if message.trim().is_empty() {
            return Err(BetterOcrError::Llm(
                "LLM response contained empty content".to_string(),
            ));
        }

        Ok(message)
    }

    fn map_openai_error(error: OpenAIError) -> BetterOcrError {
        match error {
            OpenAIError::Reqwest(reqwest_error) => {
                BetterOcrError::Llm(format!("LLM request failed: {reqwest_error}"))
            }
            OpenAIError::ApiError(api_error) => {
                BetterOcrError::Llm(format!("LLM API error: {api_error}"))
            }
            OpenAIError::JSONDeserialize(err) => {
                BetterOcrError::Llm(format!("Failed to parse LLM response: {err}"))
            }
            OpenAIError::InvalidArgument(message) => BetterOcrError::Validation(message),
            other => BetterOcrError::Llm(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_env_key(api_key: Option<&str>) -> LlmClient {
        LlmClient::new(&LlmConfig {
            api_key: api_key.map(String::from),
            ..LlmConfig::default()
        })
    }

    #[test]
    fn test_explicit_api_key_wins_over_config() {
        let client = client_with_env_key(Some("sk-env"));
        let options = LlmOptions::default().with_api_key("sk-explicit");

        assert_eq!(client.resolve_api_key(&options).unwrap(), "sk-explicit");
    }

    #[test]
    fn test_config_api_key_used_as_fallback() {
        let client = client_with_env_key(Some("sk-env"));
        assert_eq!(client.resolve_api_key(&LlmOptions::default()).unwrap(), "sk-env");
    }

    #[test]
    fn test_missing_api_key_is_unavailable() {
        let client = client_with_env_key(None);
        assert!(matches!(
            client.resolve_api_key(&LlmOptions::default()),
            Err(BetterOcrError::LlmUnavailable(_))
        ));
    }

    #[test]
    fn test_build_request_forwards_options_without_api_key() {
        let options = LlmOptions::new("gpt-4o-mini")
            .with("temperature", 0.0)
            .with("max_tokens", 256)
            .with_api_key("sk-explicit");

        let request = LlmClient::build_request("hello", &options).unwrap();
        assert_eq!(request["model"], "gpt-4o-mini");
        assert_eq!(request["temperature"], 0.0);
        assert_eq!(request["max_tokens"], 256);
        assert_eq!(request["messages"].as_array().map(Vec::len), Some(1));

        let body = serde_json::to_string(&request).unwrap();
        assert!(!body.contains("sk-explicit"));
        assert!(!body.contains("API_KEY"));
    }

    #[test]
    fn test_build_request_defaults_model() {
        let options = LlmOptions::from_map(serde_json::Map::new());
        let request = LlmClient::build_request("hello", &options).unwrap();
        assert_eq!(request["model"], DEFAULT_LLM_MODEL);
    }

    #[test]
    fn test_build_request_keeps_unmodelled_keys() {
        let options = LlmOptions::new("gpt-4o")
            .with("reasoning_effort_x", "high")
            .with("seed_typo", 3);

        let request = LlmClient::build_request("hello", &options).unwrap();
        assert_eq!(request["reasoning_effort_x"], "high");
        assert_eq!(request["seed_typo"], 3);
    }

    #[test]
    fn test_build_request_rejects_streaming() {
        let options = LlmOptions::default().with("stream", true);
        let result = LlmClient::build_request("hello", &options);
        assert!(matches!(result, Err(BetterOcrError::Validation(_))));
    }

    #[test]
    fn test_build_request_rejects_empty_prompt() {
        let result = LlmClient::build_request("   ", &LlmOptions::default());
        assert!(matches!(result, Err(BetterOcrError::Validation(_))));
    }

    #[test]
    fn test_build_request_rejects_mistyped_options() {
        let options = LlmOptions::default().with("temperature", "hot");
        let result = LlmClient::build_request("hello", &options);
        assert!(matches!(result, Err(BetterOcrError::Validation(_))));
    }
}
