use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::{ChatMessage, Generation, GenerationError, GenerationParams, Generator, GeneratorConfig};

/// Client for an OpenAI-compatible chat-completions endpoint
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    config: GeneratorConfig,
}

impl OpenAiGenerator {
    pub fn new(api_key: impl Into<String>, config: GeneratorConfig) -> Result<Self, GenerationError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GenerationError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    /// Create a generator using the OPENAI_API_KEY environment variable.
    pub fn from_env(config: GeneratorConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| GenerationError::NoApiKey)?;
        if api_key.trim().is_empty() {
            return Err(GenerationError::NoApiKey);
        }
        Self::new(api_key, config)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }

    fn build_headers(&self) -> Result<HeaderMap, GenerationError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| GenerationError::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        params: &GenerationParams,
    ) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.config.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        }
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        "OpenAI chat completions"
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<Generation, GenerationError> {
        debug!(
            model = %self.config.model,
            messages = messages.len(),
            max_tokens = params.max_tokens,
            temperature = ?params.temperature,
            "Requesting chat completion"
        );

        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers()?)
            .json(&self.build_request(messages, params))
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let (text, model, output_tokens) = parse_response(api_response)?;
        let duration = start.elapsed();

        debug!(
            duration_ms = duration.as_millis(),
            chars = text.len(),
            "Chat completion received"
        );

        let mut result = Generation::new(text, model, duration);
        if let Some(tokens) = output_tokens {
            result = result.with_output_tokens(tokens);
        }
        Ok(result)
    }
}

fn parse_response(
    api_response: ApiResponse,
) -> Result<(String, String, Option<u32>), GenerationError> {
    let text = api_response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(GenerationError::EmptyResponse)?;

    Ok((
        text,
        api_response.model,
        api_response.usage.map(|u| u.completion_tokens),
    ))
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> OpenAiGenerator {
        OpenAiGenerator::new("test-key", GeneratorConfig::default()).unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let generator = OpenAiGenerator::new(
            "test-key",
            GeneratorConfig::default().with_api_base("http://localhost:1234/v1/"),
        )
        .unwrap();
        assert_eq!(
            generator.endpoint(),
            "http://localhost:1234/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_omits_default_temperature() {
        let generator = generator();
        let messages = vec![ChatMessage::user("Judge this story")];
        let request = generator.build_request(&messages, &GenerationParams::judging());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["max_tokens"], 700);
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Judge this story");
    }

    #[test]
    fn test_request_includes_temperature() {
        let generator = generator();
        let messages = vec![ChatMessage::system("world"), ChatMessage::user("hi")];
        let request = generator.build_request(&messages, &GenerationParams::co_creation());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["max_tokens"], 400);
        assert!((json["temperature"].as_f64().unwrap() - 0.85).abs() < 1e-6);
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-3.5-turbo-0125",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Once upon a time"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
        }"#;
        let api_response: ApiResponse = serde_json::from_str(body).unwrap();
        let (text, model, tokens) = parse_response(api_response).unwrap();
        assert_eq!(text, "Once upon a time");
        assert_eq!(model, "gpt-3.5-turbo-0125");
        assert_eq!(tokens, Some(4));
    }

    #[test]
    fn test_parse_response_without_choices() {
        let api_response: ApiResponse =
            serde_json::from_str(r#"{"model": "m", "choices": []}"#).unwrap();
        assert!(matches!(
            parse_response(api_response),
            Err(GenerationError::EmptyResponse)
        ));
    }
}
