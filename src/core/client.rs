use crate::domain::model::{is_blank, RunConfiguration};
use crate::domain::ports::TextTransformer;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single remote call produced no usable text.
#[derive(Error, Debug)]
pub enum TransformFailure {
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat-completion client that rewrites one value per request.
///
/// The underlying `reqwest::Client` is cheap to clone and shares its
/// connection pool, so one instance serves every concurrent call of a run.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client,
    config: RunConfiguration,
}

impl ChatCompletionClient {
    pub fn new(config: &RunConfiguration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(config.max_concurrent.max(1))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &RunConfiguration) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    fn build_request<'a>(&'a self, text: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: self.config.render_prompt(text),
            }],
            temperature: self.config.temperature,
        }
    }

    /// One round trip, with every failure mode surfaced as a value.
    pub async fn try_transform(&self, text: &str) -> std::result::Result<String, TransformFailure> {
        let payload = self.build_request(text);

        tracing::debug!("POST {} ({} chars)", self.config.endpoint, text.len());
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.request_timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(TransformFailure::Status { status, body });
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| TransformFailure::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TransformFailure::MalformedResponse("no choices returned".to_string()))
    }
}

#[async_trait]
impl TextTransformer for ChatCompletionClient {
    async fn transform(&self, text: &str) -> String {
        if is_blank(text) {
            return text.to_string();
        }

        match self.try_transform(text).await {
            Ok(rewritten) => rewritten,
            Err(TransformFailure::Status { status, body }) => {
                tracing::warn!("⚠️ API returned {} - {}; keeping original text", status, body);
                text.to_string()
            }
            Err(e) => {
                tracing::warn!("⚠️ Request failed: {}; keeping original text", e);
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn config_for(server: &MockServer) -> RunConfiguration {
        let mut config = RunConfiguration::new("test-key");
        config.endpoint = server.url("/v1/chat/completions");
        config.prompt_template = "Rewrite: {text}".to_string();
        config
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
            ]
        })
    }

    #[tokio::test]
    async fn test_transform_returns_first_choice_content() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_partial(
                    r#"{"model": "deepseek-chat", "messages": [{"role": "user", "content": "Rewrite: hello world"}]}"#,
                );
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(completion("hi everyone"));
        });

        let client = ChatCompletionClient::new(&config_for(&server)).unwrap();
        let result = client.transform("hello world").await;

        api_mock.assert();
        assert_eq!(result, "hi everyone");
    }

    #[tokio::test]
    async fn test_blank_text_skips_the_network() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(completion("should not be used"));
        });

        let client = ChatCompletionClient::new(&config_for(&server)).unwrap();
        assert_eq!(client.transform("").await, "");
        assert_eq!(client.transform("   \t").await, "   \t");

        api_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_non_200_falls_back_to_original() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429).body("rate limited");
        });

        let client = ChatCompletionClient::new(&config_for(&server)).unwrap();

        match client.try_transform("keep me").await {
            Err(TransformFailure::Status { status, body }) => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected status failure, got {:?}", other),
        }
        assert_eq!(client.transform("keep me").await, "keep me");
        api_mock.assert_hits(2);
    }

    #[tokio::test]
    async fn test_malformed_body_falls_back_to_original() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .header("Content-Type", "application/json")
                .body("{\"unexpected\": true}");
        });

        let client = ChatCompletionClient::new(&config_for(&server)).unwrap();

        assert!(matches!(
            client.try_transform("keep me").await,
            Err(TransformFailure::MalformedResponse(_))
        ));
        assert_eq!(client.transform("keep me").await, "keep me");
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        });

        let client = ChatCompletionClient::new(&config_for(&server)).unwrap();
        assert!(matches!(
            client.try_transform("keep me").await,
            Err(TransformFailure::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_original() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(completion("too late"));
        });

        let mut config = config_for(&server);
        config.request_timeout = Duration::from_millis(50);
        let client = ChatCompletionClient::new(&config).unwrap();

        assert!(matches!(
            client.try_transform("slow").await,
            Err(TransformFailure::Transport(_))
        ));
        assert_eq!(client.transform("slow").await, "slow");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back_to_original() {
        let mut config = RunConfiguration::new("test-key");
        // port 9 (discard) is closed on test machines
        config.endpoint = "http://127.0.0.1:9/v1/chat/completions".to_string();
        config.request_timeout = Duration::from_secs(2);
        let client = ChatCompletionClient::new(&config).unwrap();

        assert_eq!(client.transform("offline").await, "offline");
    }
}
