//! Client for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use {
    async_trait::async_trait,
    pagekeep_config::SummarizerConfig,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    tracing::{debug, trace, warn},
};

use crate::{
    error::{Result, SummarizeError},
    types::{Summarizer, SummaryResponse},
};

const TEMPERATURE: f32 = 0.95;
const TOP_P: f32 = 0.7;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tokens (prompt {}, completion {})",
            self.total_tokens, self.prompt_tokens, self.completion_tokens
        )
    }
}

/// [`Summarizer`] for any OpenAI-compatible chat API (Zhipu GLM by default).
pub struct OpenAiCompatSummarizer {
    client: reqwest::Client,
    api_key: Option<Secret<String>>,
    base_url: String,
    model: String,
}

impl OpenAiCompatSummarizer {
    pub fn new(
        api_key: Option<Secret<String>>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SummarizeError::request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.expose_secret().trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &SummarizerConfig) -> Result<Self> {
        Self::new(
            config.api_key.clone(),
            &config.base_url,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn endpoint(&self) -> Result<reqwest::Url> {
        let raw = format!("{}/chat/completions", self.base_url);
        reqwest::Url::parse(&raw)
            .map_err(|e| SummarizeError::request(format!("invalid base url {raw}: {e}")))
    }
}

#[async_trait]
impl Summarizer for OpenAiCompatSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<SummaryResponse> {
        let api_key = self.api_key.as_ref().ok_or(SummarizeError::MissingApiKey)?;
        let endpoint = self.endpoint()?;
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            top_p: TOP_P,
        };

        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "summarize request");

        let response = self
            .client
            .post(endpoint.clone())
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|source| SummarizeError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| SummarizeError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !status.is_success() {
            warn!(status = %status, model = %self.model, body = %text, "summarizer API error");
            return Ok(SummaryResponse {
                status: status.as_u16(),
                message: text,
                ..Default::default()
            });
        }

        trace!(response = %text, "summarizer raw response");
        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| SummarizeError::decode(format!("invalid JSON body: {e}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SummarizeError::decode("response has no message content"))?;

        Ok(SummaryResponse {
            status: status.as_u16(),
            message: String::new(),
            content: content.trim().to_string(),
            usage: parsed.usage.unwrap_or_default().to_string(),
        })
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn summarizer(base_url: &str, key: Option<&str>) -> OpenAiCompatSummarizer {
        OpenAiCompatSummarizer::new(
            key.map(|k| Secret::new(k.to_string())),
            base_url,
            "glm-4-flash",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn posts_chat_completion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "glm-4-flash",
                "messages": [{"role": "user", "content": "summarize: body"}],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":" short version "}}],
                    "usage":{"prompt_tokens":9,"completion_tokens":3,"total_tokens":12}}"#,
            )
            .create_async()
            .await;

        let s = summarizer(&format!("{}/", server.url()), Some("sk-test"));
        let response = s.summarize("summarize: body").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.content, "short version");
        assert_eq!(response.usage, "12 tokens (prompt 9, completion 3)");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sampling_parameters_are_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex(r#""top_p":0\.7"#.into()))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let s = summarizer(&server.url(), Some("k"));
        let response = s.summarize("p").await.unwrap();
        assert_eq!(response.usage, "0 tokens (prompt 0, completion 0)");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_becomes_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"rate limited"}}"#)
            .create_async()
            .await;

        let s = summarizer(&server.url(), Some("k"));
        let response = s.summarize("p").await.unwrap();
        assert_eq!(response.status, 429);
        assert!(!response.is_success());
        assert!(response.message.contains("rate limited"));
    }

    #[tokio::test]
    async fn missing_content_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let s = summarizer(&server.url(), Some("k"));
        let err = s.summarize("p").await.unwrap_err();
        assert!(matches!(err, SummarizeError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let s = summarizer("http://127.0.0.1:1", Some("   "));
        let err = s.summarize("p").await.unwrap_err();
        assert!(matches!(err, SummarizeError::MissingApiKey));
    }

    #[tokio::test]
    async fn invalid_base_url_is_request_error() {
        let s = summarizer("not a url", Some("k"));
        let err = s.summarize("p").await.unwrap_err();
        assert!(matches!(err, SummarizeError::Request(_)));
    }
}
