//! Chat-completions client used as the stage-2 classification service.

use std::time::Duration;

use async_trait::async_trait;
use juportal_ai::prompt::{self, SYSTEM_PROMPT};
use juportal_ai::{ClassificationService, ClassifyError};
use juportal_core::{ClassificationItem, Verdict};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Client for `POST {base_url}/chat/completions`.
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    /// `base_url` like `https://api.openai.com/v1` (trailing slash ignored).
    pub fn new(base_url: &str, api_key: Option<String>, model: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.to_string(),
            timeout,
        }
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ClassifyError {
        if e.is_timeout() {
            ClassifyError::Timeout(self.timeout.as_secs())
        } else {
            ClassifyError::Transport(e.to_string())
        }
    }
}

fn status_error(status: StatusCode, body: String) -> ClassifyError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClassifyError::Unauthorized(body),
        StatusCode::TOO_MANY_REQUESTS => ClassifyError::RateLimited(body),
        s => ClassifyError::Server {
            status: s.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl ClassificationService for ChatClient {
    async fn is_available(&self) -> bool {
        if self.api_key.is_none() {
            info!("no API key configured, classification service disabled");
            return false;
        }
        let url = format!("{}/models", self.base_url);
        match self.authorized(self.client.get(&url)).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(url = %url, status = resp.status().as_u16(), "classification service check failed");
                false
            }
            Err(e) => {
                warn!(url = %url, error = %e, "classification service unreachable");
                false
            }
        }
    }

    async fn classify(&self, items: &[ClassificationItem]) -> Result<Vec<Verdict>, ClassifyError> {
        if self.api_key.is_none() {
            return Err(ClassifyError::Unavailable("no API key configured".into()));
        }
        let user_prompt = prompt::build_batch_prompt(items);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: 0.1,
            max_tokens: 200 + 120 * items.len() as u32,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, items = items.len(), "classifying batch");
        let resp = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let reply: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ClassifyError::Parse(e.to_string()))?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClassifyError::Parse("reply has no message content".into()))?;

        let verdicts = prompt::parse_reply(&content)?;
        debug!(items = items.len(), verdicts = verdicts.len(), "batch classified");
        Ok(verdicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use serde_json::json;

    fn item(file: &str) -> ClassificationItem {
        ClassificationItem {
            file_name: file.into(),
            expected_language: "FR".into(),
            text: "La Cour rejette le pourvoi.".into(),
        }
    }

    fn client(server: &MockServer, key: Option<&str>) -> ChatClient {
        ChatClient::new(
            &format!("{}/", server.base_url()),
            key.map(String::from),
            "test-model",
            Duration::from_secs(5),
        )
    }

    #[test]
    fn trims_trailing_slash_and_blank_key() {
        let c = ChatClient::new("http://localhost:8080/v1/", Some("  ".into()), "m", Duration::from_secs(1));
        assert_eq!(c.base_url, "http://localhost:8080/v1");
        assert!(c.api_key.is_none());
    }

    #[tokio::test]
    async fn available_when_models_endpoint_answers() {
        let server = MockServer::start_async().await;
        let models = server
            .mock_async(|when, then| {
                when.method(GET).path("/models").header("authorization", "Bearer k");
                then.status(200).json_body(json!({"data": []}));
            })
            .await;

        assert!(client(&server, Some("k")).is_available().await);
        models.assert_async().await;
    }

    #[tokio::test]
    async fn unavailable_without_key_or_when_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/models");
                then.status(401);
            })
            .await;

        assert!(!client(&server, None).is_available().await);
        assert!(!client(&server, Some("bad")).is_available().await);
    }

    #[tokio::test]
    async fn classify_parses_fenced_reply() {
        let server = MockServer::start_async().await;
        let content = "```json\n[{\"fileName\":\"a.json\",\"is_valid\":true,\"confidence\":0.92,\"explanation\":\"French\"}]\n```";
        let chat = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer k")
                    .body_contains("File: a.json");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": content}}]
                }));
            })
            .await;

        let verdicts = client(&server, Some("k")).classify(&[item("a.json")]).await.unwrap();
        chat.assert_async().await;
        assert_eq!(verdicts.len(), 1);
        assert!(verdicts[0].is_valid);
        assert!((verdicts[0].confidence - 0.92).abs() < 1e-6);
    }

    async fn classify_with_status(status: u16) -> ClassifyError {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(status).body("nope");
            })
            .await;
        client(&server, Some("k"))
            .classify(&[item("a.json")])
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn status_codes_map_to_errors() {
        let err = classify_with_status(429).await;
        assert!(matches!(err, ClassifyError::RateLimited(_)), "{err:?}");
        assert!(err.is_transient());

        let err = classify_with_status(401).await;
        assert!(matches!(err, ClassifyError::Unauthorized(_)), "{err:?}");
        assert!(!err.is_transient());

        let err = classify_with_status(503).await;
        assert!(
            matches!(err, ClassifyError::Server { status: 503, ref body } if body == "nope"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn non_json_content_is_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"content": "Sorry, I can't."}}]
                }));
            })
            .await;
        let err = client(&server, Some("k")).classify(&[item("a.json")]).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Parse(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn classify_without_key_is_unavailable() {
        let server = MockServer::start_async().await;
        let err = client(&server, None).classify(&[item("a.json")]).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Unavailable(_)));
    }
}
