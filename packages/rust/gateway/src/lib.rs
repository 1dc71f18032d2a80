//! Language-model gateway.
//!
//! Sends one free-text prompt to a remote generative-text endpoint and
//! returns the first generated text fragment. The gateway knows nothing about
//! medical semantics; prompts are built by the stages in `clarifymd-core`.

mod wire;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use clarifymd_shared::{GatewayError, GatewaySettings};

use crate::wire::{GenerateRequest, GenerateResponse};

/// User-Agent string for gateway requests.
const USER_AGENT: &str = concat!("ClarifyMD/", env!("CARGO_PKG_VERSION"));

/// A text-in, text-out language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send `prompt` and return the first generated text fragment.
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError>;
}

// ---------------------------------------------------------------------------
// GeminiGateway
// ---------------------------------------------------------------------------

/// Gateway backed by the Gemini `generateContent` REST endpoint.
///
/// Each call issues exactly one POST. There are no retries, no caching, and
/// no timeout beyond the transport's own limits.
#[derive(Debug, Clone)]
pub struct GeminiGateway {
    client: Client,
    settings: GatewaySettings,
}

impl GeminiGateway {
    /// Create a gateway. The endpoint is not validated until the first call.
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GatewayError::ClientBuild(e.to_string()))?;

        Ok(Self { client, settings })
    }

    /// Build the request URL: the configured endpoint plus `key=<api key>`.
    fn endpoint(&self) -> Result<Url, GatewayError> {
        let base = &self.settings.base_url;
        let invalid = |reason: String| GatewayError::InvalidEndpoint {
            url: base.clone(),
            reason,
        };

        let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }

        url.query_pairs_mut()
            .append_pair("key", &self.settings.api_key);
        Ok(url)
    }
}

#[async_trait]
impl LanguageModel for GeminiGateway {
    #[instrument(skip_all, fields(prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        let url = self.endpoint()?;

        let response = self
            .client
            .post(url)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(Box::new(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(Box::new(e)))?;

        debug!(status = status.as_u16(), body_len = body.len(), "gateway response");

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: GenerateResponse = match serde_json::from_str(&body) {
            Ok(decoded) => decoded,
            Err(source) => return Err(GatewayError::Decode { body, source }),
        };

        decoded.into_first_text().ok_or(GatewayError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

    fn gateway_for(base_url: String) -> GeminiGateway {
        GeminiGateway::new(GatewaySettings {
            base_url,
            api_key: "test-key".into(),
        })
        .unwrap()
    }

    fn candidate_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
    }

    #[test]
    fn endpoint_appends_api_key() {
        let gateway = gateway_for("https://llm.example.com/v1/models/m:generateContent".into());
        let url = gateway.endpoint().unwrap();
        assert_eq!(url.query(), Some("key=test-key"));
    }

    #[tokio::test]
    async fn empty_base_url_is_invalid_endpoint() {
        let gateway = gateway_for(String::new());
        let err = gateway.generate("hello").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn non_http_scheme_is_invalid_endpoint() {
        let gateway = gateway_for("file:///etc/passwd".into());
        let err = gateway.generate("hello").await.unwrap_err();
        match err {
            GatewayError::InvalidEndpoint { reason, .. } => assert!(reason.contains("file")),
            other => panic!("expected InvalidEndpoint, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_posts_prompt_and_returns_first_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(query_param("key", "test-key"))
            .and(body_json(serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Explique diabetes" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("Diabetes é...")))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(format!("{}{MODEL_PATH}", server.uri()));
        let text = gateway.generate("Explique diabetes").await.unwrap();
        assert_eq!(text, "Diabetes é...");
    }

    #[tokio::test]
    async fn zero_candidates_is_empty_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let gateway = gateway_for(format!("{}{MODEL_PATH}", server.uri()));
        let err = gateway.generate("hello").await.unwrap_err();
        assert!(matches!(err, GatewayError::EmptyResponse));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error_with_raw_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway down</html>"))
            .mount(&server)
            .await;

        let gateway = gateway_for(format!("{}{MODEL_PATH}", server.uri()));
        match gateway.generate("hello").await.unwrap_err() {
            GatewayError::Decode { body, .. } => assert_eq!(body, "<html>gateway down</html>"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_status_keeps_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string(r#"{"error":{"message":"API key not valid"}}"#),
            )
            .mount(&server)
            .await;

        let gateway = gateway_for(format!("{}{MODEL_PATH}", server.uri()));
        match gateway.generate("hello").await.unwrap_err() {
            GatewayError::Status { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("API key not valid"));
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Nothing listens on port 1.
        let gateway = gateway_for(format!("http://127.0.0.1:1{MODEL_PATH}"));
        let err = gateway.generate("hello").await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
