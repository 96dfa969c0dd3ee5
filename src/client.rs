//! MyMemory translation API client.
//!
//! The provider answers every request with HTTP 200 and reports the real outcome
//! in a `responseStatus` field inside the JSON body, so classification happens
//! on the decoded payload rather than on the HTTP status line.

use crate::error::TranslateError;
use crate::languages::provider_source;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Public MyMemory endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.mymemory.translated.net/get";

const SUCCESS_STATUS: i64 = 200;

/// A successful translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub translated_text: String,
    /// Language reported by the provider, or the requested source when absent
    pub detected_source: String,
}

/// Decoded provider payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResult {
    Success {
        translated_text: String,
        detected_source: Option<String>,
    },
    Failure {
        code: i64,
        detail: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderResponse {
    response_status: StatusField,
    #[serde(default)]
    response_data: Option<Value>,
    #[serde(default)]
    response_details: Option<Value>,
}

/// `responseStatus` is usually a number but some error paths send a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatusField {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    translated_text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

/// Build the `langpair` query value, mapping the auto-detect selector to the
/// provider's sentinel.
pub fn build_langpair(source: &str, target: &str) -> String {
    format!("{}|{}", provider_source(source), target)
}

/// Decode a raw response body. Anything missing or malformed is a
/// connection error.
pub fn decode_response(body: &str) -> Result<ProviderResult, TranslateError> {
    let response: ProviderResponse = serde_json::from_str(body)
        .map_err(|e| TranslateError::Connection(format!("malformed response: {}", e)))?;

    let code = match response.response_status {
        StatusField::Number(code) => code,
        StatusField::Text(text) => text.trim().parse().map_err(|_| {
            TranslateError::Connection(format!("invalid responseStatus: {:?}", text))
        })?,
    };

    if code == SUCCESS_STATUS {
        let data = response
            .response_data
            .ok_or_else(|| TranslateError::Connection("missing responseData".to_string()))?;
        let data: ResponseData = serde_json::from_value(data)
            .map_err(|e| TranslateError::Connection(format!("malformed responseData: {}", e)))?;

        return Ok(ProviderResult::Success {
            translated_text: data.translated_text,
            detected_source: data.detected_source_language.filter(|s| !s.is_empty()),
        });
    }

    let detail = response
        .response_details
        .as_ref()
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string());

    Ok(ProviderResult::Failure { code, detail })
}

#[derive(Clone)]
pub struct TranslationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl TranslationClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_http_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Translate `text` from `source` (a code or the auto-detect selector) to `target`.
    ///
    /// Empty text after trimming returns [`TranslateError::EmptyInput`] without
    /// issuing a request.
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Translation, TranslateError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TranslateError::EmptyInput);
        }

        let langpair = build_langpair(source, target);
        debug!("Requesting translation ({} chars, {})", text.len(), langpair);

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!("Translation request failed: {}", e);
                TranslateError::Connection(e.to_string())
            })?;

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read translation response: {}", e);
            TranslateError::Connection(e.to_string())
        })?;

        match decode_response(&body)? {
            ProviderResult::Success {
                translated_text,
                detected_source,
            } => Ok(Translation {
                translated_text,
                detected_source: detected_source
                    .unwrap_or_else(|| provider_source(source).to_string()),
            }),
            ProviderResult::Failure { code, detail } => {
                warn!("Translation API returned status {}: {}", code, detail);
                Err(TranslateError::Api { detail })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    fn success_body(translated: &str, detected: Option<&str>) -> serde_json::Value {
        let mut data = serde_json::json!({ "translatedText": translated, "match": 1 });
        if let Some(detected) = detected {
            data["detectedSourceLanguage"] = serde_json::json!(detected);
        }
        serde_json::json!({
            "responseData": data,
            "responseStatus": 200,
            "responseDetails": "",
            "matches": []
        })
    }

    async fn mock_client() -> (MockServer, TranslationClient) {
        let mock_server = MockServer::start().await;
        let client = TranslationClient::new(format!("{}/get", mock_server.uri()));
        (mock_server, client)
    }

    // ==================== langpair Tests ====================

    #[test]
    fn test_langpair_substitutes_autodetect() {
        assert_eq!(build_langpair("autodetect", "pt-BR"), "Autodetect|pt-BR");
        assert_eq!(build_langpair("en-US", "pt-BR"), "en-US|pt-BR");
    }

    // ==================== decode_response Tests ====================

    #[test]
    fn test_decode_success_with_detected_language() {
        let body = success_body("Olá", Some("en")).to_string();
        assert_eq!(
            decode_response(&body).unwrap(),
            ProviderResult::Success {
                translated_text: "Olá".to_string(),
                detected_source: Some("en".to_string()),
            }
        );
    }

    #[test]
    fn test_decode_success_without_detected_language() {
        let body = success_body("Olá", None).to_string();
        assert_eq!(
            decode_response(&body).unwrap(),
            ProviderResult::Success {
                translated_text: "Olá".to_string(),
                detected_source: None,
            }
        );
    }

    #[test]
    fn test_decode_failure_uses_details() {
        let body = r#"{"responseStatus":403,"responseDetails":"quota exceeded","responseData":null}"#;
        assert_eq!(
            decode_response(body).unwrap(),
            ProviderResult::Failure {
                code: 403,
                detail: "quota exceeded".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_failure_without_details_uses_code() {
        let body = r#"{"responseStatus":"429"}"#;
        assert_eq!(
            decode_response(body).unwrap(),
            ProviderResult::Failure {
                code: 429,
                detail: "429".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_string_success_status() {
        let body = r#"{"responseStatus":"200","responseData":{"translatedText":"Hola"}}"#;
        assert!(matches!(
            decode_response(body).unwrap(),
            ProviderResult::Success { .. }
        ));
    }

    #[test]
    fn test_decode_malformed_is_connection_error() {
        for body in [
            "not json",
            "{}",
            r#"{"responseStatus":"abc"}"#,
            r#"{"responseStatus":200}"#,
            r#"{"responseStatus":200,"responseData":{"match":1}}"#,
        ] {
            assert!(
                matches!(decode_response(body), Err(TranslateError::Connection(_))),
                "body should be a connection error: {}",
                body
            );
        }
    }

    // ==================== TranslationClient Tests ====================

    #[tokio::test]
    async fn test_translate_autodetect_success() {
        let (mock_server, client) = mock_client().await;

        Mock::given(method("GET"))
            .and(path("/get"))
            .and(query_param("q", "Hello"))
            .and(query_param("langpair", "Autodetect|pt-BR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("Olá", Some("en"))))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client
            .translate("Hello", "autodetect", "pt-BR")
            .await
            .expect("Should succeed");

        assert_eq!(result.translated_text, "Olá");
        assert_eq!(result.detected_source, "en");
    }

    #[tokio::test]
    async fn test_translate_trims_and_encodes_text() {
        let (mock_server, client) = mock_client().await;

        Mock::given(method("GET"))
            .and(path("/get"))
            .and(query_param("q", "fish & chips?"))
            .and(query_param("langpair", "en-US|fr-FR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("poisson", None)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client
            .translate("  fish & chips?\n", "en-US", "fr-FR")
            .await
            .expect("Should succeed");

        assert_eq!(result.detected_source, "en-US");
    }

    #[tokio::test]
    async fn test_translate_detected_falls_back_to_sentinel() {
        let (mock_server, client) = mock_client().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("Olá", None)))
            .mount(&mock_server)
            .await;

        let result = client.translate("Hello", "autodetect", "pt-BR").await.unwrap();
        assert_eq!(result.detected_source, "Autodetect");
    }

    #[tokio::test]
    async fn test_translate_empty_text_sends_nothing() {
        let (mock_server, client) = mock_client().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        assert_eq!(
            client.translate("   ", "autodetect", "pt-BR").await,
            Err(TranslateError::EmptyInput)
        );
    }

    #[tokio::test]
    async fn test_translate_api_error() {
        let (mock_server, client) = mock_client().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responseStatus": 403,
                "responseDetails": "quota exceeded"
            })))
            .mount(&mock_server)
            .await;

        assert_eq!(
            client.translate("Hello", "en-US", "pt-BR").await,
            Err(TranslateError::Api {
                detail: "quota exceeded".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_translate_http_error_page_is_connection_error() {
        let (mock_server, client) = mock_client().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&mock_server)
            .await;

        assert!(matches!(
            client.translate("Hello", "en-US", "pt-BR").await,
            Err(TranslateError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_translate_unreachable_server_is_connection_error() {
        let client = TranslationClient::new("http://127.0.0.1:1/get");

        assert!(matches!(
            client.translate("Hello", "en-US", "pt-BR").await,
            Err(TranslateError::Connection(_))
        ));
    }
}
