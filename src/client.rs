//! HTTP client for the generator API
//!
//! One liveness probe, one generation call, no retries. If the API is
//! unreachable the collector fails fast instead of writing a partial file.

use crate::error::{Error, Result};
use crate::server::{ErrorResponse, GenerateRequest, GenerateResponse, HealthResponse};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Request timeout in seconds; generation may include a 10s domain analysis
const TIMEOUT_SECS: u64 = 30;

/// Client for the config generator API
#[derive(Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the API at the given base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(concat!("perfmatters-gen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    /// Probe `GET /health`; errors mean the API is unreachable or unhealthy
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.endpoint("health")?;
        let response =
            self.client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| Error::ApiUnreachable {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(Error::ApiUnreachable {
                url: url.to_string(),
                reason: format!("health check returned status {}", response.status()),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::HttpRequest(e.to_string()))
    }

    /// Call `POST /generate-config`
    ///
    /// Non-200 responses surface the API's `error` field.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = self.endpoint("generate-config")?;
        let response = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::ApiUnreachable {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => format!("status {}", status),
            };
            return Err(Error::ApiError(message));
        }

        response
            .json()
            .await
            .map_err(|e| Error::HttpRequest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generate_request() -> GenerateRequest {
        GenerateRequest {
            plugins: vec!["woocommerce".to_string()],
            theme: "astra".to_string(),
            domain: None,
            analyze_domain: false,
        }
    }

    #[tokio::test]
    async fn health_check_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "healthy",
                "version": "1.0.0",
                "timestamp": "2026-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let health = client.health().await.unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn health_check_fails_fast_when_unreachable() {
        let client = ApiClient::new("http://127.0.0.1:1").unwrap();
        let result = client.health().await;
        assert!(matches!(result, Err(Error::ApiUnreachable { .. })));
    }

    #[tokio::test]
    async fn generate_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate-config"))
            .and(body_partial_json(
                serde_json::json!({ "plugins": ["woocommerce"], "theme": "astra" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "config": {
                    "perfmatters_options": {
                        "assets": {
                            "js_exclusions": "jquery.min.js\nwoocommerce.min.js",
                            "delay_js_exclusions": "jquery",
                            "rucss_excluded_stylesheets": ""
                        }
                    }
                },
                "processing_info": { "plugins_processed": 1, "theme_processed": true },
                "generated_at": "2026-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let response = client.generate(&generate_request()).await.unwrap();
        assert!(response.success);
        assert_eq!(response.processing_info.plugins_processed, 1);
        assert!(response.detected_ad_providers.is_empty());
        assert_eq!(
            response.config.perfmatters_options.assets.js_exclusions,
            "jquery.min.js\nwoocommerce.min.js"
        );
    }

    #[tokio::test]
    async fn generate_surfaces_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate-config"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "success": false,
                "error": "plugins field is required"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let result = client.generate(&generate_request()).await;
        match result {
            Err(Error::ApiError(message)) => assert!(message.contains("plugins")),
            other => panic!("expected ApiError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn reject_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
