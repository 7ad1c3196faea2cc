//! Upstream current-weather API client
//!
//! One request per city against `GET {base_url}/data/2.5/weather?id=..&appid=..`.
//! Pacing is not done here; see [`crate::services::pacer`].

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::UpstreamObservation;

const USER_AGENT: &str = concat!("owc-collector/", env!("CARGO_PKG_VERSION"));

/// Failure of a single upstream request
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Parse(err.to_string())
        } else {
            // Strip the URL: it carries the API key
            UpstreamError::Network(err.without_url().to_string())
        }
    }
}

/// Source of current-weather observations for one city
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_weather(&self, city_id: i64) -> Result<UpstreamObservation, UpstreamError>;
}

/// Upstream API client
pub struct OpenWeatherClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Build a client whose every request carries `request_timeout`
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/data/2.5/weather", self.base_url)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current_weather(&self, city_id: i64) -> Result<UpstreamObservation, UpstreamError> {
        let url = self.endpoint();
        tracing::debug!(city_id, url = %url, "Querying upstream weather API");

        let response = self
            .http_client
            .get(&url)
            .query(&[("id", city_id.to_string()), ("appid", self.api_key.clone())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status(status.as_u16(), error_text));
        }

        let observation = response.json::<UpstreamObservation>().await?;
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use std::collections::HashMap;

    async fn spawn_upstream() -> String {
        async fn weather(
            Query(params): Query<HashMap<String, String>>,
        ) -> Result<Json<serde_json::Value>, StatusCode> {
            if params.get("appid").map(String::as_str) != Some("test-key") {
                return Err(StatusCode::UNAUTHORIZED);
            }
            match params.get("id").map(String::as_str) {
                Some("404") => Err(StatusCode::NOT_FOUND),
                Some("999") => {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Err(StatusCode::GATEWAY_TIMEOUT)
                }
                Some("500") => Ok(Json(serde_json::json!("not an object"))),
                Some(id) => {
                    let id: i64 = id.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
                    Ok(Json(serde_json::json!({
                        "id": id,
                        "main": {"temp": 300.0, "humidity": 80}
                    })))
                }
                None => Err(StatusCode::BAD_REQUEST),
            }
        }

        let app = Router::new().route("/data/2.5/weather", get(weather));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn test_client_creation() {
        let client = OpenWeatherClient::new("https://example.com/", "k", Duration::from_secs(5));
        assert!(client.is_ok());
        assert_eq!(
            client.unwrap().endpoint(),
            "https://example.com/data/2.5/weather"
        );
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let base = spawn_upstream().await;
        let client = OpenWeatherClient::new(base, "test-key", Duration::from_secs(5)).unwrap();

        let observation = client.current_weather(524901).await.unwrap();
        assert_eq!(observation.id, Some(524901));
        assert_eq!(observation.main.unwrap().humidity, Some(80));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let base = spawn_upstream().await;
        let client = OpenWeatherClient::new(base, "test-key", Duration::from_secs(5)).unwrap();

        assert!(matches!(
            client.current_weather(404).await,
            Err(UpstreamError::Status(404, _))
        ));
    }

    #[tokio::test]
    async fn test_wrong_key_is_rejected_by_upstream() {
        let base = spawn_upstream().await;
        let client = OpenWeatherClient::new(base, "wrong", Duration::from_secs(5)).unwrap();

        assert!(matches!(
            client.current_weather(1).await,
            Err(UpstreamError::Status(401, _))
        ));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let base = spawn_upstream().await;
        let client = OpenWeatherClient::new(base, "test-key", Duration::from_secs(5)).unwrap();

        assert!(matches!(
            client.current_weather(500).await,
            Err(UpstreamError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let base = spawn_upstream().await;
        let client =
            OpenWeatherClient::new(base, "test-key", Duration::from_millis(200)).unwrap();

        let start = std::time::Instant::now();
        let result = client.current_weather(999).await;

        assert!(matches!(result, Err(UpstreamError::Timeout)), "got {:?}", result);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        // Nothing listens on port 9 locally
        let client =
            OpenWeatherClient::new("http://127.0.0.1:9", "k", Duration::from_secs(2)).unwrap();
        assert!(client.current_weather(1).await.is_err());
    }
}
