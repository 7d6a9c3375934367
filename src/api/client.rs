//! Studio REST API Client
//!
//! HTTP client for the studio backend, built on `reqwest`.

use super::dto::{
    BikeAssignment, ClientQuery, CopyRequest, CopyResponse, ReservationPatch, ReservationUpdate,
    SlotSettingsPatch,
};
use super::error::{extract_message, ApiError, ApiResult};
use super::StudioApi;
use crate::model::{
    ClientRow, CopyTarget, Page, RaceRegistration, RaceSummary, Slot, SlotDetail, WeekSchedule,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin (e.g., "http://localhost:8000"); paths start with `/api`
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            request_timeout_ms: 15_000,
        }
    }
}

/// Studio backend client
///
/// Failed requests are reported once; nothing is retried.
pub struct HttpStudioApi {
    client: Client,
    config: ClientConfig,
}

impl HttpStudioApi {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(ApiError::Config(format!(
                "base URL must start with http:// or https://, got {:?}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let config = ClientConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        tracing::debug!(method = "GET", path, "Backend request");
        let builder = self.request(Method::GET, path);
        self.execute(builder, "GET", path).await
    }

    /// Send a mutation. Each one carries a fresh `X-Request-Id`.
    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request_id = uuid::Uuid::new_v4().to_string();
        let method_name = method.as_str().to_string();
        tracing::info!(
            method = %method_name,
            path,
            request_id = %request_id,
            "Backend mutation"
        );

        let builder = self
            .request(method, path)
            .header("X-Request-Id", request_id.as_str())
            .json(body);

        self.execute(builder, &method_name, path).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method: &str,
        path: &str,
    ) -> ApiResult<T> {
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = extract_message(&text);
            tracing::warn!(
                method,
                path,
                status = status.as_u16(),
                message = message.as_deref().unwrap_or(""),
                "Backend returned an error"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await.map_err(map_transport_error)?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(method, path, error = %e, "Unexpected response body");
            ApiError::Decode(format!("{} {}: {}", method, path, e))
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_connect() {
        ApiError::Unavailable
    } else {
        ApiError::Request(e)
    }
}

#[async_trait]
impl StudioApi for HttpStudioApi {
    async fn slot_detail(&self, slot_id: i64) -> ApiResult<SlotDetail> {
        self.get(&format!("/api/schedule/slots/{}", slot_id)).await
    }

    async fn update_slot(&self, slot_id: i64, patch: &SlotSettingsPatch) -> ApiResult<Slot> {
        self.send_json(
            Method::PATCH,
            &format!("/api/schedule/slots/{}", slot_id),
            patch,
        )
        .await
    }

    async fn patch_reservation(
        &self,
        reservation_id: i64,
        patch: &ReservationPatch,
    ) -> ApiResult<ReservationUpdate> {
        self.send_json(
            Method::PATCH,
            &format!("/api/schedule/reservations/{}", reservation_id),
            patch,
        )
        .await
    }

    async fn copy_targets(&self, slot_id: i64) -> ApiResult<Vec<CopyTarget>> {
        self.get(&format!("/api/schedule/slots/{}/copy-targets", slot_id))
            .await
    }

    async fn copy_slot(&self, slot_id: i64, request: &CopyRequest) -> ApiResult<CopyResponse> {
        self.send_json(
            Method::POST,
            &format!("/api/schedule/slots/{}/copy", slot_id),
            request,
        )
        .await
    }

    async fn week(&self, week_start: NaiveDate) -> ApiResult<WeekSchedule> {
        self.get(&format!(
            "/api/schedule/week?start={}",
            week_start.format("%Y-%m-%d")
        ))
        .await
    }

    async fn search_clients(&self, query: &ClientQuery) -> ApiResult<Page<ClientRow>> {
        self.get(&format!("/api/clients?{}", query.to_query_string()))
            .await
    }

    async fn race_summary(&self, race_id: i64) -> ApiResult<RaceSummary> {
        self.get(&format!("/api/races/{}/summary", race_id)).await
    }

    async fn assign_bike(
        &self,
        race_id: i64,
        registration_id: i64,
        assignment: &BikeAssignment,
    ) -> ApiResult<RaceRegistration> {
        self.send_json(
            Method::PATCH,
            &format!("/api/races/{}/registrations/{}", race_id, registration_id),
            assignment,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let api = HttpStudioApi::new(ClientConfig {
            base_url: "http://studio.local/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(api.url("/api/races/1/summary"), "http://studio.local/api/races/1/summary");
    }

    #[test]
    fn test_rejects_base_url_without_scheme() {
        let result = HttpStudioApi::new(ClientConfig {
            base_url: "studio.local".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ApiError::Config(_))));
    }
}
