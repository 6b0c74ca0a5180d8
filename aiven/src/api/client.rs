use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::error::{ApiError, ErrorBody};

pub const DEFAULT_API_URL: &str = "https://api.aiven.io/v1";

/// Aiven API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: String,
    user_agent: String,
    retry_config: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(base_url: &str, api_token: &str) -> Result<Self, ApiError> {
        Self::with_config(base_url, api_token, RetryConfig::default())
    }

    /// Create a new API client with custom retry configuration
    pub fn with_config(
        base_url: &str,
        api_token: &str,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                base_url,
                parsed.scheme()
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(retry_config.timeout_seconds))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: base_url.trim_end_matches('/').to_string(),
                auth_header: format!("aivenv1 {}", api_token),
                user_agent: format!("terraform-provider-aiven/{}", env!("CARGO_PKG_VERSION")),
                retry_config,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Kafka topic operations
    pub fn kafka_topics(&self) -> super::kafka::KafkaTopicsApi<'_> {
        super::kafka::KafkaTopicsApi::new(self)
    }

    /// Kafka ACL operations
    pub fn kafka_acls(&self) -> super::kafka::KafkaAclsApi<'_> {
        super::kafka::KafkaAclsApi::new(self)
    }

    /// Project VPC operations
    pub fn vpcs(&self) -> super::vpcs::VpcsApi<'_> {
        super::vpcs::VpcsApi::new(self)
    }

    /// VPC peering connection operations
    pub fn vpc_peering_connections(&self) -> super::vpcs::PeeringConnectionsApi<'_> {
        super::vpcs::PeeringConnectionsApi::new(self)
    }

    pub fn services(&self) -> super::services::ServicesApi<'_> {
        super::services::ServicesApi::new(self)
    }

    pub fn service_integrations(&self) -> super::integrations::ServiceIntegrationsApi<'_> {
        super::integrations::ServiceIntegrationsApi::new(self)
    }

    pub fn integration_endpoints(&self) -> super::integrations::IntegrationEndpointsApi<'_> {
        super::integrations::IntegrationEndpointsApi::new(self)
    }

    /// Elasticsearch ACL configuration of a service
    pub fn elasticsearch_acls(&self) -> super::elasticsearch::ElasticsearchAclsApi<'_> {
        super::elasticsearch::ElasticsearchAclsApi::new(self)
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("GET request to: {}", url);

                self.authorized(self.inner.http_client.get(&url))
                    .send()
                    .await
            },
            path,
            Method::GET,
        )
        .await
    }

    /// Execute a POST request with retry logic
    pub async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("POST request to: {}", url);

                self.authorized(self.inner.http_client.post(&url))
                    .json(body)
                    .send()
                    .await
            },
            path,
            Method::POST,
        )
        .await
    }

    /// Execute a PUT request with retry logic
    pub async fn put<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("PUT request to: {}", url);

                self.authorized(self.inner.http_client.put(&url))
                    .json(body)
                    .send()
                    .await
            },
            path,
            Method::PUT,
        )
        .await
    }

    /// Execute a DELETE request with retry logic
    pub async fn delete<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("DELETE request to: {}", url);

                self.authorized(self.inner.http_client.delete(&url))
                    .send()
                    .await
            },
            path,
            Method::DELETE,
        )
        .await
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(AUTHORIZATION, &self.inner.auth_header)
            .header(USER_AGENT, &self.inner.user_agent)
    }

    /// Execute request with retry logic. Rate limiting (429), 503 and
    /// connection failures are retried with exponential backoff, timeouts only
    /// for GET and DELETE. Every other error is returned as is.
    async fn execute_with_retry<F, Fut, T>(
        &self,
        request_fn: F,
        path: &str,
        method: Method,
    ) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
        T: for<'de> Deserialize<'de>,
    {
        let retry = &self.inner.retry_config;
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= retry.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    retry.initial_backoff_ms * (2_u64.pow(attempt - 1)),
                    retry.max_backoff_ms,
                );
                tracing::debug!(
                    "Retrying request to {} after {}ms (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return self.parse_success_response(response).await;
                    }

                    let error = self.error_from_response(response).await;
                    if status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE
                    {
                        tracing::warn!("Request to {} returned {}, will retry", path, status);
                        last_error = Some(error);
                    } else {
                        return Err(error);
                    }
                }
                Err(e) => {
                    if e.is_connect() || (e.is_timeout() && replays_on_timeout(&method)) {
                        tracing::warn!("Request to {} failed: {}, will retry", path, e);
                        last_error = Some(ApiError::Request(e));
                    } else {
                        return Err(ApiError::Request(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or_else(|| {
            ApiError::Parse(format!("no response received for {}", path))
        }))
    }

    /// Parse successful response. An empty body parses as JSON `null`.
    async fn parse_success_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        let body = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str::<T>(body).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::Parse(format!("Failed to parse response: {}", e))
        })
    }

    async fn error_from_response(&self, response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => ApiError::Api {
                status,
                message: body.message,
                more_info: body.more_info,
            },
            Err(_) => ApiError::Api {
                status,
                message: text,
                more_info: None,
            },
        }
    }
}

/// Whether a request that timed out can be sent again without applying twice
fn replays_on_timeout(method: &Method) -> bool {
    *method == Method::GET || *method == Method::DELETE
}

/// Percent-encode one path segment
pub(crate) fn segment(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}
