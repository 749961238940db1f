//! HTTP client for the hosted backend-as-a-service.
//!
//! Tables are exposed PostgREST-style under `/rest/v1/<table>`, auth under
//! `/auth/v1`. Every request carries the project's anon key in the `apikey`
//! header plus a bearer token (the user's access token when known, the anon
//! key otherwise).

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Postgres unique violation, surfaced by PostgREST as `code`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct HostedClient {
    base_url: String,
    anon_key: SecretString,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct HostedErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl HostedClient {
    pub fn new(base_url: impl Into<String>, anon_key: SecretString) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request with `apikey` and bearer headers. `bearer` defaults to the
    /// anon key.
    pub fn request(
        &self,
        method: Method,
        url: &str,
        bearer: Option<&SecretString>,
    ) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.anon_key);
        self.http_client
            .request(method, url)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(token.expose_secret())
    }

    /// Sends and decodes a JSON body, mapping failures to `DomainError`
    /// with the backend's message.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, DomainError> {
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;
        let response = Self::check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DomainError::new(ErrorCode::SerializationError, e.to_string()))
    }

    /// Fails on non-2xx, preserving the backend's message.
    pub async fn check(response: Response) -> Result<Response, DomainError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<HostedErrorBody>(&text).ok();
        let message = body
            .as_ref()
            .and_then(|b| {
                b.message
                    .clone()
                    .or_else(|| b.msg.clone())
                    .or_else(|| b.error_description.clone())
            })
            .unwrap_or_else(|| {
                if text.is_empty() {
                    status.to_string()
                } else {
                    text.clone()
                }
            });

        let code = match body.as_ref().and_then(|b| b.code.as_deref()) {
            Some(UNIQUE_VIOLATION) => ErrorCode::Conflict,
            _ if status == reqwest::StatusCode::UNAUTHORIZED => ErrorCode::Unauthorized,
            _ => ErrorCode::DatabaseError,
        };

        tracing::warn!(status = %status, error = %message, "Hosted backend request failed");
        Err(DomainError::new(code, message))
    }
}
