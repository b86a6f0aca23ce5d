use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum DbError {
    /// The write collided with a uniqueness constraint (PostgREST surfaces
    /// Postgres 23505 as HTTP 409). Callers translate this into the same
    /// feedback as their application-level pre-check.
    #[error("uniqueness constraint violation")]
    UniqueViolation,

    #[error("database authentication failed: {0}")]
    Unauthorized(String),

    #[error("database API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("database transport error: {0}")]
    Transport(String),

    #[error("failed to decode database response: {0}")]
    Decode(String),
}

/// Thin client for the Postgres REST interface. All access uses the service
/// key from configuration; authorization decisions live in the handlers.
pub struct DbClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl DbClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.database_rest_url.clone(),
            service_key: config.database_service_key.clone(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, DbError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|_| DbError::Unauthorized("service key is not a valid header value".to_string()))?;
        headers.insert("apikey", key);

        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|_| DbError::Unauthorized("service key is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| DbError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Database API error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::CONFLICT => DbError::UniqueViolation,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    DbError::Unauthorized(error_text)
                }
                _ => DbError::Api {
                    status: status.as_u16(),
                    message: error_text,
                },
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DbError::Decode(e.to_string()))
    }

    /// GET a filtered selection, decoded as a row list.
    pub async fn select<T>(&self, path: &str) -> Result<Vec<T>, DbError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, path, None, None).await
    }

    /// POST a new row, asking PostgREST to return the stored representation.
    pub async fn insert<T>(&self, path: &str, body: Value) -> Result<Vec<T>, DbError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body), Some(Self::return_representation()))
            .await
    }

    /// PATCH matching rows, returning the updated representations.
    pub async fn update<T>(&self, path: &str, body: Value) -> Result<Vec<T>, DbError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, path, Some(body), Some(Self::return_representation()))
            .await
    }

    /// DELETE matching rows, returning the removed representations.
    pub async fn delete<T>(&self, path: &str) -> Result<Vec<T>, DbError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::DELETE, path, None, Some(Self::return_representation()))
            .await
    }

    fn return_representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
