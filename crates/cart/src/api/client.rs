//! `reqwest` implementation of the cart and transaction resources.

use std::sync::Arc;

use pickngo_core::{CartItemId, TransactionId, UserName};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::types::{CartItem, CreatedTransaction, Data, TransactionRecord};
use super::{ApiError, CartResource, TransactionResource};
use crate::config::CartConfig;

/// Longest slice of a response body copied into logs and errors.
const BODY_SNIPPET_LEN: usize = 200;

/// Backend REST API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    base_url: Url,
    fetch_limit: u32,
}

impl RestClient {
    /// Create a new backend API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &CartConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| ApiError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                base_url: config.api_base_url.clone(),
                fetch_limit: config.fetch_limit,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Execute a GET request and decode the JSON body.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.inner.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a DELETE request, ignoring any body on success.
    async fn delete(&self, url: Url) -> Result<(), ApiError> {
        let response = self.inner.client.delete(url).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(Self::parse_error(response).await)
    }

    /// Check the status and parse the JSON body.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        // Body as text first for better error diagnostics
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %snippet(&body),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Turn a non-success response into an [`ApiError`].
    async fn parse_error(response: reqwest::Response) -> ApiError {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return ApiError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return ApiError::NotFound(response.url().path().to_string());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!(
            status = %status,
            body = %snippet(&message),
            "Backend API returned non-success status"
        );

        ApiError::Status {
            status: status.as_u16(),
            message: snippet(&message),
        }
    }
}

impl CartResource for RestClient {
    #[instrument(skip(self), fields(user = %user))]
    async fn list_for_user(&self, user: &UserName) -> Result<Vec<CartItem>, ApiError> {
        let mut url = self.endpoint("carts")?;
        url.query_pairs_mut()
            .append_pair("filters[user_name][$eq]", user.as_str())
            .append_pair("_limit", &self.inner.fetch_limit.to_string());

        let envelope: Data<Vec<CartItem>> = self.get(url).await?;
        debug!(count = envelope.data.len(), "Fetched cart items");
        Ok(envelope.data)
    }

    #[instrument(skip(self), fields(item_id = %id))]
    async fn delete_item(&self, id: CartItemId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("carts/{id}"))?;
        self.delete(url).await?;
        debug!("Deleted cart item");
        Ok(())
    }
}

impl TransactionResource for RestClient {
    #[instrument(skip(self, record), fields(product = %record.product_name))]
    async fn create_transaction(
        &self,
        record: &TransactionRecord,
    ) -> Result<Option<TransactionId>, ApiError> {
        let url = self.endpoint("transactions")?;
        let response = self
            .inner
            .client
            .post(url)
            .json(&Data::new(record))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        // A 2xx reply means the record is stored, whatever the body holds
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Transaction created but reply body was not received");
                return Ok(None);
            }
        };

        match serde_json::from_str::<Data<CreatedTransaction>>(&body) {
            Ok(Data {
                data: CreatedTransaction { id: Some(id) },
            }) => {
                debug!(transaction_id = %id, "Created transaction");
                Ok(Some(id))
            }
            Ok(_) => {
                warn!(body = %snippet(&body), "Transaction created without an id in the reply");
                Ok(None)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    body = %snippet(&body),
                    "Transaction created but reply could not be parsed"
                );
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("fetch_limit", &self.inner.fetch_limit)
            .finish_non_exhaustive()
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LEN).collect()
}
