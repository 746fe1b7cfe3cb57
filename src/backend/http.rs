//! Production backend speaking authenticated JSON over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::backend::StorefrontBackend;
use crate::domain::{Cart, CheckoutSession, OrderStatus, PaymentRecord};
use crate::error::BackendError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the storefront backend.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl HttpConfig {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read `CHECKOUT_BASE_URL` and `CHECKOUT_API_TOKEN`. Returns `None`
    /// when no base URL is configured.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("CHECKOUT_BASE_URL").ok()?;
        let api_token = std::env::var("CHECKOUT_API_TOKEN").unwrap_or_default();
        Some(Self::new(base_url, api_token))
    }
}

/// `StorefrontBackend` over HTTP with bearer authentication.
pub struct HttpBackend {
    client: Client,
    config: HttpConfig,
}

impl HttpBackend {
    pub fn new(config: HttpConfig) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.api_token)
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn post_ack(&self, path: &str) -> Result<(), BackendError> {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from(resp).await);
        }
        Ok(())
    }

    async fn delete_ack(&self, path: &str) -> Result<(), BackendError> {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from(resp).await);
        }
        Ok(())
    }
}

#[async_trait]
impl StorefrontBackend for HttpBackend {
    async fn fetch_cart(&self) -> Result<Cart, BackendError> {
        self.get_json("/cart").await
    }

    async fn remove_item(&self, item_id: &str) -> Result<(), BackendError> {
        self.delete_ack(&format!("/cart/items/{item_id}")).await
    }

    async fn clear_cart(&self) -> Result<(), BackendError> {
        self.delete_ack("/cart").await
    }

    async fn apply_code(&self, code: &str) -> Result<Cart, BackendError> {
        self.post_json("/cart/apply-code", &ApplyCodeBody { code })
            .await
    }

    async fn clear_code(&self) -> Result<(), BackendError> {
        self.post_ack("/cart/clear-code").await
    }

    async fn checkout(&self) -> Result<CheckoutSession, BackendError> {
        self.post_empty("/cart/checkout").await
    }

    async fn check_status(&self, order_id: &str) -> Result<OrderStatus, BackendError> {
        let body: StatusBody = self
            .post_json("/payment/check-status", &OrderIdBody { order_id })
            .await?;
        Ok(body.status)
    }

    async fn simulate_success(&self, order_id: &str) -> Result<OrderStatus, BackendError> {
        let body: StatusBody = self
            .post_json("/payment/simulate-success", &OrderIdBody { order_id })
            .await?;
        Ok(body.status)
    }

    async fn list_payments(&self) -> Result<Vec<PaymentRecord>, BackendError> {
        self.get_json("/payments").await
    }
}

#[derive(Serialize)]
struct ApplyCodeBody<'a> {
    code: &'a str,
}

#[derive(Serialize)]
struct OrderIdBody<'a> {
    order_id: &'a str,
}

#[derive(Deserialize)]
struct StatusBody {
    status: OrderStatus,
}

/// Error body shape used by the storefront for rejected requests.
#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

async fn error_from(resp: reqwest::Response) -> BackendError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    match status {
        401 | 403 => BackendError::Unauthorized,
        400 | 404 | 422 => BackendError::Validation(validation_message(&body)),
        _ => BackendError::Server { status, body },
    }
}

fn validation_message(body: &str) -> String {
    serde_json::from_str::<ApiMessage>(body)
        .map(|m| m.message)
        .unwrap_or_else(|_| body.to_string())
}
