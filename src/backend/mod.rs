//! The storefront backend contract as an async port.
//!
//! Every mutation of cart or payment state belongs to the server; this
//! crate only consumes the contract below and re-fetches after mutating.

mod http;
mod memory;

pub use http::{HttpBackend, HttpConfig};
pub use memory::InMemoryBackend;

use async_trait::async_trait;

use crate::domain::{Cart, CheckoutSession, OrderStatus, PaymentRecord};
use crate::error::BackendError;

/// Abstraction over the storefront backend for testability.
/// Real implementation: `HttpBackend`. In-process stand-in: `InMemoryBackend`.
#[async_trait]
pub trait StorefrontBackend: Send + Sync {
    /// `GET /cart`: current snapshot. Idempotent and side-effect-free.
    async fn fetch_cart(&self) -> Result<Cart, BackendError>;

    /// `DELETE /cart/items/{id}`: acknowledge only, callers re-fetch.
    async fn remove_item(&self, item_id: &str) -> Result<(), BackendError>;

    /// `DELETE /cart`: empty the cart.
    async fn clear_cart(&self) -> Result<(), BackendError>;

    /// `POST /cart/apply-code`: the updated cart, or a validation error
    /// when the server judges the code expired, inactive or unknown.
    async fn apply_code(&self, code: &str) -> Result<Cart, BackendError>;

    /// `POST /cart/clear-code`: detach the applied code.
    async fn clear_code(&self) -> Result<(), BackendError>;

    /// `POST /cart/checkout`: create an order and payment session from the
    /// current cart. Not idempotent: every call creates a new order.
    async fn checkout(&self) -> Result<CheckoutSession, BackendError>;

    /// `POST /payment/check-status`: the canonical order status.
    async fn check_status(&self, order_id: &str) -> Result<OrderStatus, BackendError>;

    /// `POST /payment/simulate-success`: mark a PENDING order PAID.
    /// Exposed by non-production backends only.
    async fn simulate_success(&self, order_id: &str) -> Result<OrderStatus, BackendError>;

    /// `GET /payments`: past orders for the history view.
    async fn list_payments(&self) -> Result<Vec<PaymentRecord>, BackendError>;
}
