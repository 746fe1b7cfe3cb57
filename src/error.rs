use thiserror::Error;

/// Errors surfaced by the storefront backend port.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// The server rejected the request as invalid (expired or unknown promo
    /// code, missing item). Recovered locally; no state changed.
    #[error("Request rejected: {0}")]
    Validation(String),
    #[error("Not authenticated against the storefront")]
    Unauthorized,
    #[error("Server error: HTTP {status} - {body}")]
    Server { status: u16, body: String },
    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PromoError {
    #[error("Promo code must not be empty")]
    EmptyCode,
    /// At most one code per cart; the client refuses a second apply without
    /// touching the attached one.
    #[error("A promo code is already applied: {0}")]
    AlreadyApplied(String),
    /// The server judged the code expired, inactive or unknown. Non-fatal;
    /// the cart is unchanged.
    #[error("Promo code rejected: {0}")]
    Rejected(String),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    /// The hosted widget was never injected. A configuration error: fatal
    /// for the current action, never a silently-skipped branch.
    #[error("Payment widget is not available")]
    WidgetUnavailable,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckoutError {
    /// The submission call itself failed; the checkout trigger is
    /// re-enabled (the in-flight flag is already reset when this surfaces).
    #[error("Checkout submission failed: {0}")]
    Submit(#[source] BackendError),
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Order {order_id} cannot be resumed: {reason}")]
    NotResumable { order_id: String, reason: String },
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReconcileError {
    #[error("No pending order is tracked for this session")]
    NoPendingOrder,
    #[error("Order {requested} is not the tracked pending order ({tracked})")]
    NotTracked { requested: String, tracked: String },
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}
