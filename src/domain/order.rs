use serde::{Deserialize, Serialize};

/// Canonical payment state of an order. Owned by the backend; everything the
/// client holds is a cached snapshot, never current truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
}

impl OrderStatus {
    /// PENDING is the only non-terminal status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Paid => write!(f, "PAID"),
            OrderStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// One payment attempt for the current cart contents.
///
/// Issued fresh per submission and never mutated in place; resubmitting
/// creates a new order with a new session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub order_id: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

/// A past order as listed by the payment history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: String,
    pub status: OrderStatus,
    /// Session token, still usable for resume while the order is PENDING.
    #[serde(default)]
    pub token: Option<String>,
    pub amount: u64,
}
