//! Server-side truth for payment results.
//!
//! Every widget signal, even a clean success, is followed by a status
//! check against the server. The canonical status decides the outcome;
//! the signal only fills the gaps when the server cannot be reached.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::backend::StorefrontBackend;
use crate::domain::OrderStatus;
use crate::error::{BackendError, ReconcileError};
use crate::gateway::WidgetSignal;

/// Where a payment attempt landed after reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    /// The server confirmed the payment. The only outcome that may
    /// consume the cart.
    Paid { order_id: String },
    /// The order is awaiting settlement and can be resumed later.
    Pending { order_id: String },
    /// The payment failed.
    Failed { order_id: String, message: String },
    /// The widget reported success but the server could not be reached to
    /// confirm it. Treated as good news for navigation, never for the cart.
    Unverified { order_id: String },
}

impl PaymentOutcome {
    pub fn order_id(&self) -> &str {
        match self {
            Self::Paid { order_id }
            | Self::Pending { order_id }
            | Self::Failed { order_id, .. }
            | Self::Unverified { order_id } => order_id,
        }
    }
}

/// Remembers which order is being paid for right now. The debug
/// force-success control refuses to touch any other order.
#[derive(Clone, Default)]
pub struct PendingOrderMarker {
    order: Arc<Mutex<Option<String>>>,
}

impl PendingOrderMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn track(&self, order_id: impl Into<String>) {
        *self.order.lock().await = Some(order_id.into());
    }

    pub async fn clear(&self) {
        *self.order.lock().await = None;
    }

    pub async fn current(&self) -> Option<String> {
        self.order.lock().await.clone()
    }
}

/// Resolves widget signals into outcomes by asking the server.
#[derive(Clone)]
pub struct StatusReconciler {
    backend: Arc<dyn StorefrontBackend>,
    marker: PendingOrderMarker,
}

impl StatusReconciler {
    pub fn new(backend: Arc<dyn StorefrontBackend>, marker: PendingOrderMarker) -> Self {
        Self { backend, marker }
    }

    /// Ask the server for the canonical status of an order.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, order_id: &str) -> Result<OrderStatus, BackendError> {
        debug!("Sending request");
        self.backend.check_status(order_id).await
    }

    /// Turn a widget signal into an outcome. The canonical status wins
    /// whenever the server answers; an unreachable server is not fatal and
    /// falls back to the signal's own reading.
    #[instrument(skip(self, signal))]
    pub async fn resolve(&self, order_id: &str, signal: WidgetSignal) -> PaymentOutcome {
        if let WidgetSignal::Success(receipt)
        | WidgetSignal::Pending(receipt)
        | WidgetSignal::Error(receipt) = &signal
        {
            debug!(
                transaction_id = ?receipt.transaction_id,
                message = %receipt.message,
                "Widget signal received"
            );
        }
        let outcome = match self.reconcile(order_id).await {
            Ok(status) => {
                // Only an observed canonical terminal status releases the
                // marker. A fallback outcome leaves the order targetable,
                // since the server may still hold it PENDING.
                if status.is_terminal() {
                    self.marker.clear().await;
                }
                outcome_from_status(order_id, status, &signal)
            }
            Err(err) => {
                warn!(error = %err, "Status check failed, falling back to the widget signal");
                fallback_outcome(order_id, &signal)
            }
        };
        info!(order_id, outcome = ?outcome, "Payment attempt resolved");
        outcome
    }

    /// Debug control: settle the tracked pending order as paid. Refused
    /// outright for any order the marker does not name.
    #[instrument(skip(self))]
    pub async fn force_success(&self, order_id: &str) -> Result<PaymentOutcome, ReconcileError> {
        match self.marker.current().await {
            None => return Err(ReconcileError::NoPendingOrder),
            Some(tracked) if tracked != order_id => {
                return Err(ReconcileError::NotTracked {
                    requested: order_id.to_string(),
                    tracked,
                })
            }
            Some(_) => {}
        }
        debug!("Sending request");
        let status = self.backend.simulate_success(order_id).await?;
        let outcome = outcome_from_status(order_id, status, &WidgetSignal::Closed);
        if matches!(outcome, PaymentOutcome::Paid { .. }) {
            self.marker.clear().await;
        }
        Ok(outcome)
    }
}

fn outcome_from_status(order_id: &str, status: OrderStatus, signal: &WidgetSignal) -> PaymentOutcome {
    let order_id = order_id.to_string();
    match status {
        OrderStatus::Paid => PaymentOutcome::Paid { order_id },
        OrderStatus::Pending => PaymentOutcome::Pending { order_id },
        OrderStatus::Failed => PaymentOutcome::Failed {
            order_id,
            message: failure_message(signal),
        },
    }
}

/// The server could not be reached. Read the signal at face value, except
/// that an unconfirmed success never counts as paid.
fn fallback_outcome(order_id: &str, signal: &WidgetSignal) -> PaymentOutcome {
    let order_id = order_id.to_string();
    match signal {
        WidgetSignal::Success(_) => PaymentOutcome::Unverified { order_id },
        WidgetSignal::Pending(_) | WidgetSignal::Closed => PaymentOutcome::Pending { order_id },
        WidgetSignal::Error(_) => PaymentOutcome::Failed {
            order_id,
            message: failure_message(signal),
        },
    }
}

fn failure_message(signal: &WidgetSignal) -> String {
    match signal {
        WidgetSignal::Error(receipt) if !receipt.message.is_empty() => receipt.message.clone(),
        _ => "Payment failed".to_string(),
    }
}
