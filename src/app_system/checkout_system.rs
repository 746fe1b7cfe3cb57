//! The checkout flow wired end to end.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::backend::StorefrontBackend;
use crate::cart_store::CartStore;
use crate::checkout::{CheckoutAttempt, CheckoutFlight, CheckoutOrchestrator};
use crate::domain::{CheckoutSession, OrderStatus};
use crate::error::{CheckoutError, ReconcileError};
use crate::gateway::PaymentGateway;
use crate::history::PaymentHistory;
use crate::promo::PromoCodeApplier;
use crate::reconcile::{PaymentOutcome, PendingOrderMarker, StatusReconciler};

/// Owns the shared pieces of the checkout flow and runs the one path every
/// payment takes: submit or resume, open the widget, reconcile, commit.
pub struct CheckoutSystem {
    pub cart: CartStore,
    pub promo: PromoCodeApplier,
    pub history: PaymentHistory,
    orchestrator: CheckoutOrchestrator,
    gateway: PaymentGateway,
    reconciler: StatusReconciler,
    marker: PendingOrderMarker,
}

impl CheckoutSystem {
    pub fn new(backend: Arc<dyn StorefrontBackend>, gateway: PaymentGateway) -> Self {
        // One flag and one marker, shared by everything that reads them.
        let flight = CheckoutFlight::new();
        let marker = PendingOrderMarker::new();

        let cart = CartStore::new(backend.clone());
        let promo = PromoCodeApplier::new(backend.clone(), cart.clone(), flight.clone());
        let orchestrator = CheckoutOrchestrator::new(backend.clone(), flight);
        let reconciler = StatusReconciler::new(backend.clone(), marker.clone());
        let history = PaymentHistory::new(backend);

        Self {
            cart,
            promo,
            history,
            orchestrator,
            gateway,
            reconciler,
            marker,
        }
    }

    /// Live handle to the in-flight flag.
    pub fn flight(&self) -> CheckoutFlight {
        self.orchestrator.flight()
    }

    /// Order id the debug force-success control is scoped to, if any.
    pub async fn tracked_order(&self) -> Option<String> {
        self.marker.current().await
    }

    /// Submit the current cart and carry the payment attempt through the
    /// widget and reconciliation to an outcome.
    #[instrument(skip(self))]
    pub async fn pay_current_cart(&self) -> Result<PaymentOutcome, CheckoutError> {
        let attempt = self.orchestrator.submit().await?;
        self.marker.track(&attempt.session.order_id).await;
        info!(order_id = %attempt.session.order_id, "Order created, opening payment");
        self.drive(attempt).await
    }

    /// Re-enter payment for a PENDING order picked from history. From here
    /// on the path is exactly the one a fresh checkout takes.
    #[instrument(skip(self))]
    pub async fn resume_payment(&self, order_id: &str) -> Result<PaymentOutcome, CheckoutError> {
        let Some(record) = self.history.find(order_id).await? else {
            return Err(CheckoutError::NotResumable {
                order_id: order_id.to_string(),
                reason: "no such order".to_string(),
            });
        };
        let token = match (record.status, record.token) {
            (OrderStatus::Pending, Some(token)) => token,
            (OrderStatus::Pending, None) => {
                return Err(CheckoutError::NotResumable {
                    order_id: order_id.to_string(),
                    reason: "payment session is gone".to_string(),
                })
            }
            (status, _) => {
                return Err(CheckoutError::NotResumable {
                    order_id: order_id.to_string(),
                    reason: format!("order is {status}"),
                })
            }
        };

        self.marker.track(order_id).await;
        info!(order_id, "Resuming payment for pending order");
        let attempt = self.orchestrator.resume(CheckoutSession {
            order_id: order_id.to_string(),
            token,
            redirect_url: None,
        });
        self.drive(attempt).await
    }

    /// Debug control: settle the tracked pending order as paid and commit
    /// the result. Refused for any other order.
    #[instrument(skip(self))]
    pub async fn force_pending_success(
        &self,
        order_id: &str,
    ) -> Result<PaymentOutcome, ReconcileError> {
        let outcome = self.reconciler.force_success(order_id).await?;
        self.commit(&outcome).await;
        Ok(outcome)
    }

    /// The shopper navigates away from checkout.
    pub async fn leave_checkout(&self) {
        self.promo.teardown().await;
    }

    /// One widget session plus reconciliation. The attempt keeps the
    /// in-flight flag up until the outcome is committed.
    async fn drive(&self, attempt: CheckoutAttempt) -> Result<PaymentOutcome, CheckoutError> {
        let signal = self.gateway.open(&attempt.session.token).await?;
        let outcome = self
            .reconciler
            .resolve(&attempt.session.order_id, signal)
            .await;
        self.commit(&outcome).await;
        Ok(outcome)
    }

    /// Apply an outcome to local state. Only a server-confirmed payment
    /// touches the cart.
    async fn commit(&self, outcome: &PaymentOutcome) {
        match outcome {
            PaymentOutcome::Paid { order_id } => {
                info!(order_id = %order_id, "Payment confirmed, cart consumed");
                self.cart.reset().await;
            }
            PaymentOutcome::Pending { order_id } => {
                info!(order_id = %order_id, "Payment pending, order can be resumed later");
            }
            PaymentOutcome::Failed { order_id, message } => {
                warn!(order_id = %order_id, message = %message, "Payment failed");
            }
            PaymentOutcome::Unverified { order_id } => {
                warn!(order_id = %order_id, "Success reported but unconfirmed, keeping the cart");
            }
        }
    }
}
