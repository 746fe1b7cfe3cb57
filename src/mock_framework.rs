//! # Mock Framework
//!
//! Utilities for testing the checkout flow against a storefront we control.
//!
//! Use [`mock_backend`] to get a backend and a receiver. Every call the flow
//! makes arrives on the receiver as a [`BackendCall`] carrying its oneshot
//! responder. Pop calls with the `expect_*` helpers, assert the request, and
//! script the reply. This makes the server's timing and answers fully
//! deterministic, including failures and never-delivered responses.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::backend::StorefrontBackend;
use crate::domain::{Cart, CartItem, CheckoutSession, ItemKind, OrderStatus, PaymentRecord};
use crate::error::BackendError;
use crate::gateway::{PaymentWidget, WidgetSignal};

/// One request captured from the flow, with the channel to answer it on.
pub enum BackendCall {
    FetchCart {
        respond_to: oneshot::Sender<Result<Cart, BackendError>>,
    },
    RemoveItem {
        item_id: String,
        respond_to: oneshot::Sender<Result<(), BackendError>>,
    },
    ClearCart {
        respond_to: oneshot::Sender<Result<(), BackendError>>,
    },
    ApplyCode {
        code: String,
        respond_to: oneshot::Sender<Result<Cart, BackendError>>,
    },
    ClearCode {
        respond_to: oneshot::Sender<Result<(), BackendError>>,
    },
    Checkout {
        respond_to: oneshot::Sender<Result<CheckoutSession, BackendError>>,
    },
    CheckStatus {
        order_id: String,
        respond_to: oneshot::Sender<Result<OrderStatus, BackendError>>,
    },
    SimulateSuccess {
        order_id: String,
        respond_to: oneshot::Sender<Result<OrderStatus, BackendError>>,
    },
    ListPayments {
        respond_to: oneshot::Sender<Result<Vec<PaymentRecord>, BackendError>>,
    },
}

/// Backend that forwards every call to a channel the test holds.
#[derive(Clone)]
pub struct ChannelBackend {
    sender: mpsc::Sender<BackendCall>,
}

/// Creates a mock backend and a receiver for asserting requests.
pub fn mock_backend(buffer_size: usize) -> (Arc<ChannelBackend>, mpsc::Receiver<BackendCall>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (Arc::new(ChannelBackend { sender }), receiver)
}

fn mock_gone() -> BackendError {
    BackendError::Transport("mock backend dropped".to_string())
}

#[async_trait]
impl StorefrontBackend for ChannelBackend {
    async fn fetch_cart(&self) -> Result<Cart, BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(BackendCall::FetchCart { respond_to })
            .await
            .map_err(|_| mock_gone())?;
        response.await.map_err(|_| mock_gone())?
    }

    async fn remove_item(&self, item_id: &str) -> Result<(), BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(BackendCall::RemoveItem {
                item_id: item_id.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| mock_gone())?;
        response.await.map_err(|_| mock_gone())?
    }

    async fn clear_cart(&self) -> Result<(), BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(BackendCall::ClearCart { respond_to })
            .await
            .map_err(|_| mock_gone())?;
        response.await.map_err(|_| mock_gone())?
    }

    async fn apply_code(&self, code: &str) -> Result<Cart, BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(BackendCall::ApplyCode {
                code: code.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| mock_gone())?;
        response.await.map_err(|_| mock_gone())?
    }

    async fn clear_code(&self) -> Result<(), BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(BackendCall::ClearCode { respond_to })
            .await
            .map_err(|_| mock_gone())?;
        response.await.map_err(|_| mock_gone())?
    }

    async fn checkout(&self) -> Result<CheckoutSession, BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(BackendCall::Checkout { respond_to })
            .await
            .map_err(|_| mock_gone())?;
        response.await.map_err(|_| mock_gone())?
    }

    async fn check_status(&self, order_id: &str) -> Result<OrderStatus, BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(BackendCall::CheckStatus {
                order_id: order_id.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| mock_gone())?;
        response.await.map_err(|_| mock_gone())?
    }

    async fn simulate_success(&self, order_id: &str) -> Result<OrderStatus, BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(BackendCall::SimulateSuccess {
                order_id: order_id.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| mock_gone())?;
        response.await.map_err(|_| mock_gone())?
    }

    async fn list_payments(&self) -> Result<Vec<PaymentRecord>, BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(BackendCall::ListPayments { respond_to })
            .await
            .map_err(|_| mock_gone())?;
        response.await.map_err(|_| mock_gone())?
    }
}

/// Helper to verify that the next call is a cart fetch.
pub async fn expect_fetch_cart(
    receiver: &mut mpsc::Receiver<BackendCall>,
) -> Option<oneshot::Sender<Result<Cart, BackendError>>> {
    match receiver.recv().await {
        Some(BackendCall::FetchCart { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next call removes a cart line.
pub async fn expect_remove_item(
    receiver: &mut mpsc::Receiver<BackendCall>,
) -> Option<(String, oneshot::Sender<Result<(), BackendError>>)> {
    match receiver.recv().await {
        Some(BackendCall::RemoveItem {
            item_id,
            respond_to,
        }) => Some((item_id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call empties the cart.
pub async fn expect_clear_cart(
    receiver: &mut mpsc::Receiver<BackendCall>,
) -> Option<oneshot::Sender<Result<(), BackendError>>> {
    match receiver.recv().await {
        Some(BackendCall::ClearCart { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next call applies a promo code.
pub async fn expect_apply_code(
    receiver: &mut mpsc::Receiver<BackendCall>,
) -> Option<(String, oneshot::Sender<Result<Cart, BackendError>>)> {
    match receiver.recv().await {
        Some(BackendCall::ApplyCode { code, respond_to }) => Some((code, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call detaches the promo code.
pub async fn expect_clear_code(
    receiver: &mut mpsc::Receiver<BackendCall>,
) -> Option<oneshot::Sender<Result<(), BackendError>>> {
    match receiver.recv().await {
        Some(BackendCall::ClearCode { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next call is a checkout submission.
pub async fn expect_checkout(
    receiver: &mut mpsc::Receiver<BackendCall>,
) -> Option<oneshot::Sender<Result<CheckoutSession, BackendError>>> {
    match receiver.recv().await {
        Some(BackendCall::Checkout { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next call is a status check.
pub async fn expect_check_status(
    receiver: &mut mpsc::Receiver<BackendCall>,
) -> Option<(String, oneshot::Sender<Result<OrderStatus, BackendError>>)> {
    match receiver.recv().await {
        Some(BackendCall::CheckStatus {
            order_id,
            respond_to,
        }) => Some((order_id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a forced settlement.
pub async fn expect_simulate_success(
    receiver: &mut mpsc::Receiver<BackendCall>,
) -> Option<(String, oneshot::Sender<Result<OrderStatus, BackendError>>)> {
    match receiver.recv().await {
        Some(BackendCall::SimulateSuccess {
            order_id,
            respond_to,
        }) => Some((order_id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call lists payment history.
pub async fn expect_list_payments(
    receiver: &mut mpsc::Receiver<BackendCall>,
) -> Option<oneshot::Sender<Result<Vec<PaymentRecord>, BackendError>>> {
    match receiver.recv().await {
        Some(BackendCall::ListPayments { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Widget double that pops one scripted signal per opening and records the
/// token each opening was given.
pub struct ScriptedWidget {
    signals: Mutex<VecDeque<WidgetSignal>>,
    tokens: Mutex<Vec<String>>,
}

impl ScriptedWidget {
    pub fn new(signals: impl IntoIterator<Item = WidgetSignal>) -> Arc<Self> {
        Arc::new(Self {
            signals: Mutex::new(signals.into_iter().collect()),
            tokens: Mutex::new(Vec::new()),
        })
    }

    /// Tokens the flow handed to the widget, in order.
    pub async fn seen_tokens(&self) -> Vec<String> {
        self.tokens.lock().await.clone()
    }
}

#[async_trait]
impl PaymentWidget for ScriptedWidget {
    async fn pay(&self, token: &str) -> WidgetSignal {
        self.tokens.lock().await.push(token.to_string());
        // An exhausted script reads as the shopper closing the widget.
        self.signals
            .lock()
            .await
            .pop_front()
            .unwrap_or(WidgetSignal::Closed)
    }
}

/// Two-line cart from the storefront's worked example: Rp 150,000 total.
pub fn sample_cart() -> Cart {
    Cart {
        items: vec![
            CartItem::new(
                "item-1",
                ItemKind::Session,
                "Morning workshop",
                100_000,
                "event-1",
            ),
            CartItem::new(
                "item-2",
                ItemKind::EventPackage,
                "Full event pass",
                50_000,
                "event-1",
            ),
        ],
        applied_code: None,
        total_price: 150_000,
        item_count: 2,
    }
}

/// [`sample_cart`] after the server accepted PROMO10.
pub fn discounted_cart() -> Cart {
    Cart {
        applied_code: Some("PROMO10".to_string()),
        total_price: 135_000,
        ..sample_cart()
    }
}

pub fn sample_session() -> CheckoutSession {
    CheckoutSession {
        order_id: "order_1".to_string(),
        token: "pay-token-1".to_string(),
        redirect_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend() {
        let (backend, mut receiver) = mock_backend(10);

        let fetch_task = tokio::spawn(async move { backend.fetch_cart().await });

        let responder = expect_fetch_cart(&mut receiver)
            .await
            .expect("Expected FetchCart request");
        responder.send(Ok(sample_cart())).unwrap();

        let result = fetch_task.await.unwrap();
        assert_eq!(result, Ok(sample_cart()));
    }

    #[tokio::test]
    async fn test_scripted_widget() {
        let widget = ScriptedWidget::new([WidgetSignal::Closed]);
        assert_eq!(widget.pay("pay-token-1").await, WidgetSignal::Closed);
        // Script exhausted, further openings read as closed too.
        assert_eq!(widget.pay("pay-token-2").await, WidgetSignal::Closed);
        assert_eq!(widget.seen_tokens().await, vec!["pay-token-1", "pay-token-2"]);
    }
}
