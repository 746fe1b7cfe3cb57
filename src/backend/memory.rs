//! In-process storefront. Powers the demo driver and in-process tests
//! through the same port as the HTTP backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backend::StorefrontBackend;
use crate::domain::{Cart, CartItem, CheckoutSession, OrderStatus, PaymentRecord};
use crate::error::BackendError;

struct StoredOrder {
    status: OrderStatus,
    token: String,
    amount: u64,
}

struct StoreState {
    cart: Cart,
    orders: HashMap<String, StoredOrder>,
    order_log: Vec<String>,
    /// Flat rupiah discount per accepted promo code.
    codes: HashMap<String, u64>,
}

/// `StorefrontBackend` backed by plain in-process state.
pub struct InMemoryBackend {
    state: Mutex<StoreState>,
    next_order: AtomicU64,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                cart: Cart::default(),
                orders: HashMap::new(),
                order_log: Vec::new(),
                codes: HashMap::new(),
            }),
            next_order: AtomicU64::new(1),
        }
    }

    /// Register a promo code the store will accept, with its flat discount.
    pub async fn accept_code(&self, code: impl Into<String>, discount: u64) {
        let mut state = self.state.lock().await;
        state.codes.insert(code.into(), discount);
    }

    /// Put an item into the cart. Adding to the cart happens outside the
    /// checkout core, so the store exposes it as a seeding step.
    pub async fn seed_item(&self, item: CartItem) {
        let mut state = self.state.lock().await;
        state.cart.items.push(item);
        retotal(&mut state);
    }

    /// Confirm the payment behind a session token, the way the provider's
    /// asynchronous confirmation would reach the server out-of-band.
    /// Returns false when no PENDING order carries that token.
    pub async fn settle_token(&self, token: &str) -> bool {
        let mut state = self.state.lock().await;
        match pending_for_token(&state, token) {
            Some(id) => {
                settle(&mut state, &id);
                true
            }
            None => false,
        }
    }

    /// Record the provider declining the payment behind a session token,
    /// the failed counterpart of [`Self::settle_token`].
    pub async fn decline_token(&self, token: &str) -> bool {
        let mut state = self.state.lock().await;
        match pending_for_token(&state, token) {
            Some(id) => {
                decline(&mut state, &id);
                true
            }
            None => false,
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Server side of the contract: the one place totals may be computed.
fn retotal(state: &mut StoreState) {
    let gross: u64 = state.cart.items.iter().map(|item| item.price).sum();
    let discount = state
        .cart
        .applied_code
        .as_ref()
        .and_then(|code| state.codes.get(code))
        .copied()
        .unwrap_or(0);
    state.cart.total_price = gross.saturating_sub(discount);
    state.cart.item_count = state.cart.items.len() as u32;
}

fn pending_for_token(state: &StoreState, token: &str) -> Option<String> {
    state
        .orders
        .iter()
        .find(|(_, order)| order.status == OrderStatus::Pending && order.token == token)
        .map(|(id, _)| id.clone())
}

fn settle(state: &mut StoreState, order_id: &str) {
    if let Some(order) = state.orders.get_mut(order_id) {
        order.status = OrderStatus::Paid;
    }
    // The store keeps the cart until payment is confirmed, then consumes it.
    state.cart = Cart::default();
}

fn decline(state: &mut StoreState, order_id: &str) {
    if let Some(order) = state.orders.get_mut(order_id) {
        order.status = OrderStatus::Failed;
    }
    // A failed payment leaves the cart where it was.
}

#[async_trait]
impl StorefrontBackend for InMemoryBackend {
    async fn fetch_cart(&self) -> Result<Cart, BackendError> {
        Ok(self.state.lock().await.cart.clone())
    }

    async fn remove_item(&self, item_id: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        let before = state.cart.items.len();
        state.cart.items.retain(|item| item.id != item_id);
        if state.cart.items.len() == before {
            return Err(BackendError::Validation(format!(
                "Unknown cart item: {item_id}"
            )));
        }
        retotal(&mut state);
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.cart = Cart::default();
        Ok(())
    }

    async fn apply_code(&self, code: &str) -> Result<Cart, BackendError> {
        let mut state = self.state.lock().await;
        if state.cart.applied_code.is_some() {
            return Err(BackendError::Validation(
                "A promo code is already applied".to_string(),
            ));
        }
        if !state.codes.contains_key(code) {
            return Err(BackendError::Validation(format!(
                "Unknown or expired code: {code}"
            )));
        }
        state.cart.applied_code = Some(code.to_string());
        retotal(&mut state);
        Ok(state.cart.clone())
    }

    async fn clear_code(&self) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.cart.applied_code = None;
        retotal(&mut state);
        Ok(())
    }

    async fn checkout(&self) -> Result<CheckoutSession, BackendError> {
        let mut state = self.state.lock().await;
        if state.cart.is_empty() {
            return Err(BackendError::Validation("Cart is empty".to_string()));
        }
        let n = self.next_order.fetch_add(1, Ordering::SeqCst);
        let order_id = format!("order_{n}");
        let token = format!("pay-token-{n}");
        let amount = state.cart.total_price;
        state.orders.insert(
            order_id.clone(),
            StoredOrder {
                status: OrderStatus::Pending,
                token: token.clone(),
                amount,
            },
        );
        state.order_log.push(order_id.clone());
        Ok(CheckoutSession {
            order_id,
            token,
            redirect_url: None,
        })
    }

    async fn check_status(&self, order_id: &str) -> Result<OrderStatus, BackendError> {
        let state = self.state.lock().await;
        state
            .orders
            .get(order_id)
            .map(|order| order.status)
            .ok_or_else(|| BackendError::Validation(format!("Unknown order: {order_id}")))
    }

    async fn simulate_success(&self, order_id: &str) -> Result<OrderStatus, BackendError> {
        let mut state = self.state.lock().await;
        let status = state.orders.get(order_id).map(|order| order.status);
        match status {
            Some(OrderStatus::Pending) => {
                settle(&mut state, order_id);
                Ok(OrderStatus::Paid)
            }
            Some(_) => Err(BackendError::Validation(format!(
                "Order {order_id} is not pending"
            ))),
            None => Err(BackendError::Validation(format!(
                "Unknown order: {order_id}"
            ))),
        }
    }

    async fn list_payments(&self) -> Result<Vec<PaymentRecord>, BackendError> {
        let state = self.state.lock().await;
        let records = state
            .order_log
            .iter()
            .filter_map(|id| {
                state.orders.get(id).map(|order| PaymentRecord {
                    order_id: id.clone(),
                    status: order.status,
                    token: (order.status == OrderStatus::Pending).then(|| order.token.clone()),
                    amount: order.amount,
                })
            })
            .collect();
        Ok(records)
    }
}
