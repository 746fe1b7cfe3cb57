mod backend;
mod cart_store;
mod checkout;
mod domain;
mod error;
mod gateway;
mod history;
mod promo;
mod reconcile;

mod app_system;

#[cfg(test)]
mod mock_framework;

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{error, info, Instrument};

use crate::app_system::{setup_tracing, CheckoutSystem};
use crate::backend::{HttpBackend, HttpConfig, InMemoryBackend};
use crate::domain::{CartItem, ItemKind};
use crate::gateway::{PaymentGateway, PaymentWidget, WidgetReceipt, WidgetSignal};
use crate::history::resumable;
use crate::reconcile::PaymentOutcome;

/// Demo widget: plays one scripted signal per opening. Success and Error
/// entries reach the store first, the way the real provider settles or
/// declines server-side before its callback fires.
struct SimulatedWidget {
    store: Arc<InMemoryBackend>,
    script: Mutex<VecDeque<WidgetSignal>>,
}

#[async_trait]
impl PaymentWidget for SimulatedWidget {
    async fn pay(&self, token: &str) -> WidgetSignal {
        let next = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or(WidgetSignal::Closed);
        match &next {
            WidgetSignal::Success(_) => {
                self.store.settle_token(token).await;
            }
            WidgetSignal::Error(_) => {
                self.store.decline_token(token).await;
            }
            _ => {}
        }
        next
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    // With CHECKOUT_BASE_URL set, talk to the live storefront instead. No
    // widget is injected in that mode, so it only inspects state.
    if let Some(config) = HttpConfig::from_env() {
        let backend = Arc::new(HttpBackend::new(config).map_err(|e| e.to_string())?);
        let system = CheckoutSystem::new(backend, PaymentGateway::unavailable());
        let cart = system.cart.refresh().await.map_err(|e| e.to_string())?;
        info!(total = cart.total_price, items = cart.item_count, "Live cart");
        for record in &system.history.list().await.map_err(|e| e.to_string())? {
            info!(
                order_id = %record.order_id,
                status = %record.status,
                resumable = resumable(record),
                "History entry"
            );
        }
        return Ok(());
    }

    info!("Starting checkout flow against the in-memory storefront");

    // Seed the store: two items, one accepted promo code.
    let store = Arc::new(InMemoryBackend::new());
    store.accept_code("PROMO10", 15_000).await;
    store
        .seed_item(CartItem::new(
            "item-1",
            ItemKind::Session,
            "Morning workshop",
            100_000,
            "event-1",
        ))
        .await;
    store
        .seed_item(CartItem::new(
            "item-2",
            ItemKind::EventPackage,
            "Full event pass",
            50_000,
            "event-1",
        ))
        .await;

    let widget = Arc::new(SimulatedWidget {
        store: store.clone(),
        script: Mutex::new(VecDeque::from([
            WidgetSignal::Closed,
            WidgetSignal::Success(WidgetReceipt {
                transaction_id: Some("txn-demo-1".to_string()),
                message: "approved".to_string(),
            }),
            WidgetSignal::Pending(WidgetReceipt {
                transaction_id: Some("txn-demo-2".to_string()),
                message: "awaiting bank transfer".to_string(),
            }),
            WidgetSignal::Error(WidgetReceipt {
                transaction_id: None,
                message: "card declined".to_string(),
            }),
        ])),
    });

    let system = CheckoutSystem::new(store.clone(), PaymentGateway::with_widget(widget));

    // Load the cart and play with the promo code
    let span = tracing::info_span!("cart_setup");
    async {
        let cart = system.cart.refresh().await.map_err(|e| e.to_string())?;
        info!(total = cart.total_price, items = cart.item_count, "Cart loaded");

        let cart = system
            .promo
            .apply("PROMO10")
            .await
            .map_err(|e| e.to_string())?;
        info!(total = cart.total_price, "PROMO10 attached");

        match system.promo.apply("SOMETHING-ELSE").await {
            Err(e) => info!(reason = %e, "Second code refused, PROMO10 stays"),
            Ok(_) => return Err("a second code should never apply".to_string()),
        }
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    // Walking away from checkout with no payment running detaches the code
    system.leave_checkout().await;
    let cart = system.cart.current().await;
    info!(
        has_code = cart.has_applied_code(),
        total = cart.total_price,
        "Left checkout without paying"
    );

    // Back to checkout: reattach the code, drop one item
    let cart = system
        .promo
        .apply("PROMO10")
        .await
        .map_err(|e| e.to_string())?;
    info!(total = cart.total_price, "PROMO10 attached again");
    let cart = system
        .cart
        .remove_item("item-2")
        .await
        .map_err(|e| e.to_string())?;
    info!(total = cart.total_price, items = cart.item_count, "Item removed");

    // First attempt: the shopper closes the widget without paying
    let span = tracing::info_span!("first_attempt");
    let outcome = async {
        info!("Submitting checkout");
        system.pay_current_cart().await
    }
    .instrument(span)
    .await;
    match outcome {
        Ok(PaymentOutcome::Pending { order_id }) => {
            info!(order_id = %order_id, "Payment still pending, cart kept")
        }
        Ok(other) => info!(outcome = ?other, "First attempt resolved"),
        Err(e) => error!(error = %e, "First attempt failed"),
    }
    // The attempt resolved, so the pay button is usable again
    info!(
        checkout_enabled = !system.flight().in_flight(),
        "Back on the cart screen"
    );

    // Pick the pending order from history and pay it for real this time
    let span = tracing::info_span!("resume");
    async {
        let records = system.history.list().await.map_err(|e| e.to_string())?;
        let Some(record) = records.iter().find(|record| resumable(record)) else {
            info!("Nothing to resume");
            return Ok(());
        };
        info!(order_id = %record.order_id, amount = record.amount, "Resuming pending order");
        let outcome = system
            .resume_payment(&record.order_id)
            .await
            .map_err(|e| e.to_string())?;
        info!(outcome = ?outcome, "Resume resolved");
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    let cart = system.cart.current().await;
    info!(items = cart.item_count, "Cart after confirmed payment");

    // Second purchase ends in a bank transfer, settled via the debug control
    store
        .seed_item(CartItem::new(
            "item-3",
            ItemKind::Session,
            "Evening session",
            75_000,
            "event-2",
        ))
        .await;
    system.cart.refresh().await.map_err(|e| e.to_string())?;

    let span = tracing::info_span!("second_attempt");
    let outcome = async { system.pay_current_cart().await }
        .instrument(span)
        .await;
    match outcome {
        Ok(PaymentOutcome::Pending { order_id }) => {
            info!(order_id = %order_id, "Bank transfer pending");
            // The debug control only accepts the order the marker tracks.
            let target = system
                .tracked_order()
                .await
                .ok_or_else(|| "no pending order tracked".to_string())?;
            let outcome = system
                .force_pending_success(&target)
                .await
                .map_err(|e| e.to_string())?;
            info!(
                order_id = outcome.order_id(),
                "Debug force-success settled the order"
            );
        }
        Ok(other) => info!(outcome = ?other, "Second attempt resolved"),
        Err(e) => error!(error = %e, "Second attempt failed"),
    }

    // Third purchase: the card is declined. The order dies, the cart does
    // not, and the shopper empties it by hand.
    store
        .seed_item(CartItem::new(
            "item-4",
            ItemKind::EventPackage,
            "Weekend pass",
            125_000,
            "event-2",
        ))
        .await;
    system.cart.refresh().await.map_err(|e| e.to_string())?;

    let span = tracing::info_span!("third_attempt");
    let outcome = async { system.pay_current_cart().await }
        .instrument(span)
        .await;
    match outcome {
        Ok(PaymentOutcome::Failed { order_id, message }) => {
            info!(order_id = %order_id, reason = %message, "Payment declined, cart kept")
        }
        Ok(other) => info!(outcome = ?other, "Third attempt resolved"),
        Err(e) => error!(error = %e, "Third attempt failed"),
    }
    let cart = system.cart.clear().await.map_err(|e| e.to_string())?;
    info!(items = cart.item_count, "Cart emptied");

    // Full payment history as the account screen would list it
    let records = system.history.list().await.map_err(|e| e.to_string())?;
    for record in &records {
        info!(
            order_id = %record.order_id,
            status = %record.status,
            amount = record.amount,
            resumable = resumable(record),
            "History entry"
        );
    }

    info!("Checkout flow completed successfully");
    Ok(())
}
