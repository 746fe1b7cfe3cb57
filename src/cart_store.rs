//! Client-side view of the server-owned cart.
//!
//! The server owns every number on the cart. This store never adds prices,
//! never applies discounts, never counts items. Each mutation goes to the
//! backend and the fresh snapshot it returns replaces the local one.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::backend::StorefrontBackend;
use crate::domain::Cart;
use crate::error::BackendError;

/// Holds the latest cart snapshot and round-trips every mutation.
#[derive(Clone)]
pub struct CartStore {
    backend: Arc<dyn StorefrontBackend>,
    snapshot: Arc<Mutex<Cart>>,
}

impl CartStore {
    pub fn new(backend: Arc<dyn StorefrontBackend>) -> Self {
        Self {
            backend,
            snapshot: Arc::new(Mutex::new(Cart::default())),
        }
    }

    /// Latest snapshot as last reported by the server.
    pub async fn current(&self) -> Cart {
        self.snapshot.lock().await.clone()
    }

    /// Fetch the cart from the server and replace the local snapshot.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Cart, BackendError> {
        debug!("Sending request");
        let cart = self.backend.fetch_cart().await?;
        self.install(cart.clone()).await;
        Ok(cart)
    }

    /// Remove one item, then re-fetch so the totals stay server-computed.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, item_id: &str) -> Result<Cart, BackendError> {
        debug!("Sending request");
        self.backend.remove_item(item_id).await?;
        self.refresh().await
    }

    /// Empty the cart on the server, then re-fetch.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Cart, BackendError> {
        debug!("Sending request");
        self.backend.clear_cart().await?;
        self.refresh().await
    }

    /// Adopt a snapshot the server handed back from another call.
    pub(crate) async fn install(&self, cart: Cart) {
        *self.snapshot.lock().await = cart;
    }

    /// Drop the local snapshot after the server confirmed payment and
    /// consumed the cart on its side.
    pub(crate) async fn reset(&self) {
        *self.snapshot.lock().await = Cart::default();
    }
}
