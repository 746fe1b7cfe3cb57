//! Promo code application. One code at a time, server-validated, and
//! detached again when the shopper leaves checkout without paying.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::backend::StorefrontBackend;
use crate::cart_store::CartStore;
use crate::checkout::CheckoutFlight;
use crate::domain::Cart;
use crate::error::{BackendError, PromoError};

/// Applies and clears the single promo code slot on the cart.
#[derive(Clone)]
pub struct PromoCodeApplier {
    backend: Arc<dyn StorefrontBackend>,
    cart: CartStore,
    flight: CheckoutFlight,
}

impl PromoCodeApplier {
    pub fn new(backend: Arc<dyn StorefrontBackend>, cart: CartStore, flight: CheckoutFlight) -> Self {
        Self {
            backend,
            cart,
            flight,
        }
    }

    /// Send a code to the server. Empty input and a second code are turned
    /// away locally without a request; the server decides everything else.
    #[instrument(skip(self))]
    pub async fn apply(&self, code: &str) -> Result<Cart, PromoError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(PromoError::EmptyCode);
        }
        if let Some(applied) = self.cart.current().await.applied_code {
            return Err(PromoError::AlreadyApplied(applied));
        }

        debug!("Sending request");
        let cart = match self.backend.apply_code(code).await {
            Ok(cart) => cart,
            // The server said no to this code. The cart is untouched.
            Err(BackendError::Validation(message)) => return Err(PromoError::Rejected(message)),
            Err(err) => return Err(PromoError::Backend(err)),
        };
        self.cart.install(cart.clone()).await;
        Ok(cart)
    }

    /// Detach the applied code and re-fetch the cart.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Cart, PromoError> {
        debug!("Sending request");
        self.backend.clear_code().await?;
        Ok(self.cart.refresh().await?)
    }

    /// Leaving checkout. Reads the in-flight flag at this very moment: a
    /// payment attempt that is still running keeps its discount, otherwise
    /// the code is detached so it cannot leak into a later session.
    ///
    /// Failures here are logged and swallowed. Teardown must not fail.
    #[instrument(skip(self))]
    pub async fn teardown(&self) {
        if self.flight.in_flight() {
            debug!("Checkout in flight, keeping applied code");
            return;
        }
        if !self.cart.current().await.has_applied_code() {
            return;
        }
        if let Err(err) = self.clear().await {
            warn!(error = %err, "Failed to detach promo code on teardown");
        }
    }
}
