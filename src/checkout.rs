//! Checkout submission and the in-flight flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::backend::StorefrontBackend;
use crate::domain::CheckoutSession;
use crate::error::CheckoutError;

/// Shared flag that is true for as long as a payment attempt is alive,
/// from just before the submit request leaves until the attempt resolves.
///
/// Observers must read the live value at their own moment of interest,
/// never a copy captured earlier.
#[derive(Debug, Clone, Default)]
pub struct CheckoutFlight {
    active: Arc<AtomicBool>,
}

impl CheckoutFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn begin(&self) -> FlightGuard {
        self.active.store(true, Ordering::SeqCst);
        FlightGuard {
            flight: self.clone(),
        }
    }
}

/// Lowers the flag when dropped, so every exit path lowers it.
#[derive(Debug)]
struct FlightGuard {
    flight: CheckoutFlight,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.flight.active.store(false, Ordering::SeqCst);
    }
}

/// A live payment attempt. Carries the session returned by the server and
/// keeps the in-flight flag raised until dropped.
#[derive(Debug)]
pub struct CheckoutAttempt {
    pub session: CheckoutSession,
    _flight: FlightGuard,
}

/// Turns the current cart into an order and a payment session.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    backend: Arc<dyn StorefrontBackend>,
    flight: CheckoutFlight,
}

impl CheckoutOrchestrator {
    pub fn new(backend: Arc<dyn StorefrontBackend>, flight: CheckoutFlight) -> Self {
        Self { backend, flight }
    }

    pub fn flight(&self) -> CheckoutFlight {
        self.flight.clone()
    }

    /// POST the cart to checkout. The flag goes up before the request
    /// leaves and stays up for as long as the returned attempt lives.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<CheckoutAttempt, CheckoutError> {
        let guard = self.flight.begin();
        debug!("Sending request");
        match self.backend.checkout().await {
            Ok(session) => Ok(CheckoutAttempt {
                session,
                _flight: guard,
            }),
            // Returning without the guard lowers the flag on the error path.
            Err(err) => Err(CheckoutError::Submit(err)),
        }
    }

    /// Re-enter the paying state for an order that already has a session,
    /// without creating a new one.
    pub fn resume(&self, session: CheckoutSession) -> CheckoutAttempt {
        CheckoutAttempt {
            session,
            _flight: self.flight.begin(),
        }
    }
}
