//! Payment history and the rule for which orders can re-enter payment.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::backend::StorefrontBackend;
use crate::domain::PaymentRecord;
use crate::error::BackendError;

/// A record can re-enter payment only while the server still says PENDING
/// and the original session token survived.
pub fn resumable(record: &PaymentRecord) -> bool {
    !record.status.is_terminal() && record.token.is_some()
}

/// Read-only view over past payment attempts.
#[derive(Clone)]
pub struct PaymentHistory {
    backend: Arc<dyn StorefrontBackend>,
}

impl PaymentHistory {
    pub fn new(backend: Arc<dyn StorefrontBackend>) -> Self {
        Self { backend }
    }

    /// Fetch every payment attempt the server remembers.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<PaymentRecord>, BackendError> {
        debug!("Sending request");
        self.backend.list_payments().await
    }

    /// Find one record by order id.
    pub async fn find(&self, order_id: &str) -> Result<Option<PaymentRecord>, BackendError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|record| record.order_id == order_id))
    }
}
