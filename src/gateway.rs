//! Bridge to the provider's payment widget.
//!
//! The widget is injected by the embedding environment; the flow never
//! constructs one itself. Whatever the widget reports is advisory, the
//! server has the last word on every order.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::error::GatewayError;

/// What the widget reports alongside a signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetReceipt {
    pub transaction_id: Option<String>,
    pub message: String,
}

/// The four ways a widget session ends.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetSignal {
    /// The widget believes the payment went through.
    Success(WidgetReceipt),
    /// Payment started but has not settled, e.g. a bank transfer.
    Pending(WidgetReceipt),
    /// The widget hit a payment failure.
    Error(WidgetReceipt),
    /// The shopper dismissed the widget without finishing.
    Closed,
}

/// Provider-supplied payment UI.
#[async_trait]
pub trait PaymentWidget: Send + Sync {
    /// Run one widget session for the given payment token and report how
    /// it ended.
    async fn pay(&self, token: &str) -> WidgetSignal;
}

/// Holds whichever widget the environment injected, if any.
#[derive(Clone, Default)]
pub struct PaymentGateway {
    widget: Option<Arc<dyn PaymentWidget>>,
}

impl PaymentGateway {
    /// A gateway with no widget installed. Opening it fails hard.
    pub fn unavailable() -> Self {
        Self { widget: None }
    }

    pub fn with_widget(widget: Arc<dyn PaymentWidget>) -> Self {
        Self {
            widget: Some(widget),
        }
    }

    /// Open the widget for a payment token and wait for its signal.
    /// A missing widget is a configuration fault, not a payment failure.
    #[instrument(skip(self))]
    pub async fn open(&self, token: &str) -> Result<WidgetSignal, GatewayError> {
        let widget = self
            .widget
            .as_ref()
            .ok_or(GatewayError::WidgetUnavailable)?;
        info!("Opening payment widget");
        Ok(widget.pay(token).await)
    }
}
