//! Widget events
//!
//! Events consumed by the host page. They are broadcast to every subscriber; a widget with no
//! subscribers simply drops them.

use cdw_common::{Address, DonationType, ErrorValue, RoutingFlags, SubscriptionReceipt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of the event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// `donation-completed` detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationCompleted {
    /// Amount as entered
    pub amount: String,
    /// Source token symbol
    pub token: String,
    /// Recipient address
    pub recipient: Address,
    /// Direct transfer
    pub is_direct_transfer: bool,
    /// Same chain swap
    pub is_same_chain_swap: bool,
    /// Transaction hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

/// `donation-failed` detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationFailed {
    /// User-facing message
    pub error: String,
    /// Localization key of the error, if structured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_key: Option<String>,
    /// Failure happened in the subscription flow
    pub is_subscription: bool,
    /// Direct transfer
    pub is_direct_transfer: bool,
    /// Same chain swap
    pub is_same_chain_swap: bool,
}

impl DonationFailed {
    /// Build from a normalized error
    pub fn new(error: &ErrorValue, is_subscription: bool, routing: RoutingFlags) -> Self {
        Self {
            error: error.to_string(),
            error_key: error.key().map(str::to_string),
            is_subscription,
            is_direct_transfer: routing.is_direct_transfer,
            is_same_chain_swap: routing.is_same_chain_swap,
        }
    }
}

/// `donation-type-changed` detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationTypeChanged {
    /// New type
    pub donation_type: DonationType,
}

/// Widget event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "kebab-case")]
pub enum WidgetEvent {
    /// One-time donation confirmed
    DonationCompleted(DonationCompleted),
    /// One-time donation or subscription failed
    DonationFailed(DonationFailed),
    /// Subscription created
    SubscriptionCreated(SubscriptionReceipt),
    /// Donation type toggled
    DonationTypeChanged(DonationTypeChanged),
}

impl WidgetEvent {
    /// Event name as seen by the host page
    pub fn name(&self) -> &'static str {
        match self {
            WidgetEvent::DonationCompleted(_) => "donation-completed",
            WidgetEvent::DonationFailed(_) => "donation-failed",
            WidgetEvent::SubscriptionCreated(_) => "subscription-created",
            WidgetEvent::DonationTypeChanged(_) => "donation-type-changed",
        }
    }
}

/// Event emitter
#[derive(Debug, Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<WidgetEvent>,
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl EventEmitter {
    /// Create a new [`EventEmitter`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.sender.subscribe()
    }

    /// Emit an event
    pub fn emit(&self, event: WidgetEvent) {
        tracing::debug!("Emitting {}", event.name());
        if self.sender.send(event).is_err() {
            tracing::trace!("No event subscribers");
        }
    }
}
