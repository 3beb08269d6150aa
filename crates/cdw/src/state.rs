//! Flow state
//!
//! [`FlowState`] is the single authoritative snapshot of the donation flow. It is only ever
//! mutated through [`crate::action::apply_action`], which recomputes
//! [`FlowState::current_step`] after every change.

use std::fmt;

use cdw_common::amount;
use cdw_common::{
    Address, DepositMonths, DonationType, ErrorValue, ExistingSubscription, ProgressStep, Quote,
    QuoteResult, RoutingFlags, Token,
};
use serde::{Deserialize, Serialize};

/// Step of the donation flow
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStep {
    /// Waiting for an amount
    #[default]
    Amount,
    /// Waiting for a wallet connection
    Wallet,
    /// Waiting for a token, or for its quote
    Token,
    /// Quote ready, donate enabled
    Ready,
    /// One-time donation executing
    Processing,
    /// Terminal success screen
    Success,
    /// Subscription deposit duration screen
    SubscriptionSetup,
    /// Subscription execution screen
    SubscriptionProgress,
}

impl FlowStep {
    /// Is a step of the nested subscription flow
    pub fn is_subscription(&self) -> bool {
        matches!(
            self,
            FlowStep::SubscriptionSetup | FlowStep::SubscriptionProgress
        )
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowStep::Amount => write!(f, "amount"),
            FlowStep::Wallet => write!(f, "wallet"),
            FlowStep::Token => write!(f, "token"),
            FlowStep::Ready => write!(f, "ready"),
            FlowStep::Processing => write!(f, "processing"),
            FlowStep::Success => write!(f, "success"),
            FlowStep::SubscriptionSetup => write!(f, "subscription_setup"),
            FlowStep::SubscriptionProgress => write!(f, "subscription_progress"),
        }
    }
}

/// Terminal success snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessData {
    /// Donated amount, or monthly amount for subscriptions
    pub amount: String,
    /// Recipient token symbol
    pub token_symbol: String,
    /// Recipient chain display name
    pub chain_name: String,
    /// Unix timestamp of completion
    pub timestamp: u64,
    /// Was a subscription
    pub is_subscription: bool,
    /// Monthly amount of the subscription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_amount: Option<String>,
    /// Wallet that owns the subscription, for the management link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<Address>,
    /// Transaction hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

/// Parameters captured on the subscription setup screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSetupData {
    /// Monthly amount in USD
    pub monthly_amount: String,
    /// Prepaid months
    pub deposit_months: DepositMonths,
    /// Prepaid total in USD
    pub total_deposit: String,
}

/// Donation flow state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowState {
    /// Amount as entered
    pub recipient_amount: String,
    /// Chosen source token
    pub selected_token: Option<Token>,
    /// Latest quote
    pub quote: Option<Quote>,
    /// Latest quote with routing flags
    pub quote_result: Option<QuoteResult>,
    /// Routing flags of the latest quote
    pub routing: RoutingFlags,
    /// Quote fetch in flight
    pub is_quote_loading: bool,
    /// Payment execution in flight
    pub is_donating: bool,
    /// Mirrors the wallet provider
    pub is_wallet_connected: bool,
    /// One-time or monthly
    pub donation_type: DonationType,
    /// Last failure
    pub error: Option<ErrorValue>,
    /// Success screen shown
    pub show_success_state: bool,
    /// Success snapshot
    pub success_data: Option<SuccessData>,
    /// Derived step
    pub current_step: FlowStep,
    /// Network selection modal open
    pub is_network_modal_open: bool,
    /// Monthly amount captured when entering the subscription flow
    pub subscription_monthly_amount: Option<String>,
    /// Parameters captured on the setup screen
    pub subscription_setup_data: Option<SubscriptionSetupData>,
    /// Current subscription execution step
    pub subscription_progress_step: ProgressStep,
    /// Current subscription execution has no bridge leg
    pub subscription_is_direct_transfer: bool,
    /// Subscription execution in flight
    ///
    /// Generic chain-change handling is suppressed while this is set, the executor switches
    /// networks on its own.
    pub subscription_executing: bool,
    /// Error shown on the subscription screens
    pub subscription_error: Option<ErrorValue>,
    /// Subscription the connected wallet already holds
    pub existing_subscription: Option<ExistingSubscription>,
    /// Existing subscription lookup in flight
    pub is_checking_existing_subscription: bool,
}

impl FlowState {
    /// Construction-time state
    pub fn new(is_wallet_connected: bool) -> Self {
        Self {
            is_wallet_connected,
            ..Default::default()
        }
    }

    /// Entered amount is positive
    pub fn has_valid_amount(&self) -> bool {
        amount::is_valid(&self.recipient_amount)
    }

    /// In the nested subscription flow
    pub fn is_subscription_flow(&self) -> bool {
        self.current_step.is_subscription()
    }

    /// Donate button enabled
    pub fn can_donate(&self) -> bool {
        self.current_step == FlowStep::Ready
            && !self.is_donating
            && self.quote_result.is_some()
            && self.selected_token.is_some()
    }

    /// Amount and token are frozen
    ///
    /// While a payment executes, and inside the subscription flow, whose monthly amount was
    /// captured on entry and must keep matching the quote it executes.
    pub fn is_form_locked(&self) -> bool {
        self.is_donating || self.current_step.is_subscription()
    }

    pub(crate) fn clear_quote(&mut self) {
        self.quote = None;
        self.quote_result = None;
        self.routing = RoutingFlags::default();
        self.is_quote_loading = false;
    }

    pub(crate) fn clear_subscription_flow(&mut self) {
        self.subscription_monthly_amount = None;
        self.subscription_setup_data = None;
        self.subscription_progress_step = ProgressStep::Idle;
        self.subscription_is_direct_transfer = false;
        self.subscription_executing = false;
        self.subscription_error = None;
        if self.current_step.is_subscription() {
            // Any non subscription step, the resolver picks the real one
            self.current_step = FlowStep::Amount;
        }
    }
}
