//! Flow actions and reducer
//!
//! Every mutation of [`FlowState`] is expressed as an [`Action`]. [`apply_action`] applies it
//! and recomputes the step with [`resolve_step`], so the state machine can be exercised
//! without any collaborator or runtime.

use cdw_common::{
    ChainId, DonationType, ErrorValue, ExistingSubscription, ProgressStep, QuoteResult,
    SubscriptionProgress, Token,
};

use crate::state::{FlowState, FlowStep, SubscriptionSetupData, SuccessData};
use crate::step::resolve_step;

/// Flow action
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Amount edited
    AmountChanged(String),
    /// Source token chosen or cleared
    TokenSelected(Option<Token>),
    /// Wallet connection state re-read from the provider
    WalletConnectionChanged {
        /// Provider reports a connection
        connected: bool,
    },
    /// Wallet switched network
    ChainChanged(ChainId),
    /// Wallet disconnected
    Disconnected,
    /// Network selection modal opened
    NetworkModalOpened,
    /// Network selection modal closed
    NetworkModalClosed,
    /// Donation type toggled
    DonationTypeChanged(DonationType),
    /// Quote fetch issued
    QuoteRequested,
    /// Quote fetch succeeded
    QuoteResolved(QuoteResult),
    /// Quote fetch failed
    QuoteFailed(ErrorValue),
    /// One-time donation submitted
    DonationStarted,
    /// One-time donation confirmed
    DonationSucceeded(SuccessData),
    /// One-time donation failed
    DonationFailed(ErrorValue),
    /// Donate clicked with monthly type
    SubscriptionSetupEntered,
    /// Back from the subscription flow
    SubscriptionSetupCancelled,
    /// Setup confirmed, execution starting
    SubscriptionStarted(SubscriptionSetupData),
    /// Execution step reported
    SubscriptionProgressed(SubscriptionProgress),
    /// Subscription created
    SubscriptionSucceeded(SuccessData),
    /// Subscription execution failed
    SubscriptionFailed(ErrorValue),
    /// Retry from the progress screen's error state
    SubscriptionRetried,
    /// Existing subscription lookup issued
    ExistingSubscriptionCheckStarted,
    /// Existing subscription lookup finished
    ExistingSubscriptionChecked(Option<ExistingSubscription>),
    /// Existing subscription preconditions no longer hold
    ExistingSubscriptionCleared,
    /// Error outside of quote or execution (wallet, configuration)
    ErrorRaised(ErrorValue),
    /// Donate again
    Reset {
        /// Provider reports a connection
        wallet_connected: bool,
    },
}

impl Action {
    /// Action invalidates every async continuation started before it
    pub fn invalidates_continuations(&self) -> bool {
        matches!(self, Action::Reset { .. } | Action::Disconnected)
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::AmountChanged(_) => "amount_changed",
            Action::TokenSelected(_) => "token_selected",
            Action::WalletConnectionChanged { .. } => "wallet_connection_changed",
            Action::ChainChanged(_) => "chain_changed",
            Action::Disconnected => "disconnected",
            Action::NetworkModalOpened => "network_modal_opened",
            Action::NetworkModalClosed => "network_modal_closed",
            Action::DonationTypeChanged(_) => "donation_type_changed",
            Action::QuoteRequested => "quote_requested",
            Action::QuoteResolved(_) => "quote_resolved",
            Action::QuoteFailed(_) => "quote_failed",
            Action::DonationStarted => "donation_started",
            Action::DonationSucceeded(_) => "donation_succeeded",
            Action::DonationFailed(_) => "donation_failed",
            Action::SubscriptionSetupEntered => "subscription_setup_entered",
            Action::SubscriptionSetupCancelled => "subscription_setup_cancelled",
            Action::SubscriptionStarted(_) => "subscription_started",
            Action::SubscriptionProgressed(_) => "subscription_progressed",
            Action::SubscriptionSucceeded(_) => "subscription_succeeded",
            Action::SubscriptionFailed(_) => "subscription_failed",
            Action::SubscriptionRetried => "subscription_retried",
            Action::ExistingSubscriptionCheckStarted => "existing_subscription_check_started",
            Action::ExistingSubscriptionChecked(_) => "existing_subscription_checked",
            Action::ExistingSubscriptionCleared => "existing_subscription_cleared",
            Action::ErrorRaised(_) => "error_raised",
            Action::Reset { .. } => "reset",
        }
    }
}

/// Apply an action and recompute the step
pub fn apply_action(mut state: FlowState, action: Action) -> FlowState {
    reduce(&mut state, action);
    state.current_step = resolve_step(&state);
    state
}

fn reduce(state: &mut FlowState, action: Action) {
    match action {
        Action::AmountChanged(amount) => {
            if state.is_form_locked() || state.recipient_amount == amount {
                return;
            }
            state.recipient_amount = amount;
            state.clear_quote();
        }
        Action::TokenSelected(token) => {
            if state.is_form_locked() || state.selected_token == token {
                return;
            }
            state.selected_token = token;
            state.clear_quote();
        }
        Action::WalletConnectionChanged { connected } => {
            state.is_wallet_connected = connected;
            if !connected {
                state.existing_subscription = None;
            }
        }
        Action::ChainChanged(chain_id) => {
            state.is_network_modal_open = false;
            if state.subscription_executing {
                return;
            }
            if state
                .selected_token
                .as_ref()
                .is_some_and(|token| token.chain_id != chain_id)
            {
                state.selected_token = None;
                state.clear_quote();
            }
        }
        Action::Disconnected => {
            state.is_wallet_connected = false;
            state.selected_token = None;
            state.clear_quote();
            state.existing_subscription = None;
            state.is_checking_existing_subscription = false;
            state.is_donating = false;
            state.is_network_modal_open = false;
            state.clear_subscription_flow();
        }
        Action::NetworkModalOpened => state.is_network_modal_open = true,
        Action::NetworkModalClosed => state.is_network_modal_open = false,
        Action::DonationTypeChanged(donation_type) => {
            if state.donation_type == donation_type {
                return;
            }
            state.donation_type = donation_type;
            state.clear_quote();
            if donation_type == DonationType::OneTime {
                state.existing_subscription = None;
            }
        }
        Action::QuoteRequested => {
            state.clear_quote();
            state.is_quote_loading = true;
            state.error = None;
        }
        Action::QuoteResolved(result) => {
            state.is_quote_loading = false;
            if state.selected_token.is_none() || !state.has_valid_amount() {
                return;
            }
            state.routing = result.flags;
            state.quote = Some(result.quote.clone());
            state.quote_result = Some(result);
        }
        Action::QuoteFailed(error) => {
            state.is_quote_loading = false;
            state.error = Some(error);
        }
        Action::DonationStarted => {
            state.is_donating = true;
            state.error = None;
        }
        Action::DonationSucceeded(success) => {
            state.is_donating = false;
            state.show_success_state = true;
            state.success_data = Some(success);
            state.clear_quote();
        }
        Action::DonationFailed(error) => {
            state.is_donating = false;
            state.error = Some(error);
        }
        Action::SubscriptionSetupEntered => {
            state.subscription_monthly_amount = Some(state.recipient_amount.clone());
            state.subscription_setup_data = None;
            state.subscription_error = None;
            state.subscription_progress_step = ProgressStep::Idle;
            state.current_step = FlowStep::SubscriptionSetup;
        }
        Action::SubscriptionSetupCancelled => {
            state.clear_subscription_flow();
        }
        Action::SubscriptionStarted(setup) => {
            state.subscription_setup_data = Some(setup);
            state.subscription_error = None;
            state.subscription_progress_step = ProgressStep::Idle;
            state.subscription_is_direct_transfer = false;
            state.subscription_executing = true;
            state.is_donating = true;
            state.error = None;
            state.current_step = FlowStep::SubscriptionProgress;
        }
        Action::SubscriptionProgressed(progress) => {
            if !state.subscription_executing {
                return;
            }
            state.subscription_progress_step = progress.step;
            state.subscription_is_direct_transfer = progress.is_direct_transfer;
            if progress.step.is_active() {
                state.current_step = FlowStep::SubscriptionProgress;
            }
        }
        Action::SubscriptionSucceeded(success) => {
            state.is_donating = false;
            state.clear_subscription_flow();
            state.show_success_state = true;
            state.success_data = Some(success);
            state.clear_quote();
        }
        Action::SubscriptionFailed(error) => {
            state.is_donating = false;
            state.subscription_executing = false;
            state.subscription_progress_step = ProgressStep::Idle;
            state.error = Some(error.clone());
            state.subscription_error = Some(error);
        }
        Action::SubscriptionRetried => {
            if state.current_step != FlowStep::SubscriptionProgress
                || state.subscription_executing
            {
                return;
            }
            state.subscription_error = None;
            state.subscription_progress_step = ProgressStep::Idle;
            state.current_step = FlowStep::SubscriptionSetup;
        }
        Action::ExistingSubscriptionCheckStarted => {
            state.is_checking_existing_subscription = true;
        }
        Action::ExistingSubscriptionChecked(existing) => {
            state.is_checking_existing_subscription = false;
            state.existing_subscription =
                if state.donation_type == DonationType::Monthly && state.is_wallet_connected {
                    existing
                } else {
                    None
                };
        }
        Action::ExistingSubscriptionCleared => {
            state.existing_subscription = None;
        }
        Action::ErrorRaised(error) => {
            state.error = Some(error);
        }
        Action::Reset { wallet_connected } => {
            *state = FlowState::new(wallet_connected);
        }
    }
}
