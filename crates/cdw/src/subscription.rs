//! Monthly subscription flow
//!
//! Donating with the monthly type does not execute right away. It opens a nested two-phase
//! flow:
//!
//! ```text
//! Ready
//!   └─> enter_setup()        -> SubscriptionSetup
//!         ├─> back()         -> Ready
//!         └─> continue_setup -> SubscriptionProgress (executing)
//!               ├─> success  -> Success
//!               └─> failure  -> SubscriptionProgress (error)
//!                     ├─> retry() -> SubscriptionSetup
//!                     └─> back()  -> Ready
//! ```
//!
//! While executing, progress reported by the payment executor keeps the flow pinned to the
//! progress screen, and generic chain-change handling is suppressed.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use cdw_common::amount;
use cdw_common::{
    unix_time, Address, DepositMonths, DonationType, ErrorKind, ErrorValue, PaymentExecutor,
    ProgressCallback, SubscriptionProgress, SubscriptionRequest, WalletProvider,
};
use tracing::instrument;
use uuid::Uuid;

use crate::action::Action;
use crate::config::{Recipient, WidgetConfig};
use crate::events::{DonationFailed, EventEmitter, WidgetEvent};
use crate::state::{FlowStep, SubscriptionSetupData, SuccessData};
use crate::store::StateStore;

/// Drives the subscription setup and execution flow
#[derive(Clone)]
pub struct SubscriptionOrchestrator {
    store: StateStore,
    executor: Arc<dyn PaymentExecutor>,
    wallet: Arc<dyn WalletProvider>,
    config: Arc<WidgetConfig>,
    recipient: Option<Arc<Recipient>>,
    events: EventEmitter,
}

impl fmt::Debug for SubscriptionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionOrchestrator")
            .field("config", &self.config)
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

impl SubscriptionOrchestrator {
    /// Create a new [`SubscriptionOrchestrator`]
    pub fn new(
        store: StateStore,
        executor: Arc<dyn PaymentExecutor>,
        wallet: Arc<dyn WalletProvider>,
        config: Arc<WidgetConfig>,
        recipient: Option<Arc<Recipient>>,
        events: EventEmitter,
    ) -> Self {
        Self {
            store,
            executor,
            wallet,
            config,
            recipient,
            events,
        }
    }

    /// Address subscriptions are paid to
    pub fn subscription_target(&self) -> Result<Address, ErrorKind> {
        Address::from_str(self.config.effective_subscription_target())
            .map_err(|_| ErrorKind::InvalidRecipientAddress)
    }

    /// Open the setup screen
    ///
    /// Returns false if the flow is not ready for a monthly donation.
    pub fn enter_setup(&self) -> bool {
        let entered = self.config.continuous_enabled
            && self.store.try_dispatch(
                |state| state.donation_type == DonationType::Monthly && state.can_donate(),
                Action::SubscriptionSetupEntered,
            );
        if !entered {
            tracing::debug!("Subscription setup preconditions not met");
        }
        entered
    }

    /// Total deposit shown for a duration on the setup screen
    pub fn deposit_preview(&self, months: DepositMonths) -> Option<String> {
        let monthly = self
            .store
            .read(|state| state.subscription_monthly_amount.clone())?;
        amount::total_deposit(&monthly, months)
    }

    /// Leave the subscription flow, back to the ready screen
    ///
    /// Allowed from the setup screen and from the progress screen's error state.
    pub fn back(&self) -> bool {
        self.store.try_dispatch(
            |state| match state.current_step {
                FlowStep::SubscriptionSetup => true,
                FlowStep::SubscriptionProgress => !state.subscription_executing,
                _ => false,
            },
            Action::SubscriptionSetupCancelled,
        )
    }

    /// Return to the setup screen after a failure
    pub fn retry(&self) -> bool {
        self.store.try_dispatch(
            |state| {
                state.current_step == FlowStep::SubscriptionProgress
                    && !state.subscription_executing
                    && state.subscription_error.is_some()
            },
            Action::SubscriptionRetried,
        )
    }

    /// Confirm the setup screen and execute the subscription
    #[instrument(skip_all)]
    pub async fn continue_setup(&self, months: DepositMonths) {
        let destination = match (self.recipient.clone(), self.subscription_target()) {
            (Some(recipient), Ok(target)) => Some((recipient, target)),
            _ => None,
        };

        // Checked and marked executing in one update, a concurrent call finds it busy
        let Some(((quote_result, source_token, setup), epoch)) =
            self.store.dispatch_with(|state| {
                if state.current_step != FlowStep::SubscriptionSetup || state.is_donating {
                    return None;
                }
                let monthly_amount = state.subscription_monthly_amount.as_deref()?.trim();
                let setup = SubscriptionSetupData {
                    monthly_amount: monthly_amount.to_string(),
                    deposit_months: months,
                    total_deposit: amount::total_deposit(monthly_amount, months)?,
                };
                let claimed = (
                    state.quote_result.clone()?,
                    state.selected_token.clone()?,
                    setup.clone(),
                );
                Some((claimed, Action::SubscriptionStarted(setup)))
            })
        else {
            tracing::debug!("Subscription execution preconditions not met");
            return;
        };

        let routing = quote_result.flags;

        let Some((recipient, subscription_target)) = destination else {
            let error = ErrorValue::Localized(ErrorKind::MissingConfiguration);
            tracing::error!("Cannot subscribe, recipient is not configured");
            self.store
                .dispatch_if_current(epoch, Action::SubscriptionFailed(error.clone()));
            self.events
                .emit(WidgetEvent::DonationFailed(DonationFailed::new(
                    &error, true, routing,
                )));
            return;
        };

        let operation_id = Uuid::new_v4();

        tracing::info!(
            "Executing subscription {} of {} {}/month for {} months (deposit {}) to {}",
            operation_id,
            setup.monthly_amount,
            recipient.token.symbol,
            months.months(),
            setup.total_deposit,
            subscription_target
        );

        let monthly_amount = setup.monthly_amount;
        let request = SubscriptionRequest {
            quote_result,
            source_token,
            recipient_token: recipient.token.clone(),
            monthly_amount_usd: monthly_amount.clone(),
            subscription_target,
            project_id: self.config.project_id.clone(),
            deposit_months: months,
            total_deposit_usd: setup.total_deposit,
        };

        let store = self.store.clone();
        let on_progress: ProgressCallback = Arc::new(move |progress: SubscriptionProgress| {
            tracing::debug!(
                "Subscription {} step: {} (direct: {})",
                operation_id,
                progress.step,
                progress.is_direct_transfer
            );
            store.dispatch_if_current(epoch, Action::SubscriptionProgressed(progress));
        });

        match self
            .executor
            .execute_subscription(request, on_progress)
            .await
        {
            Ok(receipt) => {
                tracing::info!(
                    "Subscription {} created in {}",
                    operation_id,
                    receipt.transaction_hash
                );

                let success = SuccessData {
                    amount: monthly_amount.clone(),
                    token_symbol: recipient.token.symbol.clone(),
                    chain_name: recipient.chain_name.clone(),
                    timestamp: unix_time(),
                    is_subscription: true,
                    monthly_amount: Some(monthly_amount),
                    wallet_address: self.wallet.account().address,
                    transaction_hash: Some(receipt.transaction_hash.clone()),
                };

                if !self
                    .store
                    .dispatch_if_current(epoch, Action::SubscriptionSucceeded(success))
                {
                    tracing::warn!(
                        "Subscription {} created after the flow was reset",
                        operation_id
                    );
                }

                self.events.emit(WidgetEvent::SubscriptionCreated(receipt));
            }
            Err(err) => {
                tracing::warn!("Subscription {} failed: {}", operation_id, err);

                let error = ErrorValue::from_execution_error(&err);
                self.store
                    .dispatch_if_current(epoch, Action::SubscriptionFailed(error.clone()));
                self.events
                    .emit(WidgetEvent::DonationFailed(DonationFailed::new(
                        &error, true, routing,
                    )));
            }
        }
    }
}
