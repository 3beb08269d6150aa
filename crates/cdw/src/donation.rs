//! One-time donation execution

use std::fmt;
use std::sync::Arc;

use cdw_common::{unix_time, DonationRequest, ErrorKind, ErrorValue, PaymentExecutor};
use tracing::instrument;
use uuid::Uuid;

use crate::action::Action;
use crate::config::Recipient;
use crate::events::{DonationCompleted, DonationFailed, EventEmitter, WidgetEvent};
use crate::state::SuccessData;
use crate::store::StateStore;

/// Drives one-time donations against the payment executor
#[derive(Clone)]
pub struct DonationOrchestrator {
    store: StateStore,
    executor: Arc<dyn PaymentExecutor>,
    recipient: Option<Arc<Recipient>>,
    events: EventEmitter,
}

impl fmt::Debug for DonationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DonationOrchestrator")
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

impl DonationOrchestrator {
    /// Create a new [`DonationOrchestrator`]
    pub fn new(
        store: StateStore,
        executor: Arc<dyn PaymentExecutor>,
        recipient: Option<Arc<Recipient>>,
        events: EventEmitter,
    ) -> Self {
        Self {
            store,
            executor,
            recipient,
            events,
        }
    }

    /// Execute a one-time donation for the current quote
    ///
    /// No-op without a quote and token, or while another execution is in flight. Failures are
    /// stored in the flow state and emitted as `donation-failed`; amount, token and quote are
    /// kept so the user can retry.
    #[instrument(skip_all)]
    pub async fn execute_donation(&self) {
        let Some(recipient) = self.recipient.clone() else {
            self.refuse_unconfigured();
            return;
        };

        // Checked and marked donating in one update, a concurrent call finds it busy
        let Some(((quote_result, source_token, amount), epoch)) =
            self.store.dispatch_with(|state| {
                if state.is_donating {
                    return None;
                }
                let claimed = (
                    state.quote_result.clone()?,
                    state.selected_token.clone()?,
                    state.recipient_amount.trim().to_string(),
                );
                Some((claimed, Action::DonationStarted))
            })
        else {
            tracing::debug!("Donation preconditions not met");
            return;
        };

        let routing = quote_result.flags;
        let operation_id = Uuid::new_v4();

        tracing::info!(
            "Executing donation {} of {} {} from {} via {} on chain {}",
            operation_id,
            amount,
            recipient.token.symbol,
            source_token.symbol,
            quote_result.quote.id,
            source_token.chain_id
        );

        let request = DonationRequest {
            quote_result,
            source_token: source_token.clone(),
            recipient_address: recipient.address.clone(),
        };

        match self.executor.execute_donation(request).await {
            Ok(receipt) => {
                tracing::info!("Donation {} completed", operation_id);

                let success = SuccessData {
                    amount: amount.clone(),
                    token_symbol: recipient.token.symbol.clone(),
                    chain_name: recipient.chain_name.clone(),
                    timestamp: unix_time(),
                    is_subscription: false,
                    monthly_amount: None,
                    wallet_address: None,
                    transaction_hash: receipt.transaction_hash.clone(),
                };

                if !self
                    .store
                    .dispatch_if_current(epoch, Action::DonationSucceeded(success))
                {
                    tracing::warn!(
                        "Donation {} completed after the flow was reset",
                        operation_id
                    );
                }

                self.events
                    .emit(WidgetEvent::DonationCompleted(DonationCompleted {
                        amount,
                        token: source_token.symbol,
                        recipient: recipient.address.clone(),
                        is_direct_transfer: routing.is_direct_transfer,
                        is_same_chain_swap: routing.is_same_chain_swap,
                        transaction_hash: receipt.transaction_hash,
                    }));
            }
            Err(err) => {
                tracing::warn!("Donation {} failed: {}", operation_id, err);

                let error = ErrorValue::from_execution_error(&err);
                self.store
                    .dispatch_if_current(epoch, Action::DonationFailed(error.clone()));
                self.events
                    .emit(WidgetEvent::DonationFailed(DonationFailed::new(
                        &error, false, routing,
                    )));
            }
        }
    }

    fn refuse_unconfigured(&self) {
        let Some(routing) = self.store.read(|state| {
            if state.is_donating || state.selected_token.is_none() {
                return None;
            }
            state.quote_result.as_ref().map(|result| result.flags)
        }) else {
            tracing::debug!("Donation preconditions not met");
            return;
        };

        let error = ErrorValue::Localized(ErrorKind::MissingConfiguration);
        tracing::error!("Cannot donate, recipient is not configured");
        self.store.dispatch(Action::ErrorRaised(error.clone()));
        self.events
            .emit(WidgetEvent::DonationFailed(DonationFailed::new(
                &error, false, routing,
            )));
    }
}
