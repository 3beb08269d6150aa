//! Quote coordination
//!
//! Turns amount and token edits into quote fetches. Amount edits are debounced on the
//! trailing edge, token edits fetch immediately. Every fetch is stamped with a request
//! generation; a response is only committed if its generation is still the latest, so a
//! slow response can never overwrite a newer one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cdw_common::amount::is_valid;
use cdw_common::{task, Address, ErrorValue, QuoteProvider, QuoteRequest, Token, WalletProvider};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::action::Action;
use crate::config::Recipient;
use crate::state::FlowState;
use crate::store::StateStore;

/// Quote coordinator
#[derive(Clone)]
pub struct QuoteCoordinator {
    store: StateStore,
    provider: Arc<dyn QuoteProvider>,
    wallet: Arc<dyn WalletProvider>,
    recipient: Option<Arc<Recipient>>,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    pending: Arc<Mutex<Option<CancellationToken>>>,
    shutdown: CancellationToken,
}

impl fmt::Debug for QuoteCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuoteCoordinator")
            .field("debounce", &self.debounce)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl QuoteCoordinator {
    /// Create a new [`QuoteCoordinator`]
    pub fn new(
        store: StateStore,
        provider: Arc<dyn QuoteProvider>,
        wallet: Arc<dyn WalletProvider>,
        recipient: Option<Arc<Recipient>>,
        debounce: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            provider,
            wallet,
            recipient,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Arc::new(Mutex::new(None)),
            shutdown,
        }
    }

    /// Latest request generation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store a new amount and schedule a debounced fetch if a token is selected
    ///
    /// Ignored while the form is locked.
    pub fn on_amount_changed(&self, amount: String) {
        let Some((should_fetch, _)) = self.store.dispatch_with(|state| {
            if state.is_form_locked() || state.recipient_amount == amount {
                return None;
            }
            self.invalidate();
            let should_fetch = state.selected_token.is_some() && is_valid(&amount);
            Some((should_fetch, Action::AmountChanged(amount)))
        }) else {
            return;
        };

        if should_fetch {
            self.schedule();
        }
    }

    /// Store a new token and fetch immediately if an amount is present
    ///
    /// Ignored while the form is locked.
    pub async fn on_token_changed(&self, token: Option<Token>) {
        let Some((should_fetch, _)) = self.store.dispatch_with(|state| {
            if state.is_form_locked() || state.selected_token == token {
                return None;
            }
            self.invalidate();
            let should_fetch = token.is_some() && state.has_valid_amount();
            Some((should_fetch, Action::TokenSelected(token)))
        }) else {
            return;
        };

        if should_fetch {
            self.calculate_quote().await;
        }
    }

    /// Supersede any in-flight fetch and cancel the pending debounce
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel_pending();
    }

    /// Cancel the pending debounce, if any
    pub fn cancel_pending(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.cancel();
        }
    }

    fn schedule(&self) {
        let token = self.shutdown.child_token();
        if let Some(previous) = self.pending.lock().replace(token.clone()) {
            previous.cancel();
        }

        let this = self.clone();
        task::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!("Debounced quote cancelled");
                }
                _ = tokio::time::sleep(this.debounce) => {
                    this.calculate_quote().await;
                }
            }
        });
    }

    fn request_for(
        state: &FlowState,
        recipient: &Recipient,
        depositor_address: Address,
    ) -> Option<QuoteRequest> {
        if state.is_form_locked() || !state.is_wallet_connected || !state.has_valid_amount() {
            return None;
        }

        Some(QuoteRequest {
            source_token: state.selected_token.clone()?,
            recipient_amount: state.recipient_amount.trim().to_string(),
            recipient_token: recipient.token.clone(),
            depositor_address,
            recipient_address: recipient.address.clone(),
        })
    }

    /// Fetch a quote for the current amount and token
    ///
    /// No-op unless an amount, a token, the recipient token and a connected wallet address are
    /// all present.
    #[instrument(skip_all)]
    pub async fn calculate_quote(&self) {
        let (Some(recipient), Some(depositor_address)) =
            (self.recipient.as_deref(), self.wallet.account().address)
        else {
            tracing::trace!("Quote preconditions not met");
            return;
        };

        // Stamped and marked loading in one update
        let Some(((request, generation), epoch)) = self.store.dispatch_with(|state| {
            let request = Self::request_for(state, recipient, depositor_address)?;
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            Some(((request, generation), Action::QuoteRequested))
        }) else {
            tracing::trace!("Quote preconditions not met");
            return;
        };

        tracing::debug!(
            "Requesting quote {} for {} {} on chain {}",
            generation,
            request.recipient_amount,
            request.source_token.symbol,
            request.source_token.chain_id
        );

        let action = match self.provider.calculate_quote(request).await {
            Ok(result) => {
                tracing::debug!(
                    "Quote {} resolved: {} (direct: {}, same chain: {})",
                    generation,
                    result.quote.id,
                    result.flags.is_direct_transfer,
                    result.flags.is_same_chain_swap
                );
                Action::QuoteResolved(result)
            }
            Err(err) => {
                tracing::warn!("Quote {} failed: {}", generation, err);
                Action::QuoteFailed(ErrorValue::from_quote_error(&err))
            }
        };

        let latest = |_: &FlowState| self.generation.load(Ordering::SeqCst) == generation;
        if !self.store.dispatch_if(epoch, latest, action) {
            tracing::debug!("Discarding stale quote {}", generation);
        }
    }
}
