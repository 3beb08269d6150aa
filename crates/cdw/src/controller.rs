//! Flow controller
//!
//! The composition root of the widget core. Owns the shared state store, wires wallet
//! notifications into state transitions and routes user actions to the quote coordinator
//! and the two payment orchestrators.

use std::fmt;
use std::sync::Arc;

use cdw_common::{
    task, ChainCatalog, DepositMonths, DonationType, ErrorValue, PaymentExecutor,
    QuoteProvider, SubscriptionLookup, Token, WalletEvent, WalletProvider,
};
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::action::Action;
use crate::config::WidgetConfig;
use crate::donation::DonationOrchestrator;
use crate::events::{DonationTypeChanged, EventEmitter, WidgetEvent};
use crate::quote::QuoteCoordinator;
use crate::state::{FlowState, FlowStep};
use crate::store::StateStore;
use crate::subscription::SubscriptionOrchestrator;

/// Donation flow controller
///
/// Cheap to clone, clones share the same flow.
#[derive(Clone)]
pub struct FlowController {
    config: Arc<WidgetConfig>,
    store: StateStore,
    wallet: Arc<dyn WalletProvider>,
    catalog: Arc<dyn ChainCatalog>,
    lookup: Option<Arc<dyn SubscriptionLookup>>,
    quotes: QuoteCoordinator,
    donation: DonationOrchestrator,
    subscription: SubscriptionOrchestrator,
    events: EventEmitter,
    shutdown: CancellationToken,
    listener: Arc<Mutex<Option<CancellationToken>>>,
    degraded: Option<ErrorValue>,
}

impl fmt::Debug for FlowController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowController")
            .field("config", &self.config)
            .field("state", &self.store.snapshot())
            .field("degraded", &self.degraded)
            .finish_non_exhaustive()
    }
}

impl FlowController {
    /// Create a new [`FlowController`]
    ///
    /// An invalid configuration does not fail construction. The problem is logged and stored
    /// in the flow error, and the controller refuses to quote or execute.
    pub fn new(
        config: WidgetConfig,
        wallet: Arc<dyn WalletProvider>,
        quote_provider: Arc<dyn QuoteProvider>,
        executor: Arc<dyn PaymentExecutor>,
        catalog: Arc<dyn ChainCatalog>,
        lookup: Option<Arc<dyn SubscriptionLookup>>,
    ) -> Self {
        let config = Arc::new(config);

        let (recipient, degraded) = match config.resolve_recipient(catalog.as_ref()) {
            Ok(recipient) => (Some(Arc::new(recipient)), None),
            Err(kind) => {
                tracing::error!(
                    "Invalid widget configuration for recipient `{}`: {}",
                    config.recipient,
                    kind
                );
                (None, Some(ErrorValue::Localized(kind)))
            }
        };

        let store = StateStore::new(FlowState::new(wallet.is_connected()));
        if let Some(error) = degraded.clone() {
            store.dispatch(Action::ErrorRaised(error));
        }

        let events = EventEmitter::new();
        let shutdown = CancellationToken::new();

        let quotes = QuoteCoordinator::new(
            store.clone(),
            quote_provider,
            wallet.clone(),
            recipient.clone(),
            config.quote_debounce(),
            shutdown.clone(),
        );
        let donation = DonationOrchestrator::new(
            store.clone(),
            executor.clone(),
            recipient.clone(),
            events.clone(),
        );
        let subscription = SubscriptionOrchestrator::new(
            store.clone(),
            executor,
            wallet.clone(),
            config.clone(),
            recipient,
            events.clone(),
        );

        Self {
            config,
            store,
            wallet,
            catalog,
            lookup,
            quotes,
            donation,
            subscription,
            events,
            shutdown,
            listener: Arc::new(Mutex::new(None)),
            degraded,
        }
    }

    /// Widget configuration
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Configuration error the controller was built with, if any
    pub fn degraded(&self) -> Option<&ErrorValue> {
        self.degraded.as_ref()
    }

    /// Current state
    pub fn state(&self) -> FlowState {
        self.store.snapshot()
    }

    /// Current step
    pub fn current_step(&self) -> FlowStep {
        self.store.current_step()
    }

    /// Watch state changes
    pub fn watch(&self) -> watch::Receiver<FlowState> {
        self.store.subscribe()
    }

    /// Subscribe to widget events
    pub fn subscribe_events(&self) -> broadcast::Receiver<WidgetEvent> {
        self.events.subscribe()
    }

    /// Quote coordinator
    pub fn quotes(&self) -> &QuoteCoordinator {
        &self.quotes
    }

    /// Start listening to wallet notifications
    ///
    /// Calling it again replaces the previous listener.
    pub fn start(&self) {
        let cancel = self.shutdown.child_token();
        if let Some(previous) = self.listener.lock().replace(cancel.clone()) {
            previous.cancel();
        }

        let mut notifications = self.wallet.subscribe();
        let this = self.clone();

        task::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!("Wallet listener stopped");
                        break;
                    }
                    notification = notifications.recv() => match notification {
                        Ok(event) => this.handle_wallet_event(event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("Wallet listener skipped {} notifications", skipped);
                            this.sync_wallet_connection();
                        }
                        Err(RecvError::Closed) => {
                            tracing::debug!("Wallet notifications closed");
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Widget teardown
    ///
    /// Stops the wallet listener and cancels the pending debounced quote.
    pub fn shutdown(&self) {
        tracing::debug!("Shutting down flow controller");
        self.shutdown.cancel();
        self.quotes.cancel_pending();
    }

    fn sync_wallet_connection(&self) {
        let connected = self.wallet.is_connected();
        if connected {
            self.store
                .dispatch(Action::WalletConnectionChanged { connected });
        } else {
            self.quotes.invalidate();
            self.store.dispatch(Action::Disconnected);
        }
    }

    /// Apply a wallet notification
    #[instrument(skip(self))]
    pub async fn handle_wallet_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::AccountChanged(account) => {
                tracing::debug!("Wallet account changed: {:?}", account.address);
                self.sync_wallet_connection();
                self.refresh_existing_subscription().await;
            }
            WalletEvent::ChainChanged(chain_id) => {
                self.store.dispatch_with(|state| {
                    let clears_token = !state.subscription_executing
                        && state
                            .selected_token
                            .as_ref()
                            .is_some_and(|token| token.chain_id != chain_id);
                    if clears_token {
                        tracing::debug!("Selected token is not on chain {}, clearing", chain_id);
                        self.quotes.invalidate();
                    }
                    Some(((), Action::ChainChanged(chain_id)))
                });
                self.wallet.close_modal();
            }
            WalletEvent::Disconnected => {
                self.quotes.invalidate();
                self.store.dispatch(Action::Disconnected);
            }
        }
    }

    /// Open the wallet connect modal
    pub async fn connect_wallet(&self) {
        match self.wallet.connect().await {
            Ok(account) => {
                tracing::info!("Wallet connected: {:?}", account.address);
                self.sync_wallet_connection();
                self.refresh_existing_subscription().await;
                self.quotes.calculate_quote().await;
            }
            Err(err) => {
                tracing::warn!("Could not connect wallet: {}", err);
                self.store
                    .dispatch(Action::ErrorRaised(ErrorValue::from_execution_error(&err)));
            }
        }
    }

    /// Disconnect the wallet
    pub async fn disconnect_wallet(&self) {
        match self.wallet.disconnect().await {
            Ok(()) => self.handle_wallet_event(WalletEvent::Disconnected).await,
            Err(err) => {
                tracing::warn!("Could not disconnect wallet: {}", err);
                self.store
                    .dispatch(Action::ErrorRaised(ErrorValue::from_execution_error(&err)));
            }
        }
    }

    /// Open the wallet's network selection
    ///
    /// The modal is closed again by the next chain change.
    pub async fn open_network_selection(&self) {
        self.store.dispatch(Action::NetworkModalOpened);

        if let Err(err) = self.wallet.open_network_modal().await {
            tracing::warn!("Could not open network selection: {}", err);
            self.store.dispatch(Action::NetworkModalClosed);
            self.store
                .dispatch(Action::ErrorRaised(ErrorValue::from_execution_error(&err)));
        }
    }

    /// Amount edit
    pub fn set_amount(&self, amount: impl Into<String>) {
        self.quotes.on_amount_changed(amount.into());
    }

    /// Token selection
    pub async fn select_token(&self, token: Option<Token>) {
        self.quotes.on_token_changed(token).await;
    }

    /// Tokens the user can pay with on the wallet's current chain
    pub fn available_tokens(&self) -> Vec<Token> {
        match self.wallet.account().chain_id {
            Some(chain_id) => self.catalog.tokens(chain_id),
            None => Vec::new(),
        }
    }

    /// Retry the quote after a failure
    pub async fn retry_quote(&self) {
        self.quotes.calculate_quote().await;
    }

    /// Toggle between one-time and monthly
    ///
    /// Returns true if the type changed. Selecting the current type is a no-op and emits
    /// nothing.
    #[instrument(skip(self))]
    pub async fn set_donation_type(&self, donation_type: DonationType) -> bool {
        if donation_type == DonationType::Monthly && !self.config.continuous_enabled {
            tracing::warn!("Monthly donations are disabled");
            return false;
        }

        let changed = self.store.dispatch_with(|state| {
            if state.donation_type == donation_type
                || state.is_donating
                || state.is_subscription_flow()
            {
                return None;
            }
            // A quote is only valid for the type it was fetched for
            self.quotes.invalidate();
            Some(((), Action::DonationTypeChanged(donation_type)))
        });
        if changed.is_none() {
            return false;
        }

        self.events
            .emit(WidgetEvent::DonationTypeChanged(DonationTypeChanged {
                donation_type,
            }));

        self.refresh_existing_subscription().await;
        self.quotes.calculate_quote().await;

        true
    }

    /// Donate button
    ///
    /// Executes a one-time donation, or opens the subscription setup for monthly donations.
    pub async fn donate(&self) {
        if let Some(error) = &self.degraded {
            tracing::warn!("Refusing to donate, widget is misconfigured: {}", error);
            return;
        }

        match self.store.read(|state| state.donation_type) {
            DonationType::OneTime => self.donation.execute_donation().await,
            DonationType::Monthly => {
                self.subscription.enter_setup();
            }
        }
    }

    /// Total deposit for a duration on the subscription setup screen
    pub fn deposit_preview(&self, months: DepositMonths) -> Option<String> {
        self.subscription.deposit_preview(months)
    }

    /// Confirm the subscription setup and execute
    pub async fn continue_subscription(&self, months: DepositMonths) {
        self.subscription.continue_setup(months).await;
    }

    /// Leave the subscription flow
    pub fn subscription_back(&self) -> bool {
        self.subscription.back()
    }

    /// Back to the subscription setup after a failure
    pub fn retry_subscription(&self) -> bool {
        self.subscription.retry()
    }

    /// Address subscriptions are paid to
    pub fn effective_subscription_target(&self) -> &str {
        self.config.effective_subscription_target()
    }

    /// Donate again
    ///
    /// Restores every field to its construction-time default in one update. In-flight quote
    /// and payment continuations are invalidated and will not write back.
    pub fn donate_again(&self) {
        tracing::debug!("Resetting flow");
        self.quotes.invalidate();
        self.store.dispatch(Action::Reset {
            wallet_connected: self.wallet.is_connected(),
        });

        if let Some(error) = self.degraded.clone() {
            self.store.dispatch(Action::ErrorRaised(error));
        }
    }

    /// Look up a subscription the connected wallet already holds
    ///
    /// Only for monthly donations with a connected wallet; otherwise the previous result is
    /// cleared. Skipped while another lookup is in flight. A result for an account the wallet
    /// has since switched away from is dropped and the lookup repeated for the new account.
    pub async fn refresh_existing_subscription(&self) {
        let Some(lookup) = self.lookup.as_ref() else {
            return;
        };
        let Ok(target) = self.subscription.subscription_target() else {
            tracing::debug!("No valid subscription target, skipping lookup");
            return;
        };

        loop {
            let Some(owner) = self.wallet.account().address else {
                self.store.try_dispatch(
                    |state| state.existing_subscription.is_some(),
                    Action::ExistingSubscriptionCleared,
                );
                return;
            };

            let eligible = |state: &FlowState| {
                state.donation_type == DonationType::Monthly && state.is_wallet_connected
            };

            let started = self.store.dispatch_with(|state| {
                if !eligible(state) {
                    return state
                        .existing_subscription
                        .is_some()
                        .then_some((false, Action::ExistingSubscriptionCleared));
                }
                if state.is_checking_existing_subscription {
                    tracing::debug!("Existing subscription check already in flight");
                    return None;
                }
                Some((true, Action::ExistingSubscriptionCheckStarted))
            });
            let Some((true, epoch)) = started else {
                return;
            };

            let existing = match lookup
                .existing_subscription(&owner, &target, self.config.project_id.as_deref())
                .await
            {
                Ok(existing) => existing,
                Err(err) => {
                    tracing::warn!("Existing subscription lookup failed: {}", err);
                    None
                }
            };

            if self.wallet.account().address.as_ref() != Some(&owner) {
                tracing::debug!("Wallet switched away from {} during lookup, repeating", owner);
                self.store
                    .dispatch_if_current(epoch, Action::ExistingSubscriptionChecked(None));
                continue;
            }

            if let Some(existing) = &existing {
                tracing::debug!(
                    "Wallet {} already subscribes {} monthly",
                    owner,
                    existing.monthly_amount_usd
                );
            }

            self.store
                .dispatch_if_current(epoch, Action::ExistingSubscriptionChecked(existing));
            return;
        }
    }
}
