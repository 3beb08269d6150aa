use std::sync::Arc;

use cdw_common::{ChainCatalog, PaymentExecutor, QuoteProvider, SubscriptionLookup, WalletProvider};

use crate::config::WidgetConfig;
use crate::controller::FlowController;
use crate::error::Error;

/// Builder for creating a new [`FlowController`]
#[derive(Default)]
#[allow(missing_debug_implementations)]
pub struct FlowControllerBuilder {
    config: Option<WidgetConfig>,
    wallet: Option<Arc<dyn WalletProvider>>,
    quote_provider: Option<Arc<dyn QuoteProvider>>,
    executor: Option<Arc<dyn PaymentExecutor>>,
    catalog: Option<Arc<dyn ChainCatalog>>,
    lookup: Option<Arc<dyn SubscriptionLookup>>,
}

impl FlowControllerBuilder {
    /// Create a new FlowControllerBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the widget configuration
    pub fn config(mut self, config: WidgetConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the wallet provider
    pub fn wallet(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Set the quote provider
    pub fn quote_provider(mut self, quote_provider: Arc<dyn QuoteProvider>) -> Self {
        self.quote_provider = Some(quote_provider);
        self
    }

    /// Set the payment executor
    pub fn payment_executor(mut self, executor: Arc<dyn PaymentExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Set the chain catalog
    pub fn chain_catalog(mut self, catalog: Arc<dyn ChainCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the existing subscription lookup
    ///
    /// Optional. Without it the widget never reports an existing subscription.
    pub fn subscription_lookup(mut self, lookup: Arc<dyn SubscriptionLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Build the controller
    ///
    /// Fails only on a missing part. An invalid configuration still builds, in degraded mode.
    pub fn build(self) -> Result<FlowController, Error> {
        let config = self.config.ok_or(Error::Missing("Config"))?;
        let wallet = self.wallet.ok_or(Error::Missing("Wallet provider"))?;
        let quote_provider = self
            .quote_provider
            .ok_or(Error::Missing("Quote provider"))?;
        let executor = self.executor.ok_or(Error::Missing("Payment executor"))?;
        let catalog = self.catalog.ok_or(Error::Missing("Chain catalog"))?;

        Ok(FlowController::new(
            config,
            wallet,
            quote_provider,
            executor,
            catalog,
            self.lookup,
        ))
    }
}
