//! Shared setup for the flow integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use cdw::{FlowController, FlowControllerBuilder, FlowState, FlowStep, WidgetConfig, WidgetEvent};
use cdw_common::{Address, Token};
use cdw_fake::catalog::POLYGON;
use cdw_fake::{
    FakeChainCatalog, FakePaymentExecutor, FakeQuoteProvider, FakeSubscriptionLookup, FakeWallet,
};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

pub const RECIPIENT: &str = "0x1111111111111111111111111111111111111111";
pub const SUBSCRIPTION_TARGET: &str = "0x2222222222222222222222222222222222222222";
pub const DONOR: &str = "0x00000000000000000000000000000000000000aa";

pub fn setup_tracing() {
    let default_filter = "debug";

    let env_filter = EnvFilter::new(default_filter);

    // Ok if successful, Err if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}

/// A controller wired to fake collaborators, with handles to script them
pub struct TestWidget {
    pub controller: FlowController,
    pub wallet: Arc<FakeWallet>,
    pub quotes: Arc<FakeQuoteProvider>,
    pub executor: Arc<FakePaymentExecutor>,
    pub lookup: Arc<FakeSubscriptionLookup>,
    pub catalog: Arc<FakeChainCatalog>,
}

impl TestWidget {
    pub fn new(config: WidgetConfig, connected: bool) -> Result<Self> {
        setup_tracing();

        let donor: Address = DONOR.parse()?;
        let wallet = Arc::new(if connected {
            FakeWallet::connected(donor, POLYGON)
        } else {
            FakeWallet::new(donor, POLYGON)
        });
        let quotes = Arc::new(FakeQuoteProvider::new());
        let executor = Arc::new(FakePaymentExecutor::new());
        let lookup = Arc::new(FakeSubscriptionLookup::new());
        let catalog = Arc::new(FakeChainCatalog::new());

        let controller = FlowControllerBuilder::new()
            .config(config)
            .wallet(wallet.clone())
            .quote_provider(quotes.clone())
            .payment_executor(executor.clone())
            .chain_catalog(catalog.clone())
            .subscription_lookup(lookup.clone())
            .build()?;

        Ok(Self {
            controller,
            wallet,
            quotes,
            executor,
            lookup,
            catalog,
        })
    }

    /// Connected widget paying the default recipient
    pub fn connected() -> Result<Self> {
        Self::new(WidgetConfig::new(RECIPIENT), true)
    }

    /// Another controller on the same collaborators, as if the widget was mounted again
    pub fn remount(&self) -> Result<FlowController> {
        Ok(FlowControllerBuilder::new()
            .config(self.controller.config().clone())
            .wallet(self.wallet.clone())
            .quote_provider(self.quotes.clone())
            .payment_executor(self.executor.clone())
            .chain_catalog(self.catalog.clone())
            .subscription_lookup(self.lookup.clone())
            .build()?)
    }

    pub fn token(&self, chain_id: u64, symbol: &str) -> Result<Token> {
        self.catalog
            .by_symbol(chain_id, symbol)
            .ok_or_else(|| anyhow::anyhow!("No {symbol} on chain {chain_id}"))
    }

    pub fn polygon_usdc(&self) -> Result<Token> {
        self.token(POLYGON, "USDC")
    }

    /// Amount entered and USDC on Polygon selected, quote resolved
    pub async fn ready(&self, amount: &str) -> Result<()> {
        self.controller.set_amount(amount);
        self.controller
            .select_token(Some(self.polygon_usdc()?))
            .await;
        anyhow::ensure!(
            self.controller.current_step() == FlowStep::Ready,
            "Expected ready, got {}",
            self.controller.current_step()
        );
        Ok(())
    }

    pub fn state(&self) -> FlowState {
        self.controller.state()
    }
}

/// Wait until the state satisfies `f`
pub async fn wait_for_state(
    controller: &FlowController,
    f: impl FnMut(&FlowState) -> bool,
) -> Result<()> {
    let mut state = controller.watch();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(f)).await??;
    Ok(())
}

/// Events emitted so far
pub fn drain_events(events: &mut broadcast::Receiver<WidgetEvent>) -> Vec<WidgetEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
