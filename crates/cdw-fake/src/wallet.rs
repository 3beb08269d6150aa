//! Fake wallet provider

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cdw_common::{Address, ChainId, WalletAccount, WalletEvent, WalletProvider};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::Error;

const NOTIFICATION_CAPACITY: usize = 16;

/// In-memory wallet
///
/// `connect` succeeds immediately with the configured account unless a connect error is set.
/// The `simulate_*` helpers change the account and broadcast the matching notification, the
/// way a browser wallet extension would.
#[derive(Debug, Clone)]
pub struct FakeWallet {
    account: Arc<Mutex<Option<WalletAccount>>>,
    pending_account: WalletAccount,
    connect_error: Arc<Mutex<Option<Error>>>,
    notifications: broadcast::Sender<WalletEvent>,
    network_modal_opened: Arc<AtomicUsize>,
    modal_closed: Arc<AtomicUsize>,
}

impl FakeWallet {
    /// Create a new disconnected [`FakeWallet`] that connects as `address` on `chain_id`
    pub fn new(address: Address, chain_id: ChainId) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            account: Arc::new(Mutex::new(None)),
            pending_account: WalletAccount {
                address: Some(address),
                chain_id: Some(chain_id),
            },
            connect_error: Arc::new(Mutex::new(None)),
            notifications,
            network_modal_opened: Arc::new(AtomicUsize::new(0)),
            modal_closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a new already connected [`FakeWallet`]
    pub fn connected(address: Address, chain_id: ChainId) -> Self {
        let wallet = Self::new(address, chain_id);
        *wallet.account.lock() = Some(wallet.pending_account.clone());
        wallet
    }

    /// Make the next `connect` calls fail
    pub fn set_connect_error(&self, error: Option<Error>) {
        *self.connect_error.lock() = error;
    }

    /// Connect without going through `connect`, as if the user approved in the extension
    pub fn simulate_connect(&self) {
        let account = self.pending_account.clone();
        *self.account.lock() = Some(account.clone());
        self.notify(WalletEvent::AccountChanged(account));
    }

    /// Switch account
    pub fn simulate_account_change(&self, address: Address) {
        let account = {
            let mut current = self.account.lock();
            let chain_id = current
                .as_ref()
                .and_then(|account| account.chain_id)
                .or(self.pending_account.chain_id);
            let account = WalletAccount {
                address: Some(address),
                chain_id,
            };
            *current = Some(account.clone());
            account
        };
        self.notify(WalletEvent::AccountChanged(account));
    }

    /// Switch network
    pub fn simulate_chain_change(&self, chain_id: ChainId) {
        if let Some(account) = self.account.lock().as_mut() {
            account.chain_id = Some(chain_id);
        }
        self.notify(WalletEvent::ChainChanged(chain_id));
    }

    /// Disconnect from the extension side
    pub fn simulate_disconnect(&self) {
        self.account.lock().take();
        self.notify(WalletEvent::Disconnected);
    }

    /// Times the network modal was opened
    pub fn network_modal_opened(&self) -> usize {
        self.network_modal_opened.load(Ordering::SeqCst)
    }

    /// Times `close_modal` was called
    pub fn modal_closed(&self) -> usize {
        self.modal_closed.load(Ordering::SeqCst)
    }

    fn notify(&self, event: WalletEvent) {
        tracing::debug!("Fake wallet notification: {:?}", event);
        let _ = self.notifications.send(event);
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    fn is_connected(&self) -> bool {
        self.account.lock().is_some()
    }

    fn account(&self) -> WalletAccount {
        self.account.lock().clone().unwrap_or_default()
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.notifications.subscribe()
    }

    async fn connect(&self) -> Result<WalletAccount, cdw_common::Error> {
        if let Some(err) = self.connect_error.lock().clone() {
            return Err(err.into());
        }

        let account = self.pending_account.clone();
        *self.account.lock() = Some(account.clone());
        Ok(account)
    }

    async fn disconnect(&self) -> Result<(), cdw_common::Error> {
        self.account.lock().take();
        Ok(())
    }

    async fn open_network_modal(&self) -> Result<(), cdw_common::Error> {
        if !self.is_connected() {
            return Err(Error::NotConnected.into());
        }
        self.network_modal_opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close_modal(&self) {
        self.modal_closed.fetch_add(1, Ordering::SeqCst);
    }
}
