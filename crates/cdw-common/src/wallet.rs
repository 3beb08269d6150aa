//! Wallet provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Error;
use crate::types::{Address, ChainId};

/// Connected account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    /// Account address
    pub address: Option<Address>,
    /// Chain the wallet is currently on
    pub chain_id: Option<ChainId>,
}

/// Wallet notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// Account connected or switched
    AccountChanged(WalletAccount),
    /// Wallet switched network
    ChainChanged(ChainId),
    /// Wallet disconnected
    Disconnected,
}

/// Wallet connectivity
///
/// Notifications are delivered through [`WalletProvider::subscribe`]; dropping the receiver
/// unsubscribes.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Is a wallet connected
    fn is_connected(&self) -> bool;

    /// Current account
    fn account(&self) -> WalletAccount;

    /// Subscribe to account, chain and disconnect notifications
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;

    /// Open the connect modal and wait for a connection
    async fn connect(&self) -> Result<WalletAccount, Error>;

    /// Disconnect
    async fn disconnect(&self) -> Result<(), Error>;

    /// Open the network selection modal
    async fn open_network_modal(&self) -> Result<(), Error>;

    /// Close any open modal
    fn close_modal(&self);
}
