//! CDW shared types and collaborator traits.
//!
//! This crate is the base foundation for the donation widget core (`cdw`) and its
//! collaborator implementations. It holds the token, quote and error types shared across
//! crates, plus the narrow traits through which the core reaches the outside world:
//! the wallet, the quote engine, the payment executor and the chain catalog.

pub mod amount;
pub mod catalog;
pub mod error;
pub mod payment;
pub mod quote;
pub mod task;
pub mod types;
pub mod wallet;

pub use self::catalog::ChainCatalog;
pub use self::error::{Error, ErrorKind, ErrorValue};
pub use self::payment::{
    DonationReceipt, DonationRequest, ExistingSubscription, PaymentExecutor, ProgressCallback,
    ProgressStep, SubscriptionLookup, SubscriptionProgress, SubscriptionReceipt,
    SubscriptionRequest,
};
pub use self::quote::{QuoteProvider, QuoteRequest};
pub use self::types::{
    Address, ChainId, DepositMonths, DonationType, Quote, QuoteResult, RoutingFlags, Token,
};
pub use self::wallet::{WalletAccount, WalletEvent, WalletProvider};

/// Seconds since unix epoch
pub fn unix_time() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
