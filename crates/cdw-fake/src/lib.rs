//! CDW Fake Collaborators
//!
//! In-memory implementations of the collaborator traits the donation widget core depends on.
//! Used by tests and by hosts that want a demo backend: the wallet connects instantly, quotes
//! are computed locally and payments always confirm, unless a delay or failure is scripted.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod catalog;
pub mod error;
pub mod payment;
pub mod quote;
pub mod wallet;

pub use self::catalog::FakeChainCatalog;
pub use self::error::Error;
pub use self::payment::{FakePaymentExecutor, FakeSubscriptionLookup};
pub use self::quote::{FakeQuoteProvider, FakeQuoteResponse};
pub use self::wallet::FakeWallet;
