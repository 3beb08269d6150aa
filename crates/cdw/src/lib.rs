//! Cross-chain donation widget core
//!
//! The donation flow as an explicit state machine: a [`FlowState`] snapshot mutated only
//! through [`Action`]s, a pure [`resolve_step`] deciding the visible screen, and a
//! [`FlowController`] that wires the wallet, the quote engine and the payment executor
//! into it.
//!
//! ```text
//! AMOUNT -> WALLET -> TOKEN -> READY -> PROCESSING -> SUCCESS
//!                               └─> SUBSCRIPTION_SETUP -> SUBSCRIPTION_PROGRESS -> SUCCESS
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod action;
mod builder;
pub mod config;
pub mod controller;
pub mod donation;
pub mod error;
pub mod events;
pub mod quote;
pub mod state;
pub mod step;
pub mod store;
pub mod subscription;

#[doc(hidden)]
pub use cdw_common::{self as common, amount, types};

pub use self::action::{apply_action, Action};
pub use self::builder::FlowControllerBuilder;
pub use self::config::{Recipient, WidgetConfig};
pub use self::controller::FlowController;
pub use self::donation::DonationOrchestrator;
pub use self::error::Error;
pub use self::events::{
    DonationCompleted, DonationFailed, DonationTypeChanged, EventEmitter, WidgetEvent,
};
pub use self::quote::QuoteCoordinator;
pub use self::state::{FlowState, FlowStep, SubscriptionSetupData, SuccessData};
pub use self::step::resolve_step;
pub use self::store::StateStore;
pub use self::subscription::SubscriptionOrchestrator;
