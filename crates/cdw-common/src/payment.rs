//! Payment execution
//!
//! The payment executor submits the on-chain donation or subscription transaction for a
//! previously computed quote. Subscription execution is multi-step (network switch,
//! signature, approval, ...) and reports each step through a [`ProgressCallback`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{Address, ChainId, DepositMonths, QuoteResult, Token};

/// One-time donation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    /// Quote to execute
    pub quote_result: QuoteResult,
    /// Token the depositor pays with
    pub source_token: Token,
    /// Recipient address
    pub recipient_address: Address,
}

/// One-time donation receipt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationReceipt {
    /// Transaction hash, if the executor reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

/// Subscription request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    /// Quote to execute
    pub quote_result: QuoteResult,
    /// Token the depositor pays with
    pub source_token: Token,
    /// Token the subscription is denominated in
    pub recipient_token: Token,
    /// Monthly amount in USD, as entered
    pub monthly_amount_usd: String,
    /// Address receiving the recurring payments
    pub subscription_target: Address,
    /// Project id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Months prepaid into the subscription balance
    pub deposit_months: DepositMonths,
    /// Prepaid total in USD
    pub total_deposit_usd: String,
}

/// Subscription receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionReceipt {
    /// Transaction hash
    pub transaction_hash: String,
    /// Monthly amount in USD
    pub monthly_amount_usd: String,
    /// Address receiving the recurring payments
    pub subscription_target: Address,
    /// Project id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Chain the deposit originated from
    pub origin_chain_id: ChainId,
    /// Token the deposit originated from
    pub origin_token: Address,
    /// Direct transfer
    pub is_direct_transfer: bool,
    /// Same chain swap
    pub is_same_chain_swap: bool,
}

/// Subscription execution step
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressStep {
    /// Nothing in progress
    #[default]
    Idle,
    /// Switching the wallet network
    SwitchingNetwork,
    /// Waiting for a signature
    Signing,
    /// Building the transaction
    Building,
    /// Refreshing the quote
    Quoting,
    /// Waiting for a token approval
    Approving,
    /// Waiting for confirmation
    Confirming,
}

impl ProgressStep {
    /// Is this a step of an active execution
    pub fn is_active(&self) -> bool {
        !matches!(self, ProgressStep::Idle)
    }
}

impl fmt::Display for ProgressStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressStep::Idle => write!(f, "idle"),
            ProgressStep::SwitchingNetwork => write!(f, "switching_network"),
            ProgressStep::Signing => write!(f, "signing"),
            ProgressStep::Building => write!(f, "building"),
            ProgressStep::Quoting => write!(f, "quoting"),
            ProgressStep::Approving => write!(f, "approving"),
            ProgressStep::Confirming => write!(f, "confirming"),
        }
    }
}

/// Subscription progress report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionProgress {
    /// Step
    pub step: ProgressStep,
    /// Same chain or direct transfer, no bridge leg
    pub is_direct_transfer: bool,
}

/// Progress callback handed to [`PaymentExecutor::execute_subscription`]
pub type ProgressCallback = Arc<dyn Fn(SubscriptionProgress) + Send + Sync>;

/// Payment submission
#[async_trait]
pub trait PaymentExecutor: Send + Sync {
    /// Execute a one-time donation
    async fn execute_donation(&self, request: DonationRequest) -> Result<DonationReceipt, Error>;

    /// Create a monthly subscription, reporting each step through `on_progress`
    async fn execute_subscription(
        &self,
        request: SubscriptionRequest,
        on_progress: ProgressCallback,
    ) -> Result<SubscriptionReceipt, Error>;
}

/// Subscription already registered for a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingSubscription {
    /// Monthly amount in USD
    pub monthly_amount_usd: String,
    /// Remaining prepaid balance in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_usd: Option<String>,
}

/// Lookup of existing subscriptions
#[async_trait]
pub trait SubscriptionLookup: Send + Sync {
    /// Subscription `owner` holds towards `target`, if any
    async fn existing_subscription(
        &self,
        owner: &Address,
        target: &Address,
        project_id: Option<&str>,
    ) -> Result<Option<ExistingSubscription>, Error>;
}
