//! Quote provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{Address, QuoteResult, Token};

/// Quote request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Token the depositor pays with
    pub source_token: Token,
    /// Amount the recipient should receive, as entered
    pub recipient_amount: String,
    /// Token the recipient receives
    pub recipient_token: Token,
    /// Connected wallet address
    pub depositor_address: Address,
    /// Recipient address
    pub recipient_address: Address,
}

/// Cross-chain quote computation
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Compute a quote for converting the source token into the recipient amount
    async fn calculate_quote(&self, request: QuoteRequest) -> Result<QuoteResult, Error>;
}
