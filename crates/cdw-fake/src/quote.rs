//! Fake quote provider

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdw_common::amount;
use cdw_common::{Quote, QuoteProvider, QuoteRequest, QuoteResult, RoutingFlags};
use parking_lot::Mutex;
use serde_json::json;

use crate::error::Error;

/// Bridge and swap fee charged on converted routes
const FAKE_FEE_RATE: f64 = 0.01;

/// Scripted response of the next quote call
#[derive(Debug, Clone)]
pub struct FakeQuoteResponse {
    /// Time the call takes
    pub delay: Duration,
    /// Error returned instead of a quote
    pub error: Option<Error>,
}

impl FakeQuoteResponse {
    /// Succeed after `delay`
    pub fn ok_after(delay: Duration) -> Self {
        Self { delay, error: None }
    }

    /// Fail with `error`
    pub fn err(error: Error) -> Self {
        Self {
            delay: Duration::ZERO,
            error: Some(error),
        }
    }
}

/// Quote provider with scripted delays and failures
///
/// Quotes are numbered `quote-1`, `quote-2`, ... in call order. Without a script every call
/// succeeds immediately.
#[derive(Debug, Clone, Default)]
pub struct FakeQuoteProvider {
    calls: Arc<AtomicU64>,
    script: Arc<Mutex<VecDeque<FakeQuoteResponse>>>,
    requests: Arc<Mutex<Vec<QuoteRequest>>>,
}

impl FakeQuoteProvider {
    /// Create a new [`FakeQuoteProvider`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response of a future call
    pub fn push_response(&self, response: FakeQuoteResponse) {
        self.script.lock().push_back(response);
    }

    /// Number of calls so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<QuoteRequest> {
        self.requests.lock().clone()
    }

    fn quote(id: u64, request: &QuoteRequest) -> QuoteResult {
        let same_chain = request.source_token.chain_id == request.recipient_token.chain_id;
        let direct = same_chain && request.source_token.address == request.recipient_token.address;
        let flags = RoutingFlags {
            is_direct_transfer: direct,
            is_same_chain_swap: same_chain && !direct,
        };

        let recipient_amount = amount::parse_positive(&request.recipient_amount).unwrap_or_default();
        let (source_amount, fee) = if direct {
            (recipient_amount, 0.0)
        } else {
            let fee = amount::round_cents(recipient_amount * FAKE_FEE_RATE);
            (recipient_amount + fee, fee)
        };

        QuoteResult {
            quote: Quote {
                id: format!("quote-{id}"),
                source_amount: format!("{source_amount:.2}"),
                recipient_amount: request.recipient_amount.clone(),
                fee_usd: Some(format!("{fee:.2}")),
                estimated_duration_secs: Some(if same_chain { 15 } else { 120 }),
                route: json!({
                    "fromChainId": request.source_token.chain_id,
                    "toChainId": request.recipient_token.chain_id,
                    "fromToken": request.source_token.address,
                    "toToken": request.recipient_token.address,
                }),
            },
            flags,
        }
    }
}

#[async_trait]
impl QuoteProvider for FakeQuoteProvider {
    async fn calculate_quote(&self, request: QuoteRequest) -> Result<QuoteResult, cdw_common::Error> {
        let id = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().push(request.clone());

        let response = self.script.lock().pop_front();
        let response = response.unwrap_or_else(|| FakeQuoteResponse::ok_after(Duration::ZERO));

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }

        if let Some(err) = response.error {
            tracing::debug!("Fake quote {} failing: {}", id, err);
            return Err(err.into());
        }

        Ok(Self::quote(id, &request))
    }
}
