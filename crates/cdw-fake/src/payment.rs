//! Fake payment executor and subscription lookup

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdw_common::{
    Address, DonationReceipt, DonationRequest, ExistingSubscription, PaymentExecutor,
    ProgressCallback, ProgressStep, SubscriptionLookup, SubscriptionProgress,
    SubscriptionReceipt, SubscriptionRequest,
};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::Error;

fn transaction_hash() -> String {
    format!("0x{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Steps reported while creating a subscription
pub fn subscription_steps(is_direct_transfer: bool) -> Vec<ProgressStep> {
    if is_direct_transfer {
        vec![
            ProgressStep::Signing,
            ProgressStep::Building,
            ProgressStep::Confirming,
        ]
    } else {
        vec![
            ProgressStep::SwitchingNetwork,
            ProgressStep::Quoting,
            ProgressStep::Approving,
            ProgressStep::Signing,
            ProgressStep::Confirming,
        ]
    }
}

/// Payment executor with scripted failures
///
/// Executions succeed after the configured delay unless a failure was queued.
#[derive(Debug, Clone, Default)]
pub struct FakePaymentExecutor {
    delay: Arc<Mutex<Duration>>,
    failures: Arc<Mutex<VecDeque<Error>>>,
    donations: Arc<Mutex<Vec<DonationRequest>>>,
    subscriptions: Arc<Mutex<Vec<SubscriptionRequest>>>,
}

impl FakePaymentExecutor {
    /// Create a new [`FakePaymentExecutor`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time each execution takes
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Fail the next execution
    pub fn push_failure(&self, error: Error) {
        self.failures.lock().push_back(error);
    }

    /// Donation requests received so far
    pub fn donations(&self) -> Vec<DonationRequest> {
        self.donations.lock().clone()
    }

    /// Subscription requests received so far
    pub fn subscriptions(&self) -> Vec<SubscriptionRequest> {
        self.subscriptions.lock().clone()
    }

    async fn wait(&self) {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PaymentExecutor for FakePaymentExecutor {
    async fn execute_donation(
        &self,
        request: DonationRequest,
    ) -> Result<DonationReceipt, cdw_common::Error> {
        self.donations.lock().push(request);
        self.wait().await;

        if let Some(err) = self.failures.lock().pop_front() {
            tracing::debug!("Fake donation failing: {}", err);
            return Err(err.into());
        }

        Ok(DonationReceipt {
            transaction_hash: Some(transaction_hash()),
        })
    }

    async fn execute_subscription(
        &self,
        request: SubscriptionRequest,
        on_progress: ProgressCallback,
    ) -> Result<SubscriptionReceipt, cdw_common::Error> {
        self.subscriptions.lock().push(request.clone());

        let flags = request.quote_result.flags;
        for step in subscription_steps(flags.is_direct_transfer) {
            on_progress(SubscriptionProgress {
                step,
                is_direct_transfer: flags.is_direct_transfer,
            });
            tokio::task::yield_now().await;
        }

        self.wait().await;

        if let Some(err) = self.failures.lock().pop_front() {
            tracing::debug!("Fake subscription failing: {}", err);
            return Err(err.into());
        }

        Ok(SubscriptionReceipt {
            transaction_hash: transaction_hash(),
            monthly_amount_usd: request.monthly_amount_usd,
            subscription_target: request.subscription_target,
            project_id: request.project_id,
            origin_chain_id: request.source_token.chain_id,
            origin_token: request.source_token.address,
            is_direct_transfer: flags.is_direct_transfer,
            is_same_chain_swap: flags.is_same_chain_swap,
        })
    }
}

/// Subscription registry keyed by owner
#[derive(Debug, Clone, Default)]
pub struct FakeSubscriptionLookup {
    subscriptions: Arc<Mutex<HashMap<Address, ExistingSubscription>>>,
    delay: Arc<Mutex<Duration>>,
    lookups: Arc<Mutex<u64>>,
}

impl FakeSubscriptionLookup {
    /// Create a new [`FakeSubscriptionLookup`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription for `owner`
    pub fn insert(&self, owner: Address, subscription: ExistingSubscription) {
        self.subscriptions.lock().insert(owner, subscription);
    }

    /// Time each lookup takes
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Number of lookups so far
    pub fn lookups(&self) -> u64 {
        *self.lookups.lock()
    }
}

#[async_trait]
impl SubscriptionLookup for FakeSubscriptionLookup {
    async fn existing_subscription(
        &self,
        owner: &Address,
        _target: &Address,
        _project_id: Option<&str>,
    ) -> Result<Option<ExistingSubscription>, cdw_common::Error> {
        *self.lookups.lock() += 1;

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(self.subscriptions.lock().get(owner).cloned())
    }
}
