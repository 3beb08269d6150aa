//! Monthly subscription flow against fake collaborators

mod common;

use std::time::Duration;

use anyhow::Result;
use cdw::{FlowState, FlowStep, WidgetConfig, WidgetEvent};
use cdw_common::{
    Address, DepositMonths, DonationType, ErrorKind, ErrorValue, ExistingSubscription,
    ProgressStep, WalletEvent, WalletProvider,
};
use cdw_fake::catalog::{ETHEREUM, POLYGON};
use common::*;

const OTHER_DONOR: &str = "0x00000000000000000000000000000000000000bb";

async fn monthly_ready(widget: &TestWidget, amount: &str) -> Result<()> {
    anyhow::ensure!(
        widget
            .controller
            .set_donation_type(DonationType::Monthly)
            .await
    );
    widget.ready(amount).await
}

/// Monthly donation of 25 for three months:
/// 1. Donate opens the setup screen instead of executing
/// 2. Continue executes and `subscription-created` carries the monthly amount
/// 3. Donate again goes back to a one-time donation outside the subscription flow
#[tokio::test]
async fn test_subscription_flow() -> Result<()> {
    let widget = TestWidget::connected()?;
    let mut events = widget.controller.subscribe_events();

    monthly_ready(&widget, "25").await?;

    widget.controller.donate().await;
    let state = widget.state();
    assert_eq!(state.current_step, FlowStep::SubscriptionSetup);
    assert!(state.is_subscription_flow());
    assert_eq!(state.subscription_monthly_amount.as_deref(), Some("25"));
    assert!(widget.executor.subscriptions().is_empty());

    assert_eq!(
        widget.controller.deposit_preview(DepositMonths::One).as_deref(),
        Some("25.00")
    );
    assert_eq!(
        widget.controller.deposit_preview(DepositMonths::Three).as_deref(),
        Some("75.00")
    );
    assert_eq!(
        widget.controller.deposit_preview(DepositMonths::Twelve).as_deref(),
        Some("300.00")
    );

    widget
        .controller
        .continue_subscription(DepositMonths::Three)
        .await;

    let state = widget.state();
    assert_eq!(state.current_step, FlowStep::Success);
    assert!(!state.is_donating);
    assert!(!state.subscription_executing);
    assert_eq!(state.subscription_progress_step, ProgressStep::Idle);
    let success = state.success_data.expect("success data");
    assert!(success.is_subscription);
    assert_eq!(success.monthly_amount.as_deref(), Some("25"));
    assert_eq!(success.chain_name, "Polygon");
    assert_eq!(
        success.wallet_address.as_ref().map(|address| address.as_str()),
        Some(DONOR)
    );

    let request = &widget.executor.subscriptions()[0];
    assert_eq!(request.monthly_amount_usd, "25");
    assert_eq!(request.deposit_months, DepositMonths::Three);
    assert_eq!(request.total_deposit_usd, "75.00");
    assert_eq!(request.subscription_target.as_str(), RECIPIENT);

    let events = drain_events(&mut events);
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], WidgetEvent::DonationTypeChanged(_)));
    match &events[1] {
        WidgetEvent::SubscriptionCreated(receipt) => {
            assert_eq!(receipt.monthly_amount_usd, "25");
            assert_eq!(receipt.subscription_target.as_str(), RECIPIENT);
            assert_eq!(receipt.origin_chain_id, POLYGON);
            assert!(receipt.is_direct_transfer);
        }
        other => anyhow::bail!("Unexpected event {}", other.name()),
    }

    widget.controller.donate_again();

    let state = widget.state();
    assert_eq!(state.donation_type, DonationType::OneTime);
    assert!(!state.is_subscription_flow());
    assert_eq!(state.current_step, FlowStep::Amount);
    assert!(state.subscription_setup_data.is_none());

    Ok(())
}

/// Subscriptions go to the configured target, with the project id attached
#[tokio::test]
async fn test_subscription_target() -> Result<()> {
    let config = WidgetConfig::new(RECIPIENT)
        .with_subscription_target(SUBSCRIPTION_TARGET)
        .with_project_id("42");
    let widget = TestWidget::new(config, true)?;
    assert_eq!(
        widget.controller.effective_subscription_target(),
        SUBSCRIPTION_TARGET
    );

    monthly_ready(&widget, "10").await?;
    widget.controller.donate().await;
    widget
        .controller
        .continue_subscription(DepositMonths::One)
        .await;

    let request = &widget.executor.subscriptions()[0];
    assert_eq!(request.subscription_target.as_str(), SUBSCRIPTION_TARGET);
    assert_eq!(request.project_id.as_deref(), Some("42"));
    assert_eq!(request.total_deposit_usd, "10.00");

    Ok(())
}

/// Going back from setup discards it and returns to ready with the quote intact
#[tokio::test]
async fn test_setup_back() -> Result<()> {
    let widget = TestWidget::connected()?;
    monthly_ready(&widget, "25").await?;
    let quote = widget.state().quote;

    widget.controller.donate().await;
    assert_eq!(widget.controller.current_step(), FlowStep::SubscriptionSetup);

    // The type cannot change inside the flow
    assert!(
        !widget
            .controller
            .set_donation_type(DonationType::OneTime)
            .await
    );

    assert!(widget.controller.subscription_back());

    let state = widget.state();
    assert_eq!(state.current_step, FlowStep::Ready);
    assert!(state.subscription_monthly_amount.is_none());
    assert_eq!(state.quote, quote);
    assert!(!widget.controller.subscription_back());

    Ok(())
}

/// A failed subscription stays on the progress screen, retry goes back to setup
#[tokio::test]
async fn test_subscription_failure_and_retry() -> Result<()> {
    let widget = TestWidget::connected()?;
    monthly_ready(&widget, "25").await?;
    let mut events = widget.controller.subscribe_events();

    widget
        .executor
        .push_failure(cdw_fake::Error::Rejected(ErrorKind::SignatureRejected));

    widget.controller.donate().await;
    widget
        .controller
        .continue_subscription(DepositMonths::Six)
        .await;

    let rejected = Some(ErrorValue::Localized(ErrorKind::SignatureRejected));
    let state = widget.state();
    assert_eq!(state.current_step, FlowStep::SubscriptionProgress);
    assert!(!state.is_donating);
    assert!(!state.subscription_executing);
    assert_eq!(state.subscription_error, rejected);
    assert_eq!(state.error, rejected);
    assert_eq!(state.recipient_amount, "25");
    assert!(state.quote.is_some());

    match drain_events(&mut events).as_slice() {
        [WidgetEvent::DonationFailed(failed)] => {
            assert!(failed.is_subscription);
            assert_eq!(failed.error_key.as_deref(), Some("errors.signatureRejected"));
        }
        other => anyhow::bail!("Unexpected events {:?}", other),
    }

    assert!(widget.controller.retry_subscription());
    let state = widget.state();
    assert_eq!(state.current_step, FlowStep::SubscriptionSetup);
    assert!(state.subscription_error.is_none());
    assert!(!widget.controller.retry_subscription());

    widget
        .controller
        .continue_subscription(DepositMonths::Six)
        .await;
    assert_eq!(widget.controller.current_step(), FlowStep::Success);
    assert_eq!(widget.executor.subscriptions().len(), 2);

    Ok(())
}

/// Chain changes while the subscription executes neither clear the token nor leave the
/// progress screen
#[tokio::test(start_paused = true)]
async fn test_chain_change_during_subscription() -> Result<()> {
    let widget = TestWidget::connected()?;
    monthly_ready(&widget, "25").await?;
    widget.executor.set_delay(Duration::from_secs(1));

    widget.controller.donate().await;

    let controller = widget.controller.clone();
    let executing = tokio::spawn(async move {
        controller
            .continue_subscription(DepositMonths::Three)
            .await
    });

    wait_for_state(&widget.controller, |state| {
        state.subscription_progress_step == ProgressStep::Confirming
    })
    .await?;
    assert!(widget.state().subscription_executing);

    widget
        .controller
        .handle_wallet_event(WalletEvent::ChainChanged(ETHEREUM))
        .await;

    let state = widget.state();
    assert!(state.selected_token.is_some());
    assert_eq!(state.current_step, FlowStep::SubscriptionProgress);
    assert_eq!(widget.wallet.modal_closed(), 1);

    executing.await?;
    assert_eq!(widget.controller.current_step(), FlowStep::Success);

    Ok(())
}

/// Monthly donations can be switched off
#[tokio::test]
async fn test_continuous_disabled() -> Result<()> {
    let widget = TestWidget::new(
        WidgetConfig::new(RECIPIENT).with_continuous_enabled(false),
        true,
    )?;
    let mut events = widget.controller.subscribe_events();

    assert!(
        !widget
            .controller
            .set_donation_type(DonationType::Monthly)
            .await
    );
    assert_eq!(widget.state().donation_type, DonationType::OneTime);
    assert!(drain_events(&mut events).is_empty());

    Ok(())
}

/// Only a real toggle emits `donation-type-changed`, and it invalidates the quote
#[tokio::test]
async fn test_donation_type_toggle() -> Result<()> {
    let widget = TestWidget::connected()?;
    widget.ready("100").await?;
    let mut events = widget.controller.subscribe_events();

    assert!(
        !widget
            .controller
            .set_donation_type(DonationType::OneTime)
            .await
    );
    assert!(drain_events(&mut events).is_empty());

    assert!(
        widget
            .controller
            .set_donation_type(DonationType::Monthly)
            .await
    );
    assert!(
        !widget
            .controller
            .set_donation_type(DonationType::Monthly)
            .await
    );

    let events = drain_events(&mut events);
    assert_eq!(events.len(), 1);
    match &events[0] {
        WidgetEvent::DonationTypeChanged(changed) => {
            assert_eq!(changed.donation_type, DonationType::Monthly)
        }
        other => anyhow::bail!("Unexpected event {}", other.name()),
    }

    // The one-time quote was dropped and fetched again for the monthly donation
    let state = widget.state();
    assert_eq!(state.quote.map(|quote| quote.id).as_deref(), Some("quote-2"));
    assert_eq!(state.current_step, FlowStep::Ready);

    Ok(())
}

/// The existing subscription is looked up for monthly donations and cleared when the
/// preconditions go away
#[tokio::test]
async fn test_existing_subscription() -> Result<()> {
    let widget = TestWidget::connected()?;
    let existing = ExistingSubscription {
        monthly_amount_usd: "10".to_string(),
        balance_usd: Some("30".to_string()),
    };
    widget.lookup.insert(DONOR.parse()?, existing.clone());

    widget.controller.refresh_existing_subscription().await;
    assert_eq!(widget.lookup.lookups(), 0);

    widget
        .controller
        .set_donation_type(DonationType::Monthly)
        .await;
    let state = widget.state();
    assert_eq!(state.existing_subscription, Some(existing.clone()));
    assert!(!state.is_checking_existing_subscription);
    assert_eq!(widget.lookup.lookups(), 1);

    widget
        .controller
        .set_donation_type(DonationType::OneTime)
        .await;
    assert!(widget.state().existing_subscription.is_none());

    widget
        .controller
        .set_donation_type(DonationType::Monthly)
        .await;
    assert_eq!(widget.state().existing_subscription, Some(existing));

    widget
        .controller
        .handle_wallet_event(WalletEvent::Disconnected)
        .await;
    assert!(widget.state().existing_subscription.is_none());

    Ok(())
}

/// A lookup already in flight is not started twice
#[tokio::test(start_paused = true)]
async fn test_existing_subscription_reentry() -> Result<()> {
    let widget = TestWidget::connected()?;
    widget.lookup.set_delay(Duration::from_secs(1));

    let controller = widget.controller.clone();
    let toggling = tokio::spawn(async move {
        controller
            .set_donation_type(DonationType::Monthly)
            .await
    });

    wait_for_state(&widget.controller, |state| {
        state.is_checking_existing_subscription
    })
    .await?;

    widget.controller.refresh_existing_subscription().await;
    assert_eq!(widget.lookup.lookups(), 1);

    assert!(toggling.await?);
    let state = widget.state();
    assert!(!state.is_checking_existing_subscription);
    assert!(state.existing_subscription.is_none());
    assert_eq!(widget.lookup.lookups(), 1);

    Ok(())
}

/// The setup screen freezes amount and token, so the executed monthly amount always matches
/// the quote it executes
#[tokio::test(start_paused = true)]
async fn test_setup_freezes_amount_and_token() -> Result<()> {
    let widget = TestWidget::connected()?;
    monthly_ready(&widget, "25").await?;
    widget.controller.donate().await;
    let calls = widget.quotes.calls();

    widget.controller.set_amount("40");
    widget
        .controller
        .select_token(Some(widget.token(POLYGON, "USDT")?))
        .await;
    widget.controller.retry_quote().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    let state = widget.state();
    assert_eq!(state.current_step, FlowStep::SubscriptionSetup);
    assert_eq!(state.recipient_amount, "25");
    assert_eq!(state.selected_token, Some(widget.polygon_usdc()?));
    assert_eq!(widget.quotes.calls(), calls);
    assert_eq!(
        widget.controller.deposit_preview(DepositMonths::Three).as_deref(),
        Some("75.00")
    );

    widget
        .controller
        .continue_subscription(DepositMonths::Three)
        .await;

    let request = &widget.executor.subscriptions()[0];
    assert_eq!(request.monthly_amount_usd, "25");
    assert_eq!(request.quote_result.quote.recipient_amount, "25");
    assert_eq!(request.total_deposit_usd, "75.00");

    Ok(())
}

/// Switching accounts looks up the existing subscription of the new account
#[tokio::test]
async fn test_account_change_refreshes_existing_subscription() -> Result<()> {
    let widget = TestWidget::connected()?;
    let other: Address = OTHER_DONOR.parse()?;
    let existing = ExistingSubscription {
        monthly_amount_usd: "20".to_string(),
        balance_usd: None,
    };
    widget.lookup.insert(other.clone(), existing.clone());

    widget
        .controller
        .set_donation_type(DonationType::Monthly)
        .await;
    assert!(widget.state().existing_subscription.is_none());
    assert_eq!(widget.lookup.lookups(), 1);

    widget.wallet.simulate_account_change(other);
    widget
        .controller
        .handle_wallet_event(WalletEvent::AccountChanged(widget.wallet.account()))
        .await;

    assert_eq!(widget.state().existing_subscription, Some(existing));
    assert_eq!(widget.lookup.lookups(), 2);

    Ok(())
}

/// A lookup resolving after the wallet switched accounts is not shown for the new account:
/// 1. Lookup for the first account in flight
/// 2. Account switch, its own lookup skipped while the first is in flight
/// 3. First result dropped, lookup repeated for the new account
#[tokio::test(start_paused = true)]
async fn test_account_change_during_lookup() -> Result<()> {
    let widget = TestWidget::connected()?;
    let other: Address = OTHER_DONOR.parse()?;
    let first = ExistingSubscription {
        monthly_amount_usd: "10".to_string(),
        balance_usd: None,
    };
    let second = ExistingSubscription {
        monthly_amount_usd: "20".to_string(),
        balance_usd: None,
    };
    widget.lookup.insert(DONOR.parse()?, first);
    widget.lookup.insert(other.clone(), second.clone());
    widget.lookup.set_delay(Duration::from_secs(1));

    let controller = widget.controller.clone();
    let toggling = tokio::spawn(async move {
        controller
            .set_donation_type(DonationType::Monthly)
            .await
    });

    wait_for_state(&widget.controller, |state| {
        state.is_checking_existing_subscription
    })
    .await?;

    widget.wallet.simulate_account_change(other);
    widget
        .controller
        .handle_wallet_event(WalletEvent::AccountChanged(widget.wallet.account()))
        .await;
    assert_eq!(widget.lookup.lookups(), 1);

    assert!(toggling.await?);

    let state = widget.state();
    assert_eq!(state.existing_subscription, Some(second));
    assert!(!state.is_checking_existing_subscription);
    assert_eq!(widget.lookup.lookups(), 2);

    Ok(())
}

/// Donating again while a subscription executes drops its late progress and result, but the
/// created subscription is still reported
#[tokio::test(start_paused = true)]
async fn test_donate_again_during_subscription() -> Result<()> {
    let widget = TestWidget::connected()?;
    monthly_ready(&widget, "25").await?;
    widget.executor.set_delay(Duration::from_secs(1));
    let mut events = widget.controller.subscribe_events();

    widget.controller.donate().await;

    let controller = widget.controller.clone();
    let executing = tokio::spawn(async move {
        controller
            .continue_subscription(DepositMonths::Three)
            .await
    });

    wait_for_state(&widget.controller, |state| state.subscription_executing).await?;

    widget.controller.donate_again();
    assert_eq!(widget.state(), FlowState::new(true));

    executing.await?;

    let state = widget.state();
    assert_eq!(state, FlowState::new(true));
    assert_eq!(state.subscription_progress_step, ProgressStep::Idle);
    assert_eq!(widget.executor.subscriptions().len(), 1);

    assert!(matches!(
        drain_events(&mut events).as_slice(),
        [WidgetEvent::SubscriptionCreated(_)]
    ));

    Ok(())
}
