//! Quote debouncing and stale response handling

mod common;

use std::time::Duration;

use anyhow::Result;
use cdw::FlowStep;
use cdw_common::{ErrorKind, ErrorValue};
use cdw_fake::catalog::POLYGON;
use cdw_fake::FakeQuoteResponse;
use common::*;

/// Rapid amount edits within the debounce window trigger exactly one fetch, for the last amount
#[tokio::test(start_paused = true)]
async fn test_amount_edits_are_debounced() -> Result<()> {
    let widget = TestWidget::connected()?;

    widget
        .controller
        .select_token(Some(widget.polygon_usdc()?))
        .await;
    assert_eq!(widget.quotes.calls(), 0);

    widget.controller.set_amount("1");
    widget.controller.set_amount("10");
    widget.controller.set_amount("100");
    assert_eq!(widget.controller.current_step(), FlowStep::Token);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(widget.quotes.calls(), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(widget.quotes.calls(), 1);
    assert_eq!(widget.quotes.requests()[0].recipient_amount, "100");
    assert_eq!(widget.controller.current_step(), FlowStep::Ready);

    Ok(())
}

/// Selecting a token with an amount present fetches without waiting for the debounce
#[tokio::test(start_paused = true)]
async fn test_token_change_fetches_immediately() -> Result<()> {
    let widget = TestWidget::connected()?;
    widget.controller.set_amount("100");

    let start = tokio::time::Instant::now();
    widget
        .controller
        .select_token(Some(widget.polygon_usdc()?))
        .await;

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(widget.quotes.calls(), 1);
    assert_eq!(widget.controller.current_step(), FlowStep::Ready);

    Ok(())
}

/// A slow response arriving after a newer one never overwrites it:
/// 1. USDC selected, its quote takes 2s
/// 2. USDT selected while loading, its quote takes 100ms and resolves first
/// 3. The USDC response arrives last and is discarded
#[tokio::test(start_paused = true)]
async fn test_stale_quote_discarded() -> Result<()> {
    let widget = TestWidget::connected()?;
    widget
        .quotes
        .push_response(FakeQuoteResponse::ok_after(Duration::from_secs(2)));
    widget
        .quotes
        .push_response(FakeQuoteResponse::ok_after(Duration::from_millis(100)));

    widget.controller.set_amount("100");

    let controller = widget.controller.clone();
    let usdc = widget.polygon_usdc()?;
    let slow = tokio::spawn(async move { controller.select_token(Some(usdc)).await });
    wait_for_state(&widget.controller, |state| state.is_quote_loading).await?;

    let usdt = widget.token(POLYGON, "USDT")?;
    widget.controller.select_token(Some(usdt.clone())).await;

    let state = widget.state();
    assert_eq!(state.quote.as_ref().map(|quote| quote.id.as_str()), Some("quote-2"));
    assert!(state.routing.is_same_chain_swap);

    slow.await?;

    let state = widget.state();
    assert_eq!(state.quote.as_ref().map(|quote| quote.id.as_str()), Some("quote-2"));
    assert_eq!(state.selected_token, Some(usdt));
    assert_eq!(state.current_step, FlowStep::Ready);
    assert_eq!(widget.quotes.calls(), 2);

    Ok(())
}

/// Editing the amount while a fetch is in flight supersedes it
#[tokio::test(start_paused = true)]
async fn test_amount_edit_supersedes_inflight_quote() -> Result<()> {
    let widget = TestWidget::connected()?;
    widget
        .quotes
        .push_response(FakeQuoteResponse::ok_after(Duration::from_secs(2)));

    widget.controller.set_amount("100");
    let controller = widget.controller.clone();
    let usdc = widget.polygon_usdc()?;
    let slow = tokio::spawn(async move { controller.select_token(Some(usdc)).await });
    wait_for_state(&widget.controller, |state| state.is_quote_loading).await?;

    widget.controller.set_amount("250");
    let state = widget.state();
    assert!(state.quote.is_none());
    assert!(!state.is_quote_loading);

    // The debounced fetch for 250 resolves at 500ms, the 100 response at 2s is dropped
    slow.await?;

    let state = widget.state();
    let quote = state.quote.expect("quote for the new amount");
    assert_eq!(quote.id, "quote-2");
    assert_eq!(quote.recipient_amount, "250");
    assert_eq!(state.current_step, FlowStep::Ready);
    assert_eq!(widget.quotes.calls(), 2);

    Ok(())
}

/// Quote failures keep amount and token, and a retry recovers
#[tokio::test]
async fn test_quote_failure_and_retry() -> Result<()> {
    let widget = TestWidget::connected()?;
    widget
        .quotes
        .push_response(FakeQuoteResponse::err(cdw_fake::Error::Generic(
            "Route temporarily unavailable".to_string(),
        )));
    widget
        .quotes
        .push_response(FakeQuoteResponse::err(cdw_fake::Error::Rejected(
            ErrorKind::InsufficientLiquidity,
        )));

    widget.controller.set_amount("100");
    widget
        .controller
        .select_token(Some(widget.polygon_usdc()?))
        .await;

    let state = widget.state();
    assert_eq!(
        state.error,
        Some(ErrorValue::Message("Route temporarily unavailable".to_string()))
    );
    assert!(!state.is_quote_loading);
    assert_eq!(state.recipient_amount, "100");
    assert!(state.selected_token.is_some());
    assert_eq!(state.current_step, FlowStep::Token);

    widget.controller.retry_quote().await;
    assert_eq!(
        widget.state().error,
        Some(ErrorValue::Localized(ErrorKind::InsufficientLiquidity))
    );

    widget.controller.retry_quote().await;
    let state = widget.state();
    assert!(state.error.is_none());
    assert_eq!(state.current_step, FlowStep::Ready);

    Ok(())
}

/// Shutdown cancels the pending debounced fetch
#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_quote() -> Result<()> {
    let widget = TestWidget::connected()?;
    widget
        .controller
        .select_token(Some(widget.polygon_usdc()?))
        .await;

    widget.controller.set_amount("100");
    widget.controller.shutdown();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(widget.quotes.calls(), 0);
    assert_eq!(widget.controller.current_step(), FlowStep::Token);

    Ok(())
}
