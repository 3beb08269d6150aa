//! Step resolution

use crate::state::{FlowState, FlowStep};

/// Resolve the current step of the flow from a state snapshot
///
/// First match wins:
/// 1. inside the subscription flow, stay (only explicit transitions leave it)
/// 2. success
/// 3. donating
/// 4. no usable amount
/// 5. no wallet
/// 6. no token
/// 7. quote present and not loading
/// 8. token chosen, quote pending
pub fn resolve_step(state: &FlowState) -> FlowStep {
    if state.current_step.is_subscription() {
        return state.current_step;
    }

    if state.show_success_state {
        return FlowStep::Success;
    }

    if state.is_donating {
        return FlowStep::Processing;
    }

    if !state.has_valid_amount() {
        return FlowStep::Amount;
    }

    if !state.is_wallet_connected {
        return FlowStep::Wallet;
    }

    if state.selected_token.is_none() {
        return FlowStep::Token;
    }

    if state.quote.is_some() && !state.is_quote_loading {
        return FlowStep::Ready;
    }

    FlowStep::Token
}

#[cfg(test)]
mod tests {
    use cdw_common::{Address, Quote, Token};

    use super::*;

    fn usdc() -> Token {
        Token {
            address: Address::zero(),
            symbol: "USDC".to_string(),
            decimals: 6,
            chain_id: 137,
            name: None,
        }
    }

    fn quote() -> Quote {
        Quote {
            id: "q".to_string(),
            source_amount: "100".to_string(),
            recipient_amount: "100".to_string(),
            fee_usd: None,
            estimated_duration_secs: None,
            route: serde_json::Value::Null,
        }
    }

    fn ready_state() -> FlowState {
        FlowState {
            recipient_amount: "100".to_string(),
            is_wallet_connected: true,
            selected_token: Some(usdc()),
            quote: Some(quote()),
            ..Default::default()
        }
    }

    #[test]
    fn test_precedence() {
        let mut state = FlowState::default();
        assert_eq!(resolve_step(&state), FlowStep::Amount);

        state.recipient_amount = "100".to_string();
        assert_eq!(resolve_step(&state), FlowStep::Wallet);

        state.is_wallet_connected = true;
        assert_eq!(resolve_step(&state), FlowStep::Token);

        state.selected_token = Some(usdc());
        state.is_quote_loading = true;
        assert_eq!(resolve_step(&state), FlowStep::Token);

        state.quote = Some(quote());
        assert_eq!(resolve_step(&state), FlowStep::Token);

        state.is_quote_loading = false;
        assert_eq!(resolve_step(&state), FlowStep::Ready);

        state.is_donating = true;
        assert_eq!(resolve_step(&state), FlowStep::Processing);

        state.show_success_state = true;
        assert_eq!(resolve_step(&state), FlowStep::Success);
    }

    #[test]
    fn test_invalid_amounts() {
        for amount in ["", "0", "-1", "abc", "  "] {
            let mut state = ready_state();
            state.recipient_amount = amount.to_string();
            assert_eq!(resolve_step(&state), FlowStep::Amount, "amount {amount:?}");
        }
    }

    #[test]
    fn test_subscription_steps_are_sticky() {
        for step in [FlowStep::SubscriptionSetup, FlowStep::SubscriptionProgress] {
            let mut state = ready_state();
            state.current_step = step;
            assert_eq!(resolve_step(&state), step);

            state.recipient_amount.clear();
            state.selected_token = None;
            state.quote = None;
            state.is_donating = true;
            state.show_success_state = true;
            assert_eq!(resolve_step(&state), step);
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let states = [
            FlowState::default(),
            ready_state(),
            FlowState {
                is_donating: true,
                ..ready_state()
            },
            FlowState {
                current_step: FlowStep::SubscriptionSetup,
                ..ready_state()
            },
        ];

        for mut state in states {
            let first = resolve_step(&state);
            state.current_step = first;
            assert_eq!(resolve_step(&state), first);
        }
    }
}
