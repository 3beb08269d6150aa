//! Decimal amount helpers
//!
//! Amounts travel through the flow as the raw strings the user typed. These helpers decide
//! whether such a string is a usable amount and derive USD totals from it.

use crate::types::DepositMonths;

/// Parse a user entered amount, returning it only if it is a finite, positive number
pub fn parse_positive(amount: &str) -> Option<f64> {
    let amount = amount.trim();
    if amount.is_empty() {
        return None;
    }

    match amount.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Some(value),
        _ => None,
    }
}

/// Is the string a usable amount
pub fn is_valid(amount: &str) -> bool {
    parse_positive(amount).is_some()
}

/// Round to cents
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Total prepaid deposit for a monthly amount, formatted with two decimals
pub fn total_deposit(monthly_amount: &str, months: DepositMonths) -> Option<String> {
    let monthly = parse_positive(monthly_amount)?;
    Some(format!(
        "{:.2}",
        round_cents(monthly * f64::from(months.months()))
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("100"), Some(100.0));
        assert_eq!(parse_positive(" 0.5 "), Some(0.5));
        assert_eq!(parse_positive(""), None);
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("-5"), None);
        assert_eq!(parse_positive("abc"), None);
        assert_eq!(parse_positive("NaN"), None);
        assert_eq!(parse_positive("inf"), None);
    }

    #[test]
    fn test_total_deposit() {
        assert_eq!(
            total_deposit("25", DepositMonths::Three).as_deref(),
            Some("75.00")
        );
        assert_eq!(
            total_deposit("9.99", DepositMonths::Twelve).as_deref(),
            Some("119.88")
        );
        assert_eq!(
            total_deposit("0.333", DepositMonths::Three).as_deref(),
            Some("1.00")
        );
        assert_eq!(total_deposit("", DepositMonths::One), None);
    }
}
