//! Errors

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Localizable error kinds
///
/// Each kind maps to a stable localization key the presentation layer resolves, plus an
/// English default message used for logs and hosts without a string table.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Recipient address is not a valid EVM address
    InvalidRecipientAddress,
    /// Entered amount is empty, unparseable or not positive
    InvalidAmount,
    /// Source network is not supported by the quote engine
    UnsupportedNetwork,
    /// Source token is not supported by the quote engine
    UnsupportedToken,
    /// Not enough liquidity to route the transfer
    InsufficientLiquidity,
    /// Wallet balance does not cover the transfer
    InsufficientFunds,
    /// Price moved beyond the allowed slippage
    SlippageExceeded,
    /// No route between source and recipient token
    RouteNotFound,
    /// Quote or routing server is unavailable
    ServerUnavailable,
    /// User rejected the signature request
    SignatureRejected,
    /// User rejected the transaction
    TransactionRejected,
    /// Generic network failure
    NetworkError,
    /// Operation requires a connected wallet
    WalletNotConnected,
    /// Required widget configuration is missing
    MissingConfiguration,
}

impl ErrorKind {
    /// Localization key
    pub fn key(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRecipientAddress => "errors.invalidRecipientAddress",
            ErrorKind::InvalidAmount => "errors.invalidAmount",
            ErrorKind::UnsupportedNetwork => "errors.unsupportedNetwork",
            ErrorKind::UnsupportedToken => "errors.unsupportedToken",
            ErrorKind::InsufficientLiquidity => "errors.insufficientLiquidity",
            ErrorKind::InsufficientFunds => "errors.insufficientFunds",
            ErrorKind::SlippageExceeded => "errors.slippageExceeded",
            ErrorKind::RouteNotFound => "errors.routeNotFound",
            ErrorKind::ServerUnavailable => "errors.serverUnavailable",
            ErrorKind::SignatureRejected => "errors.signatureRejected",
            ErrorKind::TransactionRejected => "errors.transactionRejected",
            ErrorKind::NetworkError => "errors.networkError",
            ErrorKind::WalletNotConnected => "errors.walletNotConnected",
            ErrorKind::MissingConfiguration => "errors.missingConfiguration",
        }
    }

    /// English default message
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRecipientAddress => "Invalid recipient address",
            ErrorKind::InvalidAmount => "Please enter a valid amount",
            ErrorKind::UnsupportedNetwork => "This network is not supported",
            ErrorKind::UnsupportedToken => "This token is not supported",
            ErrorKind::InsufficientLiquidity => "Insufficient liquidity for this route",
            ErrorKind::InsufficientFunds => "Insufficient funds",
            ErrorKind::SlippageExceeded => "Price changed too much, please try again",
            ErrorKind::RouteNotFound => "No route found for this token",
            ErrorKind::ServerUnavailable => "Service temporarily unavailable",
            ErrorKind::SignatureRejected => "Signature was rejected by user",
            ErrorKind::TransactionRejected => "Transaction was rejected by user",
            ErrorKind::NetworkError => "Network error, please try again",
            ErrorKind::WalletNotConnected => "Please connect your wallet",
            ErrorKind::MissingConfiguration => "Widget is not configured",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_message())
    }
}

/// User-facing error held in the flow state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ErrorValue {
    /// Structured error resolved through its localization key
    Localized(ErrorKind),
    /// Free text
    Message(String),
}

impl ErrorValue {
    /// Localization key, if the error is structured
    pub fn key(&self) -> Option<&'static str> {
        match self {
            ErrorValue::Localized(kind) => Some(kind.key()),
            ErrorValue::Message(_) => None,
        }
    }

    /// Normalize a quote failure: generic errors keep their text
    pub fn from_quote_error(err: &Error) -> Self {
        match err {
            Error::Localized(kind) => ErrorValue::Localized(*kind),
            Error::Message(msg) => ErrorValue::Message(msg.clone()),
            Error::Anyhow(err) => ErrorValue::Message(err.to_string()),
        }
    }

    /// Normalize an execution failure: generic errors fall back to a network error
    pub fn from_execution_error(err: &Error) -> Self {
        match err {
            Error::Localized(kind) => ErrorValue::Localized(*kind),
            Error::Message(_) | Error::Anyhow(_) => ErrorValue::Localized(ErrorKind::NetworkError),
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorValue::Localized(kind) => write!(f, "{kind}"),
            ErrorValue::Message(msg) => f.write_str(msg),
        }
    }
}

impl From<ErrorKind> for ErrorValue {
    fn from(kind: ErrorKind) -> Self {
        ErrorValue::Localized(kind)
    }
}

/// Collaborator error
///
/// Returned by wallet, quote and payment collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// Structured, localizable failure
    #[error("{0}")]
    Localized(ErrorKind),
    /// Free text failure
    #[error("{0}")]
    Message(String),
    /// AnyHow Error
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::Localized(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_falls_back_to_network_error() {
        let err = Error::Message("socket hang up".to_string());
        assert_eq!(
            ErrorValue::from_execution_error(&err),
            ErrorValue::Localized(ErrorKind::NetworkError)
        );

        let err = Error::Anyhow(anyhow::anyhow!("boom"));
        assert_eq!(
            ErrorValue::from_execution_error(&err),
            ErrorValue::Localized(ErrorKind::NetworkError)
        );
    }

    #[test]
    fn test_structured_errors_pass_through() {
        let err = Error::Localized(ErrorKind::TransactionRejected);
        let value = ErrorValue::from_execution_error(&err);
        assert_eq!(value.key(), Some("errors.transactionRejected"));
        assert_eq!(value.to_string(), "Transaction was rejected by user");

        let value = ErrorValue::from_quote_error(&Error::Localized(ErrorKind::RouteNotFound));
        assert_eq!(value, ErrorValue::Localized(ErrorKind::RouteNotFound));
    }

    #[test]
    fn test_quote_error_keeps_free_text() {
        let err = Error::Message("Amount too small for bridge".to_string());
        let value = ErrorValue::from_quote_error(&err);
        assert_eq!(value.key(), None);
        assert_eq!(value.to_string(), "Amount too small for bridge");
    }

    #[test]
    fn test_error_value_serialization() {
        let value = ErrorValue::Localized(ErrorKind::InsufficientFunds);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"type":"localized","value":"insufficientFunds"}"#);
    }
}
