//! Fake collaborator errors

use cdw_common::ErrorKind;
use thiserror::Error;

/// Fake Error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Structured rejection, surfaced as a localizable error
    #[error("{0}")]
    Rejected(ErrorKind),
    /// Free text failure
    #[error("{0}")]
    Generic(String),
    /// Operation needs a connected wallet
    #[error("Wallet not connected")]
    NotConnected,
}

impl From<Error> for cdw_common::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Rejected(kind) => Self::Localized(kind),
            Error::NotConnected => Self::Localized(ErrorKind::WalletNotConnected),
            Error::Generic(msg) => Self::Anyhow(anyhow::anyhow!(msg)),
        }
    }
}
