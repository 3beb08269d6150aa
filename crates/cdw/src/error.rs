//! Errors

use thiserror::Error;

/// CDW Error
#[derive(Debug, Error)]
pub enum Error {
    /// Builder is missing a required part
    #[error("`{0}` required")]
    Missing(&'static str),
    /// Config Error
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
