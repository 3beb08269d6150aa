//! Widget configuration

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use cdw_common::{Address, ChainCatalog, ChainId, ErrorKind, Token};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Polygon
pub const DEFAULT_RECIPIENT_CHAIN_ID: ChainId = 137;

/// USDC on Polygon
pub const DEFAULT_RECIPIENT_TOKEN: &str = "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359";

/// Trailing-edge debounce applied to amount edits
pub const DEFAULT_QUOTE_DEBOUNCE_MS: u64 = 500;

fn default_recipient_chain_id() -> ChainId {
    DEFAULT_RECIPIENT_CHAIN_ID
}

fn default_recipient_token_address() -> String {
    DEFAULT_RECIPIENT_TOKEN.to_string()
}

fn default_continuous_enabled() -> bool {
    true
}

fn default_quote_debounce_ms() -> u64 {
    DEFAULT_QUOTE_DEBOUNCE_MS
}

/// Widget configuration
///
/// Only the fields the orchestration needs. Copy text, theme and other cosmetics belong to
/// the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Donation recipient
    #[serde(default)]
    pub recipient: String,
    /// Chain the recipient is paid on
    #[serde(default = "default_recipient_chain_id")]
    pub recipient_chain_id: ChainId,
    /// Token the recipient is paid in
    #[serde(default = "default_recipient_token_address")]
    pub recipient_token_address: String,
    /// Address receiving subscription payments, falls back to `recipient`
    #[serde(default)]
    pub subscription_target: Option<String>,
    /// Project id attached to subscriptions
    #[serde(default)]
    pub project_id: Option<String>,
    /// Monthly subscriptions offered
    #[serde(default = "default_continuous_enabled")]
    pub continuous_enabled: bool,
    /// Debounce applied to amount edits before a quote is fetched
    #[serde(default = "default_quote_debounce_ms")]
    pub quote_debounce_ms: u64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            recipient_chain_id: DEFAULT_RECIPIENT_CHAIN_ID,
            recipient_token_address: default_recipient_token_address(),
            subscription_target: None,
            project_id: None,
            continuous_enabled: true,
            quote_debounce_ms: DEFAULT_QUOTE_DEBOUNCE_MS,
        }
    }
}

impl WidgetConfig {
    /// Create a new [`WidgetConfig`] for a recipient
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            ..Default::default()
        }
    }

    /// Load from a config file, overridden by `CDW_` environment variables
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("CDW"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load from a TOML string
    pub fn from_toml_str(toml: &str) -> Result<Self, Error> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Set the subscription target
    pub fn with_subscription_target(mut self, target: impl Into<String>) -> Self {
        self.subscription_target = Some(target.into());
        self
    }

    /// Set the project id
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Enable or disable monthly subscriptions
    pub fn with_continuous_enabled(mut self, enabled: bool) -> Self {
        self.continuous_enabled = enabled;
        self
    }

    /// Set the quote debounce
    pub fn with_quote_debounce(mut self, debounce: Duration) -> Self {
        self.quote_debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Quote debounce
    pub fn quote_debounce(&self) -> Duration {
        Duration::from_millis(self.quote_debounce_ms)
    }

    /// Address subscriptions are paid to
    ///
    /// The configured subscription target when non-empty, the recipient otherwise.
    pub fn effective_subscription_target(&self) -> &str {
        match self.subscription_target.as_deref().map(str::trim) {
            Some(target) if !target.is_empty() => target,
            _ => &self.recipient,
        }
    }

    /// Validate addresses
    pub fn validate(&self) -> Result<(), ErrorKind> {
        if self.recipient.trim().is_empty() {
            return Err(ErrorKind::MissingConfiguration);
        }

        Address::from_str(&self.recipient).map_err(|_| ErrorKind::InvalidRecipientAddress)?;
        Address::from_str(self.effective_subscription_target())
            .map_err(|_| ErrorKind::InvalidRecipientAddress)?;
        Address::from_str(&self.recipient_token_address)
            .map_err(|_| ErrorKind::MissingConfiguration)?;

        Ok(())
    }

    /// Validate and resolve the recipient against the chain catalog
    pub fn resolve_recipient(&self, catalog: &dyn ChainCatalog) -> Result<Recipient, ErrorKind> {
        self.validate()?;

        let address =
            Address::from_str(&self.recipient).map_err(|_| ErrorKind::InvalidRecipientAddress)?;
        let token_address = Address::from_str(&self.recipient_token_address)
            .map_err(|_| ErrorKind::MissingConfiguration)?;
        let token = catalog
            .token(self.recipient_chain_id, &token_address)
            .ok_or(ErrorKind::MissingConfiguration)?;
        let chain_name = catalog
            .chain_name(self.recipient_chain_id)
            .ok_or(ErrorKind::MissingConfiguration)?;

        Ok(Recipient {
            address,
            token,
            chain_name,
        })
    }
}

/// Resolved recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Recipient address
    pub address: Address,
    /// Token the recipient is paid in
    pub token: Token,
    /// Recipient chain display name
    pub chain_name: String,
}
