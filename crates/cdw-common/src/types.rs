//! Token, quote and donation types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// EVM chain id
pub type ChainId = u64;

/// EVM address
///
/// Always `0x` followed by 40 hex characters. Stored lowercase so addresses compare
/// equal regardless of checksum casing.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Zero address, used for native tokens
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(40)))
    }

    /// Address as str
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(Error::Localized(ErrorKind::InvalidRecipientAddress))?;

        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::Localized(ErrorKind::InvalidRecipientAddress));
        }

        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::from_str(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source or recipient token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Contract address ([`Address::zero`] for native tokens)
    pub address: Address,
    /// Ticker symbol
    pub symbol: String,
    /// Decimals
    pub decimals: u8,
    /// Chain the token lives on
    pub chain_id: ChainId,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Token {
    /// Is native gas token
    pub fn is_native(&self) -> bool {
        self.address == Address::zero()
    }
}

/// Routing flags of a quote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingFlags {
    /// Source token is the recipient token on the recipient chain, no conversion needed
    pub is_direct_transfer: bool,
    /// Conversion happens on the recipient chain, no bridge needed
    pub is_same_chain_swap: bool,
}

/// Computed exchange path for a source token into the recipient token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Quote id assigned by the provider
    pub id: String,
    /// Amount of source token the depositor pays, in source token units
    pub source_amount: String,
    /// Amount the recipient receives, in recipient token units
    pub recipient_amount: String,
    /// Estimated fees in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_usd: Option<String>,
    /// Estimated duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_secs: Option<u64>,
    /// Provider specific route payload, handed back to the payment executor untouched
    #[serde(default)]
    pub route: serde_json::Value,
}

/// Quote plus derived routing flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    /// Quote
    pub quote: Quote,
    /// Routing flags
    #[serde(flatten)]
    pub flags: RoutingFlags,
}

/// Donation type
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonationType {
    /// Single payment
    #[default]
    #[serde(rename = "one-time")]
    OneTime,
    /// Recurring monthly subscription
    #[serde(rename = "monthly")]
    Monthly,
}

impl fmt::Display for DonationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DonationType::OneTime => write!(f, "one-time"),
            DonationType::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for DonationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one-time" => Ok(DonationType::OneTime),
            "monthly" => Ok(DonationType::Monthly),
            _ => Err(Error::Message(format!("Unknown donation type: {s}"))),
        }
    }
}

/// Number of months prepaid at subscription setup
#[derive(
    Debug, Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub enum DepositMonths {
    /// 1 month
    One,
    /// 3 months
    #[default]
    Three,
    /// 6 months
    Six,
    /// 12 months
    Twelve,
}

impl DepositMonths {
    /// All options in display order
    pub const ALL: [DepositMonths; 4] = [
        DepositMonths::One,
        DepositMonths::Three,
        DepositMonths::Six,
        DepositMonths::Twelve,
    ];

    /// Number of months
    pub fn months(&self) -> u32 {
        match self {
            DepositMonths::One => 1,
            DepositMonths::Three => 3,
            DepositMonths::Six => 6,
            DepositMonths::Twelve => 12,
        }
    }
}

impl TryFrom<u32> for DepositMonths {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DepositMonths::One),
            3 => Ok(DepositMonths::Three),
            6 => Ok(DepositMonths::Six),
            12 => Ok(DepositMonths::Twelve),
            _ => Err(Error::Message(format!("Unsupported deposit duration: {value}"))),
        }
    }
}

impl From<DepositMonths> for u32 {
    fn from(value: DepositMonths) -> Self {
        value.months()
    }
}
