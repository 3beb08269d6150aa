//! Fake chain catalog

use std::collections::HashMap;
use std::str::FromStr;

use cdw_common::{Address, ChainCatalog, ChainId, Token};

/// Polygon
pub const POLYGON: ChainId = 137;
/// Ethereum mainnet
pub const ETHEREUM: ChainId = 1;
/// Base
pub const BASE: ChainId = 8453;
/// Arbitrum One
pub const ARBITRUM: ChainId = 42161;

/// USDC on Polygon
pub const POLYGON_USDC: &str = "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359";
/// USDT on Polygon
pub const POLYGON_USDT: &str = "0xc2132d05d31c914a87c6611c10748aeb04b58e8f";
/// USDC on Ethereum
pub const ETHEREUM_USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
/// USDC on Base
pub const BASE_USDC: &str = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913";
/// USDC on Arbitrum
pub const ARBITRUM_USDC: &str = "0xaf88d065e77c8cc2239327c5edb3a432268e5831";

fn token(chain_id: ChainId, address: &str, symbol: &str, decimals: u8, name: &str) -> Token {
    Token {
        address: Address::from_str(address).unwrap_or_else(|_| Address::zero()),
        symbol: symbol.to_string(),
        decimals,
        chain_id,
        name: Some(name.to_string()),
    }
}

/// Static catalog of a handful of mainnet chains and their stablecoins
#[derive(Debug, Clone)]
pub struct FakeChainCatalog {
    chains: HashMap<ChainId, (String, Vec<Token>)>,
}

impl Default for FakeChainCatalog {
    fn default() -> Self {
        let zero = Address::zero();
        let native = zero.as_str();

        let chains = [
            (
                POLYGON,
                "Polygon",
                vec![
                    token(POLYGON, POLYGON_USDC, "USDC", 6, "USD Coin"),
                    token(POLYGON, POLYGON_USDT, "USDT", 6, "Tether USD"),
                    token(POLYGON, native, "POL", 18, "Polygon Ecosystem Token"),
                ],
            ),
            (
                ETHEREUM,
                "Ethereum",
                vec![
                    token(ETHEREUM, ETHEREUM_USDC, "USDC", 6, "USD Coin"),
                    token(ETHEREUM, native, "ETH", 18, "Ether"),
                ],
            ),
            (
                BASE,
                "Base",
                vec![
                    token(BASE, BASE_USDC, "USDC", 6, "USD Coin"),
                    token(BASE, native, "ETH", 18, "Ether"),
                ],
            ),
            (
                ARBITRUM,
                "Arbitrum",
                vec![
                    token(ARBITRUM, ARBITRUM_USDC, "USDC", 6, "USD Coin"),
                    token(ARBITRUM, native, "ETH", 18, "Ether"),
                ],
            ),
        ]
        .into_iter()
        .map(|(chain_id, name, tokens)| (chain_id, (name.to_string(), tokens)))
        .collect();

        Self { chains }
    }
}

impl FakeChainCatalog {
    /// Create a new [`FakeChainCatalog`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog without any chain, for misconfiguration tests
    pub fn empty() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }

    /// Token by symbol
    pub fn by_symbol(&self, chain_id: ChainId, symbol: &str) -> Option<Token> {
        self.tokens(chain_id)
            .into_iter()
            .find(|token| token.symbol == symbol)
    }
}

impl ChainCatalog for FakeChainCatalog {
    fn token(&self, chain_id: ChainId, address: &Address) -> Option<Token> {
        self.chains
            .get(&chain_id)?
            .1
            .iter()
            .find(|token| &token.address == address)
            .cloned()
    }

    fn tokens(&self, chain_id: ChainId) -> Vec<Token> {
        self.chains
            .get(&chain_id)
            .map(|(_, tokens)| tokens.clone())
            .unwrap_or_default()
    }

    fn chain_name(&self, chain_id: ChainId) -> Option<String> {
        self.chains.get(&chain_id).map(|(name, _)| name.clone())
    }
}
