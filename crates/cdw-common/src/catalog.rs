//! Token and chain metadata

use crate::types::{Address, ChainId, Token};

/// Token and chain metadata lookup
pub trait ChainCatalog: Send + Sync {
    /// Token metadata by chain and contract address
    fn token(&self, chain_id: ChainId, address: &Address) -> Option<Token>;

    /// Tokens selectable on a chain
    fn tokens(&self, chain_id: ChainId) -> Vec<Token>;

    /// Chain display name
    fn chain_name(&self, chain_id: ChainId) -> Option<String>;
}
