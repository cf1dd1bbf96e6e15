use crate::chain::ChainId;
use crate::erc20::{decimalsCall, nameCall, symbolCall, totalSupplyCall};
use crate::error::UpstreamError;
use crate::rpc::RpcClient;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use tracing::debug;

/// ERC20 metadata for one token, immutable after the fetch.
#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub address: Address,
    pub chain: ChainId,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

impl TokenMetadata {
    pub fn total_supply_formatted(&self) -> String {
        format_supply(self.total_supply, self.decimals)
    }
}

/// Seam for the on-chain metadata read, so the history scanner and the
/// orchestrator can be exercised against fakes.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, address: Address, chain: ChainId) -> Result<TokenMetadata, UpstreamError>;
}

#[derive(Clone)]
pub struct TokenMetadataFetcher {
    rpc: RpcClient,
}

impl TokenMetadataFetcher {
    pub fn new(rpc: RpcClient) -> Self {
        TokenMetadataFetcher { rpc }
    }
}

#[async_trait]
impl MetadataSource for TokenMetadataFetcher {
    // If any of the four reads fails, the whole fetch fails and the caller
    // reports the metadata as absent.
    async fn fetch(
        &self,
        address: Address,
        chain: ChainId,
    ) -> Result<TokenMetadata, UpstreamError> {
        let (name, symbol, decimals, total_supply) = tokio::try_join!(
            self.rpc.call_contract(chain, address, nameCall {}),
            self.rpc.call_contract(chain, address, symbolCall {}),
            self.rpc.call_contract(chain, address, decimalsCall {}),
            self.rpc.call_contract(chain, address, totalSupplyCall {}),
        )
        .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        debug!("token {address}: {name} ({symbol}), {decimals} decimals");

        Ok(TokenMetadata {
            address,
            chain,
            name,
            symbol,
            decimals,
            total_supply,
        })
    }
}

/// Raw supply divided by `10^decimals` in `U256`, comma-separated, no
/// fractional digits.
pub fn format_supply(raw: U256, decimals: u8) -> String {
    let whole = U256::from(10u8)
        .checked_pow(U256::from(decimals))
        .map(|scale| raw / scale)
        .unwrap_or(U256::ZERO);
    group_thousands(&whole.to_string())
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
