use crate::chain::ChainId;
use crate::error::UpstreamError;
use crate::explorer::{ExplorerApi, SortOrder};
use alloy_primitives::{Address, U256};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingRecord {
    pub funder: Address,
}

/// Finds the wallet that first sent value to `address`: the sender of the
/// chronologically first transaction with `address` as recipient and a
/// strictly positive value. `Ok(None)` when no such transfer exists in the
/// scanned window.
pub async fn trace_funding(
    explorer: &dyn ExplorerApi,
    address: Address,
    chain: ChainId,
) -> Result<Option<FundingRecord>, UpstreamError> {
    let txs = explorer
        .transactions(address, chain, SortOrder::Ascending)
        .await?;

    for tx in txs {
        // Parsing normalizes case, so the recipient match is
        // case-insensitive on the hex form.
        let Ok(to) = Address::from_str(&tx.to) else {
            continue;
        };
        if to != address {
            continue;
        }
        let value = U256::from_str(&tx.value).unwrap_or(U256::ZERO);
        if value.is_zero() {
            continue;
        }
        let Ok(from) = Address::from_str(&tx.from) else {
            continue;
        };
        debug!("{address} was first funded by {from} (tx {})", tx.hash);
        return Ok(Some(FundingRecord { funder: from }));
    }

    Ok(None)
}
