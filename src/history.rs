use crate::chain::ChainId;
use crate::error::UpstreamError;
use crate::explorer::{ExplorerApi, SortOrder};
use crate::metadata::MetadataSource;
use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHistoryEntry {
    pub name: String,
    pub symbol: String,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

/// Walks `owner`'s transaction list newest-first and collects the contracts
/// it created, enriched with their ERC20 metadata.
///
/// The token under analysis (`exclude`) and any address already collected
/// in this scan are dropped; contracts whose metadata fetch fails are
/// silently skipped. Stops once `limit` entries are collected or the page
/// is exhausted.
pub async fn scan_created_tokens(
    explorer: &dyn ExplorerApi,
    metadata: &dyn MetadataSource,
    owner: Address,
    exclude: Address,
    chain: ChainId,
    limit: usize,
) -> Result<Vec<TokenHistoryEntry>, UpstreamError> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let txs = explorer
        .transactions(owner, chain, SortOrder::Descending)
        .await?;

    let mut seen: HashSet<Address> = HashSet::new();
    let mut entries = Vec::new();

    for tx in txs {
        // Contract creations carry an empty `to` and a populated
        // `contractAddress`.
        if !tx.to.is_empty() || tx.contract_address.is_empty() {
            continue;
        }
        let Ok(created) = Address::from_str(&tx.contract_address) else {
            continue;
        };
        if created == exclude || !seen.insert(created) {
            continue;
        }

        let token = match metadata.fetch(created, chain).await {
            Ok(token) => token,
            Err(e) => {
                debug!("skipping created contract {created}: {e}");
                continue;
            }
        };

        let created_at = tx
            .time_stamp
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_default();

        entries.push(TokenHistoryEntry {
            name: token.name,
            symbol: token.symbol,
            address: created,
            created_at,
        });

        if entries.len() >= limit {
            break;
        }
    }

    Ok(entries)
}
