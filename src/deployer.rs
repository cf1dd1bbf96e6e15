use crate::chain::ChainId;
use crate::error::UpstreamError;
use crate::explorer::ExplorerApi;
use alloy_primitives::Address;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployerRecord {
    pub deployer: Address,
    pub creation_tx: Option<String>,
}

/// Looks up who deployed the contract. `Ok(None)` means the explorer has no
/// creation record for this address; the caller then skips every
/// deployer-dependent stage.
pub async fn resolve_deployer(
    explorer: &dyn ExplorerApi,
    address: Address,
    chain: ChainId,
) -> Result<Option<DeployerRecord>, UpstreamError> {
    let record = match explorer.contract_creation(address, chain).await {
        Ok(record) => record,
        Err(UpstreamError::NotFound) => return Ok(None),
        Err(e) => return Err(e),
    };

    let deployer = Address::from_str(&record.contract_creator).map_err(|_| {
        UpstreamError::Unavailable(format!(
            "malformed creator address: {}",
            record.contract_creator
        ))
    })?;

    debug!("contract {address} was deployed by {deployer}");

    let tx_hash = record.tx_hash;
    Ok(Some(DeployerRecord {
        deployer,
        creation_tx: (!tx_hash.is_empty()).then_some(tx_hash),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::{CreationRecord, SortOrder, TxRecord};
    use async_trait::async_trait;

    struct StaticExplorer {
        creation: Result<CreationRecord, UpstreamError>,
    }

    #[async_trait]
    impl ExplorerApi for StaticExplorer {
        async fn contract_creation(
            &self,
            _address: Address,
            _chain: ChainId,
        ) -> Result<CreationRecord, UpstreamError> {
            match &self.creation {
                Ok(record) => Ok(record.clone()),
                Err(UpstreamError::NotFound) => Err(UpstreamError::NotFound),
                Err(UpstreamError::Unavailable(msg)) => {
                    Err(UpstreamError::Unavailable(msg.clone()))
                }
            }
        }

        async fn transactions(
            &self,
            _address: Address,
            _chain: ChainId,
            _order: SortOrder,
        ) -> Result<Vec<TxRecord>, UpstreamError> {
            Ok(Vec::new())
        }
    }

    fn token() -> Address {
        Address::from([0xAA; 20])
    }

    #[tokio::test]
    async fn resolves_creator_and_tx_hash() {
        let explorer = StaticExplorer {
            creation: Ok(CreationRecord {
                contract_address: format!("{:#x}", token()),
                contract_creator: "0x4444444444444444444444444444444444444444".to_string(),
                tx_hash: "0xccc".to_string(),
            }),
        };

        let record = resolve_deployer(&explorer, token(), ChainId::Base)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.deployer, Address::from([0x44; 20]));
        assert_eq!(record.creation_tx.as_deref(), Some("0xccc"));
    }

    #[tokio::test]
    async fn missing_record_is_none_not_error() {
        let explorer = StaticExplorer {
            creation: Err(UpstreamError::NotFound),
        };
        let record = resolve_deployer(&explorer, token(), ChainId::Base)
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let explorer = StaticExplorer {
            creation: Err(UpstreamError::Unavailable("timeout".to_string())),
        };
        assert!(
            resolve_deployer(&explorer, token(), ChainId::Base)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn malformed_creator_is_an_upstream_error() {
        let explorer = StaticExplorer {
            creation: Ok(CreationRecord {
                contract_address: format!("{:#x}", token()),
                contract_creator: "GENESIS".to_string(),
                tx_hash: String::new(),
            }),
        };
        assert!(
            resolve_deployer(&explorer, token(), ChainId::Base)
                .await
                .is_err()
        );
    }
}
