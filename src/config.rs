use crate::chain::ChainId;
use crate::platforms::{DetectionPolicy, PlatformSpec, ProbeKind};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ExplorerEndpoint {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    /// Chains without an explorer mapping skip every explorer-backed stage.
    pub explorer: Option<ExplorerEndpoint>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub chains: HashMap<ChainId, ChainConfig>,
    pub platforms: Vec<PlatformSpec>,
    pub detection_policy: DetectionPolicy,
    pub rpc_timeout: Duration,
    pub explorer_timeout: Duration,
    pub probe_timeout: Duration,
    pub probe_concurrency: usize,
    pub history_limit: usize,
    /// Probe response bodies must be strictly longer than this to count as
    /// a real resource. A crude heuristic: rules out empty and `{}` bodies,
    /// nothing more.
    pub min_probe_body_bytes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let infura_key = std::env::var("INFURA_KEY").unwrap_or_default();
        let etherscan_key = std::env::var("ETHERSCAN_API_KEY").unwrap_or_default();
        let basescan_key = std::env::var("BASESCAN_API_KEY").unwrap_or_default();

        let ethereum_rpc = std::env::var("ETHEREUM_RPC_URL")
            .unwrap_or_else(|_| format!("https://mainnet.infura.io/v3/{infura_key}"));
        let base_rpc = std::env::var("BASE_RPC_URL")
            .unwrap_or_else(|_| "https://mainnet.base.org".to_string());

        let history_limit = match std::env::var("HISTORY_LIMIT") {
            Ok(v) => v.parse().context("HISTORY_LIMIT must be a number")?,
            Err(_) => 5,
        };
        let detection_policy = match std::env::var("DETECTION_POLICY") {
            Ok(v) => v
                .parse()
                .context("DETECTION_POLICY must be 'exhaustive' or 'first-match'")?,
            Err(_) => DetectionPolicy::Exhaustive,
        };

        let mut chains = HashMap::new();
        chains.insert(
            ChainId::Ethereum,
            ChainConfig {
                rpc_url: ethereum_rpc,
                explorer: Some(ExplorerEndpoint {
                    api_url: "https://api.etherscan.io/api".to_string(),
                    api_key: etherscan_key,
                }),
            },
        );
        chains.insert(
            ChainId::Base,
            ChainConfig {
                rpc_url: base_rpc,
                explorer: Some(ExplorerEndpoint {
                    api_url: "https://api.basescan.org/api".to_string(),
                    api_key: basescan_key,
                }),
            },
        );
        chains.insert(
            ChainId::Arbitrum,
            ChainConfig {
                rpc_url: "https://arb1.arbitrum.io/rpc".to_string(),
                explorer: None,
            },
        );
        chains.insert(
            ChainId::Optimism,
            ChainConfig {
                rpc_url: "https://mainnet.optimism.io".to_string(),
                explorer: None,
            },
        );

        Ok(Config {
            chains,
            platforms: default_platforms(),
            detection_policy,
            rpc_timeout: Duration::from_secs(10),
            explorer_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            probe_concurrency: 4,
            history_limit,
            min_probe_body_bytes: 2,
        })
    }
}

/// Ordered probe table. Order is the probe priority and the order of
/// matches in the report.
fn default_platforms() -> Vec<PlatformSpec> {
    vec![
        PlatformSpec {
            name: "clanker".to_string(),
            link: "https://www.clanker.world/clanker/{address}".to_string(),
            probe: ProbeKind::HttpStatus {
                url: "https://www.clanker.world/api/tokens/{address}".to_string(),
            },
        },
        PlatformSpec {
            name: "farcaster".to_string(),
            link: "https://warpcast.com/~/search?q={address}".to_string(),
            // No public presence API; listed for its deep link only.
            probe: ProbeKind::Unsupported,
        },
        PlatformSpec {
            name: "baseapp".to_string(),
            link: "https://base.app/token/{address}".to_string(),
            probe: ProbeKind::HttpStatus {
                url: "https://base.app/api/token/{address}".to_string(),
            },
        },
        PlatformSpec {
            name: "uniswap".to_string(),
            link: "https://app.uniswap.org/explore/tokens/{chain}/{address}".to_string(),
            probe: ProbeKind::UniswapPools {
                subgraphs: HashMap::from([
                    (
                        ChainId::Ethereum,
                        "https://api.thegraph.com/subgraphs/name/uniswap/uniswap-v3".to_string(),
                    ),
                    (
                        ChainId::Base,
                        "https://api.studio.thegraph.com/query/48211/uniswap-v3-base/version/latest"
                            .to_string(),
                    ),
                ]),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_table_keeps_liquidity_check_last() {
        let platforms = default_platforms();
        assert_eq!(platforms.last().unwrap().name, "uniswap");
    }

    #[test]
    fn every_chain_has_an_rpc_endpoint() {
        let config = Config::from_env().unwrap();
        for chain in ChainId::ALL {
            assert!(config.chains.contains_key(&chain), "missing {chain}");
        }
    }

    #[test]
    fn explorer_mapping_covers_ethereum_and_base_only() {
        let config = Config::from_env().unwrap();
        assert!(config.chains[&ChainId::Ethereum].explorer.is_some());
        assert!(config.chains[&ChainId::Base].explorer.is_some());
        assert!(config.chains[&ChainId::Arbitrum].explorer.is_none());
        assert!(config.chains[&ChainId::Optimism].explorer.is_none());
    }
}
