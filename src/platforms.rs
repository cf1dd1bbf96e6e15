use crate::chain::ChainId;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use alloy_primitives::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPolicy {
    /// Run every probe and report every positive; append generic DEX
    /// aggregator links when nothing platform-specific matched.
    Exhaustive,
    /// Run probes in priority order and stop at the first positive.
    FirstMatch,
}

impl FromStr for DetectionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exhaustive" => Ok(DetectionPolicy::Exhaustive),
            "first-match" | "first_match" => Ok(DetectionPolicy::FirstMatch),
            other => Err(anyhow::anyhow!("unknown detection policy: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ProbeKind {
    /// GET the templated URL; present iff 200 and the body is strictly
    /// longer than the configured threshold.
    HttpStatus { url: String },
    /// Query a Uniswap v3 subgraph; present iff the pools set is non-empty.
    UniswapPools { subgraphs: HashMap<ChainId, String> },
    /// Platform with no queryable presence API; never matches.
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct PlatformSpec {
    pub name: String,
    /// Deep-link template; `{address}` and `{chain}` are substituted.
    pub link: String,
    pub probe: ProbeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformMatch {
    pub name: String,
    pub url: String,
}

pub fn render_link(template: &str, address: Address, chain: ChainId) -> String {
    template
        .replace("{address}", &format!("{address:#x}"))
        .replace("{chain}", chain.as_str())
}

/// A single presence check against one platform. Probes never fail: any
/// upstream error is logged and treated as "not present" so one flaky
/// platform cannot poison the others.
#[async_trait]
pub trait PlatformProber: Send + Sync {
    async fn probe(&self, spec: &PlatformSpec, address: Address, chain: ChainId) -> bool;
}

pub struct HttpProber {
    client: reqwest::Client,
    min_body_bytes: u64,
}

impl HttpProber {
    pub fn new(timeout: Duration, min_body_bytes: u64) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpProber {
            client,
            min_body_bytes,
        })
    }
}

#[async_trait]
impl PlatformProber for HttpProber {
    async fn probe(&self, spec: &PlatformSpec, address: Address, chain: ChainId) -> bool {
        match &spec.probe {
            ProbeKind::Unsupported => false,
            ProbeKind::HttpStatus { url } => {
                let url = render_link(url, address, chain);
                match self.client.get(&url).send().await {
                    Ok(response) if response.status() == StatusCode::OK => {
                        match response.bytes().await {
                            Ok(body) => body.len() as u64 > self.min_body_bytes,
                            Err(e) => {
                                debug!("probe {} body read failed: {e}", spec.name);
                                false
                            }
                        }
                    }
                    Ok(response) => {
                        debug!("probe {} returned HTTP {}", spec.name, response.status());
                        false
                    }
                    Err(e) => {
                        debug!("probe {} failed: {e}", spec.name);
                        false
                    }
                }
            }
            ProbeKind::UniswapPools { subgraphs } => {
                let Some(endpoint) = subgraphs.get(&chain) else {
                    return false;
                };
                let query =
                    format!("{{ pools(where: {{token0: \"{address:#x}\"}}) {{ id }} }}");
                match self
                    .client
                    .post(endpoint)
                    .json(&json!({ "query": query }))
                    .send()
                    .await
                {
                    Ok(response) => match response.json::<serde_json::Value>().await {
                        Ok(body) => body
                            .pointer("/data/pools")
                            .and_then(|pools| pools.as_array())
                            .is_some_and(|pools| !pools.is_empty()),
                        Err(e) => {
                            debug!("probe {} returned malformed JSON: {e}", spec.name);
                            false
                        }
                    },
                    Err(e) => {
                        debug!("probe {} failed: {e}", spec.name);
                        false
                    }
                }
            }
        }
    }
}

pub struct PlatformDetector {
    prober: Arc<dyn PlatformProber>,
    table: Vec<PlatformSpec>,
    policy: DetectionPolicy,
    concurrency: usize,
}

impl PlatformDetector {
    pub fn new(
        prober: Arc<dyn PlatformProber>,
        table: Vec<PlatformSpec>,
        policy: DetectionPolicy,
        concurrency: usize,
    ) -> Self {
        PlatformDetector {
            prober,
            table,
            policy,
            concurrency: concurrency.max(1),
        }
    }

    /// Matches come back in probe-table order regardless of which probe
    /// answered first.
    pub async fn detect(&self, address: Address, chain: ChainId) -> Vec<PlatformMatch> {
        let mut matches = match self.policy {
            DetectionPolicy::Exhaustive => self.detect_exhaustive(address, chain).await,
            DetectionPolicy::FirstMatch => self.detect_first_match(address, chain).await,
        };

        if matches.is_empty() && self.policy == DetectionPolicy::Exhaustive {
            matches.push(PlatformMatch {
                name: "uniswap".to_string(),
                url: format!(
                    "https://app.uniswap.org/explore/tokens/{chain}/{address:#x}"
                ),
            });
            matches.push(PlatformMatch {
                name: "dexscreener".to_string(),
                url: format!("https://dexscreener.com/{chain}/{address:#x}"),
            });
        }

        matches
    }

    async fn detect_exhaustive(&self, address: Address, chain: ChainId) -> Vec<PlatformMatch> {
        let results: Vec<(usize, bool)> = stream::iter(self.table.iter().enumerate())
            .map(|(index, spec)| {
                let prober = Arc::clone(&self.prober);
                async move { (index, prober.probe(spec, address, chain).await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut hits: Vec<usize> = results
            .into_iter()
            .filter_map(|(index, hit)| hit.then_some(index))
            .collect();
        hits.sort_unstable();

        hits.into_iter()
            .map(|index| {
                let spec = &self.table[index];
                PlatformMatch {
                    name: spec.name.clone(),
                    url: render_link(&spec.link, address, chain),
                }
            })
            .collect()
    }

    async fn detect_first_match(&self, address: Address, chain: ChainId) -> Vec<PlatformMatch> {
        for spec in &self.table {
            if self.prober.probe(spec, address, chain).await {
                return vec![PlatformMatch {
                    name: spec.name.clone(),
                    url: render_link(&spec.link, address, chain),
                }];
            }
        }
        Vec::new()
    }
}
