use crate::address;
use crate::chain::{self, ChainId};
use crate::config::Config;
use crate::deployer::resolve_deployer;
use crate::error::AnalyzerError;
use crate::explorer::{ExplorerApi, ExplorerClient};
use crate::funding::trace_funding;
use crate::history::scan_created_tokens;
use crate::metadata::{MetadataSource, TokenMetadataFetcher};
use crate::platforms::{HttpProber, PlatformDetector, PlatformProber};
use crate::report::AnalysisReport;
use crate::rpc::RpcClient;
use alloy_primitives::Address;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Owns the whole analysis pipeline. Construction wires the long-lived
/// clients once; each `analyze` call is independent, and dropping the
/// returned future cancels every in-flight upstream call.
pub struct Analyzer {
    metadata: Arc<dyn MetadataSource>,
    explorer: Arc<dyn ExplorerApi>,
    detector: PlatformDetector,
    history_limit: usize,
}

impl Analyzer {
    pub fn from_config(config: &Config) -> Result<Self> {
        let rpc = RpcClient::new(config)?;
        let metadata = Arc::new(TokenMetadataFetcher::new(rpc));
        let explorer = Arc::new(ExplorerClient::new(config)?);
        let prober: Arc<dyn PlatformProber> = Arc::new(HttpProber::new(
            config.probe_timeout,
            config.min_probe_body_bytes,
        )?);
        let detector = PlatformDetector::new(
            prober,
            config.platforms.clone(),
            config.detection_policy,
            config.probe_concurrency,
        );

        Ok(Analyzer {
            metadata,
            explorer,
            detector,
            history_limit: config.history_limit,
        })
    }

    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        explorer: Arc<dyn ExplorerApi>,
        detector: PlatformDetector,
        history_limit: usize,
    ) -> Self {
        Analyzer {
            metadata,
            explorer,
            detector,
            history_limit,
        }
    }

    /// Validates the address, resolves its chain and runs the pipeline.
    /// The only hard failure is an invalid address; everything downstream
    /// degrades into absent report fields.
    pub async fn analyze(&self, raw: &str) -> Result<AnalysisReport, AnalyzerError> {
        let address = address::validate(raw)?;
        let chain = chain::resolve_chain(address);
        Ok(self.analyze_on(address, chain).await)
    }

    pub async fn analyze_on(&self, address: Address, chain: ChainId) -> AnalysisReport {
        info!("analyzing token {address} on {chain}");

        // Metadata and platform probes only need (address, chain) and run
        // concurrently; the platform fan-out is bounded internally.
        let (metadata, platforms) = tokio::join!(
            self.metadata.fetch(address, chain),
            self.detector.detect(address, chain),
        );

        let metadata = match metadata {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("token metadata unavailable for {address}: {e}");
                None
            }
        };

        let mut report = AnalysisReport::new(address, chain);
        report.metadata = metadata;
        report.platforms = platforms;

        let deployer = match resolve_deployer(self.explorer.as_ref(), address, chain).await {
            Ok(deployer) => deployer,
            Err(e) => {
                warn!("deployer lookup failed for {address}: {e}");
                None
            }
        };

        // Without a deployer there is nothing left to trace.
        let Some(deployer) = deployer else {
            return report;
        };
        let deployer_address = deployer.deployer;
        report.deployer = Some(deployer);

        report.deployer_tokens = match scan_created_tokens(
            self.explorer.as_ref(),
            self.metadata.as_ref(),
            deployer_address,
            address,
            chain,
            self.history_limit,
        )
        .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!("deployer history scan failed for {deployer_address}: {e}");
                Vec::new()
            }
        };

        let funding = match trace_funding(self.explorer.as_ref(), deployer_address, chain).await {
            Ok(funding) => funding,
            Err(e) => {
                warn!("funding trace failed for {deployer_address}: {e}");
                None
            }
        };

        match funding {
            Some(record) if record.funder == deployer_address => {
                // Self-funded wallets are reported as such, never recursed
                // into.
                report.self_funded = true;
            }
            Some(record) => {
                report.funder_tokens = match scan_created_tokens(
                    self.explorer.as_ref(),
                    self.metadata.as_ref(),
                    record.funder,
                    address,
                    chain,
                    self.history_limit,
                )
                .await
                {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!("funder history scan failed for {}: {e}", record.funder);
                        Vec::new()
                    }
                };
                report.funding = Some(record);
            }
            None => {}
        }

        report
    }
}
