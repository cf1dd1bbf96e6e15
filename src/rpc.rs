use crate::chain::ChainId;
use crate::config::Config;
use alloy::network::TransactionBuilder;
use alloy::providers::fillers::FillProvider;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use alloy_primitives::Address;
use anyhow::Result;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

type AlloyFullProvider = FillProvider<
    alloy::providers::fillers::JoinFill<
        alloy::providers::Identity,
        alloy::providers::fillers::JoinFill<
            alloy::providers::fillers::GasFiller,
            alloy::providers::fillers::JoinFill<
                alloy::providers::fillers::BlobGasFiller,
                alloy::providers::fillers::JoinFill<
                    alloy::providers::fillers::NonceFiller,
                    alloy::providers::fillers::ChainIdFiller,
                >,
            >,
        >,
    >,
    alloy::providers::RootProvider,
>;

/// One long-lived HTTP provider per configured chain. Read-only after
/// construction, safe to share across concurrent analyses.
#[derive(Clone)]
pub struct RpcClient {
    providers: HashMap<ChainId, AlloyFullProvider>,
    request_timeout: Duration,
}

impl RpcClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut providers = HashMap::new();
        for (chain, chain_config) in &config.chains {
            let parsed_url = chain_config
                .rpc_url
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid RPC URL: {}", chain_config.rpc_url))?;
            let provider: AlloyFullProvider = ProviderBuilder::new().connect_http(parsed_url);
            providers.insert(*chain, provider);
        }

        Ok(RpcClient {
            providers,
            request_timeout: config.rpc_timeout,
        })
    }

    fn get_provider(&self, chain: ChainId) -> Result<&AlloyFullProvider> {
        self.providers
            .get(&chain)
            .ok_or_else(|| anyhow::anyhow!("No RPC endpoint configured for chain {chain}"))
    }

    /// Executes a read-only contract call and decodes its return value.
    /// No retries.
    pub async fn call_contract<C: SolCall>(
        &self,
        chain: ChainId,
        address: Address,
        call: C,
    ) -> Result<C::Return> {
        let provider = self.get_provider(chain)?;
        let tx = TransactionRequest::default()
            .with_to(address)
            .with_input(call.abi_encode());

        debug!("eth_call {} on {chain} against {address}", C::SIGNATURE);

        let raw = match timeout(self.request_timeout, provider.call(tx)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                return Err(anyhow::anyhow!("eth_call failed on {chain}: {e}"));
            }
            Err(_) => {
                return Err(anyhow::anyhow!(
                    "eth_call timed out after {} seconds on {chain}",
                    self.request_timeout.as_secs()
                ));
            }
        };

        Ok(C::abi_decode_returns(&raw)?)
    }
}
