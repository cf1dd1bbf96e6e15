use alloy_primitives::Address;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainId {
    Ethereum,
    Base,
    Arbitrum,
    Optimism,
}

impl ChainId {
    pub const ALL: [ChainId; 4] = [
        ChainId::Ethereum,
        ChainId::Base,
        ChainId::Arbitrum,
        ChainId::Optimism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Ethereum => "ethereum",
            ChainId::Base => "base",
            ChainId::Arbitrum => "arbitrum",
            ChainId::Optimism => "optimism",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ethereum" => Ok(ChainId::Ethereum),
            "base" => Ok(ChainId::Base),
            "arbitrum" => Ok(ChainId::Arbitrum),
            "optimism" => Ok(ChainId::Optimism),
            other => Err(anyhow::anyhow!(
                "unsupported chain: {other} (expected ethereum, base, arbitrum or optimism)"
            )),
        }
    }
}

/// Picks the chain an address most likely lives on.
///
/// Current policy always returns Base. The contract is a pure function of
/// the address, so a real multi-chain probe (e.g. checking for contract
/// code on each chain) can replace this without touching any caller.
pub fn resolve_chain(_address: Address) -> ChainId {
    ChainId::Base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_chains() {
        assert_eq!("base".parse::<ChainId>().unwrap(), ChainId::Base);
        assert_eq!("Ethereum".parse::<ChainId>().unwrap(), ChainId::Ethereum);
        assert!("solana".parse::<ChainId>().is_err());
    }

    #[test]
    fn resolver_is_deterministic() {
        let a = Address::from([0x11; 20]);
        let b = Address::from([0x22; 20]);
        assert_eq!(resolve_chain(a), resolve_chain(b));
        assert_eq!(resolve_chain(a), ChainId::Base);
    }
}
