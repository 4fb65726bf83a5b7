use alloy::primitives::{address, Address, B256};

#[derive(Debug, Clone)]
pub struct ChainProfile {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub symbol: String,
    pub explorer_url: String,
    /// Native-asset staking contract (stTEA). Staked balances are tracked as
    /// an ERC-20 style balance on the same contract.
    pub staking_contract: Address,
    pub block_time_ms: u64,
}

impl ChainProfile {
    pub fn tea_sepolia() -> Self {
        Self {
            chain_id: 10218,
            name: "Tea Sepolia Testnet".to_string(),
            rpc_url: "https://tea-sepolia.g.alchemy.com/public".to_string(),
            symbol: "TEA".to_string(),
            explorer_url: "https://sepolia.tea.xyz".to_string(),
            staking_contract: address!("04290DACdb061C6C9A0B9735556744be49A64012"),
            block_time_ms: 2_000,
        }
    }

    /// Apply an operator RPC override without touching the rest of the
    /// profile.
    pub fn with_rpc_url(mut self, rpc_url: String) -> Self {
        self.rpc_url = rpc_url;
        self
    }

    pub fn explorer_tx_url(&self, hash: B256) -> String {
        format!("{}/tx/{hash:#x}", self.explorer_url)
    }
}
