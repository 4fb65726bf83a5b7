use crate::error::ConfigError;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;
use std::sync::Arc;

/// The five supported run modes. One action is chosen per run and applied
/// uniformly to every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Native transfers to random destination-pool addresses, one round per
    /// pool entry.
    Transfer,
    /// Stake a random amount of native TEA into the staking contract.
    Stake,
    /// Claim accumulated staking rewards.
    Claim,
    /// Withdraw 80% of the staked balance.
    Withdraw,
    /// Fixed count of random transfers with randomized pacing.
    Daily,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Stake => "stake",
            Self::Claim => "claim",
            Self::Withdraw => "withdraw",
            Self::Daily => "daily",
        }
    }

    /// Accepts the menu ordinal (1-5) or the action name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "transfer" => Some(Self::Transfer),
            "2" | "stake" => Some(Self::Stake),
            "3" | "claim" => Some(Self::Claim),
            "4" | "withdraw" => Some(Self::Withdraw),
            "5" | "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

/// One blockchain identity the run acts on behalf of. Immutable once built;
/// the signer never leaves this struct.
#[derive(Debug, Clone)]
pub struct Account {
    pub index: usize,
    pub address: Address,
    pub signer: PrivateKeySigner,
    pub action: Action,
}

/// Build the account set from raw private-key lines, `0x` prefix optional.
/// Key material is never echoed back in errors; offending lines are
/// identified by position only.
pub fn load_accounts(key_lines: &[String], action: Action) -> Result<Vec<Arc<Account>>, ConfigError> {
    let mut accounts = Vec::with_capacity(key_lines.len());
    for (index, raw) in key_lines.iter().enumerate() {
        let clean = raw.trim().trim_start_matches("0x");
        let signer = PrivateKeySigner::from_str(clean).map_err(|_| {
            ConfigError::Invalid(format!("private key on line {} is not valid", index + 1))
        })?;
        accounts.push(Arc::new(Account {
            index,
            address: signer.address(),
            signer,
            action,
        }));
    }
    Ok(accounts)
}

/// Parse the destination address pool used for random transfers.
pub fn load_address_pool(lines: &[String]) -> Result<Vec<Address>, ConfigError> {
    let mut pool = Vec::with_capacity(lines.len());
    for (index, raw) in lines.iter().enumerate() {
        let address = Address::from_str(raw.trim()).map_err(|_| {
            ConfigError::Invalid(format!(
                "destination address on line {} is not valid: `{}`",
                index + 1,
                raw.trim()
            ))
        })?;
        pool.push(address);
    }
    Ok(pool)
}
