use crate::account::Account;
use crate::config::chains::ChainProfile;
use crate::error::TaskError;
use crate::proxy::ProxyBinding;
use crate::utils::error::compact_error_message;
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::eth::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::sol_types::SolCall;
use alloy::transports::http::Http;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const RPC_ERR_MAX_LEN: usize = 260;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(180);
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub type HttpProvider = RootProvider<Http<Client>>;

sol! {
    function stake() payable;
    function withdraw(uint256 amount);
    function balanceOf(address owner) returns (uint256);
    function getReward();
}

pub fn stake_call_data() -> Bytes {
    stakeCall {}.abi_encode().into()
}

pub fn withdraw_call_data(amount: U256) -> Bytes {
    withdrawCall { amount }.abi_encode().into()
}

pub fn staked_balance_call_data(owner: Address) -> Bytes {
    balanceOfCall { owner }.abi_encode().into()
}

pub fn claim_call_data() -> Bytes {
    getRewardCall {}.abi_encode().into()
}

pub fn decode_staked_balance(data: &Bytes) -> Result<U256, TaskError> {
    let decoded = balanceOfCall::abi_decode_returns(data, true)
        .map_err(|e| TaskError::Connection(format!("cannot decode staked balance: {e}")))?;
    Ok(decoded._0)
}

/// A fully priced, ready-to-sign transaction. The account task plans the
/// transaction; the client owns signing, nonce selection and encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPlan {
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
    pub gas_price: u128,
}

/// Narrow chain-RPC boundary the account task talks through. Production
/// uses an alloy provider over a per-account HTTP client; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_balance(&self, address: Address) -> Result<U256, TaskError>;
    async fn gas_price(&self) -> Result<u128, TaskError>;
    /// Read-only contract call.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, TaskError>;
    /// Sign and broadcast; returns the transaction hash.
    async fn submit(&self, plan: TxPlan) -> Result<B256, TaskError>;
    /// Block until the transaction is included; returns the block number.
    async fn wait_for_confirmation(&self, hash: B256) -> Result<u64, TaskError>;
}

/// Creates one `ChainClient` per account task, bound to the task's egress
/// path.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        account: &Account,
        binding: &ProxyBinding,
    ) -> Result<Arc<dyn ChainClient>, TaskError>;
}

pub struct HttpChainClient {
    provider: HttpProvider,
    wallet: EthereumWallet,
    sender: Address,
    chain_id: u64,
    receipt_poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl HttpChainClient {
    pub fn new(provider: HttpProvider, signer: PrivateKeySigner, chain_id: u64) -> Self {
        let sender = signer.address();
        Self {
            provider,
            wallet: EthereumWallet::from(signer),
            sender,
            chain_id,
            receipt_poll_interval: Duration::from_secs(2),
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }
}

fn connection_err(e: impl std::fmt::Display) -> TaskError {
    TaskError::Connection(compact_error_message(&e.to_string(), RPC_ERR_MAX_LEN))
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn get_balance(&self, address: Address) -> Result<U256, TaskError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(connection_err)
    }

    async fn gas_price(&self) -> Result<u128, TaskError> {
        self.provider.get_gas_price().await.map_err(connection_err)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, TaskError> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        self.provider.call(&request).await.map_err(connection_err)
    }

    async fn submit(&self, plan: TxPlan) -> Result<B256, TaskError> {
        let nonce = self
            .provider
            .get_transaction_count(self.sender)
            .await
            .map_err(connection_err)?;

        let request = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(plan.to)
            .with_value(plan.value)
            .with_input(plan.input)
            .with_nonce(nonce)
            .with_chain_id(self.chain_id)
            .with_gas_limit(plan.gas_limit)
            .with_gas_price(plan.gas_price);

        let envelope = request.build(&self.wallet).await.map_err(|e| {
            TaskError::Submission(compact_error_message(&e.to_string(), RPC_ERR_MAX_LEN))
        })?;
        let encoded = envelope.encoded_2718();

        let pending = self
            .provider
            .send_raw_transaction(&encoded)
            .await
            .map_err(|e| {
                TaskError::Submission(compact_error_message(&e.to_string(), RPC_ERR_MAX_LEN))
            })?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_confirmation(&self, hash: B256) -> Result<u64, TaskError> {
        let deadline = Instant::now() + self.confirmation_timeout;
        loop {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    if let Some(block_number) = receipt.block_number {
                        return Ok(block_number);
                    }
                    // Receipt known but not yet anchored to a block; keep polling.
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(TaskError::Confirmation(compact_error_message(
                        &e.to_string(),
                        RPC_ERR_MAX_LEN,
                    )))
                }
            }
            if Instant::now() >= deadline {
                return Err(TaskError::Confirmation(format!(
                    "no receipt for {hash:#x} within {}s",
                    self.confirmation_timeout.as_secs()
                )));
            }
            sleep(self.receipt_poll_interval).await;
        }
    }
}

/// Builds an alloy provider over a per-account `reqwest` client, routed
/// through the task's proxy binding when one is present.
pub struct HttpConnector {
    profile: Arc<ChainProfile>,
    request_timeout: Duration,
}

impl HttpConnector {
    pub fn new(profile: Arc<ChainProfile>) -> Self {
        Self {
            profile,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(
        &self,
        account: &Account,
        binding: &ProxyBinding,
    ) -> Result<Arc<dyn ChainClient>, TaskError> {
        let rpc_url: reqwest::Url = self
            .profile
            .rpc_url
            .parse()
            .map_err(|e| TaskError::Connection(format!("invalid RPC URL: {e}")))?;

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.request_timeout);
        if let Some(proxy_url) = &binding.url {
            let proxy = reqwest::Proxy::all(proxy_url.clone())
                .map_err(|e| TaskError::Connection(format!("proxy rejected: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| TaskError::Connection(format!("cannot build HTTP client: {e}")))?;

        let transport = Http::with_client(client, rpc_url);
        let provider = HttpProvider::new(RpcClient::new(transport, false));
        let receipt_poll_interval = Duration::from_millis(self.profile.block_time_ms.max(500));
        Ok(Arc::new(
            HttpChainClient::new(provider, account.signer.clone(), self.profile.chain_id)
                .with_receipt_poll_interval(receipt_poll_interval),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_stake_selector() {
        let data = stake_call_data();
        assert_eq!(&data[..], &[0x3a, 0x4b, 0x66, 0xf1]);
    }

    #[test]
    fn test_withdraw_call_encoding() {
        let data = withdraw_call_data(U256::from(1));
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &[0x2e, 0x1a, 0x7d, 0x4d]);
        assert_eq!(data[35], 1);
    }

    #[test]
    fn test_staked_balance_call_encoding() {
        let owner = address!("7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
        let data = staked_balance_call_data(owner);
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(&data[16..], owner.as_slice());
    }

    #[test]
    fn test_claim_selector_matches_reward_entry_point() {
        let data = claim_call_data();
        assert_eq!(&data[..], &[0x3d, 0x18, 0xb9, 0x12]);
    }

    #[test]
    fn test_decode_staked_balance() {
        let raw = Bytes::from(U256::from(42u64).to_be_bytes::<32>().to_vec());
        assert_eq!(decode_staked_balance(&raw).unwrap(), U256::from(42u64));
        assert!(decode_staked_balance(&Bytes::from(vec![0u8; 3])).is_err());
    }
}
