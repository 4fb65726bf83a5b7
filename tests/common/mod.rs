#![allow(dead_code)]

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tea_swarm::account::{load_accounts, Account, Action};
use tea_swarm::config::chains::ChainProfile;
use tea_swarm::error::TaskError;
use tea_swarm::executor::TaskExecutor;
use tea_swarm::proxy::ProxyBinding;
use tea_swarm::rpc::{ChainClient, Connector, TxPlan};
use tea_swarm::scheduler::BatchScheduler;
use tea_swarm::utils::config::{AmountRange, DelayRange, Settings};

/// Shared in-memory chain state observed by every mock client in a run.
pub struct ChainState {
    pub balance: U256,
    pub staked: U256,
    pub gas_price: u128,
    /// Countdown of submissions to fail with a `Submission` error.
    pub submit_failures: AtomicUsize,
    /// Total `submit` invocations, failed ones included.
    pub submit_calls: AtomicUsize,
    /// Successfully accepted transaction plans.
    pub submissions: Mutex<Vec<TxPlan>>,
    /// Simulated confirmation latency.
    pub confirm_delay: Duration,
    active: AtomicUsize,
    high_water: AtomicUsize,
}

impl ChainState {
    pub fn funded() -> Arc<Self> {
        Arc::new(Self {
            balance: U256::from(10_000_000_000_000_000_000u128), // 10 TEA
            staked: U256::ZERO,
            gas_price: 1_000_000_000, // 1 gwei
            submit_failures: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            confirm_delay: Duration::from_secs(1),
            active: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        })
    }

    /// Funded state with an existing staked balance.
    pub fn funded_staked(staked: U256) -> Arc<Self> {
        Arc::new(Self {
            balance: U256::from(10_000_000_000_000_000_000u128),
            staked,
            gas_price: 1_000_000_000,
            submit_failures: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            confirm_delay: Duration::from_secs(1),
            active: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        })
    }

    /// Funded state whose confirmations never arrive within a sane task
    /// budget.
    pub fn funded_slow(confirm_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            balance: U256::from(10_000_000_000_000_000_000u128),
            staked: U256::ZERO,
            gas_price: 1_000_000_000,
            submit_failures: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            confirm_delay,
            active: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        })
    }

    pub fn broke() -> Arc<Self> {
        Arc::new(Self {
            balance: U256::ZERO,
            staked: U256::ZERO,
            gas_price: 1_000_000_000,
            submit_failures: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            confirm_delay: Duration::from_secs(1),
            active: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        })
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    pub fn accepted_submissions(&self) -> Vec<TxPlan> {
        self.submissions.lock().unwrap().clone()
    }

    fn task_started(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
    }

    fn task_finished(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One mock client per task; its lifetime brackets the task's chain access,
/// which is what the concurrency high-water mark measures.
pub struct MockChainClient {
    state: Arc<ChainState>,
}

impl Drop for MockChainClient {
    fn drop(&mut self) {
        self.state.task_finished();
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_balance(&self, _address: Address) -> Result<U256, TaskError> {
        Ok(self.state.balance)
    }

    async fn gas_price(&self) -> Result<u128, TaskError> {
        Ok(self.state.gas_price)
    }

    async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes, TaskError> {
        Ok(Bytes::from(self.state.staked.to_be_bytes::<32>().to_vec()))
    }

    async fn submit(&self, plan: TxPlan) -> Result<B256, TaskError> {
        let call_index = self.state.submit_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.state.submit_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.state.submit_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(TaskError::Submission("simulated broadcast failure".to_string()));
        }
        self.state.submissions.lock().unwrap().push(plan);
        Ok(B256::from(U256::from(call_index as u64 + 1).to_be_bytes::<32>()))
    }

    async fn wait_for_confirmation(&self, _hash: B256) -> Result<u64, TaskError> {
        tokio::time::sleep(self.state.confirm_delay).await;
        Ok(7_777)
    }
}

pub struct MockConnector {
    state: Arc<ChainState>,
    /// Account index whose connection attempt panics, for fault-boundary
    /// tests.
    pub panic_on_index: Option<usize>,
}

impl MockConnector {
    pub fn new(state: Arc<ChainState>) -> Self {
        Self {
            state,
            panic_on_index: None,
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        account: &Account,
        _binding: &ProxyBinding,
    ) -> Result<Arc<dyn ChainClient>, TaskError> {
        if self.panic_on_index == Some(account.index) {
            panic!("mock connector blew up");
        }
        self.state.task_started();
        Ok(Arc::new(MockChainClient {
            state: Arc::clone(&self.state),
        }))
    }
}

/// Settings tuned for deterministic tests: tight delay ranges, fixed
/// transfer amount, short timeout overridable per test.
pub fn test_settings() -> Settings {
    Settings {
        amount_transfer_range: AmountRange {
            min_wei: 1_000,
            max_wei: 1_000,
        },
        amount_stake_range: AmountRange {
            min_wei: 2_000,
            max_wei: 2_000,
        },
        request_delay_range: DelayRange {
            min: Duration::from_millis(10),
            max: Duration::from_millis(10),
        },
        start_delay_range: DelayRange {
            min: Duration::ZERO,
            max: Duration::ZERO,
        },
        daily_transfer_count: 5,
        task_timeout: Duration::from_secs(3600),
        ..Settings::default()
    }
}

/// Deterministic throwaway keys: 0x...01, 0x...02, ...
pub fn test_accounts(count: usize, action: Action) -> Vec<Arc<Account>> {
    let lines: Vec<String> = (1..=count).map(|i| format!("{i:064x}")).collect();
    load_accounts(&lines, action).expect("test keys are valid")
}

pub fn test_pool(count: usize) -> Vec<Address> {
    (1..=count)
        .map(|i| Address::from_slice(&{
            let mut raw = [0u8; 20];
            raw[19] = i as u8;
            raw
        }))
        .collect()
}

pub fn build_scheduler(
    settings: Settings,
    state: Arc<ChainState>,
    accounts: Vec<Arc<Account>>,
    proxies: Vec<String>,
    pool: Vec<Address>,
) -> Result<BatchScheduler, tea_swarm::error::ConfigError> {
    build_scheduler_with_connector(settings, MockConnector::new(state), accounts, proxies, pool)
}

pub fn build_scheduler_with_connector(
    settings: Settings,
    connector: MockConnector,
    accounts: Vec<Arc<Account>>,
    proxies: Vec<String>,
    pool: Vec<Address>,
) -> Result<BatchScheduler, tea_swarm::error::ConfigError> {
    let settings = Arc::new(settings);
    let profile = Arc::new(ChainProfile::tea_sepolia());
    let executor = Arc::new(TaskExecutor::new(
        Arc::clone(&settings),
        profile,
        Arc::new(connector),
        Arc::new(pool),
    ));
    BatchScheduler::new(settings, executor, accounts, proxies)
}
