use crate::account::Account;
use crate::config::chains::ChainProfile;
use crate::error::TaskError;
use crate::proxy::ProxyBinder;
use crate::rpc::Connector;
use crate::task::{run_account_task, TaskContext};
use crate::utils::config::Settings;
use alloy::primitives::Address;
use std::sync::Arc;
use tokio::task::JoinError;
use tokio::time::{sleep, timeout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    Timeout,
}

/// Exactly one of these is produced per account, whatever the terminal
/// condition. Results are keyed by account index, never by completion
/// order.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub account_index: usize,
    pub outcome: Outcome,
    pub detail: Option<String>,
}

impl TaskResult {
    pub fn success(account_index: usize, detail: String) -> Self {
        Self {
            account_index,
            outcome: Outcome::Success,
            detail: Some(detail),
        }
    }

    pub fn failure(account_index: usize, detail: impl Into<String>) -> Self {
        Self {
            account_index,
            outcome: Outcome::Failure,
            detail: Some(detail.into()),
        }
    }

    pub fn timeout(account_index: usize) -> Self {
        Self {
            account_index,
            outcome: Outcome::Timeout,
            detail: None,
        }
    }
}

fn panic_payload_to_string(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "panic (unknown payload)".to_string()
}

fn join_failure_detail(err: JoinError) -> String {
    if err.is_panic() {
        format!("task panicked: {}", panic_payload_to_string(err.into_panic()))
    } else {
        "task cancelled before completion".to_string()
    }
}

/// Runs one account task inside a fault boundary: a hard wall-clock
/// timeout, and panic containment at the join point. Nothing that happens
/// inside a task can escape to the scheduler.
pub struct TaskExecutor {
    settings: Arc<Settings>,
    profile: Arc<ChainProfile>,
    binder: ProxyBinder,
    connector: Arc<dyn Connector>,
    address_pool: Arc<Vec<Address>>,
}

impl TaskExecutor {
    pub fn new(
        settings: Arc<Settings>,
        profile: Arc<ChainProfile>,
        connector: Arc<dyn Connector>,
        address_pool: Arc<Vec<Address>>,
    ) -> Self {
        let binder = ProxyBinder::new(settings.use_proxy);
        Self {
            settings,
            profile,
            binder,
            connector,
            address_pool,
        }
    }

    /// Drive one account to a `TaskResult`. On timeout the underlying task
    /// is abandoned with a best-effort abort; an in-flight submission is
    /// not rolled back.
    pub async fn execute(
        self: Arc<Self>,
        account: Arc<Account>,
        proxy_spec: Option<String>,
    ) -> TaskResult {
        let index = account.index;
        let budget = self.settings.task_timeout;
        let runner = Arc::clone(&self);
        let mut handle =
            tokio::spawn(async move { runner.run_pipeline(account, proxy_spec).await });

        match timeout(budget, &mut handle).await {
            Ok(Ok(Ok(detail))) => {
                tracing::info!("[{}] done: {detail}", index + 1);
                TaskResult::success(index, detail)
            }
            Ok(Ok(Err(err))) => {
                tracing::warn!("[{}] failed: {err}", index + 1);
                TaskResult::failure(index, err.to_string())
            }
            Ok(Err(join_err)) => {
                let detail = join_failure_detail(join_err);
                tracing::warn!("[{}] {detail}", index + 1);
                TaskResult::failure(index, detail)
            }
            Err(_) => {
                handle.abort();
                tracing::warn!(
                    "[{}] exceeded the {}s task budget, abandoned",
                    index + 1,
                    budget.as_secs()
                );
                TaskResult::timeout(index)
            }
        }
    }

    async fn run_pipeline(
        &self,
        account: Arc<Account>,
        proxy_spec: Option<String>,
    ) -> Result<String, TaskError> {
        let binding = self.binder.bind(proxy_spec.as_deref()).await?;

        // Behind a proxy pool, stagger first contact so the whole batch does
        // not hit the upstream at once.
        if self.settings.use_proxy && !binding.is_direct() {
            let delay = self.settings.start_delay_range.draw();
            tracing::info!(
                "[{}][{}][{}] starting in {}s",
                account.index + 1,
                account.address,
                binding.label(),
                delay.as_secs()
            );
            sleep(delay).await;
        }

        let client = self.connector.connect(&account, &binding).await?;
        let log_tag = TaskContext::log_tag(&account, &binding);
        let ctx = TaskContext {
            account,
            binding,
            settings: Arc::clone(&self.settings),
            profile: Arc::clone(&self.profile),
            address_pool: Arc::clone(&self.address_pool),
            client,
            log_tag,
        };
        run_account_task(&ctx).await
    }
}
