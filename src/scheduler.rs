use crate::account::Account;
use crate::error::ConfigError;
use crate::executor::{Outcome, TaskExecutor, TaskResult};
use crate::utils::config::Settings;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;

/// Throttles aggregate request rate against the upstream RPC and the proxy
/// pool between batches.
pub const INTER_BATCH_COOLDOWN: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
}

impl RunSummary {
    pub fn from_results(results: &[TaskResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.outcome {
                Outcome::Success => summary.succeeded += 1,
                Outcome::Failure => summary.failed += 1,
                Outcome::Timeout => summary.timed_out += 1,
            }
        }
        summary
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} accounts: {} succeeded, {} failed, {} timed out",
            self.total, self.succeeded, self.failed, self.timed_out
        )
    }
}

#[derive(Debug)]
pub struct RunReport {
    /// One result per account, ordered by account index.
    pub results: Vec<TaskResult>,
    pub summary: RunSummary,
}

/// Batch sizes for a run: `min(max_concurrency, remaining)` until the
/// account list is exhausted.
pub fn batch_sizes(total: usize, max_concurrency: usize) -> Vec<usize> {
    let mut sizes = Vec::new();
    let mut remaining = total;
    while remaining > 0 {
        let size = max_concurrency.min(remaining);
        sizes.push(size);
        remaining -= size;
    }
    sizes
}

/// Drives the full run: strictly sequential batches of concurrently
/// executing account tasks, with a cool-down between batches and
/// order-independent result aggregation.
pub struct BatchScheduler {
    settings: Arc<Settings>,
    executor: Arc<TaskExecutor>,
    accounts: Vec<Arc<Account>>,
    proxies: Arc<Vec<String>>,
}

impl BatchScheduler {
    /// Validates the run preconditions. A violation here is a fatal
    /// configuration error: nothing has been scheduled yet.
    pub fn new(
        settings: Arc<Settings>,
        executor: Arc<TaskExecutor>,
        accounts: Vec<Arc<Account>>,
        proxies: Vec<String>,
    ) -> Result<Self, ConfigError> {
        if accounts.is_empty() {
            return Err(ConfigError::Invalid("account list is empty".to_string()));
        }
        if settings.use_proxy && proxies.len() < accounts.len() {
            return Err(ConfigError::Invalid(format!(
                "proxying requires at least one proxy per account: {} accounts, {} proxies",
                accounts.len(),
                proxies.len()
            )));
        }
        Ok(Self {
            settings,
            executor,
            accounts,
            proxies: Arc::new(proxies),
        })
    }

    fn proxy_for(&self, account_index: usize) -> Option<String> {
        if !self.settings.use_proxy || self.proxies.is_empty() {
            return None;
        }
        Some(self.proxies[account_index % self.proxies.len()].clone())
    }

    pub async fn run(&self) -> RunReport {
        let total = self.accounts.len();
        let max_concurrency = self.settings.max_concurrency();
        tracing::info!(
            "run start: {total} accounts, max concurrency {max_concurrency}, proxying {}",
            if self.settings.use_proxy { "on" } else { "off" }
        );

        let mut slots: Vec<Option<TaskResult>> = vec![None; total];
        let mut next = 0usize;
        let mut batch_index = 0usize;
        while next < total {
            let size = max_concurrency.min(total - next);
            tracing::info!(
                "batch {}: accounts {}..{}",
                batch_index + 1,
                next + 1,
                next + size
            );

            let mut pending: HashSet<usize> = HashSet::with_capacity(size);
            let mut join_set: JoinSet<TaskResult> = JoinSet::new();
            for account in &self.accounts[next..next + size] {
                let executor = Arc::clone(&self.executor);
                let account = Arc::clone(account);
                let proxy_spec = self.proxy_for(account.index);
                pending.insert(account.index);
                join_set.spawn(async move { executor.execute(account, proxy_spec).await });
            }

            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(result) => {
                        let account_index = result.account_index;
                        pending.remove(&account_index);
                        slots[account_index] = Some(result);
                    }
                    // The executor's own fault boundary makes this
                    // unreachable in practice; the pending sweep below
                    // still accounts for the lost worker.
                    Err(err) => tracing::warn!("batch worker join error: {err}"),
                }
            }
            for account_index in pending {
                slots[account_index] =
                    Some(TaskResult::failure(account_index, "worker failed to run"));
            }

            next += size;
            batch_index += 1;
            if next < total {
                tracing::debug!(
                    "cooling down {}s before next batch",
                    INTER_BATCH_COOLDOWN.as_secs()
                );
                sleep(INTER_BATCH_COOLDOWN).await;
            }
        }

        let results: Vec<TaskResult> = slots
            .into_iter()
            .enumerate()
            .map(|(account_index, slot)| {
                slot.unwrap_or_else(|| TaskResult::failure(account_index, "result never produced"))
            })
            .collect();
        let summary = RunSummary::from_results(&results);
        tracing::info!("run complete: {summary}");
        RunReport { results, summary }
    }
}
