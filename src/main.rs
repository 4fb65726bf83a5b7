//! Tea Swarm operator binary.
//!
//! Loads accounts, proxies and the destination pool, asks for one action and
//! drives the batch scheduler across every account. Exits 0 on a completed
//! run, 1 on a fatal configuration error.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::sync::Arc;
use tea_swarm::account::{load_accounts, load_address_pool, Action};
use tea_swarm::config::chains::ChainProfile;
use tea_swarm::error::ConfigError;
use tea_swarm::executor::{Outcome, TaskExecutor};
use tea_swarm::rpc::HttpConnector;
use tea_swarm::scheduler::BatchScheduler;
use tea_swarm::utils::config::Settings;
use tea_swarm::utils::load_lines;

fn init_tracing(settings: &Settings) {
    let default_directive = if settings.debug_logging { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Interactive action menu; `ACTION` in the environment skips the prompt
/// for unattended runs.
fn select_action(settings: &Settings) -> Result<Action> {
    if let Ok(raw) = std::env::var("ACTION") {
        return Action::parse(&raw)
            .with_context(|| format!("ACTION must be 1-5 or an action name, got `{raw}`"));
    }

    println!("===== MAIN MENU =====");
    println!("1. Send TEA to random addresses in wallets.txt");
    println!("2. Stake TEA");
    println!("3. Claim rewards");
    println!("4. Withdraw stTEA (unstake 80%)");
    println!("5. Daily task ({} transfers)", settings.daily_transfer_count);
    println!("=====================");
    print!("Choose an option (1-5): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Action::parse(&line).context("invalid option, expected 1-5")
}

#[tokio::main]
async fn main() -> Result<()> {
    tea_swarm::utils::env_guard::harden_env_setup();

    let settings = Arc::new(Settings::load()?);
    init_tracing(&settings);

    let action = select_action(&settings)?;

    let key_lines = load_lines(&settings.keys_path)?;
    let accounts = load_accounts(&key_lines, action)?;
    let proxies = if settings.use_proxy {
        load_lines(&settings.proxies_path)?
    } else {
        tracing::warn!("running without proxies");
        Vec::new()
    };
    let address_pool = match action {
        Action::Transfer | Action::Daily => {
            let pool = load_address_pool(&load_lines(&settings.wallets_path)?)?;
            if pool.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "`{}` has no destination addresses",
                    settings.wallets_path
                ))
                .into());
            }
            pool
        }
        _ => Vec::new(),
    };

    let mut profile = ChainProfile::tea_sepolia();
    if let Some(url) = &settings.rpc_url_override {
        profile = profile.with_rpc_url(url.clone());
    }
    let profile = Arc::new(profile);
    tracing::info!(
        "network: {} (chain id {}), action: {}",
        profile.name,
        profile.chain_id,
        action.as_str()
    );

    let connector = Arc::new(HttpConnector::new(Arc::clone(&profile)));
    let executor = Arc::new(TaskExecutor::new(
        Arc::clone(&settings),
        profile,
        connector,
        Arc::new(address_pool),
    ));
    let scheduler = BatchScheduler::new(Arc::clone(&settings), executor, accounts, proxies)?;

    let report = scheduler.run().await;
    for result in &report.results {
        if result.outcome != Outcome::Success {
            tracing::warn!(
                "[{}] {:?}: {}",
                result.account_index + 1,
                result.outcome,
                result.detail.as_deref().unwrap_or("-")
            );
        }
    }
    tracing::info!("{}", report.summary);
    Ok(())
}
