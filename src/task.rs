use crate::account::{Account, Action};
use crate::config::chains::ChainProfile;
use crate::error::TaskError;
use crate::proxy::ProxyBinding;
use crate::rpc::{
    claim_call_data, decode_staked_balance, stake_call_data, staked_balance_call_data,
    withdraw_call_data, ChainClient, TxPlan,
};
use crate::utils::config::Settings;
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, Bytes, B256, U256};
use rand::Rng;
use std::sync::Arc;
use tokio::time::sleep;

/// Everything one account task needs, assembled by the executor after the
/// proxy bind and connection steps. All shared inputs are read-only.
pub struct TaskContext {
    pub account: Arc<Account>,
    pub binding: ProxyBinding,
    pub settings: Arc<Settings>,
    pub profile: Arc<ChainProfile>,
    pub address_pool: Arc<Vec<Address>>,
    pub client: Arc<dyn ChainClient>,
    pub log_tag: String,
}

impl TaskContext {
    pub fn log_tag(account: &Account, binding: &ProxyBinding) -> String {
        format!("[{}][{}][{}]", account.index + 1, account.address, binding.label())
    }
}

/// Withdrawals always take 80% of the staked balance, floored by integer
/// division.
pub fn withdraw_amount(staked: U256) -> U256 {
    staked * U256::from(80) / U256::from(100)
}

/// Run the account's requested action to completion. Every failure path
/// maps onto the task error taxonomy; the caller owns timeout and panic
/// containment.
pub async fn run_account_task(ctx: &TaskContext) -> Result<String, TaskError> {
    log_wallet_info(ctx).await;

    let detail = match ctx.account.action {
        Action::Transfer => run_transfer_round(ctx, ctx.address_pool.len()).await?,
        Action::Daily => run_transfer_round(ctx, ctx.settings.daily_transfer_count).await?,
        Action::Stake => run_stake(ctx).await?,
        Action::Withdraw => run_withdraw(ctx).await?,
        Action::Claim => run_claim(ctx).await?,
    };

    log_wallet_info(ctx).await;
    Ok(detail)
}

/// Balance snapshot for the operator log. Best-effort: a failed read here
/// must not fail the task, the action pipeline re-checks funds itself.
async fn log_wallet_info(ctx: &TaskContext) {
    let balance = match ctx.client.get_balance(ctx.account.address).await {
        Ok(balance) => balance,
        Err(err) => {
            tracing::debug!("{} wallet info unavailable: {err}", ctx.log_tag);
            return;
        }
    };
    let staked = staked_balance(ctx).await.unwrap_or_default();
    tracing::info!(
        "{} balance: {} {} | staked: {} st{}",
        ctx.log_tag,
        format_ether(balance),
        ctx.profile.symbol,
        format_ether(staked),
        ctx.profile.symbol,
    );
}

async fn staked_balance(ctx: &TaskContext) -> Result<U256, TaskError> {
    let data = ctx
        .client
        .call(
            ctx.profile.staking_contract,
            staked_balance_call_data(ctx.account.address),
        )
        .await?;
    decode_staked_balance(&data)
}

/// Precondition check: the account must cover `value` plus the configured
/// gas budget before any chain-mutating call is issued.
async fn ensure_funds(ctx: &TaskContext, value: U256, gas_price: u128) -> Result<(), TaskError> {
    let gas_cost = U256::from(gas_price) * U256::from(ctx.settings.estimated_gas);
    let required = value + gas_cost;
    let available = ctx.client.get_balance(ctx.account.address).await?;
    if available < required {
        return Err(TaskError::InsufficientFunds {
            available,
            required,
        });
    }
    Ok(())
}

/// Submission failures earn exactly one resubmission by the same task;
/// every other error class propagates immediately.
async fn submit_with_retry(ctx: &TaskContext, plan: TxPlan) -> Result<B256, TaskError> {
    match ctx.client.submit(plan.clone()).await {
        Ok(hash) => Ok(hash),
        Err(err) if err.is_retryable() => {
            tracing::warn!("{} resubmitting once after: {err}", ctx.log_tag);
            ctx.client.submit(plan).await
        }
        Err(err) => Err(err),
    }
}

async fn submit_and_confirm(ctx: &TaskContext, plan: TxPlan) -> Result<u64, TaskError> {
    let hash = submit_with_retry(ctx, plan).await?;
    tracing::info!(
        "{} transaction sent: {}",
        ctx.log_tag,
        ctx.profile.explorer_tx_url(hash)
    );
    let block_number = ctx.client.wait_for_confirmation(hash).await?;
    tracing::info!("{} confirmed in block {block_number}", ctx.log_tag);
    Ok(block_number)
}

async fn run_stake(ctx: &TaskContext) -> Result<String, TaskError> {
    let amount = U256::from(ctx.settings.amount_stake_range.draw());
    let gas_price = ctx.client.gas_price().await?;
    ensure_funds(ctx, amount, gas_price).await?;

    tracing::info!(
        "{} staking {} {}",
        ctx.log_tag,
        format_ether(amount),
        ctx.profile.symbol
    );
    let block_number = submit_and_confirm(
        ctx,
        TxPlan {
            to: ctx.profile.staking_contract,
            value: amount,
            input: stake_call_data(),
            gas_limit: ctx.settings.estimated_gas,
            gas_price,
        },
    )
    .await?;
    Ok(format!(
        "staked {} {} in block {block_number}",
        format_ether(amount),
        ctx.profile.symbol
    ))
}

async fn run_withdraw(ctx: &TaskContext) -> Result<String, TaskError> {
    let staked = staked_balance(ctx).await?;
    let amount = withdraw_amount(staked);
    // Cannot trigger with the 80% computation; kept as a guard against a
    // balance moving between the read and the submission.
    if staked < amount {
        return Err(TaskError::InsufficientFunds {
            available: staked,
            required: amount,
        });
    }
    let gas_price = ctx.client.gas_price().await?;
    ensure_funds(ctx, U256::ZERO, gas_price).await?;

    tracing::info!(
        "{} withdrawing {} st{}",
        ctx.log_tag,
        format_ether(amount),
        ctx.profile.symbol
    );
    let block_number = submit_and_confirm(
        ctx,
        TxPlan {
            to: ctx.profile.staking_contract,
            value: U256::ZERO,
            input: withdraw_call_data(amount),
            gas_limit: ctx.settings.estimated_gas,
            gas_price,
        },
    )
    .await?;
    Ok(format!(
        "withdrew {} st{} in block {block_number}",
        format_ether(amount),
        ctx.profile.symbol
    ))
}

async fn run_claim(ctx: &TaskContext) -> Result<String, TaskError> {
    let gas_price = ctx.client.gas_price().await?;
    ensure_funds(ctx, U256::ZERO, gas_price).await?;

    tracing::info!("{} claiming staking rewards", ctx.log_tag);
    let block_number = submit_and_confirm(
        ctx,
        TxPlan {
            to: ctx.profile.staking_contract,
            value: U256::ZERO,
            input: claim_call_data(),
            gas_limit: ctx.settings.estimated_gas,
            gas_price,
        },
    )
    .await?;
    Ok(format!("claimed rewards in block {block_number}"))
}

async fn send_to_random_address(
    ctx: &TaskContext,
    amount_wei: u128,
) -> Result<(u64, Address), TaskError> {
    let dest = {
        let mut rng = rand::thread_rng();
        ctx.address_pool[rng.gen_range(0..ctx.address_pool.len())]
    };
    let value = U256::from(amount_wei);
    let gas_price = ctx.client.gas_price().await?;
    ensure_funds(ctx, value, gas_price).await?;

    let block_number = submit_and_confirm(
        ctx,
        TxPlan {
            to: dest,
            value,
            input: Bytes::new(),
            gas_limit: ctx.settings.estimated_gas,
            gas_price,
        },
    )
    .await?;
    Ok((block_number, dest))
}

/// A round of random transfers. A zero amount draw skips the iteration
/// without counting it; individual transfer failures are recorded and the
/// round continues, failing only when every attempted transfer failed.
async fn run_transfer_round(ctx: &TaskContext, count: usize) -> Result<String, TaskError> {
    if ctx.address_pool.is_empty() {
        return Err(TaskError::Connection(
            "destination address pool is empty".to_string(),
        ));
    }
    tracing::info!("{} starting {count} transfers", ctx.log_tag);

    let mut confirmed = 0usize;
    let mut attempted = 0usize;
    let mut last_error: Option<TaskError> = None;
    for i in 0..count {
        let amount = ctx.settings.amount_transfer_range.draw();
        // A zero draw skips the iteration outright, pacing delay included.
        if amount == 0 {
            tracing::debug!("{} transfer {}/{count} drew zero, skipped", ctx.log_tag, i + 1);
            continue;
        }
        attempted += 1;
        match send_to_random_address(ctx, amount).await {
            Ok((block_number, dest)) => {
                confirmed += 1;
                tracing::info!(
                    "{} transfer {}/{count}: {} {} to {dest} in block {block_number}",
                    ctx.log_tag,
                    i + 1,
                    format_ether(U256::from(amount)),
                    ctx.profile.symbol,
                );
            }
            Err(err) => {
                tracing::warn!("{} transfer {}/{count} failed: {err}", ctx.log_tag, i + 1);
                last_error = Some(err);
            }
        }
        if i + 1 < count {
            sleep(ctx.settings.request_delay_range.draw()).await;
        }
    }

    if let Some(err) = last_error {
        if confirmed == 0 {
            return Err(err);
        }
    }
    Ok(format!("{confirmed}/{attempted} transfers confirmed"))
}
