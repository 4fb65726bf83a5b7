use crate::error::ConfigError;
use alloy::primitives::utils::parse_ether;
use rand::Rng;
use std::env;
use std::time::Duration;

const DEFAULT_MAX_CONCURRENCY_WITH_PROXY: usize = 10;
const DEFAULT_MAX_CONCURRENCY_NO_PROXY: usize = 5;
const DEFAULT_AMOUNT_TRANSFER_RANGE: &str = "0.0001,0.001";
const DEFAULT_AMOUNT_STAKE_RANGE: &str = "0.01,0.05";
const DEFAULT_DAILY_TRANSFER_COUNT: usize = 100;
const DEFAULT_REQUEST_DELAY_RANGE: &str = "1,5";
const DEFAULT_START_DELAY_RANGE: &str = "1,30";
const DEFAULT_ESTIMATED_GAS: u64 = 100_000;
const DEFAULT_TASK_TIMEOUT_SECS: u64 = 24 * 60 * 60;

const DEFAULT_KEYS_PATH: &str = "privateKeys.txt";
const DEFAULT_PROXIES_PATH: &str = "proxies.txt";
const DEFAULT_WALLETS_PATH: &str = "wallets.txt";

/// Inclusive amount range in wei. Monetary arithmetic never leaves the
/// chain's smallest unit; decimal TEA appears only in configuration input
/// and display output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountRange {
    pub min_wei: u128,
    pub max_wei: u128,
}

impl AmountRange {
    pub fn draw(&self) -> u128 {
        rand::thread_rng().gen_range(self.min_wei..=self.max_wei)
    }
}

/// Inclusive delay range; draws are uniform at millisecond granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn draw(&self) -> Duration {
        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub use_proxy: bool,
    pub max_concurrency_with_proxy: usize,
    pub max_concurrency_no_proxy: usize,
    pub amount_transfer_range: AmountRange,
    pub amount_stake_range: AmountRange,
    pub daily_transfer_count: usize,
    pub request_delay_range: DelayRange,
    pub start_delay_range: DelayRange,
    pub estimated_gas: u64,
    pub task_timeout: Duration,
    pub debug_logging: bool,
    pub rpc_url_override: Option<String>,
    pub keys_path: String,
    pub proxies_path: String,
    pub wallets_path: String,
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid(format!(
            "{name} must be a boolean, got `{other}`"
        ))),
    }
}

fn env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_bool(name, &raw),
        Err(_) => Ok(default),
    }
}

fn env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<usize>().map_err(|_| {
            ConfigError::Invalid(format!("{name} must be a positive integer, got `{raw}`"))
        }),
        Err(_) => Ok(default),
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!("{name} must be a positive integer, got `{raw}`"))
        }),
        Err(_) => Ok(default),
    }
}

fn split_range(name: &str, raw: &str) -> Result<(String, String), ConfigError> {
    let (min, max) = raw.split_once(',').ok_or_else(|| {
        ConfigError::Invalid(format!("{name} must be `min,max`, got `{raw}`"))
    })?;
    Ok((min.trim().to_string(), max.trim().to_string()))
}

fn parse_amount_range(name: &str, raw: &str) -> Result<AmountRange, ConfigError> {
    let (min_raw, max_raw) = split_range(name, raw)?;
    let to_wei = |part: &str| -> Result<u128, ConfigError> {
        let wei = parse_ether(part).map_err(|e| {
            ConfigError::Invalid(format!("{name} amount `{part}` is not a decimal TEA value: {e}"))
        })?;
        u128::try_from(wei)
            .map_err(|_| ConfigError::Invalid(format!("{name} amount `{part}` is out of range")))
    };
    let range = AmountRange {
        min_wei: to_wei(&min_raw)?,
        max_wei: to_wei(&max_raw)?,
    };
    if range.min_wei > range.max_wei {
        return Err(ConfigError::Invalid(format!(
            "{name} minimum exceeds maximum (`{raw}`)"
        )));
    }
    Ok(range)
}

fn parse_delay_range(name: &str, raw: &str) -> Result<DelayRange, ConfigError> {
    let (min_raw, max_raw) = split_range(name, raw)?;
    let to_duration = |part: &str| -> Result<Duration, ConfigError> {
        let secs = part.parse::<f64>().map_err(|_| {
            ConfigError::Invalid(format!("{name} delay `{part}` is not a number of seconds"))
        })?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "{name} delay `{part}` must be a non-negative number of seconds"
            )));
        }
        Ok(Duration::from_secs_f64(secs))
    };
    let range = DelayRange {
        min: to_duration(&min_raw)?,
        max: to_duration(&max_raw)?,
    };
    if range.min > range.max {
        return Err(ConfigError::Invalid(format!(
            "{name} minimum exceeds maximum (`{raw}`)"
        )));
    }
    Ok(range)
}

fn env_amount_range(name: &str, default: &str) -> Result<AmountRange, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_amount_range(name, &raw)
}

fn env_delay_range(name: &str, default: &str) -> Result<DelayRange, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_delay_range(name, &raw)
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let use_proxy = env_bool("USE_PROXY", false)?;
        let max_concurrency_with_proxy = env_usize(
            "MAX_CONCURRENCY_WITH_PROXY",
            DEFAULT_MAX_CONCURRENCY_WITH_PROXY,
        )?;
        let max_concurrency_no_proxy =
            env_usize("MAX_CONCURRENCY_NO_PROXY", DEFAULT_MAX_CONCURRENCY_NO_PROXY)?;
        if max_concurrency_with_proxy == 0 || max_concurrency_no_proxy == 0 {
            return Err(ConfigError::Invalid(
                "max concurrency must be at least 1".to_string(),
            ));
        }

        let amount_transfer_range =
            env_amount_range("AMOUNT_TRANSFER_RANGE", DEFAULT_AMOUNT_TRANSFER_RANGE)?;
        let amount_stake_range =
            env_amount_range("AMOUNT_STAKE_RANGE", DEFAULT_AMOUNT_STAKE_RANGE)?;
        let daily_transfer_count =
            env_usize("NUMBER_OF_DAILY_TRANSFERS", DEFAULT_DAILY_TRANSFER_COUNT)?;
        let request_delay_range =
            env_delay_range("DELAY_BETWEEN_REQUESTS_RANGE", DEFAULT_REQUEST_DELAY_RANGE)?;
        let start_delay_range = env_delay_range("START_DELAY_RANGE", DEFAULT_START_DELAY_RANGE)?;
        let estimated_gas = env_u64("ESTIMATED_GAS", DEFAULT_ESTIMATED_GAS)?;
        if estimated_gas == 0 {
            return Err(ConfigError::Invalid(
                "ESTIMATED_GAS must be at least 1".to_string(),
            ));
        }
        let task_timeout =
            Duration::from_secs(env_u64("TASK_TIMEOUT_SECS", DEFAULT_TASK_TIMEOUT_SECS)?);
        let debug_logging = env_bool("DEBUG_LOGGING", false)?;
        let rpc_url_override = env::var("RPC_URL").ok().filter(|v| !v.trim().is_empty());

        Ok(Self {
            use_proxy,
            max_concurrency_with_proxy,
            max_concurrency_no_proxy,
            amount_transfer_range,
            amount_stake_range,
            daily_transfer_count,
            request_delay_range,
            start_delay_range,
            estimated_gas,
            task_timeout,
            debug_logging,
            rpc_url_override,
            keys_path: env::var("PRIVATE_KEYS_PATH").unwrap_or_else(|_| DEFAULT_KEYS_PATH.into()),
            proxies_path: env::var("PROXIES_PATH").unwrap_or_else(|_| DEFAULT_PROXIES_PATH.into()),
            wallets_path: env::var("WALLETS_PATH").unwrap_or_else(|_| DEFAULT_WALLETS_PATH.into()),
        })
    }

    /// One concurrency budget applies behind proxies, another on a direct
    /// connection.
    pub fn max_concurrency(&self) -> usize {
        if self.use_proxy {
            self.max_concurrency_with_proxy
        } else {
            self.max_concurrency_no_proxy
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_proxy: false,
            max_concurrency_with_proxy: DEFAULT_MAX_CONCURRENCY_WITH_PROXY,
            max_concurrency_no_proxy: DEFAULT_MAX_CONCURRENCY_NO_PROXY,
            amount_transfer_range: AmountRange {
                // 0.0001..0.001 TEA
                min_wei: 100_000_000_000_000,
                max_wei: 1_000_000_000_000_000,
            },
            amount_stake_range: AmountRange {
                // 0.01..0.05 TEA
                min_wei: 10_000_000_000_000_000,
                max_wei: 50_000_000_000_000_000,
            },
            daily_transfer_count: DEFAULT_DAILY_TRANSFER_COUNT,
            request_delay_range: DelayRange {
                min: Duration::from_secs(1),
                max: Duration::from_secs(5),
            },
            start_delay_range: DelayRange {
                min: Duration::from_secs(1),
                max: Duration::from_secs(30),
            },
            estimated_gas: DEFAULT_ESTIMATED_GAS,
            task_timeout: Duration::from_secs(DEFAULT_TASK_TIMEOUT_SECS),
            debug_logging: false,
            rpc_url_override: None,
            keys_path: DEFAULT_KEYS_PATH.into(),
            proxies_path: DEFAULT_PROXIES_PATH.into(),
            wallets_path: DEFAULT_WALLETS_PATH.into(),
        }
    }
}
