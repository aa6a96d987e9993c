use crate::chain::{ChainConfig, TEMPO_EXPLORER_URL, TEMPO_RPC_URL, TEMPO_TESTNET_ID, TEMPO_TESTNET_NAME};
use crate::token::{ALPHA_USD, DEMO_RECEIVER};
use anyhow::{bail, Context, Result};
use ethers::types::Address;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub chain: ChainConfig,
    pub contracts: ContractsConfig,
    pub wallet: WalletConfig,
    pub flow: FlowConfig,
    pub tui: TuiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ContractsConfig {
    pub token: Address,
    pub receiver: Address,
}

#[derive(Clone, Default)]
pub struct WalletConfig {
    pub private_key: Option<String>,
    pub keystore_path: Option<PathBuf>,
    pub keystore_password: Option<String>,
    pub initial_chain_id: Option<u64>,
    pub initial_rpc_url: Option<String>,
}

// Keys stay out of logs
impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("keystore_path", &self.keystore_path)
            .field("keystore_password", &self.keystore_password.as_ref().map(|_| "<redacted>"))
            .field("initial_chain_id", &self.initial_chain_id)
            .field("initial_rpc_url", &self.initial_rpc_url)
            .finish()
    }
}

/// How to wait for a faucet credit to become visible on chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStrategy {
    /// Sleep once, then read the balance
    Fixed(Duration),
    /// Read the balance every `interval` until it changes or `max_attempts` is reached
    Poll { interval: Duration, max_attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub fund_settle: Duration,
    pub refresh_delay: Duration,
    pub settle_strategy: String,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
}

impl FlowConfig {
    pub fn settle(&self) -> SettleStrategy {
        match self.settle_strategy.as_str() {
            "poll" => SettleStrategy::Poll {
                interval: self.poll_interval,
                max_attempts: self.poll_max_attempts.max(1),
            },
            _ => SettleStrategy::Fixed(self.fund_settle),
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            fund_settle: Duration::from_millis(4000),
            refresh_delay: Duration::from_millis(2000),
            settle_strategy: "fixed".to_string(),
            poll_interval: Duration::from_millis(1000),
            poll_max_attempts: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TuiConfig {
    pub tick_rate: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
}

fn parse_address(name: &str, default: &str) -> Result<Address> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .with_context(|| format!("{} is not a valid address: {}", name, raw))
}

fn millis(name: &str, default: u64) -> Result<Duration> {
    Ok(Duration::from_millis(
        env::var(name)
            .unwrap_or_else(|_| default.to_string())
            .parse()
            .with_context(|| format!("{} must be a number of milliseconds", name))?,
    ))
}

/// Lowercased settle strategy name; only `fixed` and `poll` are known
fn settle_strategy_name(raw: &str) -> Result<String> {
    let name = raw.trim().to_lowercase();
    match name.as_str() {
        "fixed" | "poll" => Ok(name),
        _ => bail!("M402_SETTLE_STRATEGY must be \"fixed\" or \"poll\", got {:?}", raw),
    }
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("m402-demo")
        .join("logs")
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = FlowConfig::default();

        Ok(Self {
            chain: ChainConfig {
                id: env::var("M402_CHAIN_ID")
                    .unwrap_or_else(|_| TEMPO_TESTNET_ID.to_string())
                    .parse()
                    .context("M402_CHAIN_ID must be an integer")?,
                name: env::var("M402_CHAIN_NAME").unwrap_or_else(|_| TEMPO_TESTNET_NAME.to_string()),
                rpc_url: env::var("M402_RPC_URL").unwrap_or_else(|_| TEMPO_RPC_URL.to_string()),
                explorer_url: env::var("M402_EXPLORER_URL")
                    .unwrap_or_else(|_| TEMPO_EXPLORER_URL.to_string()),
            },
            contracts: ContractsConfig {
                token: parse_address("M402_TOKEN_ADDRESS", ALPHA_USD)?,
                receiver: parse_address("M402_RECEIVER_ADDRESS", DEMO_RECEIVER)?,
            },
            wallet: WalletConfig {
                private_key: env::var("WALLET_PRIVATE_KEY").ok().filter(|k| !k.trim().is_empty()),
                keystore_path: env::var("WALLET_KEYSTORE_PATH").ok().map(PathBuf::from),
                keystore_password: env::var("WALLET_KEYSTORE_PASSWORD").ok(),
                initial_chain_id: env::var("WALLET_INITIAL_CHAIN_ID")
                    .ok()
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("WALLET_INITIAL_CHAIN_ID must be an integer")?,
                initial_rpc_url: env::var("WALLET_INITIAL_RPC_URL").ok(),
            },
            flow: FlowConfig {
                fund_settle: millis("M402_FUND_SETTLE_MS", 4000)?,
                refresh_delay: millis("M402_REFRESH_DELAY_MS", 2000)?,
                settle_strategy: settle_strategy_name(
                    &env::var("M402_SETTLE_STRATEGY").unwrap_or(defaults.settle_strategy),
                )?,
                poll_interval: millis("M402_POLL_INTERVAL_MS", 1000)?,
                poll_max_attempts: env::var("M402_POLL_MAX_ATTEMPTS")
                    .unwrap_or_else(|_| defaults.poll_max_attempts.to_string())
                    .parse()
                    .context("M402_POLL_MAX_ATTEMPTS must be an integer")?,
            },
            tui: TuiConfig {
                tick_rate: millis("M402_TICK_MS", 100)?,
            },
            logging: LoggingConfig {
                log_dir: env::var("M402_LOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| default_log_dir()),
            },
        })
    }
}
