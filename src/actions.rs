//! External Operations
//!
//! The suspending calls behind each controller transition: connect, switch
//! chain, read balance, fund and execute. They take the wallet capability
//! explicitly and never touch controller state, so both the TUI (which
//! spawns them) and the headless driver (which awaits them) share them.

use crate::config::{Config, SettleStrategy};
use crate::faucet::{FaucetClient, FaucetError};
use crate::flow::FundOutcome;
use crate::memo::Memo;
use crate::token::{decode_balance, demo_amount, Balance, Tip20};
use crate::types::{WalletError, WalletResult};
use crate::wallet::{Account, Connectors, WalletProvider};
use ethers::types::{Address, TxHash, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything the payment needs besides the wallet itself
#[derive(Debug, Clone)]
pub struct DemoContext {
    pub token: Tip20,
    pub receiver: Address,
    pub amount: U256,
    pub memo: Memo,
    pub faucet: FaucetClient,
    pub settle: SettleStrategy,
}

impl DemoContext {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            token: Tip20::new(config.contracts.token)?,
            receiver: config.contracts.receiver,
            amount: demo_amount()?,
            memo: Memo::DEMO,
            faucet: FaucetClient::new(config.chain.rpc_url.clone()),
            settle: config.flow.settle(),
        })
    }
}

/// Connect the preferred connector
pub async fn connect(
    connectors: &Connectors,
) -> WalletResult<(Arc<dyn WalletProvider>, Account)> {
    let wallet = connectors.preferred().ok_or(WalletError::ProviderAbsent)?;
    info!("Connecting via {} ({})", wallet.name(), wallet.kind());
    let account = wallet.connect().await?;
    Ok((wallet, account))
}

pub async fn read_balance(
    wallet: &dyn WalletProvider,
    token: &Tip20,
    owner: Address,
) -> WalletResult<Balance> {
    let call = token.balance_of(owner)?;
    let balance = decode_balance(wallet.read_contract(&call).await?)?;
    debug!("Balance of {:#x}: {}", owner, balance.display());
    Ok(balance)
}

/// Request faucet funds, then wait for the credit per the settle strategy
pub async fn fund(
    ctx: &DemoContext,
    wallet: &dyn WalletProvider,
    owner: Address,
    before: Balance,
) -> Result<FundOutcome, FaucetError> {
    ctx.faucet.fund_address(owner).await?;

    match ctx.settle {
        SettleStrategy::Fixed(delay) => {
            tokio::time::sleep(delay).await;
            let balance = read_balance(wallet, &ctx.token, owner)
                .await
                .map_err(|e| warn!("Balance refresh after funding failed: {}", e))
                .ok();
            Ok(FundOutcome {
                balance,
                confirmed: None,
            })
        }
        SettleStrategy::Poll {
            interval,
            max_attempts,
        } => {
            let mut last = None;
            for attempt in 1..=max_attempts {
                tokio::time::sleep(interval).await;
                match read_balance(wallet, &ctx.token, owner).await {
                    Ok(balance) if balance.raw > before.raw => {
                        info!("Funding observed after {} poll(s)", attempt);
                        return Ok(FundOutcome {
                            balance: Some(balance),
                            confirmed: Some(true),
                        });
                    }
                    Ok(balance) => last = Some(balance),
                    Err(e) => warn!("Balance poll {} failed: {}", attempt, e),
                }
            }
            warn!("Funding not observed after {} poll(s)", max_attempts);
            Ok(FundOutcome {
                balance: last,
                confirmed: Some(false),
            })
        }
    }
}

/// Submit the memo-tagged transfer
pub async fn execute(ctx: &DemoContext, wallet: &dyn WalletProvider) -> WalletResult<TxHash> {
    let call = ctx
        .token
        .transfer_with_memo(ctx.receiver, ctx.amount, &ctx.memo)?;
    info!(
        "Sending {} base units to {:#x} with memo {}",
        ctx.amount, ctx.receiver, ctx.memo
    );
    wallet.write_contract(&call).await
}

pub async fn switch_chain(wallet: &dyn WalletProvider, chain_id: u64) -> WalletResult<u64> {
    info!("Requesting switch to chain {}", chain_id);
    wallet.switch_chain(chain_id).await
}

pub async fn disconnect(wallet: &dyn WalletProvider) {
    if let Err(e) = wallet.disconnect().await {
        warn!("Wallet disconnect failed: {}", e);
    }
}
