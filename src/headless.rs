//! Headless Driver
//!
//! Runs the whole demo without a terminal UI: connect, switch network if
//! needed, fund when the balance is empty, pay, and print the explorer
//! link. It goes through the same controllers as the widget, so every
//! transition is gated identically.

use crate::actions::{self, DemoContext};
use crate::chain::ChainConfig;
use crate::config::Config;
use crate::flow::TransactionFlow;
use crate::session::{SessionController, SessionStatus};
use crate::token::Balance;
use crate::types::{Effect, WalletError};
use crate::utils::{checksum, full_hash};
use crate::wallet::{Connectors, WalletProvider};
use anyhow::{anyhow, bail, Result};
use ethers::types::{Address, TxHash};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a completed `run`
#[derive(Debug, Clone)]
pub struct RunReport {
    pub account: Address,
    pub funded: bool,
    pub balance_after: Option<Balance>,
    pub hash: TxHash,
    pub explorer_url: String,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Payment settled on Tempo")?;
        writeln!(f, "  account:  {}", checksum(&self.account))?;
        if self.funded {
            writeln!(f, "  funded:   yes (testnet faucet)")?;
        }
        if let Some(balance) = self.balance_after {
            writeln!(f, "  balance:  {} AlphaUSD", balance.display())?;
        }
        writeln!(f, "  tx:       {}", full_hash(&self.hash))?;
        write!(f, "  explorer: {}", self.explorer_url)
    }
}

/// Session snapshot printed by `status`
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub account: Address,
    pub chain_id: u64,
    pub status: SessionStatus,
    pub balance: Option<Balance>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "account: {}", checksum(&self.account))?;
        writeln!(f, "chain:   {} ({})", self.chain_id, self.status.as_str())?;
        match self.balance {
            Some(balance) => write!(f, "balance: {} AlphaUSD", balance.display()),
            None => write!(f, "balance: unavailable on this chain"),
        }
    }
}

struct Driver<'a> {
    ctx: &'a DemoContext,
    session: SessionController,
    flow: TransactionFlow,
    wallet: Option<Arc<dyn WalletProvider>>,
}

impl<'a> Driver<'a> {
    fn new(ctx: &'a DemoContext, chain: &ChainConfig, refresh_delay: Duration) -> Self {
        Self {
            ctx,
            session: SessionController::new(chain.id),
            flow: TransactionFlow::new(refresh_delay),
            wallet: None,
        }
    }

    fn wallet(&self) -> Result<Arc<dyn WalletProvider>> {
        self.wallet
            .clone()
            .ok_or_else(|| anyhow!("No wallet connected"))
    }

    async fn connect(&mut self, connectors: &Connectors) -> Result<()> {
        self.session.begin_connect()?;
        let effects = match actions::connect(connectors).await {
            Ok((wallet, account)) => {
                self.wallet = Some(wallet);
                self.session.complete_connect(Ok(account))
            }
            Err(WalletError::ProviderAbsent) => {
                self.session.complete_connect(Err(WalletError::ProviderAbsent));
                bail!("No wallet found. Set WALLET_PRIVATE_KEY or WALLET_KEYSTORE_PATH.");
            }
            Err(err) => self.session.complete_connect(Err(err)),
        };
        if let Some(error) = self.session.error() {
            bail!("{}", error);
        }
        self.apply(effects).await
    }

    async fn ensure_chain(&mut self) -> Result<()> {
        if self.session.status() != SessionStatus::WrongChain {
            return Ok(());
        }
        let chain_id = self.session.begin_switch()?;
        let result = actions::switch_chain(self.wallet()?.as_ref(), chain_id).await;
        let effects = self.session.complete_switch(result);
        if let Some(error) = self.session.error() {
            bail!("{}", error);
        }
        self.apply(effects).await
    }

    async fn fund_if_empty(&mut self) -> Result<bool> {
        if !self.flow.can_fund(&self.session) {
            return Ok(false);
        }
        let owner = self.flow.begin_fund(&self.session)?;
        let before = self.flow.balance().unwrap_or_default();
        let result = actions::fund(self.ctx, self.wallet()?.as_ref(), owner, before).await;
        self.flow.complete_fund(result);
        if let Some(error) = self.flow.error() {
            bail!("{}", error);
        }
        if let Some(notice) = self.flow.notice() {
            warn!("{}", notice);
        }
        Ok(true)
    }

    async fn execute(&mut self) -> Result<TxHash> {
        if !self.flow.can_execute(&self.session) {
            bail!("Balance is empty; testnet funds have not arrived yet");
        }
        self.flow.begin_execute(&self.session)?;
        let result = actions::execute(self.ctx, self.wallet()?.as_ref()).await;
        let effects = self.flow.complete_execute(result);
        if let Some(error) = self.flow.error() {
            bail!("{}", error);
        }
        let hash = self
            .flow
            .hash()
            .ok_or_else(|| anyhow!("Transaction completed without a hash"))?;
        self.apply(effects).await?;
        Ok(hash)
    }

    async fn disconnect(&mut self) {
        if self.session.disconnect().is_ok() {
            if let Some(wallet) = self.wallet.take() {
                actions::disconnect(wallet.as_ref()).await;
            }
        }
    }

    /// Effects run inline here; there is nothing to race against
    async fn apply(&mut self, effects: Vec<Effect>) -> Result<()> {
        for effect in effects {
            match effect {
                Effect::RefreshBalance => self.refresh_balance().await?,
                Effect::RefreshBalanceAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    self.refresh_balance().await?;
                }
                Effect::ResetAttempts => self.flow.reset_all(),
            }
        }
        Ok(())
    }

    async fn refresh_balance(&mut self) -> Result<()> {
        let owner = self
            .session
            .address()
            .ok_or_else(|| anyhow!("No account connected"))?;
        match actions::read_balance(self.wallet()?.as_ref(), &self.ctx.token, owner).await {
            Ok(balance) => self.flow.set_balance(balance),
            Err(e) => warn!("Balance read failed: {}", e),
        }
        Ok(())
    }
}

/// Connect, switch, fund if needed and pay once
pub async fn drive(
    ctx: &DemoContext,
    connectors: &Connectors,
    chain: &ChainConfig,
    refresh_delay: Duration,
) -> Result<RunReport> {
    let mut driver = Driver::new(ctx, chain, refresh_delay);

    driver.connect(connectors).await?;
    driver.ensure_chain().await?;
    let account = driver
        .session
        .address()
        .ok_or_else(|| anyhow!("No account connected"))?;
    info!(
        "Ready on {} with balance {:?}",
        chain.name,
        driver.flow.balance().map(|b| b.display())
    );

    let funded = driver.fund_if_empty().await?;
    let hash = driver.execute().await?;
    let balance_after = driver.flow.balance();
    driver.disconnect().await;

    Ok(RunReport {
        account,
        funded,
        balance_after,
        hash,
        explorer_url: chain.tx_url(&hash),
    })
}

/// Connect and report the session without paying
pub async fn inspect(ctx: &DemoContext, connectors: &Connectors, chain: &ChainConfig) -> Result<StatusReport> {
    let mut driver = Driver::new(ctx, chain, Duration::ZERO);
    driver.connect(connectors).await?;

    let report = StatusReport {
        account: driver
            .session
            .address()
            .ok_or_else(|| anyhow!("No account connected"))?,
        chain_id: driver.session.session().chain_id.unwrap_or_default(),
        status: driver.session.status(),
        balance: driver.flow.balance(),
    };
    driver.disconnect().await;
    Ok(report)
}

/// `m402-demo run`
pub async fn run(config: Config) -> Result<()> {
    let ctx = DemoContext::from_config(&config)?;
    let connectors = Connectors::from_config(&config.wallet, &config.chain)?;
    let report = drive(&ctx, &connectors, &config.chain, config.flow.refresh_delay).await?;
    println!("{}", report);
    Ok(())
}

/// `m402-demo status`
pub async fn status(config: Config) -> Result<()> {
    let ctx = DemoContext::from_config(&config)?;
    let connectors = Connectors::from_config(&config.wallet, &config.chain)?;
    let report = inspect(&ctx, &connectors, &config.chain).await?;
    println!("{}", report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;
    use crate::faucet::FaucetClient;
    use crate::memo::Memo;
    use crate::token::{demo_amount, Tip20, ALPHA_USD, DEMO_RECEIVER};
    use crate::wallet::testing::FakeWallet;

    const TARGET: u64 = 42431;

    fn context(faucet_url: String) -> DemoContext {
        DemoContext {
            token: Tip20::new(ALPHA_USD.parse().unwrap()).unwrap(),
            receiver: DEMO_RECEIVER.parse().unwrap(),
            amount: demo_amount().unwrap(),
            memo: Memo::DEMO,
            faucet: FaucetClient::new(faucet_url),
            settle: FlowConfig::default().settle(),
        }
    }

    fn connectors(wallet: &Arc<FakeWallet>) -> Connectors {
        Connectors::new(vec![wallet.clone() as Arc<dyn WalletProvider>])
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_from_wrong_chain_and_empty_balance() {
        let mut server = mockito::Server::new_async().await;
        let faucet = server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":[]}"#)
            .expect(1)
            .create_async()
            .await;

        let wallet = Arc::new(FakeWallet::new(1).with_balances(&[0, 1_000_000, 999_000]));
        let chain = ChainConfig::tempo_testnet();
        let report = drive(
            &context(server.url()),
            &connectors(&wallet),
            &chain,
            Duration::from_secs(2),
        )
        .await
        .unwrap();

        faucet.assert_async().await;
        assert!(report.funded);
        assert_eq!(report.hash, TxHash::repeat_byte(0x5a));
        assert_eq!(report.balance_after, Some(Balance::new(999_000u64)));
        assert_eq!(report.explorer_url, chain.tx_url(&report.hash));
        assert_eq!(wallet.writes().len(), 1);
        assert_eq!(wallet.balance_reads(), 3);
        assert!(!wallet.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_skips_faucet_with_balance() {
        let wallet = Arc::new(FakeWallet::new(TARGET).with_balances(&[5_000_000]));
        let report = drive(
            &context("http://127.0.0.1:1".into()),
            &connectors(&wallet),
            &ChainConfig::tempo_testnet(),
            Duration::from_secs(2),
        )
        .await
        .unwrap();

        assert!(!report.funded);
        assert_eq!(wallet.writes().len(), 1);
        assert!(report.to_string().contains("https://scout.tempo.xyz/tx/0x5a5a"));
    }

    #[tokio::test]
    async fn test_run_without_wallet() {
        let err = drive(
            &context("http://127.0.0.1:1".into()),
            &Connectors::default(),
            &ChainConfig::tempo_testnet(),
            Duration::ZERO,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("No wallet found"));
    }

    #[tokio::test]
    async fn test_run_stops_on_faucet_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"message":"busy"}}"#)
            .create_async()
            .await;

        let wallet = Arc::new(FakeWallet::new(TARGET));
        let err = drive(
            &context(server.url()),
            &connectors(&wallet),
            &ChainConfig::tempo_testnet(),
            Duration::ZERO,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Faucet failed: busy");
        assert!(wallet.writes().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_rejected_switch() {
        let wallet = Arc::new(
            FakeWallet::new(1).failing_switch(WalletError::UserRejected("denied".into())),
        );
        let err = drive(
            &context("http://127.0.0.1:1".into()),
            &connectors(&wallet),
            &ChainConfig::tempo_testnet(),
            Duration::ZERO,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "User rejected the request.");
    }

    #[tokio::test]
    async fn test_status_on_wrong_chain() {
        let wallet = Arc::new(FakeWallet::new(1));
        let report = inspect(
            &context("http://127.0.0.1:1".into()),
            &connectors(&wallet),
            &ChainConfig::tempo_testnet(),
        )
        .await
        .unwrap();
        assert_eq!(report.chain_id, 1);
        assert_eq!(report.status, SessionStatus::WrongChain);
        assert_eq!(report.balance, None);
        assert_eq!(wallet.balance_reads(), 0);
    }
}
