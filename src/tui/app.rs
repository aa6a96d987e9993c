//! Application State
//!
//! Owns the session and flow controllers. User actions start external
//! operations on spawned tasks; their results come back as [`AppEvent`]s
//! and are applied on the UI loop, so controllers are only ever mutated
//! from one place.

use crate::actions::{self, DemoContext};
use crate::chain::ChainConfig;
use crate::faucet::FaucetError;
use crate::flow::{FundOutcome, FundingState, TransactionFlow, TxState};
use crate::session::{SessionController, SessionStatus};
use crate::token::Balance;
use crate::tui::event::AppAction;
use crate::types::{Effect, FlowError, WalletResult};
use crate::utils::{display_address, full_hash};
use crate::wallet::{Account, Connectors, WalletProvider};
use chrono::{DateTime, Utc};
use ethers::types::TxHash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Ticks between checks of the wallet's active network
pub const ACCOUNT_POLL_TICKS: u64 = 20;

/// Activity entries kept for display
pub const MAX_ACTIVITY: usize = 500;

/// Current view/screen
#[derive(Debug, Clone, PartialEq, Default)]
pub enum View {
    #[default]
    Main,
    Help,
}

/// Severity of an activity log entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A line in the activity log
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Results of spawned operations. Everything but `Connected` carries the
/// session epoch the operation was started under.
#[derive(Debug)]
pub enum AppEvent {
    Connected(WalletResult<(Arc<dyn WalletProvider>, Account)>),
    ChainSwitched {
        epoch: u64,
        result: WalletResult<u64>,
    },
    BalanceLoaded {
        epoch: u64,
        result: WalletResult<Balance>,
    },
    Funded {
        epoch: u64,
        result: Result<FundOutcome, FaucetError>,
    },
    Executed {
        epoch: u64,
        result: WalletResult<TxHash>,
    },
    /// `seen_chain` is the session's chain id when the poll started
    AccountPolled {
        epoch: u64,
        seen_chain: Option<u64>,
        result: WalletResult<Option<Account>>,
    },
}

/// Main application state
pub struct App {
    pub chain: ChainConfig,
    pub ctx: DemoContext,
    pub connectors: Connectors,
    pub wallet: Option<Arc<dyn WalletProvider>>,

    // Controllers
    pub session: SessionController,
    pub flow: TransactionFlow,

    // UI State
    pub view: View,
    pub should_quit: bool,
    pub activity: Vec<ActivityEntry>,
    pub scroll_offset: u16,
    pub max_scroll: u16,
    pub tick: u64,
    quit_armed: bool,
    account_poll_pending: bool,

    // Async communication
    event_rx: mpsc::Receiver<AppEvent>,
    event_tx: mpsc::Sender<AppEvent>,
}

impl App {
    pub fn new(
        chain: ChainConfig,
        ctx: DemoContext,
        connectors: Connectors,
        refresh_delay: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(100);

        let mut app = Self {
            session: SessionController::new(chain.id),
            flow: TransactionFlow::new(refresh_delay),
            chain,
            ctx,
            connectors,
            wallet: None,
            view: View::Main,
            should_quit: false,
            activity: Vec::new(),
            scroll_offset: 0,
            max_scroll: 0,
            tick: 0,
            quit_armed: false,
            account_poll_pending: false,
            event_rx: rx,
            event_tx: tx,
        };

        if app.connectors.is_empty() {
            app.log(
                LogLevel::Warning,
                "No wallet found. Set WALLET_PRIVATE_KEY or WALLET_KEYSTORE_PATH to take part.",
            );
        } else {
            app.log(
                LogLevel::Info,
                format!("Ready. Press [c] to connect and pay on {}.", app.chain.name),
            );
        }
        app
    }

    pub fn has_wallet(&self) -> bool {
        !self.connectors.is_empty()
    }

    /// The error to show under the widget, most recent source first
    pub fn error(&self) -> Option<&str> {
        self.flow.error().or_else(|| self.session.error())
    }

    pub fn explorer_link(&self) -> Option<String> {
        self.flow.hash().map(|h| self.chain.tx_url(&h))
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.activity.push(ActivityEntry {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        });
        if self.activity.len() > MAX_ACTIVITY {
            let excess = self.activity.len() - MAX_ACTIVITY;
            self.activity.drain(..excess);
        }
        self.scroll_to_bottom();
    }

    /// A faucet claim or payment has been started and not yet answered
    pub fn has_operation_in_flight(&self) -> bool {
        self.flow.tx_state() == TxState::Executing || self.flow.funding() == FundingState::Funding
    }

    /// Poll for async events
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Apply the result of a spawned operation
    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Connected(result) => {
                let effects = match result {
                    Ok((wallet, account)) => {
                        self.log(
                            LogLevel::Success,
                            format!(
                                "Connected {} via {}",
                                display_address(&account.address),
                                wallet.name()
                            ),
                        );
                        self.wallet = Some(wallet);
                        let effects = self.session.complete_connect(Ok(account));
                        if self.session.status() == SessionStatus::WrongChain {
                            self.log(
                                LogLevel::Warning,
                                format!("Switch to {} to continue.", self.chain.name),
                            );
                        }
                        effects
                    }
                    Err(err) => {
                        let effects = self.session.complete_connect(Err(err));
                        if let Some(message) = self.session.error() {
                            let message = message.to_string();
                            self.log(LogLevel::Error, message);
                        }
                        effects
                    }
                };
                self.apply_effects(effects);
            }
            AppEvent::ChainSwitched { epoch, result } => {
                if self.is_stale(epoch) {
                    return;
                }
                let effects = self.session.complete_switch(result);
                match self.session.error() {
                    Some(message) => {
                        let message = message.to_string();
                        self.log(LogLevel::Error, message);
                    }
                    None => self.log(LogLevel::Success, format!("Switched to {}", self.chain.name)),
                }
                self.apply_effects(effects);
            }
            AppEvent::BalanceLoaded { epoch, result } => {
                if self.is_stale(epoch) {
                    return;
                }
                match result {
                    Ok(balance) => {
                        debug!("Balance loaded: {}", balance.display());
                        self.flow.set_balance(balance);
                    }
                    Err(err) => {
                        warn!("Balance read failed: {}", err);
                        self.log(
                            LogLevel::Warning,
                            format!("Balance read failed: {}", err.describe("unknown error")),
                        );
                    }
                }
            }
            AppEvent::Funded { epoch, result } => {
                if self.is_stale(epoch) {
                    return;
                }
                self.flow.complete_fund(result);
                match self.flow.error() {
                    Some(message) => {
                        let message = message.to_string();
                        self.log(LogLevel::Error, message);
                    }
                    None => {
                        let balance = self.flow.balance().unwrap_or_default().display();
                        self.log(LogLevel::Success, format!("Testnet funds claimed, balance {}", balance));
                    }
                }
                if let Some(notice) = self.flow.notice() {
                    let notice = notice.to_string();
                    self.log(LogLevel::Warning, notice);
                }
            }
            AppEvent::Executed { epoch, result } => {
                if self.is_stale(epoch) {
                    return;
                }
                let effects = self.flow.complete_execute(result);
                match (self.flow.hash(), self.flow.error()) {
                    (Some(hash), _) => {
                        self.log(LogLevel::Success, format!("Payment settled on Tempo: {}", full_hash(&hash)));
                    }
                    (None, Some(message)) => {
                        let message = message.to_string();
                        self.log(LogLevel::Error, message);
                    }
                    (None, None) => {}
                }
                self.apply_effects(effects);
            }
            AppEvent::AccountPolled {
                epoch,
                seen_chain,
                result,
            } => {
                self.account_poll_pending = false;
                if self.is_stale(epoch) || self.session.session().chain_id != seen_chain {
                    return;
                }
                match result {
                    Ok(Some(account)) => self.on_account(account),
                    Ok(None) => {
                        warn!("Wallet no longer reports an account");
                        if self.session.status().is_connected() {
                            self.log(LogLevel::Warning, "The wallet dropped the connection");
                            self.disconnect();
                        }
                    }
                    Err(err) => debug!("Account poll failed: {}", err),
                }
            }
        }
    }

    /// Follow a network change made in the wallet itself
    fn on_account(&mut self, account: Account) {
        if self.session.session().chain_id == Some(account.chain_id) {
            return;
        }
        let was_ready = self.session.is_ready();
        let effects = self.session.on_chain_changed(account.chain_id);
        match (was_ready, self.session.is_ready()) {
            (true, false) => self.log(
                LogLevel::Warning,
                format!(
                    "Wallet moved to chain {}. Switch back to {} to continue.",
                    account.chain_id, self.chain.name
                ),
            ),
            (false, true) => self.log(LogLevel::Success, format!("Wallet is back on {}", self.chain.name)),
            _ => {}
        }
        self.apply_effects(effects);
    }

    fn is_stale(&self, epoch: u64) -> bool {
        let stale = epoch != self.session.epoch();
        if stale {
            debug!(
                "Dropping result from epoch {} (current {})",
                epoch,
                self.session.epoch()
            );
        }
        stale
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RefreshBalance => self.spawn_balance_refresh(None),
                Effect::RefreshBalanceAfter(delay) => self.spawn_balance_refresh(Some(delay)),
                Effect::ResetAttempts => self.flow.reset_all(),
            }
        }
    }

    fn refused(&self, err: FlowError) {
        debug!("Action refused: {}", err);
    }

    /// Handle a user action
    pub fn handle_action(&mut self, action: AppAction) {
        if self.view == View::Help && !matches!(action, AppAction::Tick) {
            // any key closes help
            self.view = View::Main;
            return;
        }

        match action {
            AppAction::Quit => {
                if self.has_operation_in_flight() && !self.quit_armed {
                    self.quit_armed = true;
                    self.log(
                        LogLevel::Warning,
                        "A request is still waiting on the wallet or faucet. Press [q] again to quit.",
                    );
                } else {
                    self.should_quit = true;
                }
            }
            AppAction::ForceQuit => {
                self.should_quit = true;
            }
            AppAction::Connect => self.connect(),
            AppAction::SwitchChain => self.switch_chain(),
            AppAction::Fund => self.fund(),
            AppAction::Execute => self.execute(),
            AppAction::Reset => match self.flow.reset() {
                Ok(()) => self.log(LogLevel::Info, "Ready for another transaction"),
                Err(e) => self.refused(e),
            },
            AppAction::RefreshBalance => {
                if self.session.is_ready() {
                    self.spawn_balance_refresh(None);
                }
            }
            AppAction::Disconnect => self.disconnect(),
            AppAction::ToggleHelp => {
                self.view = View::Help;
            }
            AppAction::Escape => {
                self.view = View::Main;
            }
            AppAction::ScrollUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            AppAction::ScrollDown => {
                if self.scroll_offset < self.max_scroll {
                    self.scroll_offset += 1;
                }
            }
            AppAction::ScrollPageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            AppAction::ScrollPageDown => {
                self.scroll_offset = (self.scroll_offset + 10).min(self.max_scroll);
            }
            AppAction::Tick => {
                self.tick = self.tick.wrapping_add(1);
                if self.tick % ACCOUNT_POLL_TICKS == 0 {
                    self.poll_account();
                }
            }
        }
    }

    fn connect(&mut self) {
        if !self.has_wallet() {
            self.log(
                LogLevel::Warning,
                "No wallet found. Set WALLET_PRIVATE_KEY or WALLET_KEYSTORE_PATH.",
            );
            return;
        }
        if let Err(e) = self.session.begin_connect() {
            return self.refused(e);
        }
        self.flow.reset_all();

        let tx = self.event_tx.clone();
        let connectors = self.connectors.clone();
        tokio::spawn(async move {
            let result = actions::connect(&connectors).await;
            tx.send(AppEvent::Connected(result)).await.ok();
        });
    }

    fn switch_chain(&mut self) {
        let Some(wallet) = self.wallet.clone() else {
            return;
        };
        let chain_id = match self.session.begin_switch() {
            Ok(id) => id,
            Err(e) => return self.refused(e),
        };

        let epoch = self.session.epoch();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = actions::switch_chain(wallet.as_ref(), chain_id).await;
            tx.send(AppEvent::ChainSwitched { epoch, result }).await.ok();
        });
    }

    fn fund(&mut self) {
        let Some(wallet) = self.wallet.clone() else {
            return;
        };
        let address = match self.flow.begin_fund(&self.session) {
            Ok(address) => address,
            Err(e) => return self.refused(e),
        };
        self.log(LogLevel::Info, "Claiming testnet funds...");

        let before = self.flow.balance().unwrap_or_default();
        let epoch = self.session.epoch();
        let ctx = self.ctx.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = actions::fund(&ctx, wallet.as_ref(), address, before).await;
            tx.send(AppEvent::Funded { epoch, result }).await.ok();
        });
    }

    fn execute(&mut self) {
        let Some(wallet) = self.wallet.clone() else {
            return;
        };
        if let Err(e) = self.flow.begin_execute(&self.session) {
            return self.refused(e);
        }
        self.log(LogLevel::Info, "Sending on Tempo...");

        let epoch = self.session.epoch();
        let ctx = self.ctx.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = actions::execute(&ctx, wallet.as_ref()).await;
            tx.send(AppEvent::Executed { epoch, result }).await.ok();
        });
    }

    fn disconnect(&mut self) {
        let effects = match self.session.disconnect() {
            Ok(effects) => effects,
            Err(e) => return self.refused(e),
        };
        if let Some(wallet) = self.wallet.take() {
            tokio::spawn(async move {
                actions::disconnect(wallet.as_ref()).await;
            });
        }
        self.apply_effects(effects);
        self.log(LogLevel::Info, "Wallet disconnected");
    }

    /// Ask the wallet for its current account and network
    fn poll_account(&mut self) {
        let status = self.session.status();
        if self.account_poll_pending
            || !matches!(status, SessionStatus::WrongChain | SessionStatus::Ready)
        {
            return;
        }
        let Some(wallet) = self.wallet.clone() else {
            return;
        };

        self.account_poll_pending = true;
        let epoch = self.session.epoch();
        let seen_chain = self.session.session().chain_id;
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = wallet.account().await;
            tx.send(AppEvent::AccountPolled {
                epoch,
                seen_chain,
                result,
            })
            .await
            .ok();
        });
    }

    fn spawn_balance_refresh(&mut self, delay: Option<Duration>) {
        let (Some(wallet), Some(owner)) = (self.wallet.clone(), self.session.address()) else {
            error!("Balance refresh requested without a connected account");
            return;
        };

        let epoch = self.session.epoch();
        let token = self.ctx.token.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let result = actions::read_balance(wallet.as_ref(), &token, owner).await;
            tx.send(AppEvent::BalanceLoaded { epoch, result }).await.ok();
        });
        info!("Balance refresh scheduled (delay {:?})", delay);
    }

    /// Scroll to bottom of activity log
    fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll;
    }

    /// Update max scroll based on content
    pub fn update_scroll_bounds(&mut self, content_height: u16, viewport_height: u16) {
        let at_bottom = self.scroll_offset >= self.max_scroll;
        self.max_scroll = content_height.saturating_sub(viewport_height);
        if at_bottom || self.scroll_offset > self.max_scroll {
            self.scroll_offset = self.max_scroll;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettleStrategy;
    use crate::flow::{FundingState, TxState};
    use crate::memo::Memo;
    use crate::token::{demo_amount, Tip20, ALPHA_USD};
    use crate::types::WalletError;
    use crate::wallet::testing::FakeWallet;
    use crate::faucet::FaucetClient;
    use ethers::types::Address;

    const TARGET: u64 = 42431;

    fn app_with(wallet: FakeWallet, faucet_url: String) -> (App, Arc<FakeWallet>) {
        let wallet = Arc::new(wallet);
        let ctx = DemoContext {
            token: Tip20::new(ALPHA_USD.parse().unwrap()).unwrap(),
            receiver: Address::repeat_byte(0xde),
            amount: demo_amount().unwrap(),
            memo: Memo::DEMO,
            faucet: FaucetClient::new(faucet_url),
            settle: SettleStrategy::Fixed(Duration::from_millis(5)),
        };
        let connectors = Connectors::new(vec![wallet.clone() as Arc<dyn WalletProvider>]);
        let app = App::new(
            ChainConfig::tempo_testnet(),
            ctx,
            connectors,
            Duration::from_millis(5),
        );
        (app, wallet)
    }

    /// Wait for the next spawned result and apply it
    async fn next_event(app: &mut App) {
        let event = app.event_rx.recv().await.unwrap();
        app.handle_event(event);
    }

    async fn connect_ready(app: &mut App) {
        app.handle_action(AppAction::Connect);
        next_event(app).await; // connected
        next_event(app).await; // balance
    }

    #[tokio::test]
    async fn test_connect_triggers_single_balance_read() {
        let (mut app, wallet) = app_with(
            FakeWallet::new(TARGET).with_balances(&[2_000_000]),
            "http://127.0.0.1:1".into(),
        );
        connect_ready(&mut app).await;

        assert!(app.session.is_ready());
        assert_eq!(app.flow.balance(), Some(Balance::new(2_000_000u64)));
        assert_eq!(wallet.balance_reads(), 1);
        assert!(app.event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wrong_chain_switch_then_pay() {
        let (mut app, wallet) = app_with(
            FakeWallet::new(1).with_balances(&[5_000]),
            "http://127.0.0.1:1".into(),
        );
        app.handle_action(AppAction::Connect);
        next_event(&mut app).await;
        assert_eq!(app.session.status(), SessionStatus::WrongChain);
        assert_eq!(wallet.balance_reads(), 0);

        // execute is not offered on the wrong chain
        app.handle_action(AppAction::Execute);
        assert_eq!(app.flow.tx_state(), TxState::Idle);

        app.handle_action(AppAction::SwitchChain);
        next_event(&mut app).await; // switched
        next_event(&mut app).await; // balance
        assert!(app.session.is_ready());
        assert_eq!(wallet.balance_reads(), 1);

        app.handle_action(AppAction::Execute);
        assert_eq!(app.flow.tx_state(), TxState::Executing);
        // second execute while in flight is refused
        app.handle_action(AppAction::Execute);
        next_event(&mut app).await;
        assert_eq!(app.flow.tx_state(), TxState::Complete);
        assert_eq!(wallet.writes().len(), 1);
        assert!(app
            .explorer_link()
            .unwrap()
            .starts_with("https://scout.tempo.xyz/tx/0x5a5a"));

        // delayed refresh after completion
        next_event(&mut app).await;
        assert_eq!(wallet.balance_reads(), 2);

        app.handle_action(AppAction::Reset);
        assert_eq!(app.flow.tx_state(), TxState::Idle);
        assert_eq!(app.flow.hash(), None);
        assert!(app.session.is_ready());
    }

    #[tokio::test]
    async fn test_fund_then_execute() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":[]}"#)
            .create_async()
            .await;
        let (mut app, _wallet) = app_with(
            FakeWallet::new(TARGET).with_balances(&[0, 1_000_000]),
            server.url(),
        );
        connect_ready(&mut app).await;
        assert!(app.flow.can_fund(&app.session));
        assert!(!app.flow.can_execute(&app.session));

        app.handle_action(AppAction::Fund);
        assert_eq!(app.flow.funding(), FundingState::Funding);
        next_event(&mut app).await;
        assert_eq!(app.flow.funding(), FundingState::Funded);
        assert!(app.flow.can_execute(&app.session));
    }

    #[tokio::test]
    async fn test_execute_failure_surfaces_error() {
        let (mut app, _wallet) = app_with(
            FakeWallet::new(TARGET)
                .with_balances(&[5_000])
                .failing_write(WalletError::UserRejected("denied".into())),
            "http://127.0.0.1:1".into(),
        );
        connect_ready(&mut app).await;

        app.handle_action(AppAction::Execute);
        next_event(&mut app).await;
        assert_eq!(app.flow.tx_state(), TxState::Idle);
        assert_eq!(app.error(), Some("User rejected the request."));
    }

    #[tokio::test]
    async fn test_disconnect_drops_in_flight_results() {
        let (mut app, _wallet) = app_with(
            FakeWallet::new(TARGET).with_balances(&[5_000]),
            "http://127.0.0.1:1".into(),
        );
        connect_ready(&mut app).await;

        app.handle_action(AppAction::Execute);
        app.handle_action(AppAction::Disconnect);
        assert_eq!(app.session.status(), SessionStatus::Disconnected);
        assert_eq!(app.flow.tx_state(), TxState::Idle);
        assert_eq!(app.flow.balance(), None);

        // the execute result arrives under the old epoch and is ignored
        next_event(&mut app).await;
        assert_eq!(app.flow.tx_state(), TxState::Idle);
        assert_eq!(app.flow.hash(), None);
        assert!(app.wallet.is_none());
    }

    #[tokio::test]
    async fn test_no_connectors_shows_call_to_action() {
        let chain = ChainConfig::tempo_testnet();
        let ctx = DemoContext {
            token: Tip20::new(ALPHA_USD.parse().unwrap()).unwrap(),
            receiver: Address::zero(),
            amount: demo_amount().unwrap(),
            memo: Memo::DEMO,
            faucet: FaucetClient::new("http://127.0.0.1:1"),
            settle: SettleStrategy::Fixed(Duration::from_millis(5)),
        };
        let mut app = App::new(chain, ctx, Connectors::default(), Duration::from_millis(5));
        assert!(!app.has_wallet());

        app.handle_action(AppAction::Connect);
        assert_eq!(app.session.status(), SessionStatus::Disconnected);
        assert!(app
            .activity
            .iter()
            .all(|entry| entry.level != LogLevel::Error));
    }

    async fn tick_until_account_poll(app: &mut App) {
        for _ in 0..ACCOUNT_POLL_TICKS {
            app.handle_action(AppAction::Tick);
        }
        next_event(app).await;
    }

    #[tokio::test]
    async fn test_wallet_chain_change_follows_readiness() {
        let (mut app, wallet) = app_with(
            FakeWallet::new(TARGET).with_balances(&[5_000]),
            "http://127.0.0.1:1".into(),
        );
        connect_ready(&mut app).await;
        assert_eq!(wallet.balance_reads(), 1);

        // unchanged network: nothing happens
        tick_until_account_poll(&mut app).await;
        assert!(app.session.is_ready());
        assert_eq!(wallet.account_reads(), 1);

        wallet.set_chain(1);
        tick_until_account_poll(&mut app).await;
        assert_eq!(app.session.status(), SessionStatus::WrongChain);
        assert!(!app.flow.can_execute(&app.session));
        assert!(app.event_rx.try_recv().is_err());

        wallet.set_chain(TARGET);
        tick_until_account_poll(&mut app).await;
        assert!(app.session.is_ready());
        next_event(&mut app).await; // single balance refresh
        assert_eq!(wallet.balance_reads(), 2);
        assert!(app.event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_account_not_polled_while_disconnected() {
        let (mut app, wallet) = app_with(FakeWallet::new(TARGET), "http://127.0.0.1:1".into());
        for _ in 0..ACCOUNT_POLL_TICKS * 2 {
            app.handle_action(AppAction::Tick);
        }
        tokio::task::yield_now().await;
        assert_eq!(wallet.account_reads(), 0);
        assert!(app.event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_quit_waits_for_second_press_while_paying() {
        let (mut app, _wallet) = app_with(
            FakeWallet::new(TARGET).with_balances(&[5_000]),
            "http://127.0.0.1:1".into(),
        );
        app.handle_action(AppAction::Quit);
        assert!(app.should_quit);

        let (mut app, _wallet) = app_with(
            FakeWallet::new(TARGET).with_balances(&[5_000]),
            "http://127.0.0.1:1".into(),
        );
        connect_ready(&mut app).await;
        app.handle_action(AppAction::Execute);
        assert!(app.has_operation_in_flight());

        app.handle_action(AppAction::Quit);
        assert!(!app.should_quit);
        assert_eq!(app.activity.last().map(|e| e.level), Some(LogLevel::Warning));
        app.handle_action(AppAction::Quit);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_activity_log_is_capped() {
        let (mut app, _wallet) = app_with(FakeWallet::new(TARGET), "http://127.0.0.1:1".into());
        for i in 0..MAX_ACTIVITY + 100 {
            app.log(LogLevel::Info, format!("entry {}", i));
        }
        assert_eq!(app.activity.len(), MAX_ACTIVITY);
        assert_eq!(
            app.activity.last().map(|e| e.message.as_str()),
            Some(format!("entry {}", MAX_ACTIVITY + 99).as_str())
        );
    }

    #[tokio::test]
    async fn test_help_closes_on_any_key() {
        let (mut app, _wallet) = app_with(FakeWallet::new(TARGET), "http://127.0.0.1:1".into());
        app.handle_action(AppAction::ToggleHelp);
        assert_eq!(app.view, View::Help);
        app.handle_action(AppAction::Connect);
        assert_eq!(app.view, View::Main);
        assert_eq!(app.session.status(), SessionStatus::Disconnected);
    }
}
