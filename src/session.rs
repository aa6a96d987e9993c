//! Wallet Session Controller
//!
//! Tracks whether a wallet is connected, which account it exposes and
//! whether it is on the target chain.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ok──▶ WrongChain ──switch──▶ SwitchingChain
//!      ▲                        │                  ▲                       │
//!      │                        └──err─────────────┼───▶ Disconnected      ├──ok──▶ Ready
//!      └──────────── disconnect ◀──────────────────┴───────────────────────┴──err─▶ WrongChain
//! ```
//!
//! Entering `Ready` yields exactly one [`Effect::RefreshBalance`].

use crate::types::{Effect, FlowError, WalletError};
use crate::wallet::Account;
use ethers::types::Address;
use tracing::{info, warn};

/// Observable session status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    /// Connected, but the wallet is on another chain
    WrongChain,
    SwitchingChain,
    /// Connected on the target chain
    Ready,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connecting => "connecting",
            SessionStatus::WrongChain => "on the wrong chain",
            SessionStatus::SwitchingChain => "switching chain",
            SessionStatus::Ready => "connected",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            SessionStatus::WrongChain | SessionStatus::SwitchingChain | SessionStatus::Ready
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub connected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Connect,
    Switch,
}

#[derive(Debug)]
pub struct SessionController {
    target_chain_id: u64,
    session: Session,
    pending: Option<Pending>,
    error: Option<String>,
    epoch: u64,
}

impl SessionController {
    pub fn new(target_chain_id: u64) -> Self {
        Self {
            target_chain_id,
            session: Session::default(),
            pending: None,
            error: None,
            epoch: 0,
        }
    }

    pub fn target_chain_id(&self) -> u64 {
        self.target_chain_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn address(&self) -> Option<Address> {
        self.session.address
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Incremented on every disconnect. Results of operations started under an
    /// older epoch must be dropped.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn status(&self) -> SessionStatus {
        match (self.pending, self.session.connected) {
            (Some(Pending::Connect), _) => SessionStatus::Connecting,
            (_, false) => SessionStatus::Disconnected,
            (Some(Pending::Switch), true) => SessionStatus::SwitchingChain,
            (None, true) if self.on_target_chain() => SessionStatus::Ready,
            (None, true) => SessionStatus::WrongChain,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == SessionStatus::Ready
    }

    fn on_target_chain(&self) -> bool {
        self.session.chain_id == Some(self.target_chain_id)
    }

    /// Effects for a transition from `was_ready` to the current status
    fn readiness_effects(&self, was_ready: bool) -> Vec<Effect> {
        if !was_ready && self.is_ready() {
            vec![Effect::RefreshBalance]
        } else {
            Vec::new()
        }
    }

    pub fn begin_connect(&mut self) -> Result<(), FlowError> {
        let status = self.status();
        if status != SessionStatus::Disconnected {
            return Err(FlowError::refused("connect", status.as_str()));
        }
        self.pending = Some(Pending::Connect);
        self.error = None;
        Ok(())
    }

    pub fn complete_connect(&mut self, result: Result<Account, WalletError>) -> Vec<Effect> {
        if self.pending != Some(Pending::Connect) {
            warn!("Ignoring connect result with no connect pending");
            return Vec::new();
        }
        self.pending = None;

        match result {
            Ok(account) => {
                self.session = Session {
                    address: Some(account.address),
                    chain_id: Some(account.chain_id),
                    connected: true,
                };
                info!(
                    "Session connected {:#x} on chain {} (target {})",
                    account.address, account.chain_id, self.target_chain_id
                );
                self.readiness_effects(false)
            }
            // No connector: stay quietly disconnected, the UI shows a call-to-action
            Err(WalletError::ProviderAbsent) => {
                self.session = Session::default();
                Vec::new()
            }
            Err(err) => {
                warn!("Connect failed: {}", err);
                self.session = Session::default();
                self.error = Some(err.describe("Failed to connect wallet"));
                Vec::new()
            }
        }
    }

    /// Returns the chain id to request from the wallet
    pub fn begin_switch(&mut self) -> Result<u64, FlowError> {
        let status = self.status();
        if status != SessionStatus::WrongChain {
            return Err(FlowError::refused("switch chain", status.as_str()));
        }
        self.pending = Some(Pending::Switch);
        self.error = None;
        Ok(self.target_chain_id)
    }

    pub fn complete_switch(&mut self, result: Result<u64, WalletError>) -> Vec<Effect> {
        if self.pending != Some(Pending::Switch) {
            warn!("Ignoring switch result with no switch pending");
            return Vec::new();
        }
        self.pending = None;

        match result {
            Ok(chain_id) => {
                self.session.chain_id = Some(chain_id);
                info!("Wallet now on chain {}", chain_id);
                self.readiness_effects(false)
            }
            Err(err) => {
                warn!("Chain switch failed: {}", err);
                self.error = Some(err.describe("Failed to switch network"));
                Vec::new()
            }
        }
    }

    /// The wallet reported a network change on its own
    pub fn on_chain_changed(&mut self, chain_id: u64) -> Vec<Effect> {
        if !self.session.connected || self.pending.is_some() {
            return Vec::new();
        }
        let was_ready = self.is_ready();
        self.session.chain_id = Some(chain_id);
        self.readiness_effects(was_ready)
    }

    pub fn disconnect(&mut self) -> Result<Vec<Effect>, FlowError> {
        let status = self.status();
        if !status.is_connected() {
            return Err(FlowError::refused("disconnect", status.as_str()));
        }
        self.session = Session::default();
        self.pending = None;
        self.error = None;
        self.epoch += 1;
        info!("Session disconnected (epoch {})", self.epoch);
        Ok(vec![Effect::ResetAttempts])
    }
}
