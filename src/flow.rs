//! Transaction Flow Controller
//!
//! Drives the funding and payment sequence once the session is ready:
//!
//! ```text
//! idle --(balance == 0, fund)--> funding --(faucet ok, settled)--> funded
//! idle(ready, balance > 0) --(execute)--> executing --(ok)--> complete
//! executing --(write failure)--> idle(ready), error set
//! funding --(faucet failure)--> idle, error set
//! complete --(reset)--> idle(ready)
//! ```
//!
//! Every failure lands in a stable state from which the same action can be
//! retried by hand.

use crate::faucet::FaucetError;
use crate::session::SessionController;
use crate::token::Balance;
use crate::types::{Effect, FlowError, WalletError};
use ethers::types::{Address, TxHash};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FundingState {
    #[default]
    Idle,
    Funding,
    Funded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxState {
    #[default]
    Idle,
    Executing,
    Complete,
}

impl TxState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxState::Idle => "idle",
            TxState::Executing => "a transaction is executing",
            TxState::Complete => "a transaction is complete",
        }
    }
}

/// Result of a faucet request once the settle wait has elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundOutcome {
    /// Balance read after the wait, if the read succeeded
    pub balance: Option<Balance>,
    /// Whether the credit was observed. `None` when the balance was not
    /// compared (fixed-delay strategy).
    pub confirmed: Option<bool>,
}

#[derive(Debug)]
pub struct TransactionFlow {
    funding: FundingState,
    tx: TxState,
    hash: Option<TxHash>,
    error: Option<String>,
    notice: Option<String>,
    balance: Option<Balance>,
    refresh_delay: Duration,
}

impl TransactionFlow {
    pub fn new(refresh_delay: Duration) -> Self {
        Self {
            funding: FundingState::Idle,
            tx: TxState::Idle,
            hash: None,
            error: None,
            notice: None,
            balance: None,
            refresh_delay,
        }
    }

    pub fn funding(&self) -> FundingState {
        self.funding
    }

    pub fn tx_state(&self) -> TxState {
        self.tx
    }

    pub fn hash(&self) -> Option<TxHash> {
        self.hash
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Soft warning (e.g. funding not observed on chain yet)
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn balance(&self) -> Option<Balance> {
        self.balance
    }

    pub fn set_balance(&mut self, balance: Balance) {
        self.balance = Some(balance);
    }

    fn has_funds(&self) -> bool {
        self.balance.map(|b| !b.is_zero()).unwrap_or(false)
    }

    pub fn can_fund(&self, session: &SessionController) -> bool {
        session.is_ready() && self.funding == FundingState::Idle && !self.has_funds()
    }

    pub fn can_execute(&self, session: &SessionController) -> bool {
        session.is_ready() && self.tx == TxState::Idle && self.has_funds()
    }

    /// Returns the address to fund
    pub fn begin_fund(&mut self, session: &SessionController) -> Result<Address, FlowError> {
        if !session.is_ready() {
            return Err(FlowError::refused("fund", session.status().as_str()));
        }
        match self.funding {
            FundingState::Funding => return Err(FlowError::refused("fund", "funding")),
            FundingState::Funded => return Err(FlowError::refused("fund", "already funded")),
            FundingState::Idle => {}
        }
        if self.has_funds() {
            return Err(FlowError::refused("fund", "the balance is not empty"));
        }
        let address = session
            .address()
            .ok_or_else(|| FlowError::refused("fund", "no account is connected"))?;

        self.funding = FundingState::Funding;
        self.error = None;
        self.notice = None;
        Ok(address)
    }

    pub fn complete_fund(&mut self, result: Result<FundOutcome, FaucetError>) {
        if self.funding != FundingState::Funding {
            warn!("Ignoring faucet result with no funding pending");
            return;
        }

        match result {
            Ok(outcome) => {
                if let Some(balance) = outcome.balance {
                    self.balance = Some(balance);
                }
                if outcome.confirmed == Some(false) {
                    self.notice = Some(
                        "Funding not visible on chain yet; the balance may update shortly."
                            .to_string(),
                    );
                }
                self.funding = FundingState::Funded;
                info!("Funding complete, balance {:?}", self.balance.map(|b| b.display()));
            }
            Err(err) => {
                self.funding = FundingState::Idle;
                self.error = Some(err.user_message());
                warn!("Funding failed: {}", err);
            }
        }
    }

    pub fn begin_execute(&mut self, session: &SessionController) -> Result<(), FlowError> {
        if !session.is_ready() {
            return Err(FlowError::refused("execute", session.status().as_str()));
        }
        if self.tx != TxState::Idle {
            return Err(FlowError::refused("execute", self.tx.as_str()));
        }
        if !self.has_funds() {
            return Err(FlowError::refused("execute", "the balance is empty"));
        }
        self.tx = TxState::Executing;
        self.hash = None;
        self.error = None;
        Ok(())
    }

    pub fn complete_execute(&mut self, result: Result<TxHash, WalletError>) -> Vec<Effect> {
        if self.tx != TxState::Executing {
            warn!("Ignoring transaction result with no transaction executing");
            return Vec::new();
        }

        match result {
            Ok(hash) => {
                self.tx = TxState::Complete;
                self.hash = Some(hash);
                self.error = None;
                info!("Transaction settled: {:#x}", hash);
                vec![Effect::RefreshBalanceAfter(self.refresh_delay)]
            }
            Err(err) => {
                self.tx = TxState::Idle;
                self.hash = None;
                self.error = Some(err.describe("Transaction failed"));
                warn!("Transaction failed: {}", err);
                Vec::new()
            }
        }
    }

    /// Clear the last result and return to idle ("run another transaction")
    pub fn reset(&mut self) -> Result<(), FlowError> {
        if self.tx == TxState::Executing {
            return Err(FlowError::refused("reset", self.tx.as_str()));
        }
        self.tx = TxState::Idle;
        self.hash = None;
        self.error = None;
        Ok(())
    }

    /// Drop all attempt state, used when the session ends
    pub fn reset_all(&mut self) {
        self.funding = FundingState::Idle;
        self.tx = TxState::Idle;
        self.hash = None;
        self.error = None;
        self.notice = None;
        self.balance = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Account;
    use ethers::types::U256;

    const TARGET: u64 = 42431;

    fn ready_session() -> SessionController {
        let mut session = SessionController::new(TARGET);
        session.begin_connect().unwrap();
        session.complete_connect(Ok(Account {
            address: Address::repeat_byte(0xab),
            chain_id: TARGET,
        }));
        session
    }

    fn flow() -> TransactionFlow {
        TransactionFlow::new(Duration::from_secs(2))
    }

    #[test]
    fn test_execute_unavailable_without_balance() {
        let session = ready_session();
        let mut flow = flow();

        // unknown balance counts as empty
        assert!(!flow.can_execute(&session));
        assert!(flow.begin_execute(&session).is_err());

        flow.set_balance(Balance::zero());
        assert!(!flow.can_execute(&session));
        assert!(flow.begin_execute(&session).is_err());
        assert_eq!(flow.tx_state(), TxState::Idle);

        flow.set_balance(Balance::new(1u64));
        assert!(flow.can_execute(&session));
    }

    #[test]
    fn test_execute_requires_ready_session() {
        let mut session = SessionController::new(TARGET);
        let mut flow = flow();
        flow.set_balance(Balance::new(5_000u64));
        assert!(flow.begin_execute(&session).is_err());

        session.begin_connect().unwrap();
        session.complete_connect(Ok(Account {
            address: Address::repeat_byte(0xab),
            chain_id: 1,
        }));
        assert!(!flow.can_execute(&session));
        assert!(flow.begin_execute(&session).is_err());
    }

    #[test]
    fn test_execute_success_schedules_one_refresh() {
        let session = ready_session();
        let mut flow = flow();
        flow.set_balance(Balance::new(10_000u64));

        flow.begin_execute(&session).unwrap();
        assert_eq!(flow.tx_state(), TxState::Executing);
        // at most one in flight
        assert!(flow.begin_execute(&session).is_err());

        let hash = TxHash::repeat_byte(0x11);
        let effects = flow.complete_execute(Ok(hash));
        assert_eq!(effects, vec![Effect::RefreshBalanceAfter(Duration::from_secs(2))]);
        assert_eq!(flow.tx_state(), TxState::Complete);
        assert_eq!(flow.hash(), Some(hash));
        assert_eq!(flow.error(), None);
    }

    #[test]
    fn test_execute_failure_returns_to_idle() {
        let session = ready_session();
        let mut flow = flow();
        flow.set_balance(Balance::new(10_000u64));

        flow.begin_execute(&session).unwrap();
        let effects = flow.complete_execute(Err(WalletError::Rpc {
            code: Some(3),
            short: Some("execution reverted".into()),
            message: "(code: 3, message: execution reverted, data: None)".into(),
        }));
        assert!(effects.is_empty());
        assert_eq!(flow.tx_state(), TxState::Idle);
        assert_eq!(flow.error(), Some("execution reverted"));
        assert_eq!(flow.hash(), None);

        // retry clears the error
        flow.begin_execute(&session).unwrap();
        assert_eq!(flow.error(), None);
    }

    #[test]
    fn test_reset_after_complete() {
        let session = ready_session();
        let mut flow = flow();
        let balance = Balance::new(10_000u64);
        flow.set_balance(balance);
        flow.begin_execute(&session).unwrap();
        flow.complete_execute(Ok(TxHash::repeat_byte(0x11)));

        let before = session.session().clone();
        flow.reset().unwrap();
        assert_eq!(flow.tx_state(), TxState::Idle);
        assert_eq!(flow.hash(), None);
        assert_eq!(flow.error(), None);
        assert_eq!(flow.balance(), Some(balance));
        assert_eq!(session.session(), &before);
    }

    #[test]
    fn test_reset_refused_while_executing() {
        let session = ready_session();
        let mut flow = flow();
        flow.set_balance(Balance::new(1u64));
        flow.begin_execute(&session).unwrap();
        assert!(flow.reset().is_err());
    }

    #[test]
    fn test_faucet_failure_message() {
        let session = ready_session();
        let mut flow = flow();
        flow.set_balance(Balance::zero());

        assert!(flow.can_fund(&session));
        flow.begin_fund(&session).unwrap();
        assert_eq!(flow.funding(), FundingState::Funding);
        assert!(!flow.can_fund(&session));

        flow.complete_fund(Err(FaucetError::Rpc(Some("busy".into()))));
        assert_eq!(flow.funding(), FundingState::Idle);
        assert_eq!(flow.error(), Some("Faucet failed: busy"));
    }

    #[test]
    fn test_fund_is_single_use() {
        let session = ready_session();
        let mut flow = flow();
        flow.set_balance(Balance::zero());

        flow.begin_fund(&session).unwrap();
        flow.complete_fund(Ok(FundOutcome {
            balance: Some(Balance::new(U256::exp10(12))),
            confirmed: None,
        }));
        assert_eq!(flow.funding(), FundingState::Funded);
        assert!(flow.can_execute(&session));
        assert!(!flow.can_fund(&session));
        assert!(flow.begin_fund(&session).is_err());
    }

    #[test]
    fn test_funded_even_if_balance_unchanged() {
        let session = ready_session();
        let mut flow = flow();
        flow.set_balance(Balance::zero());

        flow.begin_fund(&session).unwrap();
        flow.complete_fund(Ok(FundOutcome {
            balance: Some(Balance::zero()),
            confirmed: Some(false),
        }));
        assert_eq!(flow.funding(), FundingState::Funded);
        assert!(flow.notice().is_some());
        // the credit has not landed, so execute stays unavailable
        assert!(!flow.can_execute(&session));
    }

    #[test]
    fn test_fund_refused_with_balance() {
        let session = ready_session();
        let mut flow = flow();
        flow.set_balance(Balance::new(1u64));
        assert!(!flow.can_fund(&session));
        assert!(flow.begin_fund(&session).is_err());
        assert_eq!(flow.funding(), FundingState::Idle);
    }

    #[test]
    fn test_reset_all() {
        let session = ready_session();
        let mut flow = flow();
        flow.set_balance(Balance::zero());
        flow.begin_fund(&session).unwrap();
        flow.complete_fund(Err(FaucetError::Transport("timeout".into())));

        flow.reset_all();
        assert_eq!(flow.funding(), FundingState::Idle);
        assert_eq!(flow.tx_state(), TxState::Idle);
        assert_eq!(flow.error(), None);
        assert_eq!(flow.balance(), None);
    }
}
