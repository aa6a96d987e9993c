// Shared types, effects and error definitions

use std::time::Duration;

/// EIP-1193 "user rejected request" error code
pub const USER_REJECTED_CODE: i64 = 4001;

/// Side effects requested by a controller transition.
///
/// Controllers never perform I/O themselves. The event loop (TUI or
/// headless driver) executes these after applying the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Re-read the token balance now
    RefreshBalance,
    /// Re-read the token balance once the delay has elapsed
    RefreshBalanceAfter(Duration),
    /// Drop funding and transaction state back to idle
    ResetAttempts,
}

/// Errors reported by a wallet provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("No wallet connector available")]
    ProviderAbsent,

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("User rejected the request: {0}")]
    UserRejected(String),

    #[error("Chain {0} is not configured in the wallet")]
    UnrecognizedChain(u64),

    #[error("{message}")]
    Rpc {
        code: Option<i64>,
        short: Option<String>,
        message: String,
    },

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl WalletError {
    /// Short, human form of the error when one exists
    pub fn short_message(&self) -> Option<String> {
        match self {
            WalletError::ProviderAbsent => Some("No wallet found.".to_string()),
            WalletError::UserRejected(_) => Some("User rejected the request.".to_string()),
            WalletError::UnrecognizedChain(id) => {
                Some(format!("Chain {} is not configured in the wallet.", id))
            }
            WalletError::Rpc { short, .. } => short.clone(),
            WalletError::NotConnected | WalletError::Abi(_) | WalletError::Transport(_) => None,
        }
    }

    /// Full error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Message for display, falling back to `fallback` when nothing better exists
    pub fn describe(&self, fallback: &str) -> String {
        describe_error(
            self.short_message().as_deref(),
            Some(self.message().as_str()),
            fallback,
        )
    }

    /// Whether the user declined the request in the wallet
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WalletError::UserRejected(_))
            || matches!(self, WalletError::Rpc { code: Some(USER_REJECTED_CODE), .. })
    }
}

pub type WalletResult<T> = std::result::Result<T, WalletError>;

/// Pick the most specific non-empty description of an error.
///
/// Order: short description, then generic message, then `fallback`.
pub fn describe_error(short: Option<&str>, message: Option<&str>, fallback: &str) -> String {
    [short, message]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// A controller refused a transition because of its current state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("cannot {action} while {state}")]
    Refused {
        action: &'static str,
        state: &'static str,
    },
}

impl FlowError {
    pub fn refused(action: &'static str, state: &'static str) -> Self {
        FlowError::Refused { action, state }
    }
}
