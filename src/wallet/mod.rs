//! Wallet Provider Capability
//!
//! The controllers never talk to a signer or an RPC endpoint directly. They
//! receive a [`WalletProvider`] chosen from the configured [`Connectors`],
//! which lets tests substitute a fake wallet.

pub mod local;
#[cfg(test)]
pub mod testing;

pub use local::LocalSigner;

use crate::chain::ChainConfig;
use crate::config::WalletConfig;
use crate::types::{WalletError, WalletResult};
use async_trait::async_trait;
use ethers::abi::{Function, Token};
use ethers::types::{Address, Bytes, TxHash};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// How a connector reaches its signing key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    /// Key injected into the process environment
    Injected,
    /// Encrypted JSON keystore unlocked at connect time
    Keystore,
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorKind::Injected => write!(f, "injected"),
            ConnectorKind::Keystore => write!(f, "keystore"),
        }
    }
}

/// Account exposed by a connected wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    pub chain_id: u64,
}

/// A single contract function invocation
#[derive(Debug, Clone)]
pub struct ContractCall {
    pub address: Address,
    pub function: Function,
    pub args: Vec<Token>,
}

impl ContractCall {
    /// ABI-encoded calldata (selector + arguments)
    pub fn calldata(&self) -> WalletResult<Bytes> {
        self.function
            .encode_input(&self.args)
            .map(Bytes::from)
            .map_err(|e| WalletError::Abi(e.to_string()))
    }

    /// Decode the return data of this call
    pub fn decode_output(&self, data: &[u8]) -> WalletResult<Vec<Token>> {
        self.function
            .decode_output(data)
            .map_err(|e| WalletError::Abi(e.to_string()))
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync + fmt::Debug {
    /// Human readable connector name
    fn name(&self) -> &str;

    fn kind(&self) -> ConnectorKind;

    /// Request account access
    async fn connect(&self) -> WalletResult<Account>;

    async fn disconnect(&self) -> WalletResult<()>;

    /// Currently connected account, if any
    async fn account(&self) -> WalletResult<Option<Account>>;

    /// Change the wallet's active network, returning the new chain id
    async fn switch_chain(&self, chain_id: u64) -> WalletResult<u64>;

    /// Execute a view call against the active network
    async fn read_contract(&self, call: &ContractCall) -> WalletResult<Vec<Token>>;

    /// Sign and submit a state-changing call, returning the transaction hash
    async fn write_contract(&self, call: &ContractCall) -> WalletResult<TxHash>;
}

/// Available wallet connectors, in discovery order
#[derive(Debug, Clone, Default)]
pub struct Connectors {
    connectors: Vec<Arc<dyn WalletProvider>>,
}

impl Connectors {
    pub fn new(connectors: Vec<Arc<dyn WalletProvider>>) -> Self {
        Self { connectors }
    }

    /// Build connectors from the wallet configuration
    pub fn from_config(wallet: &WalletConfig, chain: &ChainConfig) -> anyhow::Result<Self> {
        let mut connectors: Vec<Arc<dyn WalletProvider>> = Vec::new();

        if let Some(path) = &wallet.keystore_path {
            connectors.push(Arc::new(LocalSigner::from_keystore(
                path.clone(),
                wallet.keystore_password.clone(),
                wallet,
                chain,
            )));
        }

        if let Some(key) = &wallet.private_key {
            connectors.push(Arc::new(LocalSigner::from_private_key(key, wallet, chain)?));
        }

        info!("Discovered {} wallet connector(s)", connectors.len());
        Ok(Self { connectors })
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// First injected connector, else the first available one
    pub fn preferred(&self) -> Option<Arc<dyn WalletProvider>> {
        self.connectors
            .iter()
            .find(|c| c.kind() == ConnectorKind::Injected)
            .or_else(|| self.connectors.first())
            .cloned()
    }
}
