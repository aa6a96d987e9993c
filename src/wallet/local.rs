// Local signing key wallet backed by ethers
//
// Stands in for a browser-injected wallet: it holds a signing key, knows a
// small set of networks, and tracks which one is active.

use super::{Account, ConnectorKind, ContractCall, WalletProvider};
use crate::chain::ChainConfig;
use crate::config::WalletConfig;
use crate::types::{WalletError, WalletResult, USER_REJECTED_CODE};
use async_trait::async_trait;
use ethers::abi::Token;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, MiddlewareError, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{TransactionRequest, TxHash};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// A network the wallet can switch to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub chain_id: u64,
    pub rpc_url: String,
}

#[derive(Debug)]
enum KeySource {
    Key(LocalWallet),
    Keystore {
        path: PathBuf,
        password: Option<String>,
    },
}

#[derive(Debug)]
struct SignerState {
    wallet: Option<LocalWallet>,
    active_chain: u64,
}

#[derive(Debug)]
pub struct LocalSigner {
    name: String,
    kind: ConnectorKind,
    source: KeySource,
    networks: Vec<Network>,
    state: RwLock<SignerState>,
}

impl LocalSigner {
    /// Signer from a hex private key (`WALLET_PRIVATE_KEY`)
    pub fn from_private_key(
        key: &str,
        wallet: &WalletConfig,
        chain: &ChainConfig,
    ) -> anyhow::Result<Self> {
        let signer: LocalWallet = key
            .trim()
            .trim_start_matches("0x")
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid WALLET_PRIVATE_KEY: {}", e))?;

        Ok(Self::build(
            "Environment key",
            ConnectorKind::Injected,
            KeySource::Key(signer),
            wallet,
            chain,
        ))
    }

    /// Signer unlocked from an encrypted JSON keystore at connect time
    pub fn from_keystore(
        path: PathBuf,
        password: Option<String>,
        wallet: &WalletConfig,
        chain: &ChainConfig,
    ) -> Self {
        Self::build(
            "Keystore",
            ConnectorKind::Keystore,
            KeySource::Keystore { path, password },
            wallet,
            chain,
        )
    }

    fn build(
        name: &str,
        kind: ConnectorKind,
        source: KeySource,
        wallet: &WalletConfig,
        chain: &ChainConfig,
    ) -> Self {
        let mut networks = vec![Network {
            chain_id: chain.id,
            rpc_url: chain.rpc_url.clone(),
        }];

        let initial_chain = wallet.initial_chain_id.unwrap_or(chain.id);
        if initial_chain != chain.id {
            match &wallet.initial_rpc_url {
                Some(rpc_url) => networks.push(Network {
                    chain_id: initial_chain,
                    rpc_url: rpc_url.clone(),
                }),
                None => warn!(
                    "WALLET_INITIAL_CHAIN_ID={} has no WALLET_INITIAL_RPC_URL, reads will fail until switched",
                    initial_chain
                ),
            }
        }

        Self {
            name: name.to_string(),
            kind,
            source,
            networks,
            state: RwLock::new(SignerState {
                wallet: None,
                active_chain: initial_chain,
            }),
        }
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    fn network(&self, chain_id: u64) -> WalletResult<&Network> {
        self.networks
            .iter()
            .find(|n| n.chain_id == chain_id)
            .ok_or(WalletError::UnrecognizedChain(chain_id))
    }

    fn provider(network: &Network) -> WalletResult<Provider<Http>> {
        Provider::<Http>::try_from(network.rpc_url.as_str())
            .map_err(|e| WalletError::Transport(format!("invalid RPC URL {}: {}", network.rpc_url, e)))
    }

    async fn unlock(&self) -> WalletResult<LocalWallet> {
        match &self.source {
            KeySource::Key(wallet) => Ok(wallet.clone()),
            KeySource::Keystore { path, password } => {
                let password = password.clone().ok_or_else(|| {
                    WalletError::UserRejected("keystore is locked (no password provided)".into())
                })?;
                let path = path.clone();
                tokio::task::spawn_blocking(move || LocalWallet::decrypt_keystore(&path, password))
                    .await
                    .map_err(|e| WalletError::Transport(e.to_string()))?
                    .map_err(|e| WalletError::UserRejected(format!("keystore unlock failed: {}", e)))
            }
        }
    }

    /// Snapshot of the connected key and active network
    async fn session(&self) -> WalletResult<(LocalWallet, Network)> {
        let state = self.state.read().await;
        let wallet = state.wallet.clone().ok_or(WalletError::NotConnected)?;
        let network = self.network(state.active_chain)?.clone();
        Ok((wallet, network))
    }
}

/// Map an ethers middleware error onto the wallet error taxonomy
pub(crate) fn rpc_error<E: MiddlewareError>(err: E) -> WalletError {
    match err.as_error_response() {
        Some(resp) if resp.code == USER_REJECTED_CODE => {
            WalletError::UserRejected(resp.message.clone())
        }
        Some(resp) => WalletError::Rpc {
            code: Some(resp.code),
            short: Some(resp.message.clone()),
            message: err.to_string(),
        },
        None => WalletError::Rpc {
            code: None,
            short: None,
            message: err.to_string(),
        },
    }
}

#[async_trait]
impl WalletProvider for LocalSigner {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ConnectorKind {
        self.kind
    }

    async fn connect(&self) -> WalletResult<Account> {
        let wallet = self.unlock().await?;
        let mut state = self.state.write().await;
        let account = Account {
            address: wallet.address(),
            chain_id: state.active_chain,
        };
        state.wallet = Some(wallet);
        info!(
            "{} connector connected {:#x} on chain {}",
            self.kind, account.address, account.chain_id
        );
        Ok(account)
    }

    async fn disconnect(&self) -> WalletResult<()> {
        self.state.write().await.wallet = None;
        Ok(())
    }

    async fn account(&self) -> WalletResult<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.wallet.as_ref().map(|w| Account {
            address: w.address(),
            chain_id: state.active_chain,
        }))
    }

    async fn switch_chain(&self, chain_id: u64) -> WalletResult<u64> {
        if self.state.read().await.wallet.is_none() {
            return Err(WalletError::NotConnected);
        }

        let network = self.network(chain_id)?.clone();
        let reported = Self::provider(&network)?
            .get_chainid()
            .await
            .map_err(rpc_error)?;
        if reported.as_u64() != chain_id {
            return Err(WalletError::Rpc {
                code: None,
                short: Some(format!("RPC endpoint serves chain {}, not {}", reported, chain_id)),
                message: format!(
                    "{} reports chain id {} but {} was requested",
                    network.rpc_url, reported, chain_id
                ),
            });
        }

        self.state.write().await.active_chain = chain_id;
        info!("Switched active network to chain {}", chain_id);
        Ok(chain_id)
    }

    async fn read_contract(&self, call: &ContractCall) -> WalletResult<Vec<Token>> {
        let (wallet, network) = self.session().await?;
        let provider = Self::provider(&network)?;

        let tx = TransactionRequest::new()
            .from(wallet.address())
            .to(call.address)
            .data(call.calldata()?);
        let output = provider.call(&tx.into(), None).await.map_err(rpc_error)?;
        debug!("{} returned {} bytes", call.function.name, output.len());

        call.decode_output(&output)
    }

    async fn write_contract(&self, call: &ContractCall) -> WalletResult<TxHash> {
        let (wallet, network) = self.session().await?;
        let provider = Self::provider(&network)?;
        let client = SignerMiddleware::new(provider, wallet.with_chain_id(network.chain_id));

        let tx = TransactionRequest::new()
            .from(client.address())
            .to(call.address)
            .data(call.calldata()?);
        let pending = client.send_transaction(tx, None).await.map_err(rpc_error)?;
        let hash = pending.tx_hash();
        info!("Submitted {} as {:#x}", call.function.name, hash);
        Ok(hash)
    }
}
