// Target network description (Tempo testnet by default)

use ethers::types::TxHash;

pub const TEMPO_TESTNET_ID: u64 = 42431;
pub const TEMPO_TESTNET_NAME: &str = "Tempo Testnet (Moderato)";
pub const TEMPO_RPC_URL: &str = "https://rpc.moderato.tempo.xyz";
pub const TEMPO_EXPLORER_URL: &str = "https://scout.tempo.xyz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
}

impl ChainConfig {
    pub fn tempo_testnet() -> Self {
        Self {
            id: TEMPO_TESTNET_ID,
            name: TEMPO_TESTNET_NAME.to_string(),
            rpc_url: TEMPO_RPC_URL.to_string(),
            explorer_url: TEMPO_EXPLORER_URL.to_string(),
        }
    }

    /// Explorer link for a transaction: `{explorer}/tx/{hash}`
    pub fn tx_url(&self, hash: &TxHash) -> String {
        format!("{}/tx/{:#x}", self.explorer_url.trim_end_matches('/'), hash)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::tempo_testnet()
    }
}
