// In-memory wallet used by controller and driver tests

use super::{Account, ConnectorKind, ContractCall, WalletProvider};
use crate::types::{WalletError, WalletResult};
use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, TxHash, U256};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug)]
struct FakeState {
    connected: bool,
    chain_id: u64,
    balances: VecDeque<U256>,
    connect_error: Option<WalletError>,
    switch_error: Option<WalletError>,
    write_error: Option<WalletError>,
    balance_reads: usize,
    account_reads: usize,
    writes: Vec<ContractCall>,
}

/// Scripted wallet: each balance read pops the next scripted value and the
/// last value repeats forever.
#[derive(Debug)]
pub struct FakeWallet {
    name: String,
    kind: ConnectorKind,
    address: Address,
    state: Mutex<FakeState>,
}

impl FakeWallet {
    pub fn new(chain_id: u64) -> Self {
        Self {
            name: "fake".to_string(),
            kind: ConnectorKind::Injected,
            address: Address::repeat_byte(0xab),
            state: Mutex::new(FakeState {
                connected: false,
                chain_id,
                balances: VecDeque::from([U256::zero()]),
                connect_error: None,
                switch_error: None,
                write_error: None,
                balance_reads: 0,
                account_reads: 0,
                writes: Vec::new(),
            }),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_kind(mut self, kind: ConnectorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_balances(self, balances: &[u64]) -> Self {
        self.state.lock().unwrap().balances = balances.iter().map(|b| U256::from(*b)).collect();
        self
    }

    pub fn failing_connect(self, err: WalletError) -> Self {
        self.state.lock().unwrap().connect_error = Some(err);
        self
    }

    pub fn failing_switch(self, err: WalletError) -> Self {
        self.state.lock().unwrap().switch_error = Some(err);
        self
    }

    pub fn failing_write(self, err: WalletError) -> Self {
        self.state.lock().unwrap().write_error = Some(err);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn balance_reads(&self) -> usize {
        self.state.lock().unwrap().balance_reads
    }

    pub fn writes(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Move the wallet to another network without a switch request
    pub fn set_chain(&self, chain_id: u64) {
        self.state.lock().unwrap().chain_id = chain_id;
    }

    pub fn account_reads(&self) -> usize {
        self.state.lock().unwrap().account_reads
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ConnectorKind {
        self.kind
    }

    async fn connect(&self) -> WalletResult<Account> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.connect_error.clone() {
            return Err(err);
        }
        state.connected = true;
        Ok(Account {
            address: self.address,
            chain_id: state.chain_id,
        })
    }

    async fn disconnect(&self) -> WalletResult<()> {
        self.state.lock().unwrap().connected = false;
        Ok(())
    }

    async fn account(&self) -> WalletResult<Option<Account>> {
        let mut state = self.state.lock().unwrap();
        state.account_reads += 1;
        Ok(state.connected.then(|| Account {
            address: self.address,
            chain_id: state.chain_id,
        }))
    }

    async fn switch_chain(&self, chain_id: u64) -> WalletResult<u64> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.switch_error.clone() {
            return Err(err);
        }
        state.chain_id = chain_id;
        Ok(chain_id)
    }

    async fn read_contract(&self, call: &ContractCall) -> WalletResult<Vec<Token>> {
        let mut state = self.state.lock().unwrap();
        if !state.connected {
            return Err(WalletError::NotConnected);
        }
        match call.function.name.as_str() {
            "balanceOf" => {
                state.balance_reads += 1;
                let balance = if state.balances.len() > 1 {
                    state.balances.pop_front().unwrap_or_default()
                } else {
                    state.balances.front().copied().unwrap_or_default()
                };
                Ok(vec![Token::Uint(balance)])
            }
            other => Err(WalletError::Abi(format!("unexpected read {}", other))),
        }
    }

    async fn write_contract(&self, call: &ContractCall) -> WalletResult<TxHash> {
        let mut state = self.state.lock().unwrap();
        if !state.connected {
            return Err(WalletError::NotConnected);
        }
        state.writes.push(call.clone());
        if let Some(err) = state.write_error.clone() {
            return Err(err);
        }
        Ok(TxHash::repeat_byte(0x5a))
    }
}
