//! TIP-20 Token Contract
//!
//! TIP-20 is ERC-20 compatible with Tempo extensions. Only three functions
//! are used here: `balanceOf`, `transfer` and `transferWithMemo`.

use crate::memo::Memo;
use crate::types::{WalletError, WalletResult};
use crate::utils::format_token_amount;
use crate::wallet::ContractCall;
use ethers::abi::{parse_abi, Abi, Token};
use ethers::types::{Address, U256};
use ethers::utils::parse_units;

/// TIP-20 stablecoins use 6 decimals
pub const TOKEN_DECIMALS: u32 = 6;

/// Price of the demo data query, in whole token units
pub const DEMO_AMOUNT: &str = "0.001";

/// The data query the demo payment pays for
pub const DEMO_QUERY: &str = "Hivemapper Street Query";
pub const DEMO_LOCATION: &str = "São Paulo, -23.55, -46.63";
pub const DEMO_PRICE: &str = "$0.001";

/// AlphaUSD on Tempo testnet
pub const ALPHA_USD: &str = "0x20c0000000000000000000000000000000000001";

/// Demo receiver (burn address, testnet only)
pub const DEMO_RECEIVER: &str = "0x000000000000000000000000000000000000dEaD";

const TIP20_ABI: &[&str] = &[
    "function balanceOf(address account) view returns (uint256)",
    "function transfer(address to, uint256 amount) returns (bool)",
    "function transferWithMemo(address to, uint256 amount, bytes32 memo)",
];

/// Token balance in base units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Balance {
    pub raw: U256,
}

impl Balance {
    pub const DECIMALS: u32 = TOKEN_DECIMALS;

    pub fn new(raw: impl Into<U256>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Two-decimal display form, e.g. `1,000.00`
    pub fn display(&self) -> String {
        format_token_amount(self.raw, Self::DECIMALS)
    }
}

/// Convert a decimal amount string into base units
pub fn to_base_units(amount: &str, decimals: u32) -> WalletResult<U256> {
    parse_units(amount, decimals)
        .map(Into::into)
        .map_err(|e| WalletError::Abi(format!("invalid amount {}: {}", amount, e)))
}

/// The fixed demo transfer amount (1000 base units)
pub fn demo_amount() -> WalletResult<U256> {
    to_base_units(DEMO_AMOUNT, TOKEN_DECIMALS)
}

/// Call builder for a TIP-20 token
#[derive(Debug, Clone)]
pub struct Tip20 {
    address: Address,
    abi: Abi,
}

impl Tip20 {
    pub fn new(address: Address) -> WalletResult<Self> {
        let abi = parse_abi(TIP20_ABI).map_err(|e| WalletError::Abi(e.to_string()))?;
        Ok(Self { address, abi })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn call(&self, name: &str, args: Vec<Token>) -> WalletResult<ContractCall> {
        let function = self
            .abi
            .function(name)
            .map_err(|e| WalletError::Abi(e.to_string()))?
            .clone();
        Ok(ContractCall {
            address: self.address,
            function,
            args,
        })
    }

    pub fn balance_of(&self, owner: Address) -> WalletResult<ContractCall> {
        self.call("balanceOf", vec![Token::Address(owner)])
    }

    pub fn transfer(&self, to: Address, amount: U256) -> WalletResult<ContractCall> {
        self.call("transfer", vec![Token::Address(to), Token::Uint(amount)])
    }

    pub fn transfer_with_memo(
        &self,
        to: Address,
        amount: U256,
        memo: &Memo,
    ) -> WalletResult<ContractCall> {
        self.call(
            "transferWithMemo",
            vec![Token::Address(to), Token::Uint(amount), memo.to_token()],
        )
    }
}

/// Decode the single `uint256` returned by `balanceOf`
pub fn decode_balance(tokens: Vec<Token>) -> WalletResult<Balance> {
    tokens
        .into_iter()
        .next()
        .and_then(Token::into_uint)
        .map(Balance::new)
        .ok_or_else(|| WalletError::Abi("balanceOf returned no uint256".to_string()))
}
