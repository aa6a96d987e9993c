//! Fixed-size transfer memos
//!
//! A memo is a 32-byte tag attached to a TIP-20 `transferWithMemo` call so
//! the receiving side can reconcile the payment off-chain. Tags are UTF-8
//! text, right-padded with zero bytes.

use ethers::abi::Token;
use std::fmt;

pub const MEMO_LEN: usize = 32;

/// Tag identifying the data provider and the queried coordinates
pub const DEMO_MEMO_TAG: &str = "m402:hivemapper:-23.55,-46.63";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoError {
    #[error("memo tag is {0} bytes, at most 32 allowed")]
    TooLong(usize),

    #[error("memo is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memo([u8; MEMO_LEN]);

impl Memo {
    /// The memo attached to the demo payment
    pub const DEMO: Memo = Memo::pad(DEMO_MEMO_TAG);

    /// Right-pad a tag known at compile time
    const fn pad(tag: &str) -> Memo {
        let bytes = tag.as_bytes();
        assert!(bytes.len() <= MEMO_LEN);
        let mut out = [0u8; MEMO_LEN];
        let mut i = 0;
        while i < bytes.len() {
            out[i] = bytes[i];
            i += 1;
        }
        Memo(out)
    }

    /// Encode a UTF-8 tag, right-padding with zero bytes to 32 bytes
    pub fn encode(tag: &str) -> Result<Self, MemoError> {
        let bytes = tag.as_bytes();
        if bytes.len() > MEMO_LEN {
            return Err(MemoError::TooLong(bytes.len()));
        }
        let mut out = [0u8; MEMO_LEN];
        out[..bytes.len()].copy_from_slice(bytes);
        Ok(Memo(out))
    }

    pub fn from_bytes(bytes: [u8; MEMO_LEN]) -> Self {
        Memo(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MEMO_LEN] {
        &self.0
    }

    /// Decode back to text, trimming trailing zero bytes
    pub fn decode(&self) -> Result<String, MemoError> {
        let end = self
            .0
            .iter()
            .rposition(|b| *b != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        std::str::from_utf8(&self.0[..end])
            .map(str::to_string)
            .map_err(|_| MemoError::InvalidUtf8)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// ABI `bytes32` argument
    pub fn to_token(&self) -> Token {
        Token::FixedBytes(self.0.to_vec())
    }
}

impl fmt::Debug for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Memo({})", self.to_hex())
    }
}

impl fmt::Display for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str(&self.to_hex()),
        }
    }
}
