// Display helpers for addresses, hashes and token amounts

use ethers::types::{Address, TxHash, U256};
use ethers::utils::to_checksum;

/// Shorten a string to `head...tail`, leaving short inputs untouched
pub fn truncate_middle(s: &str, head: usize, tail: usize) -> String {
    let count = s.chars().count();
    if count <= head + tail {
        return s.to_string();
    }
    let start: String = s.chars().take(head).collect();
    let end: String = s.chars().skip(count - tail).collect();
    format!("{}...{}", start, end)
}

/// `0xABCD...1234`: first 6 and last 4 characters
pub fn short_address(address: &str) -> String {
    truncate_middle(address, 6, 4)
}

/// `0x12345678...9abcdef0`: first 10 and last 8 characters
pub fn short_hash(hash: &str) -> String {
    truncate_middle(hash, 10, 8)
}

/// EIP-55 checksummed form of an address
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

pub fn display_address(address: &Address) -> String {
    short_address(&checksum(address))
}

pub fn full_hash(hash: &TxHash) -> String {
    format!("{:#x}", hash)
}

pub fn display_hash(hash: &TxHash) -> String {
    short_hash(&full_hash(hash))
}

/// Format base units as a two-decimal amount with thousands separators.
///
/// Rounds half up, e.g. 1_234_567_890 at 6 decimals renders `1,234.57`.
pub fn format_token_amount(raw: U256, decimals: u32) -> String {
    let scale = U256::exp10(decimals as usize);
    let cents = if decimals >= 2 {
        let step = U256::exp10(decimals as usize - 2);
        raw.saturating_add(step / 2u64) / step
    } else {
        raw.saturating_mul(U256::from(100u64)) / scale
    };
    let whole = cents / 100u64;
    let frac = (cents % 100u64).as_u64();
    format!("{}.{:02}", group_thousands(&whole.to_string()), frac)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
