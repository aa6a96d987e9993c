// m402 demo - pay for a data query with a memo-tagged TIP-20 transfer on Tempo

pub mod actions;
pub mod chain;
pub mod config;
pub mod faucet;
pub mod flow;
pub mod headless;
pub mod memo;
pub mod session;
pub mod token;
pub mod types;
pub mod utils;
pub mod wallet;
pub mod tui;       // Terminal User Interface

// Re-exports for convenience
pub use config::Config;
pub use flow::TransactionFlow;
pub use session::SessionController;
