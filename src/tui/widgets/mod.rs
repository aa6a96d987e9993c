//! TUI Widgets

mod card;
mod steps;
mod wallet;

pub use card::render_card;
pub use steps::{render_steps, stages, StageState};
pub use wallet::render_wallet;
