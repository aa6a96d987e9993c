//! Step Tracker Widget
//!
//! Shows where the user is in the connect → pay sequence.

use crate::flow::{FundingState, TransactionFlow, TxState};
use crate::session::{SessionController, SessionStatus};
use crate::tui::theme::{Icons, Theme};
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// State of a single step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageState {
    Pending,
    Active,
    Complete,
    Error,
}

pub const STEP_NAMES: [&str; 5] = ["Connect", "Network", "Funds", "Execute", "Settled"];

pub fn render_steps(frame: &mut Frame, area: Rect, session: &SessionController, flow: &TransactionFlow) {
    let block = Block::default()
        .title(" Progress ")
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let states = stages(session, flow);
    let mut spans = Vec::new();

    for (i, (name, state)) in STEP_NAMES.iter().zip(states).enumerate() {
        let (icon, style) = match state {
            StageState::Complete => (Icons::COMPLETE, Theme::complete()),
            StageState::Active => (Icons::ACTIVE, Theme::active()),
            StageState::Pending => (Icons::PENDING, Theme::pending()),
            StageState::Error => (Icons::ERROR, Theme::error()),
        };

        spans.push(Span::styled(format!("{} ", icon), style));
        spans.push(Span::styled(name.to_string(), style));

        if i < STEP_NAMES.len() - 1 {
            spans.push(Span::styled(format!(" {} ", Icons::ARROW), Theme::text_dim()));
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

/// Derive every step's state from the two controllers
pub fn stages(session: &SessionController, flow: &TransactionFlow) -> [StageState; 5] {
    let status = session.status();
    let ready = status == SessionStatus::Ready;
    let has_funds = flow.balance().map(|b| !b.is_zero()).unwrap_or(false);

    let connect = match status {
        SessionStatus::Connecting => StageState::Active,
        SessionStatus::Disconnected if session.error().is_some() => StageState::Error,
        SessionStatus::Disconnected => StageState::Pending,
        _ => StageState::Complete,
    };

    let network = match status {
        SessionStatus::Ready => StageState::Complete,
        SessionStatus::WrongChain if session.error().is_some() => StageState::Error,
        SessionStatus::WrongChain | SessionStatus::SwitchingChain => StageState::Active,
        _ => StageState::Pending,
    };

    let funds = if !ready {
        StageState::Pending
    } else if has_funds {
        StageState::Complete
    } else if flow.error().is_some() {
        StageState::Error
    } else if matches!(flow.funding(), FundingState::Funding | FundingState::Funded) {
        StageState::Active
    } else {
        StageState::Pending
    };

    let execute = match flow.tx_state() {
        _ if !ready => StageState::Pending,
        TxState::Complete => StageState::Complete,
        TxState::Executing => StageState::Active,
        TxState::Idle if !has_funds => StageState::Pending,
        TxState::Idle if flow.error().is_some() => StageState::Error,
        TxState::Idle => StageState::Active,
    };

    let settled = if ready && flow.tx_state() == TxState::Complete {
        StageState::Complete
    } else {
        StageState::Pending
    };

    [connect, network, funds, execute, settled]
}
