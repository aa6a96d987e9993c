//! Session Panel Widget
//!
//! Account, network and balance, plus whichever session action is
//! currently available.

use crate::flow::FundingState;
use crate::session::SessionStatus;
use crate::tui::app::App;
use crate::tui::theme::{Icons, Theme};
use crate::utils::display_address;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render_wallet(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Wallet ")
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let lines = if app.has_wallet() {
        wallet_lines(app)
    } else {
        no_provider_lines()
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn action(key: &str, label: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("[{}] ", key), Theme::shortcut_key()),
        Span::styled(label.to_string(), Theme::text()),
    ])
}

fn pending(app: &App, label: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{} ", Icons::spinner(app.tick)), Theme::active()),
        Span::styled(label.to_string(), Theme::active()),
    ])
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<9}", label), Theme::text_secondary()),
        Span::styled(value, Theme::text()),
    ])
}

fn no_provider_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled("No wallet detected", Theme::heading())),
        Line::from(""),
        Line::from(Span::styled(
            "Provide a key to take part in the demo:",
            Theme::text_secondary(),
        )),
        Line::from(vec![
            Span::styled(format!("  {} ", Icons::DOT), Theme::text_dim()),
            Span::styled("WALLET_PRIVATE_KEY", Theme::shortcut_key()),
            Span::styled(" in .env, or", Theme::text_secondary()),
        ]),
        Line::from(vec![
            Span::styled(format!("  {} ", Icons::DOT), Theme::text_dim()),
            Span::styled("WALLET_KEYSTORE_PATH", Theme::shortcut_key()),
            Span::styled(" + ", Theme::text_secondary()),
            Span::styled("WALLET_KEYSTORE_PASSWORD", Theme::shortcut_key()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Then restart. No real funds needed.",
            Theme::text_dim(),
        )),
    ]
}

fn wallet_lines(app: &App) -> Vec<Line<'static>> {
    let session = &app.session;
    let status = session.status();
    let mut lines = Vec::new();

    match status {
        SessionStatus::Disconnected => {
            lines.push(Line::from(Span::styled(
                "Connect your wallet to execute a real m402 payment on Tempo.",
                Theme::text(),
            )));
            lines.push(Line::from(Span::styled(
                "No real funds needed.",
                Theme::text_secondary(),
            )));
            lines.push(Line::from(""));
            lines.push(action("c", "Connect Wallet"));
        }
        SessionStatus::Connecting => {
            lines.push(pending(app, "Connecting..."));
        }
        _ => {
            if let Some(address) = session.address() {
                lines.push(field("Account", display_address(&address)));
            }
            let network = match session.session().chain_id {
                Some(id) if id == app.chain.id => app.chain.name.clone(),
                Some(id) => format!("Chain {}", id),
                None => "unknown".to_string(),
            };
            lines.push(field("Network", network));
        }
    }

    match status {
        SessionStatus::WrongChain => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Switch to {} to continue.", app.chain.name),
                Theme::warning(),
            )));
            lines.push(action("s", "Switch Network"));
        }
        SessionStatus::SwitchingChain => {
            lines.push(Line::from(""));
            lines.push(pending(app, "Switching network..."));
        }
        SessionStatus::Ready => {
            let balance = app
                .flow
                .balance()
                .map(|b| format!("{} AlphaUSD", b.display()))
                .unwrap_or_else(|| "...".to_string());
            lines.push(field("Balance", balance));
            lines.push(Line::from(""));

            if app.flow.funding() == FundingState::Funding {
                lines.push(pending(app, "Claiming testnet funds..."));
            } else if app.flow.can_fund(session) {
                lines.push(action("f", "Get Testnet Funds (Free)"));
            } else if app.flow.funding() == FundingState::Funded
                && app.flow.balance().map(|b| b.is_zero()).unwrap_or(true)
            {
                lines.push(action("b", "Refresh balance"));
            }
        }
        _ => {}
    }

    if status.is_connected() {
        lines.push(action("d", "Disconnect"));
    }

    if let Some(notice) = app.flow.notice() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(notice.to_string(), Theme::warning())));
    }
    if let Some(error) = app.error() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", Icons::ERROR), Theme::error()),
            Span::styled(error.to_string(), Theme::error()),
        ]));
    }

    lines
}
