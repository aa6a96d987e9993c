//! UI Rendering
//!
//! Main layout: header, step tracker, session panel beside the transaction
//! card, activity log and status bar, with the help modal on top.

use crate::session::SessionStatus;
use crate::tui::app::{App, LogLevel, View};
use crate::tui::theme::{Icons, Theme};
use crate::tui::widgets;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Render the main UI
pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Length(3),  // Steps
            Constraint::Min(14),    // Wallet + card
            Constraint::Length(8),  // Activity
            Constraint::Length(1),  // Status bar
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[2]);

    render_header(frame, chunks[0], app);
    widgets::render_steps(frame, chunks[1], &app.session, &app.flow);
    widgets::render_wallet(frame, body[0], app);
    widgets::render_card(frame, body[1], app);
    render_activity(frame, chunks[3], app);
    render_status_bar(frame, chunks[4], app);

    if app.view == View::Help {
        render_help(frame);
    }
}

/// Header with the connection indicator
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let badge = match app.session.status() {
        SessionStatus::Ready => Span::styled(" ● CONNECTED ", Theme::badge_success()),
        SessionStatus::WrongChain | SessionStatus::SwitchingChain => {
            Span::styled(" ● WRONG NETWORK ", Theme::badge_warning())
        }
        _ => Span::styled(" ○ NOT CONNECTED ", Theme::badge_muted()),
    };

    let title = Line::from(vec![
        Span::raw(format!("{} ", Icons::BOLT)),
        Span::styled("m402", Theme::title()),
        Span::styled(format!(" Live on {}", app.chain.name), Theme::text_secondary()),
        Span::raw("   "),
        badge,
    ]);

    let header = Paragraph::new(title).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );

    frame.render_widget(header, area);
}

/// Timestamped activity log
fn render_activity(frame: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .title(" Activity ")
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = app
        .activity
        .iter()
        .map(|entry| {
            let style = match entry.level {
                LogLevel::Info => Theme::text(),
                LogLevel::Success => Theme::success(),
                LogLevel::Warning => Theme::warning(),
                LogLevel::Error => Theme::error(),
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp.format("%H:%M:%S")),
                    Theme::text_dim(),
                ),
                Span::styled(entry.message.clone(), style),
            ])
        })
        .collect();

    app.update_scroll_bounds(u16::try_from(lines.len()).unwrap_or(u16::MAX), inner.height);

    let paragraph = Paragraph::new(lines).scroll((app.scroll_offset, 0));
    frame.render_widget(paragraph, inner);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let status = match app.session.status() {
        SessionStatus::Ready => Span::styled("Ready", Theme::complete()),
        SessionStatus::Disconnected => Span::styled("Disconnected", Theme::text_secondary()),
        other => Span::styled(other.as_str().to_string(), Theme::active()),
    };

    let shortcuts = vec![
        Span::styled(" [c]", Theme::shortcut_key()),
        Span::styled(" Connect ", Theme::shortcut_desc()),
        Span::styled("[x]", Theme::shortcut_key()),
        Span::styled(" Execute ", Theme::shortcut_desc()),
        Span::styled("[d]", Theme::shortcut_key()),
        Span::styled(" Disconnect ", Theme::shortcut_desc()),
        Span::styled("[q]", Theme::shortcut_key()),
        Span::styled(" Quit ", Theme::shortcut_desc()),
        Span::styled("[F1]", Theme::shortcut_key()),
        Span::styled(" Help", Theme::shortcut_desc()),
    ];

    let line = Line::from(
        std::iter::once(status)
            .chain(std::iter::once(Span::raw(" │ ")))
            .chain(shortcuts)
            .collect::<Vec<_>>(),
    );

    frame.render_widget(Paragraph::new(line), area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<13}", key), Theme::shortcut_key()),
        Span::styled(desc, Theme::text()),
    ])
}

/// Render the help modal
fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let help_lines = vec![
        Line::from(Span::styled("Keyboard Shortcuts", Theme::heading())),
        Line::from(""),
        help_line("c", "Connect wallet"),
        help_line("s", "Switch to the Tempo network"),
        help_line("f", "Get testnet funds (free)"),
        help_line("x / Enter", "Execute the m402 payment"),
        help_line("r", "Run another transaction"),
        help_line("b", "Refresh balance"),
        help_line("d", "Disconnect"),
        help_line("↑/↓", "Scroll activity"),
        help_line("PageUp/Down", "Scroll page"),
        help_line("F1 / ?", "Show this help"),
        help_line("q / Ctrl+Q", "Quit"),
        help_line("Ctrl+C", "Force quit"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Theme::text_dim())),
    ];

    let paragraph = Paragraph::new(help_lines).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Theme::border_focused()),
    );

    frame.render_widget(paragraph, area);
}

/// Helper to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
