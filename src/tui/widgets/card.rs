//! Transaction Card Widget
//!
//! The priced data query, the execute button and, once settled, the
//! transaction hash with its explorer link.

use crate::flow::TxState;
use crate::token::{DEMO_LOCATION, DEMO_PRICE, DEMO_QUERY};
use crate::tui::app::App;
use crate::tui::theme::{Icons, Theme};
use crate::utils::{display_address, display_hash, full_hash};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render_card(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.flow.can_execute(&app.session) || app.flow.tx_state() != TxState::Idle;
    let block = Block::default()
        .title(" m402 Payment ")
        .borders(Borders::ALL)
        .border_style(if focused {
            Theme::border_focused()
        } else {
            Theme::border()
        });

    let unlocked = app.session.is_ready()
        && (app.flow.balance().map(|b| !b.is_zero()).unwrap_or(false)
            || app.flow.tx_state() != TxState::Idle);

    let mut lines = query_lines(app);
    lines.push(Line::from(""));
    if unlocked {
        lines.extend(state_lines(app));
    } else {
        lines.push(Line::from(Span::styled(
            format!("Connect on {} with a funded balance to pay.", app.chain.name),
            Theme::text_dim(),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn query_lines(app: &App) -> Vec<Line<'static>> {
    let memo = app
        .ctx
        .memo
        .decode()
        .unwrap_or_else(|_| app.ctx.memo.to_hex());

    vec![
        Line::from(Span::styled("REAL TRANSACTION", Theme::label())),
        Line::from(Span::styled(DEMO_QUERY, Theme::heading())),
        Line::from(Span::styled(DEMO_LOCATION, Theme::text_secondary())),
        Line::from(""),
        Line::from(Span::styled("AMOUNT", Theme::label())),
        Line::from(vec![
            Span::styled(DEMO_PRICE, Theme::amount()),
            Span::styled(
                format!("  AlphaUSD {} {}", Icons::ARROW, display_address(&app.ctx.receiver)),
                Theme::text_secondary(),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled("MEMO", Theme::label())),
        Line::from(Span::styled(memo, Theme::text())),
    ]
}

fn state_lines(app: &App) -> Vec<Line<'static>> {
    match app.flow.tx_state() {
        TxState::Idle => vec![Line::from(vec![
            Span::styled(format!(" Execute with m402 {} ", Icons::ARROW), Theme::button()),
            Span::styled("  [x] / [Enter]", Theme::shortcut_key()),
        ])],
        TxState::Executing => vec![Line::from(vec![
            Span::styled(format!("{} ", Icons::spinner(app.tick)), Theme::active()),
            Span::styled("Sending on Tempo...", Theme::active()),
        ])],
        TxState::Complete => {
            let Some(hash) = app.flow.hash() else {
                return Vec::new();
            };
            vec![
                Line::from(Span::styled(
                    format!("{} Payment settled on Tempo", Icons::COMPLETE),
                    Theme::success(),
                )),
                Line::from(vec![
                    Span::styled("Tx        ", Theme::text_secondary()),
                    Span::styled(display_hash(&hash), Theme::text()),
                ]),
                Line::from(vec![
                    Span::styled("Explorer  ", Theme::text_secondary()),
                    Span::styled(app.chain.tx_url(&hash), Theme::link()),
                ]),
                Line::from(Span::styled(full_hash(&hash), Theme::text_dim())),
                Line::from(""),
                Line::from(vec![
                    Span::styled("[r] ", Theme::shortcut_key()),
                    Span::styled("Run another transaction", Theme::text()),
                ]),
            ]
        }
    }
}
