//! Terminal User Interface Module
//!
//! The interactive demo widget, built with Ratatui.
//!
//! # Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ⚡ m402 Live on Tempo Testnet (Moderato)        ● CONNECTED     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ✓ Connect → ✓ Network → ✓ Funds → ● Execute → ○ Settled        │
//! ├─ Wallet ───────────────────────┬─ m402 Payment ─────────────────┤
//! │ Account  0xf39F...2266         │ REAL TRANSACTION               │
//! │ Network  Tempo Testnet         │ Hivemapper Street Query        │
//! │ Balance  1,000.00 AlphaUSD     │ $0.001   [ Execute with m402 ] │
//! ├─ Activity ─────────────────────┴────────────────────────────────┤
//! │ 12:00:01 Connected 0xf39F...2266 via injected                    │
//! └─────────────────────────────────────────────────────────────────┘
//!  Ready │ [c] Connect [x] Execute [d] Disconnect [q] Quit [F1] Help
//! ```

pub mod app;
pub mod event;
pub mod theme;
pub mod ui;
pub mod widgets;

pub use app::{App, AppEvent, View};
pub use event::{AppAction, EventHandler};

use crate::actions::DemoContext;
use crate::config::Config;
use crate::wallet::Connectors;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use tracing::{error, info};

/// Type alias for our terminal backend
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state
pub fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI application
pub async fn run(config: Config) -> anyhow::Result<()> {
    info!("Starting TUI mode");

    let ctx = DemoContext::from_config(&config)?;
    let connectors = Connectors::from_config(&config.wallet, &config.chain)?;
    let mut app = App::new(config.chain.clone(), ctx, connectors, config.flow.refresh_delay);

    let mut terminal = init_terminal()?;
    let mut events = EventHandler::new(config.tui.tick_rate);

    let result = run_app(&mut terminal, &mut app, &mut events).await;

    if let Err(e) = restore_terminal(&mut terminal) {
        error!("Failed to restore terminal: {}", e);
    }

    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Apply results of wallet and faucet calls
        app.poll_events();

        // Ticks arrive at the configured rate, so this never blocks for long
        let Some(action) = events.next().await else {
            break;
        };
        match action {
            AppAction::ForceQuit => break,
            _ => app.handle_action(action),
        }

        if app.should_quit {
            break;
        }
    }

    info!("TUI exited normally");
    Ok(())
}
