//! Event Handling
//!
//! Maps keyboard and timer events to [`AppAction`]s.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;

/// Actions that can be performed in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    /// Quit the application
    Quit,
    /// Quit immediately (Ctrl+C)
    ForceQuit,
    /// Connect the preferred wallet
    Connect,
    /// Ask the wallet to switch to the target chain
    SwitchChain,
    /// Claim testnet funds
    Fund,
    /// Send the demo payment
    Execute,
    /// Run another transaction
    Reset,
    /// Re-read the token balance
    RefreshBalance,
    Disconnect,
    ToggleHelp,
    /// Close modals
    Escape,
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    /// Timer tick for animations
    Tick,
}

/// Event handler for the TUI
pub struct EventHandler {
    rx: mpsc::Receiver<AppAction>,
    _tx: mpsc::Sender<AppAction>,
}

impl EventHandler {
    /// Create a new event handler with specified tick rate
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel(100);
        let tx_clone = tx.clone();

        tokio::spawn(async move {
            let mut reader = crossterm::event::EventStream::new();
            let mut tick_interval = tokio::time::interval(tick_rate);

            loop {
                let tick = tick_interval.tick();
                let crossterm_event = reader.next().fuse();

                tokio::select! {
                    _ = tick => {
                        if tx_clone.send(AppAction::Tick).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(evt)) = crossterm_event => {
                        if let Some(action) = Self::map_event(evt) {
                            if tx_clone.send(action).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Wait for the next action
    pub async fn next(&mut self) -> Option<AppAction> {
        self.rx.recv().await
    }

    fn map_event(event: Event) -> Option<AppAction> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Self::map_key_event(key),
            _ => None,
        }
    }

    /// Map a key event to an app action
    pub fn map_key_event(key: KeyEvent) -> Option<AppAction> {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(AppAction::ForceQuit),
            (KeyModifiers::CONTROL, KeyCode::Char('q')) => Some(AppAction::Quit),

            (KeyModifiers::NONE, code) | (KeyModifiers::SHIFT, code) => match code {
                KeyCode::Esc => Some(AppAction::Escape),
                KeyCode::F(1) | KeyCode::Char('?') => Some(AppAction::ToggleHelp),
                KeyCode::Char('q') => Some(AppAction::Quit),

                // Flow
                KeyCode::Char('c') => Some(AppAction::Connect),
                KeyCode::Char('s') => Some(AppAction::SwitchChain),
                KeyCode::Char('f') => Some(AppAction::Fund),
                KeyCode::Char('x') | KeyCode::Enter => Some(AppAction::Execute),
                KeyCode::Char('r') => Some(AppAction::Reset),
                KeyCode::Char('b') => Some(AppAction::RefreshBalance),
                KeyCode::Char('d') => Some(AppAction::Disconnect),

                // Activity log scrolling
                KeyCode::Up | KeyCode::Char('k') => Some(AppAction::ScrollUp),
                KeyCode::Down | KeyCode::Char('j') => Some(AppAction::ScrollDown),
                KeyCode::PageUp => Some(AppAction::ScrollPageUp),
                KeyCode::PageDown => Some(AppAction::ScrollPageDown),

                _ => None,
            },

            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_flow_keys() {
        assert_eq!(EventHandler::map_key_event(key(KeyCode::Char('c'))), Some(AppAction::Connect));
        assert_eq!(EventHandler::map_key_event(key(KeyCode::Char('s'))), Some(AppAction::SwitchChain));
        assert_eq!(EventHandler::map_key_event(key(KeyCode::Char('f'))), Some(AppAction::Fund));
        assert_eq!(EventHandler::map_key_event(key(KeyCode::Enter)), Some(AppAction::Execute));
        assert_eq!(EventHandler::map_key_event(key(KeyCode::Char('r'))), Some(AppAction::Reset));
        assert_eq!(EventHandler::map_key_event(key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn test_quit_keys() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(EventHandler::map_key_event(ctrl_c), Some(AppAction::ForceQuit));
        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(EventHandler::map_key_event(ctrl_q), Some(AppAction::Quit));
        assert_eq!(EventHandler::map_key_event(key(KeyCode::Char('q'))), Some(AppAction::Quit));
    }

    #[test]
    fn test_help_keys() {
        assert_eq!(EventHandler::map_key_event(key(KeyCode::F(1))), Some(AppAction::ToggleHelp));
        let shifted = KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT);
        assert_eq!(EventHandler::map_key_event(shifted), Some(AppAction::ToggleHelp));
    }
}
