//! Main application logic

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::time::{MissedTickBehavior, interval};

use crate::actors::coordinator::CoordinatorHandle;
use crate::config::ResolvedConfig;
use crate::stats::Window;

use super::{state::AppState, ui};

/// Main TUI application
///
/// Owns nothing but display state; all statistics live in the coordinator.
pub struct App {
    coordinator: CoordinatorHandle,
    short_refresh: Duration,
    long_refresh: Duration,
    state: AppState,
}

impl App {
    pub fn new(coordinator: CoordinatorHandle, config: &ResolvedConfig) -> Self {
        Self {
            coordinator,
            short_refresh: config.short_refresh,
            long_refresh: config.long_refresh,
            state: AppState::new(),
        }
    }

    /// Run the application until the user quits
    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Pick up whatever the coordinator already has, including alerts seen
        // by an earlier dashboard
        self.state.endpoints = self.coordinator.snapshot().await?;
        self.state.push_alerts(self.coordinator.recent_alerts().await?);

        let result = self.run_event_loop(&mut terminal).await;

        restore_terminal()?;
        terminal.show_cursor()?;

        result
    }

    /// Main event loop
    ///
    /// Handles exactly one of {long tick, short tick, input event} per iteration.
    async fn run_event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let mut short_tick = interval(self.short_refresh);
        let mut long_tick = interval(self.long_refresh);
        short_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        long_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut events = EventStream::new();

        loop {
            let mut alerts_height = 0;
            terminal.draw(|f| alerts_height = ui::render(f, &self.state))?;
            self.state.page_height = alerts_height.saturating_sub(2) as usize;

            tokio::select! {
                biased;

                _ = long_tick.tick() => {
                    self.refresh(Window::Long).await?;
                }

                _ = short_tick.tick() => {
                    self.refresh(Window::Short).await?;
                }

                event = events.next() => {
                    match event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            if self.handle_key_event(key) {
                                break; // Quit
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => break,
                    }
                }
            }
        }

        Ok(())
    }

    async fn refresh(&mut self, window: Window) -> Result<()> {
        let outcome = self.coordinator.refresh(window).await?;
        for event in &outcome.events {
            tracing::info!("{}", super::describe_alert(event));
        }
        self.state.apply_refresh(outcome);
        Ok(())
    }

    /// Handle keyboard event, returns `true` when the user asked to quit
    fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match (key.code, ctrl) {
            (KeyCode::Char('q'), false) | (KeyCode::Char('c'), true) => return true,
            (KeyCode::Char('j'), false) | (KeyCode::Down, _) => self.state.scroll_down(),
            (KeyCode::Char('k'), false) | (KeyCode::Up, _) => self.state.scroll_up(),
            (KeyCode::Char('d'), true) => self.state.scroll_half_page_down(),
            (KeyCode::Char('u'), true) => self.state.scroll_half_page_up(),
            (KeyCode::Char('f'), true) => self.state.scroll_page_down(),
            (KeyCode::Char('b'), true) => self.state.scroll_page_up(),
            (KeyCode::Home, _) => self.state.scroll_top(),
            (KeyCode::Char('G'), _) | (KeyCode::End, _) => self.state.scroll_bottom(),
            _ => {}
        }

        false
    }
}

/// Leave the alternate screen and raw mode
///
/// Safe to call when the terminal was never set up.
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}
