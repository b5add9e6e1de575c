/// Terminal setup, teardown and input events
use anyhow::Result;
use crossterm::{
    event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, is_raw_mode_enabled, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io::{stderr, Stderr};

/// Terminal events the app cares about
#[derive(Debug)]
pub(crate) enum Event {
    Key(KeyEvent),
    Resize,
}

/// Owns the terminal while the app runs and restores it on drop
pub(crate) struct Tui {
    terminal: Terminal<CrosstermBackend<Stderr>>,
    events: EventStream,
}

impl Tui {
    pub fn new() -> Result<Self> {
        Ok(Self {
            terminal: Terminal::new(CrosstermBackend::new(stderr()))?,
            events: EventStream::new(),
        })
    }

    pub fn enter(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(stderr(), EnterAlternateScreen)?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        if is_raw_mode_enabled()? {
            execute!(stderr(), LeaveAlternateScreen)?;
            disable_raw_mode()?;
        }
        Ok(())
    }

    /// Waits for the next key press or resize. `None` once input has ended.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.events.next().await? {
                Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    return Some(Event::Key(key))
                }
                Ok(CrosstermEvent::Resize(_, _)) => return Some(Event::Resize),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}
