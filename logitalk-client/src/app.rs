/// Main LogiTalk client app
use crate::{
    components::{
        chat_history::ChatHistory,
        text_input::{TextInput, TextInputAction},
    },
    tui::{Event, Tui},
};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use logitalk_client::{ConnectOptions, Session};
use logitalk_protocol::DisplayEvent;
use ratatui::prelude::{Constraint, Direction, Layout};
use tokio::sync::mpsc;
use tracing::info;

/// Actions taken in response to events
#[derive(Debug)]
pub(crate) enum Action {
    Input(TextInputAction),
    Send,
    Quit,
}

/// Control logic for the application - receives events, translates them into
/// actions, adjusts state, and then renders that state
#[derive(Debug)]
pub(crate) struct App<'a> {
    history: ChatHistory<'a>,
    input: TextInput,
    quit: bool,
    session: Option<Session>,
    events: mpsc::UnboundedReceiver<DisplayEvent>,
    listening: bool,
}

impl<'a> App<'a> {
    /// Builds the app and tries to connect once. A failed connection is shown
    /// in the history and the window stays open.
    pub async fn connect(addr: &str, user: String, options: &ConnectOptions) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let mut history = ChatHistory::default();
        let session = match Session::connect(addr, user, options, events_tx).await {
            Ok(session) => Some(session),
            Err(e) => {
                history.push(DisplayEvent::notice(format!(
                    "Could not connect to {addr}: {e}"
                )));
                None
            }
        };
        Self {
            history,
            input: TextInput::default(),
            quit: false,
            session,
            events,
            listening: true,
        }
    }

    async fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::Input(action) => self.do_input(action).await,
            Action::Send => self.do_send().await,
            Action::Quit => self.do_quit().await,
        }
    }

    async fn do_input(&mut self, action: TextInputAction) -> Result<Option<Action>> {
        self.input.action(action);
        Ok(None)
    }

    async fn do_quit(&mut self) -> Result<Option<Action>> {
        self.quit = true;
        Ok(None)
    }

    async fn do_send(&mut self) -> Result<Option<Action>> {
        let input_text = self.input.get_input();
        match self.session.as_mut() {
            Some(session) => session.submit(&input_text).await,
            None if !input_text.trim().is_empty() => {
                self.history
                    .push(DisplayEvent::notice("Not connected, message not sent"));
            }
            None => {}
        }
        Ok(Some(Action::Input(TextInputAction::Clear)))
    }
}

fn map_event_to_action(_app: &App, event: Event) -> Option<Action> {
    match event {
        Event::Key(key) => match key.code {
            KeyCode::Char('c') if key.modifiers == KeyModifiers::CONTROL => Some(Action::Quit),
            KeyCode::Esc => Some(Action::Quit),
            KeyCode::Enter => Some(Action::Send),
            KeyCode::Backspace => Some(Action::Input(TextInputAction::Backspace)),
            KeyCode::Delete => Some(Action::Input(TextInputAction::Delete)),
            KeyCode::Left => Some(Action::Input(TextInputAction::MoveLeft)),
            KeyCode::Right => Some(Action::Input(TextInputAction::MoveRight)),
            KeyCode::Home => Some(Action::Input(TextInputAction::MoveHome)),
            KeyCode::End => Some(Action::Input(TextInputAction::MoveEnd)),
            KeyCode::Char(c) => Some(Action::Input(TextInputAction::Char(c))),
            _ => None,
        },
        Event::Resize => None,
    }
}

pub async fn run(addr: String, user: String, options: ConnectOptions) -> Result<()> {
    let mut tui = Tui::new()?;
    tui.enter()?;

    let mut app = App::connect(&addr, user, &options).await;

    loop {
        let mut action = None;

        tokio::select! {
            // render received frames, echoes and notices
            maybe_event = app.events.recv(), if app.listening => {
                match maybe_event {
                    Some(event) => app.history.push(event),
                    None => app.listening = false,
                }
            }

            // turn UI events into actions
            maybe_event = tui.next() => {
                match maybe_event {
                    Some(event) => action = map_event_to_action(&app, event),
                    None => action = Some(Action::Quit),
                }
            }
        }

        // application update
        while let Some(next_action) = action {
            action = app.update(next_action).await?;
        }

        // application render
        tui.draw(|f| {
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(3)]);
            let split = layout.split(f.size());

            let (x, y) = app.input.cursor_position(split[1]);
            f.set_cursor(x, y);

            f.render_widget(&app.history, split[0]);
            f.render_widget(&app.input, split[1]);
        })?;

        // application exit
        if app.quit {
            break;
        }
    }

    if let Some(session) = app.session.take() {
        session.shutdown().await;
    }
    tui.exit()?;
    info!("client exited");
    Ok(())
}
