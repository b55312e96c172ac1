pub mod app;
pub mod ui;

use std::{error::Error, io};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{debug, error};

use crate::storage::KvStore;
use app::{App, InputField, InputMode};
use ui::ui;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Runs the interactive task list until the user quits.
///
/// The terminal is restored even when the event loop fails; the loop's error
/// is returned to the caller afterwards.
pub fn run_tui(store: &dyn KvStore) -> Result<(), Box<dyn Error>> {
    let mut terminal = enter_terminal()?;
    let mut app = App::new(store);
    let looped = event_loop(&mut terminal, &mut app);
    leave_terminal(&mut terminal)?;

    looped.map_err(|err| {
        error!(%err, "tui event loop failed");
        err.into()
    })
}

fn enter_terminal() -> io::Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn leave_terminal(terminal: &mut Term) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;
        if let Event::Key(key) = event::read()? {
            if handle_key(app, key) {
                debug!("tui quit requested");
                return Ok(());
            }
        }
    }
}

/// Applies one key event to `app`. Returns `true` when the user asked to quit.
///
/// Only presses count; repeat and release events are ignored.
pub fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    if app.input_mode != InputMode::Normal {
        match key.code {
            KeyCode::Enter => app.handle_input(),
            KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
                app.input_buffer.clear();
            }
            KeyCode::Char(c) => app.input_buffer.push(c),
            KeyCode::Backspace => {
                app.input_buffer.pop();
            }
            _ => {}
        }
        return false;
    }
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Char(' ') => app.complete_selected(),
        KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
        KeyCode::Char('a') => app.start_add(),
        KeyCode::Char('e') => app.start_edit(InputField::Title),
        KeyCode::Char('t') => app.start_edit(InputField::Due),
        KeyCode::Char('c') => app.toggle_completed(),
        KeyCode::Char('f') => app.cycle_category_filter(),
        KeyCode::Char('v') => app.toggle_view(),
        KeyCode::Char('r') => app.reload(),
        _ => {}
    }
    false
}
