use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::tui_app::{App, InputMode};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What a key press asks the selector to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
    StartSearch,
    EndSearch,
    SearchChar(char),
    SearchBackspace,
    ClearSearch,
    ToggleFilter,
    ToggleDetail,
    Save,
    Pull,
    Refresh,
}

/// Advance pull progress, then wait briefly for one key press.
/// Returns true if a key was handled.
pub fn handle_events(app: &mut App) -> std::io::Result<bool> {
    app.tick_pull();

    if !event::poll(POLL_INTERVAL)? {
        return Ok(false);
    }
    let Event::Key(key) = event::read()? else {
        return Ok(false);
    };
    // Release/repeat events arrive on some platforms
    if key.kind != KeyEventKind::Press {
        return Ok(false);
    }
    if let Some(action) = action_for(app.input_mode, key) {
        apply(app, action);
    }
    Ok(true)
}

pub fn action_for(mode: InputMode, key: KeyEvent) -> Option<Action> {
    let action = match (mode, key.code) {
        (InputMode::Search, KeyCode::Esc | KeyCode::Enter) => Action::EndSearch,
        (InputMode::Search, KeyCode::Backspace) => Action::SearchBackspace,
        (InputMode::Search, KeyCode::Char('u'))
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Action::ClearSearch
        }
        (InputMode::Search, KeyCode::Char(c)) => Action::SearchChar(c),
        (_, KeyCode::Up) => Action::Up,
        (_, KeyCode::Down) => Action::Down,
        (InputMode::Search, _) => return None,

        (InputMode::Normal, code) => match code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('k') => Action::Up,
            KeyCode::Char('j') => Action::Down,
            KeyCode::PageUp => Action::PageUp,
            KeyCode::PageDown => Action::PageDown,
            KeyCode::Home | KeyCode::Char('g') => Action::Top,
            KeyCode::End | KeyCode::Char('G') => Action::Bottom,
            KeyCode::Char('/') => Action::StartSearch,
            KeyCode::Char('a') => Action::ToggleFilter,
            KeyCode::Char('s') => Action::Save,
            KeyCode::Char('d') => Action::Pull,
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Enter => Action::ToggleDetail,
            _ => return None,
        },
    };
    Some(action)
}

pub fn apply(app: &mut App, action: Action) {
    if app.input_mode == InputMode::Normal {
        app.message = None;
    }
    match action {
        // Esc/q backs out of the detail pane before quitting
        Action::Quit if app.show_detail => app.show_detail = false,
        Action::Quit => app.should_quit = true,
        Action::Up => app.move_up(),
        Action::Down => app.move_down(),
        Action::PageUp => app.page_up(),
        Action::PageDown => app.page_down(),
        Action::Top => app.home(),
        Action::Bottom => app.end(),
        Action::StartSearch => app.enter_search(),
        Action::EndSearch => app.exit_search(),
        Action::SearchChar(c) => app.search_input(c),
        Action::SearchBackspace => app.search_backspace(),
        Action::ClearSearch => app.clear_search(),
        Action::ToggleFilter => app.toggle_filter(),
        Action::ToggleDetail => app.toggle_detail(),
        Action::Save => app.save_selection(),
        Action::Pull if app.ollama_available => app.start_download(),
        Action::Pull => {
            app.message = Some(format!("{} is not reachable", app.provider_name()));
        }
        Action::Refresh => app.refresh_installed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_normal_mode_bindings() {
        let normal = |code| action_for(InputMode::Normal, key(code));
        assert_eq!(normal(KeyCode::Char('j')), Some(Action::Down));
        assert_eq!(normal(KeyCode::Up), Some(Action::Up));
        assert_eq!(normal(KeyCode::Char('G')), Some(Action::Bottom));
        assert_eq!(normal(KeyCode::Char('/')), Some(Action::StartSearch));
        assert_eq!(normal(KeyCode::Char('a')), Some(Action::ToggleFilter));
        assert_eq!(normal(KeyCode::Char('s')), Some(Action::Save));
        assert_eq!(normal(KeyCode::Char('d')), Some(Action::Pull));
        assert_eq!(normal(KeyCode::Esc), Some(Action::Quit));
        assert_eq!(normal(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_search_mode_types_letters() {
        let search = |code| action_for(InputMode::Search, key(code));
        assert_eq!(search(KeyCode::Char('q')), Some(Action::SearchChar('q')));
        assert_eq!(search(KeyCode::Char('j')), Some(Action::SearchChar('j')));
        assert_eq!(search(KeyCode::Down), Some(Action::Down));
        assert_eq!(search(KeyCode::Enter), Some(Action::EndSearch));
        assert_eq!(search(KeyCode::Backspace), Some(Action::SearchBackspace));
        assert_eq!(search(KeyCode::PageDown), None);
        assert_eq!(
            action_for(
                InputMode::Search,
                KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL)
            ),
            Some(Action::ClearSearch)
        );
    }
}
