use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use fenceline_core::Route;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick();
            app.poll_assistant().await;
        }
        AppEvent::Navigate(path) => app.navigate_to(&path),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
        InputMode::NewCustomer => handle_form_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // View switching
        KeyCode::Char(c @ '1'..='5') => {
            let idx = (c as usize) - ('1' as usize);
            app.switch_to(Route::ALL[idx]);
        }

        // Assistant panel
        KeyCode::Char('a') => app.assistant.toggle_open(),
        KeyCode::Char('m') => {
            if app.assistant.state().open {
                app.assistant.toggle_minimized();
            }
        }
        KeyCode::Char('i') | KeyCode::Tab => {
            app.assistant.open();
            if app.assistant.state().minimized {
                app.assistant.toggle_minimized();
            }
            app.input_cursor = app.assistant.input().chars().count();
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(),

        // Voice
        KeyCode::Char('v') => app.assistant.toggle_listening(),
        KeyCode::Char('s') => app.assistant.stop_speaking(),

        KeyCode::Char('n') if app.route == Route::Customers => app.begin_new_customer(),

        // Settings
        KeyCode::Char('p') if app.route == Route::Settings => app.cycle_provider(),
        KeyCode::Char('t') if app.route == Route::Settings => app.toggle_speak_responses(),

        // Dismiss highlight and status line
        KeyCode::Esc => {
            app.highlight.clear();
            app.status = None;
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            let shift = key.modifiers.contains(KeyModifiers::SHIFT);
            app.press_enter(shift);
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let input = app.assistant.input_mut();
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let cursor = app.input_cursor;
            let input = app.assistant.input_mut();
            if cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.assistant.input().chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.assistant.input().chars().count();
        }
        KeyCode::Char(c) => {
            let cursor = app.input_cursor;
            let input = app.assistant.input_mut();
            let byte_pos = char_to_byte_index(input, cursor);
            input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

fn handle_form_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.form.clear();
            app.status = None;
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.submit_new_customer(),
        KeyCode::Backspace => {
            app.form.pop();
        }
        KeyCode::Char(c) => app.form.push(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use fenceline_core::{Config, Navigator};

    struct IgnoreNavigator;

    impl Navigator for IgnoreNavigator {
        fn navigate(&self, _path: &str) {}
    }

    fn test_app() -> App {
        let config = Config {
            provider: Some("ollama".to_string()),
            ..Config::default()
        };
        App::new(config, None, None, Arc::new(IgnoreNavigator))
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_char_to_byte_index_handles_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[test]
    fn test_number_keys_switch_views() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.route, Route::Quotes);
        press(&mut app, KeyCode::Char('5'));
        assert_eq!(app.route, Route::Settings);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.route, Route::Dashboard);
    }

    #[test]
    fn test_typing_edits_assistant_input() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.input_mode, InputMode::Editing);

        for c in "quotez".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Char('>'));
        assert_eq!(app.assistant.input(), ">quotes");

        // Keys that are shortcuts in normal mode are plain text while editing
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.assistant.input(), ">qquotes");
    }

    #[test]
    fn test_panel_toggles() {
        let mut app = test_app();
        assert!(app.assistant.state().open);

        press(&mut app, KeyCode::Char('m'));
        assert!(app.assistant.state().minimized);

        press(&mut app, KeyCode::Char('a'));
        assert!(!app.assistant.state().open);

        press(&mut app, KeyCode::Tab);
        assert!(app.assistant.state().open);
        assert!(!app.assistant.state().minimized);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn test_provider_key_only_works_in_settings() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.provider, fenceline_core::Provider::Ollama);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = test_app();
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);

        let mut app = test_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_new_customer_form_keys() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.input_mode, InputMode::Normal, "only on the customers view");

        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.input_mode, InputMode::NewCustomer);

        for c in "Dana Reyez".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input_mode, InputMode::Normal);
        let data = fenceline_core::SnapshotSource::snapshot(app.data.as_ref());
        assert_eq!(data.customers.last().unwrap().name, "Dana Reyes");
    }

    #[tokio::test]
    async fn test_navigate_event_changes_view() {
        let mut app = test_app();
        handle_event(&mut app, AppEvent::Navigate("schedule".to_string()))
            .await
            .unwrap();
        assert_eq!(app.route, Route::Schedule);
    }
}
