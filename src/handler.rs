use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, InputMode, Screen, StudioFocus, TextInput};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.on_tick();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The story view is modal
    if app.story.is_open() {
        handle_story_key(app, key);
        return;
    }

    match (app.screen, app.input_mode) {
        (Screen::Generators, InputMode::Normal) => handle_generators_normal(app, key),
        (Screen::Generators, InputMode::Editing) => handle_generators_editing(app, key),
        (Screen::Studio, InputMode::Normal) => handle_studio_normal(app, key),
        (Screen::Studio, InputMode::Editing) => handle_studio_editing(app, key),
    }
}

fn handle_paste(app: &mut App, text: &str) {
    if app.story.is_open() {
        app.story_insert(text);
        return;
    }

    match (app.screen, app.input_mode) {
        (Screen::Studio, InputMode::Normal) if app.studio_focus == StudioFocus::Improvement => {
            app.drop_document(text);
        }
        (Screen::Studio, InputMode::Editing) => app.chat_input_mut().insert_str(text),
        (Screen::Generators, InputMode::Editing) => {
            if let Some(field) = app.current_form_mut().selected_field_mut() {
                field.input.insert_str(text);
            }
        }
        _ => {}
    }
}

fn handle_story_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.story.close(),
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => app.export_story(),
        KeyCode::Enter => app.story_insert("\n"),
        KeyCode::Backspace => app.story_backspace(),
        KeyCode::Delete => app.story_delete(),
        KeyCode::Left => app.story_left(),
        KeyCode::Right => app.story_right(),
        KeyCode::Home => app.story_cursor = 0,
        KeyCode::End => app.story_cursor = app.story.content().chars().count(),
        KeyCode::Char(c) => {
            let mut tmp = [0u8; 4];
            app.story_insert(c.encode_utf8(&mut tmp));
        }
        _ => {}
    }
}

fn handle_generators_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Generator tabs
        KeyCode::Char('l') | KeyCode::Right => app.next_generator(),
        KeyCode::Char('h') | KeyCode::Left => app.prev_generator(),

        // Form fields
        KeyCode::Char('j') | KeyCode::Down => app.current_form_mut().next_field(),
        KeyCode::Char('k') | KeyCode::Up => app.current_form_mut().prev_field(),
        KeyCode::Enter | KeyCode::Char('i') => {
            // Choice fields cycle in place; text fields enter editing
            let edit_text = match app.current_form_mut().selected_field_mut() {
                Some(field) if field.is_choice() => {
                    field.cycle(true);
                    false
                }
                Some(_) => true,
                None => false,
            };
            if edit_text {
                app.input_mode = InputMode::Editing;
            }
        }
        KeyCode::Char(' ') => {
            if let Some(field) = app.current_form_mut().selected_field_mut() {
                field.cycle(true);
            }
        }
        KeyCode::Backspace => {
            if let Some(field) = app.current_form_mut().selected_field_mut() {
                field.cycle(false);
            }
        }

        // Result scrolling
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.result_scroll = app.result_scroll.saturating_add(5);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.result_scroll = app.result_scroll.saturating_sub(5);
        }

        // Actions
        KeyCode::Char('g') => {
            app.generate();
        }
        KeyCode::Char('s') => app.save_draft(),
        KeyCode::Char('c') => app.copy_idea_to_plot(),
        KeyCode::Char('o') => app.open_story(),

        KeyCode::Tab => app.screen = Screen::Studio,

        _ => {}
    }
}

fn handle_generators_editing(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
        app.input_mode = InputMode::Normal;
        return;
    }
    if let Some(field) = app.current_form_mut().selected_field_mut() {
        edit_input(&mut field.input, key);
    }
}

fn handle_studio_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('h') | KeyCode::Left => app.studio_focus = StudioFocus::Improvement,
        KeyCode::Char('l') | KeyCode::Right => app.studio_focus = StudioFocus::Creation,

        KeyCode::Char('j') | KeyCode::Down => app.message_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.message_nav_up(),

        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,

        // Story actions
        KeyCode::Char('a') => app.promote_selected(),
        KeyCode::Char('A') => app.add_latest_to_story(),
        KeyCode::Char('o') => app.open_story(),

        KeyCode::Tab | KeyCode::Esc => app.screen = Screen::Generators,

        _ => {}
    }
}

fn handle_studio_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            app.send_chat();
        }
        _ => edit_input(app.chat_input_mut(), key),
    }
}

fn edit_input(input: &mut TextInput, key: KeyEvent) {
    match key.code {
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => input.clear(),
        KeyCode::Char(c) => input.insert(c),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use storylab_core::{ArtifactKind, DemoBackend, DirectorySink, DraftStore, PanelId};

    fn app() -> App {
        App::with_parts(
            Arc::new(DemoBackend::with_delay(Duration::from_secs(30))),
            DraftStore::in_memory(),
            DirectorySink::new(std::env::temp_dir()),
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_typing_into_plot_form() {
        let mut app = app();
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.current_kind(), ArtifactKind::Plot);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Editing);
        type_text(&mut app, "a lighthouse keeper");
        press(&mut app, KeyCode::Esc);

        // 'g' while normal triggers generation instead of typing
        press(&mut app, KeyCode::Char('g'));
        assert!(app.controller.is_busy(PanelId::Plot));
        assert_eq!(app.current_form().fields[0].value(), "a lighthouse keeper");
    }

    #[tokio::test]
    async fn test_choice_fields_cycle_instead_of_editing() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.current_form().fields[0].value(), "Science Fiction");
    }

    #[tokio::test]
    async fn test_paste_on_improvement_records_document() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('h'));
        handle_event(&mut app, AppEvent::Paste("/tmp/notes/draft.md".into())).unwrap();

        let transcript = app.controller.transcript(PanelId::Improvement).unwrap();
        assert_eq!(transcript.latest_document(), Some("draft.md"));
    }

    #[tokio::test]
    async fn test_story_modal_captures_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('o'));
        assert!(app.story.is_open());

        type_text(&mut app, "q");
        assert!(!app.should_quit);
        assert_eq!(app.story.content(), "q");

        press(&mut app, KeyCode::Esc);
        assert!(!app.story.is_open());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
