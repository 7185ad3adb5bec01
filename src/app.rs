use std::sync::Arc;

use ratatui::widgets::ListState;
use storylab_core::artifact::{GENRES, MOODS, PLOT_STRUCTURES, PROMPT_TYPES, WRITING_STYLES};
use storylab_core::transcript::dropped_file_name;
use storylab_core::{
    ArtifactKind, Completion, Config, DemoBackend, DirectorySink, DraftStore, GenerationBackend,
    GenerationController, HttpBackend, NotificationCenter, PanelId, Parameters, SqliteStore,
    StoryView, SubmitOutcome,
};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Generators,
    Studio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Which chat panel has focus in the studio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudioFocus {
    Improvement,
    Creation,
}

impl StudioFocus {
    pub fn panel(self) -> PanelId {
        match self {
            StudioFocus::Improvement => PanelId::Improvement,
            StudioFocus::Creation => PanelId::Creation,
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn insert_at(buf: &mut String, cursor: &mut usize, text: &str) {
    let byte_pos = char_to_byte_index(buf, *cursor);
    buf.insert_str(byte_pos, text);
    *cursor += text.chars().count();
}

fn remove_before(buf: &mut String, cursor: &mut usize) {
    if *cursor > 0 {
        *cursor -= 1;
        let byte_pos = char_to_byte_index(buf, *cursor);
        buf.remove(byte_pos);
    }
}

fn remove_at(buf: &mut String, cursor: usize) {
    if cursor < buf.chars().count() {
        let byte_pos = char_to_byte_index(buf, cursor);
        buf.remove(byte_pos);
    }
}

/// Text split at the cursor, for drawing a caret between the halves
pub fn split_at_cursor(buf: &str, cursor: usize) -> (&str, &str) {
    buf.split_at(char_to_byte_index(buf, cursor))
}

/// Single-line text box with a character cursor
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    pub fn insert(&mut self, c: char) {
        let mut tmp = [0u8; 4];
        insert_at(&mut self.value, &mut self.cursor, c.encode_utf8(&mut tmp));
    }

    /// Pasted text, flattened onto one line
    pub fn insert_str(&mut self, text: &str) {
        let flat = text.replace(['\r', '\n'], " ");
        insert_at(&mut self.value, &mut self.cursor, &flat);
    }

    pub fn backspace(&mut self) {
        remove_before(&mut self.value, &mut self.cursor);
    }

    pub fn delete(&mut self) {
        remove_at(&mut self.value, self.cursor);
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// One input of a generator form: free text, or a pick from fixed choices
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub input: TextInput,
    pub choices: &'static [&'static str],
    pub choice: usize,
}

impl FormField {
    fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            input: TextInput::default(),
            choices: &[],
            choice: 0,
        }
    }

    fn pick(name: &'static str, label: &'static str, choices: &'static [&'static str]) -> Self {
        Self {
            choices,
            ..Self::text(name, label)
        }
    }

    pub fn is_choice(&self) -> bool {
        !self.choices.is_empty()
    }

    pub fn value(&self) -> &str {
        if self.is_choice() {
            self.choices[self.choice % self.choices.len()]
        } else {
            &self.input.value
        }
    }

    pub fn cycle(&mut self, forward: bool) {
        let len = self.choices.len();
        if len == 0 {
            return;
        }
        self.choice = if forward {
            (self.choice + 1) % len
        } else {
            (self.choice + len - 1) % len
        };
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorForm {
    pub kind: ArtifactKind,
    pub fields: Vec<FormField>,
    pub selected: usize,
}

impl GeneratorForm {
    pub fn for_kind(kind: ArtifactKind) -> Self {
        let fields = match kind {
            ArtifactKind::Idea => vec![
                FormField::pick("genre", "Genre", GENRES),
                FormField::pick("style", "Writing style", WRITING_STYLES),
                FormField::text("theme", "Theme (optional)"),
            ],
            ArtifactKind::Plot => vec![
                FormField::text("story_idea", "Story idea"),
                FormField::pick("structure", "Structure", PLOT_STRUCTURES),
            ],
            ArtifactKind::Dialogue => vec![
                FormField::text("characters", "Characters"),
                FormField::text("scene_context", "Scene context"),
                FormField::pick("mood", "Mood", MOODS),
            ],
            ArtifactKind::Prompt => vec![FormField::pick("type", "Prompt type", PROMPT_TYPES)],
            ArtifactKind::Story | ArtifactKind::Revision => Vec::new(),
        };
        Self {
            kind,
            fields,
            selected: 0,
        }
    }

    /// Request fields for this kind. Required fields always go out so
    /// validation can reject them; blank optional ones are left off.
    pub fn parameters(&self) -> Parameters {
        let required = self.kind.required_fields();
        let optional = self.kind.optional_fields();
        self.fields
            .iter()
            .filter(|f| {
                required.contains(&f.name)
                    || (optional.contains(&f.name) && !f.value().trim().is_empty())
            })
            .map(|f| (f.name.to_string(), f.value().to_string()))
            .collect()
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn selected_field_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.selected)
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.selected = (self.selected + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.selected = (self.selected + self.fields.len() - 1) % self.fields.len();
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Generator screen
    pub generator_idx: usize,
    pub forms: Vec<GeneratorForm>,
    pub result_scroll: u16,

    // Studio (chat) screen
    pub studio_focus: StudioFocus,
    pub creation_input: TextInput,
    pub improvement_input: TextInput,
    pub creation_state: ListState,
    pub improvement_state: ListState,

    // Story view
    pub story: StoryView,
    pub story_cursor: usize,

    // Animation state for the generating indicator
    pub animation_frame: usize,

    pub controller: GenerationController,
    pub notifications: NotificationCenter,
    pub drafts: DraftStore,
    pub export_sink: DirectorySink,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let backend: Arc<dyn GenerationBackend> = if config.demo_mode {
            info!("demo mode, using canned replies");
            Arc::new(DemoBackend::new())
        } else {
            info!(endpoint = %config.endpoint, "using generation service");
            Arc::new(HttpBackend::with_timeout(&config.endpoint, config.request_timeout()))
        };

        // Drafts are best-effort; fall back to a session-only store
        let drafts = match SqliteStore::default_path().map(|path| SqliteStore::open(&path)) {
            Some(Ok(store)) => DraftStore::new(store),
            Some(Err(e)) => {
                warn!(error = %e, "draft database unavailable, drafts will not persist");
                DraftStore::in_memory()
            }
            None => {
                warn!("no data directory, drafts will not persist");
                DraftStore::in_memory()
            }
        };

        let export_dir = config.export_dir().unwrap_or_else(DirectorySink::default_dir);
        Self::with_parts(backend, drafts, DirectorySink::new(export_dir))
    }

    pub fn with_parts(
        backend: Arc<dyn GenerationBackend>,
        drafts: DraftStore,
        export_sink: DirectorySink,
    ) -> Self {
        let notifications = NotificationCenter::new();
        let controller = GenerationController::new(backend, notifications.clone());

        Self {
            should_quit: false,
            screen: Screen::Generators,
            input_mode: InputMode::Normal,

            generator_idx: 0,
            forms: ArtifactKind::generators()
                .into_iter()
                .map(GeneratorForm::for_kind)
                .collect(),
            result_scroll: 0,

            studio_focus: StudioFocus::Creation,
            creation_input: TextInput::default(),
            improvement_input: TextInput::default(),
            creation_state: ListState::default(),
            improvement_state: ListState::default(),

            story: StoryView::new(),
            story_cursor: 0,

            animation_frame: 0,

            controller,
            notifications,
            drafts,
            export_sink,
        }
    }

    // Generator helpers
    pub fn current_form(&self) -> &GeneratorForm {
        &self.forms[self.generator_idx]
    }

    pub fn current_form_mut(&mut self) -> &mut GeneratorForm {
        &mut self.forms[self.generator_idx]
    }

    pub fn current_kind(&self) -> ArtifactKind {
        self.current_form().kind
    }

    pub fn current_panel(&self) -> PanelId {
        PanelId::for_generator(self.current_kind()).unwrap_or(PanelId::Idea)
    }

    pub fn next_generator(&mut self) {
        self.generator_idx = (self.generator_idx + 1) % self.forms.len();
        self.result_scroll = 0;
    }

    pub fn prev_generator(&mut self) {
        self.generator_idx = (self.generator_idx + self.forms.len() - 1) % self.forms.len();
        self.result_scroll = 0;
    }

    fn select_generator(&mut self, kind: ArtifactKind) {
        if let Some(idx) = self.forms.iter().position(|f| f.kind == kind) {
            self.generator_idx = idx;
            self.result_scroll = 0;
        }
    }

    pub fn generate(&mut self) -> SubmitOutcome {
        let panel = self.current_panel();
        let kind = self.current_kind();
        let parameters = self.current_form().parameters();
        let outcome = self.controller.submit(panel, kind, parameters);
        if outcome == SubmitOutcome::Started {
            self.result_scroll = 0;
        }
        outcome
    }

    /// Keep the current generator's last result as a local draft
    pub fn save_draft(&mut self) {
        let kind = self.current_kind();
        let Some(result) = self.controller.last_result(self.current_panel()) else {
            return;
        };
        self.drafts.save(kind.draft_namespace(), &result.content);
        self.notifications.success(kind.saved_message());
    }

    /// Seed the plot generator with the last generated idea
    pub fn copy_idea_to_plot(&mut self) {
        let Some(idea) = self.controller.last_result(PanelId::Idea).map(|r| r.content.clone()) else {
            return;
        };
        let plot_form = self.forms.iter_mut().find(|f| f.kind == ArtifactKind::Plot);
        if let Some(field) = plot_form.and_then(|form| form.field_mut("story_idea")) {
            field.input.set(&idea);
        }
        self.select_generator(ArtifactKind::Plot);
        self.notifications.success("Story idea copied to plot generator!");
    }

    // Studio helpers
    pub fn focused_panel(&self) -> PanelId {
        self.studio_focus.panel()
    }

    pub fn chat_input_mut(&mut self) -> &mut TextInput {
        match self.studio_focus {
            StudioFocus::Improvement => &mut self.improvement_input,
            StudioFocus::Creation => &mut self.creation_input,
        }
    }

    fn chat_state_mut(&mut self, panel: PanelId) -> &mut ListState {
        match panel {
            PanelId::Improvement => &mut self.improvement_state,
            _ => &mut self.creation_state,
        }
    }

    pub fn send_chat(&mut self) -> SubmitOutcome {
        let panel = self.focused_panel();
        let text = self.chat_input_mut().value.clone();
        let outcome = self.controller.submit_chat(panel, &text);
        if outcome == SubmitOutcome::Started {
            self.chat_input_mut().clear();
            self.select_last_message(panel);
        }
        outcome
    }

    /// A file dropped on the improvement panel; only its name is recorded
    pub fn drop_document(&mut self, pasted: &str) -> bool {
        let Some(name) = dropped_file_name(pasted) else {
            return false;
        };
        if self.controller.append_document(PanelId::Improvement, &name) {
            self.select_last_message(PanelId::Improvement);
            return true;
        }
        false
    }

    fn select_last_message(&mut self, panel: PanelId) {
        let len = self.controller.transcript(panel).map_or(0, |t| t.len());
        self.chat_state_mut(panel).select(len.checked_sub(1));
    }

    pub fn message_nav_down(&mut self) {
        let panel = self.focused_panel();
        let len = self.controller.transcript(panel).map_or(0, |t| t.len());
        if len == 0 {
            return;
        }
        let state = self.chat_state_mut(panel);
        let i = state.selected().map_or(0, |i| (i + 1).min(len - 1));
        state.select(Some(i));
    }

    pub fn message_nav_up(&mut self) {
        let panel = self.focused_panel();
        let state = self.chat_state_mut(panel);
        let i = state.selected().map_or(0, |i| i.saturating_sub(1));
        state.select(Some(i));
    }

    /// Move the selected AI reply into the story buffer
    pub fn promote_selected(&mut self) {
        let panel = self.focused_panel();
        let selected = match panel {
            PanelId::Improvement => self.improvement_state.selected(),
            _ => self.creation_state.selected(),
        };
        let content = self.controller.transcript(panel).and_then(|t| {
            let message = t.messages().get(selected?)?;
            t.promote(&message.id).map(str::to_string)
        });

        match content {
            Some(text) => self.add_to_story(&text),
            None => {
                self.notifications.info("Only AI replies can be added to the story.");
            }
        }
    }

    /// "Add Latest to Story": the newest AI reply of the focused panel
    pub fn add_latest_to_story(&mut self) {
        let latest = self
            .controller
            .transcript(self.focused_panel())
            .and_then(|t| t.latest_ai())
            .map(|m| m.content.clone());
        if let Some(text) = latest {
            self.add_to_story(&text);
        }
    }

    fn add_to_story(&mut self, text: &str) {
        self.story.append(text);
        self.open_story();
    }

    // Story view helpers
    pub fn open_story(&mut self) {
        self.story.open();
        self.story_cursor = self.story.content().chars().count();
    }

    pub fn story_insert(&mut self, text: &str) {
        let mut buf = self.story.content().to_string();
        insert_at(&mut buf, &mut self.story_cursor, text);
        self.story.set_content(buf);
    }

    pub fn story_backspace(&mut self) {
        let mut buf = self.story.content().to_string();
        remove_before(&mut buf, &mut self.story_cursor);
        self.story.set_content(buf);
    }

    pub fn story_delete(&mut self) {
        let mut buf = self.story.content().to_string();
        remove_at(&mut buf, self.story_cursor);
        self.story.set_content(buf);
    }

    pub fn story_left(&mut self) {
        self.story_cursor = self.story_cursor.saturating_sub(1);
    }

    pub fn story_right(&mut self) {
        self.story_cursor = (self.story_cursor + 1).min(self.story.content().chars().count());
    }

    pub fn export_story(&mut self) {
        match self.story.export(&self.export_sink) {
            Ok(Some(path)) => {
                self.story_cursor = 0;
                self.notifications
                    .success(format!("Story exported to {}", path.display()));
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "story export failed");
                self.notifications.error(format!("Failed to export story: {e}"));
            }
        }
    }

    fn on_completion(&mut self, completion: &Completion) {
        if completion.panel.is_chat() {
            self.select_last_message(completion.panel);
        }
    }

    /// Called on every tick: apply finished requests and expire notifications
    pub fn on_tick(&mut self) -> Vec<Completion> {
        let completions = self.controller.poll();
        for completion in &completions {
            self.on_completion(completion);
        }
        self.notifications.prune();

        if PanelId::all().iter().any(|p| self.controller.is_busy(*p)) {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        completions
    }
}
