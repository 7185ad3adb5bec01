use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
};
use storylab_core::markup::{self, SpanStyle};
use storylab_core::{ChatRole, NotificationKind, PanelId};
use crate::app::{split_at_cursor, App, InputMode, Screen, StudioFocus, TextInput};

const SPINNER: [&str; 3] = [".", "..", "..."];

/// Convert rendered markup into styled ratatui lines
fn markup_lines(text: &str) -> Vec<Line<'static>> {
    let doc = markup::render(text);
    let mut lines = Vec::new();

    for (i, para) in doc.paragraphs.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        for line in &para.lines {
            let spans: Vec<Span<'static>> = line
                .iter()
                .map(|seg| match seg.style {
                    SpanStyle::Plain => Span::raw(seg.text.clone()),
                    SpanStyle::Strong => Span::styled(
                        seg.text.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    SpanStyle::Emphasis => Span::styled(
                        seg.text.clone(),
                        Style::default().add_modifier(Modifier::ITALIC),
                    ),
                    SpanStyle::StrongEmphasis => Span::styled(
                        seg.text.clone(),
                        Style::default().add_modifier(Modifier::BOLD | Modifier::ITALIC),
                    ),
                })
                .collect();
            lines.push(Line::from(spans));
        }
    }
    lines
}

fn generating_line(app: &App) -> Line<'static> {
    Line::from(Span::styled(
        format!("Generating{}", SPINNER[app.animation_frame % SPINNER.len()]),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ))
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Generators => render_generators_screen(app, frame, body_area),
        Screen::Studio => render_studio_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.story.is_open() {
        render_story(app, frame, body_area);
    }
    render_notifications(app, frame, area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let screen_style = |screen: Screen| {
        if app.screen == screen {
            Style::default().fg(Color::Black).bg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::White)
        }
    };

    let story_indicator = if app.story.can_export() {
        " [story in progress]"
    } else {
        ""
    };

    let title = Line::from(vec![
        Span::styled(" Story Lab ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(" Generators ", screen_style(Screen::Generators)),
        Span::raw(" "),
        Span::styled(" Studio ", screen_style(Screen::Studio)),
        Span::styled(story_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("{} v{}", app.controller.backend_name(), env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = if app.story.is_open() {
        " STORY "
    } else {
        match app.screen {
            Screen::Generators => " GENERATE ",
            Screen::Studio => " STUDIO ",
        }
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = if app.story.is_open() {
        &[("type", "edit"), ("Ctrl-S", "export"), ("Esc", "close")]
    } else {
        match (app.screen, app.input_mode) {
            (Screen::Generators, InputMode::Normal) => &[
                ("h/l", "generator"),
                ("j/k", "field"),
                ("Enter", "edit/pick"),
                ("g", "generate"),
                ("s", "save"),
                ("c", "idea to plot"),
                ("o", "story"),
                ("Tab", "studio"),
                ("q", "quit"),
            ],
            (Screen::Studio, InputMode::Normal) => &[
                ("h/l", "panel"),
                ("j/k", "message"),
                ("i", "write"),
                ("a", "add to story"),
                ("A", "add latest"),
                ("o", "story"),
                ("Tab", "generators"),
                ("q", "quit"),
            ],
            (Screen::Studio, InputMode::Editing) => &[("Enter", "send"), ("Esc", "cancel")],
            (Screen::Generators, InputMode::Editing) => &[("Enter/Esc", "done")],
        }
    };

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_generators_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [tabs_area, main_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let titles: Vec<&str> = app.forms.iter().map(|f| f.kind.display_name()).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" Generators "))
        .select(app.generator_idx)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, tabs_area);

    let [form_area, result_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(main_area);

    render_form(app, frame, form_area);
    render_result(app, frame, result_area);
}

fn render_form(app: &App, frame: &mut Frame, area: Rect) {
    let form = app.current_form();
    let editing = app.input_mode == InputMode::Editing;

    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in form.fields.iter().enumerate() {
        let selected = i == form.selected;
        let label_style = if selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if selected { "> " } else { "  " };
        lines.push(Line::from(Span::styled(format!("{}{}", marker, field.label), label_style)));

        let value_line = if field.is_choice() {
            Line::from(vec![
                Span::raw("    < "),
                Span::styled(field.value().to_string(), Style::default().fg(Color::Yellow)),
                Span::raw(" >"),
            ])
        } else if selected && editing {
            input_line(&field.input, "    ")
        } else if field.input.value.is_empty() {
            Line::from(Span::styled("    (empty)", Style::default().fg(Color::DarkGray)))
        } else {
            Line::from(format!("    {}", field.input.value))
        };
        lines.push(value_line);
        lines.push(Line::default());
    }

    let border_color = if editing { Color::Yellow } else { Color::Cyan };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", form.kind.display_name()));

    let para = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(para, area);
}

fn render_result(app: &App, frame: &mut Frame, area: Rect) {
    let panel = app.current_panel();

    let mut lines = if app.controller.is_busy(panel) {
        vec![generating_line(app), Line::default()]
    } else {
        Vec::new()
    };

    match app.controller.last_result(panel) {
        Some(result) => {
            lines.push(Line::from(Span::styled(
                format!("Generated {}", result.timestamp),
                Style::default().fg(Color::DarkGray),
            )));
            lines.push(Line::default());
            lines.extend(markup_lines(&result.content));
        }
        None if lines.is_empty() => {
            lines.push(Line::from(Span::styled(
                "Fill in the form and press g to generate.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        None => {}
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Result ");

    let para = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.result_scroll, 0));
    frame.render_widget(para, area);
}

fn render_studio_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [improvement_area, creation_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(area);

    render_chat_panel(app, frame, improvement_area, StudioFocus::Improvement);
    render_chat_panel(app, frame, creation_area, StudioFocus::Creation);
}

fn chat_item(role: ChatRole, content: &str) -> ListItem<'static> {
    let (label, color) = match role {
        ChatRole::User => ("You:", Color::Cyan),
        ChatRole::Ai => ("AI:", Color::Yellow),
        ChatRole::Document => ("Document:", Color::Magenta),
    };

    let mut lines = vec![Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))];
    if role == ChatRole::Ai {
        lines.extend(markup_lines(content));
    } else {
        lines.extend(content.lines().map(|l| Line::from(l.to_string())));
    }
    lines.push(Line::default());
    ListItem::new(Text::from(lines))
}

fn render_chat_panel(app: &mut App, frame: &mut Frame, area: Rect, which: StudioFocus) {
    let panel = which.panel();
    let focused = app.studio_focus == which;
    let editing = focused && app.input_mode == InputMode::Editing;

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let title = match panel {
        PanelId::Improvement => " Story Improvement (paste a file path to upload) ".to_string(),
        _ => format!(" {} ", panel.display_name()),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let mut items: Vec<ListItem> = app
        .controller
        .transcript(panel)
        .map(|t| t.messages().iter().map(|m| chat_item(m.role, &m.content)).collect())
        .unwrap_or_default();

    if app.controller.is_busy(panel) {
        items.push(ListItem::new(generating_line(app)));
    } else if items.is_empty() {
        let hint = match panel {
            PanelId::Improvement => "Upload your draft and describe what to improve...",
            _ => "Describe the story you want to start...",
        };
        items.push(ListItem::new(Span::styled(hint, Style::default().fg(Color::DarkGray))));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Rgb(40, 40, 60)))
        .highlight_symbol("> ");

    let state = match panel {
        PanelId::Improvement => &mut app.improvement_state,
        _ => &mut app.creation_state,
    };
    frame.render_stateful_widget(list, chat_area, state);

    let input = match which {
        StudioFocus::Improvement => &app.improvement_input,
        StudioFocus::Creation => &app.creation_input,
    };
    let input_border = if editing { Color::Yellow } else { Color::DarkGray };
    let input_title = match panel {
        PanelId::Improvement => " Instructions ",
        _ => " Message ",
    };
    let input_text = if editing {
        input_line(input, "")
    } else {
        Line::from(Span::styled(input.value.clone(), Style::default().fg(Color::Cyan)))
    };
    let para = Paragraph::new(input_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(input_border))
            .title(input_title),
    );
    frame.render_widget(para, input_area);
}

/// One-line input with a block caret at the cursor
fn input_line(input: &TextInput, indent: &str) -> Line<'static> {
    let (before, after) = split_at_cursor(&input.value, input.cursor);
    let mut rest = after.chars();
    let under = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());
    Line::from(vec![
        Span::raw(format!("{}{}", indent, before)),
        Span::styled(under, Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(rest.as_str().to_string()),
    ])
}

fn render_story(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(area, 80, 80);
    frame.render_widget(Clear, popup_area);

    let (before, after) = split_at_cursor(app.story.content(), app.story_cursor);
    let caret = Style::default().add_modifier(Modifier::REVERSED);

    // Rebuild lines around the caret so it lands inside the wrapped text
    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<Span> = Vec::new();
    for (i, part) in before.split('\n').enumerate() {
        if i > 0 {
            lines.push(Line::from(std::mem::take(&mut current)));
        }
        current.push(Span::raw(part.to_string()));
    }
    let mut after_lines = after.split('\n');
    let first_after = after_lines.next().unwrap_or_default();
    let mut first_chars = first_after.chars();
    match first_chars.next() {
        Some(c) => {
            current.push(Span::styled(c.to_string(), caret));
            current.push(Span::raw(first_chars.as_str().to_string()));
        }
        None => current.push(Span::styled(" ", caret)),
    }
    lines.push(Line::from(current));
    lines.extend(after_lines.map(|l| Line::from(l.to_string())));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" My Story (Ctrl-S to export, Esc to close) ");

    let para = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(para, popup_area);
}

fn render_notifications(app: &App, frame: &mut Frame, area: Rect) {
    let width = 50.min(area.width.saturating_sub(2));
    let mut y = area.y + 1;

    for notification in app.notifications.visible() {
        if y + 3 > area.bottom() {
            break;
        }
        let color = match notification.kind {
            NotificationKind::Info => Color::Blue,
            NotificationKind::Success => Color::Green,
            NotificationKind::Error => Color::Red,
        };
        let toast_area = Rect::new(area.right().saturating_sub(width + 1), y, width, 3);
        frame.render_widget(Clear, toast_area);

        let para = Paragraph::new(notification.message.clone())
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            );
        frame.render_widget(para, toast_area);
        y += 3;
    }
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
