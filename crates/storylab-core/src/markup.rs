//! Presentation of generated text.
//!
//! Generated text uses a small markup convention: a blank line separates
//! paragraphs, a single newline breaks a line, `**text**` is strong and
//! `*text*` is emphasis. [`render`] turns that into a structure any front-end
//! can style. It is pure; the same input always gives the same document.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStyle {
    Plain,
    Strong,
    Emphasis,
    /// Emphasis nested inside strong text
    StrongEmphasis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: SpanStyle,
}

pub type Line = Vec<Segment>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    /// The text with markers stripped and breaks kept
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| {
                p.lines
                    .iter()
                    .map(|line| line.iter().map(|s| s.text.as_str()).collect::<String>())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn strong_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("strong markup pattern is valid"))
}

fn emphasis_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*(.+?)\*").expect("emphasis markup pattern is valid"))
}

/// Split `text` on `pattern`, styling matched inner text with `matched`
fn split_styled(
    text: &str,
    pattern: &Regex,
    outside: SpanStyle,
    matched: SpanStyle,
    out: &mut Vec<(String, SpanStyle)>,
) {
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push((text[last..whole.start()].to_string(), outside));
        }
        out.push((inner.as_str().to_string(), matched));
        last = whole.end();
    }
    if last < text.len() {
        out.push((text[last..].to_string(), outside));
    }
}

pub fn render(text: &str) -> Document {
    let normalized = text.replace("\r\n", "\n");
    Document {
        paragraphs: normalized
            .split("\n\n")
            .map(|para| Paragraph {
                lines: para.split('\n').map(render_line).collect(),
            })
            .collect(),
    }
}

/// Split one line into styled segments.
///
/// Strong spans are found first, so a `*` inside `**...**` never closes
/// anything; emphasis is then resolved within plain and strong text.
pub fn render_line(line: &str) -> Line {
    let mut strong_pass = Vec::new();
    split_styled(line, strong_pattern(), SpanStyle::Plain, SpanStyle::Strong, &mut strong_pass);

    let mut styled = Vec::new();
    for (text, style) in strong_pass {
        let emphasised = match style {
            SpanStyle::Strong => SpanStyle::StrongEmphasis,
            _ => SpanStyle::Emphasis,
        };
        split_styled(&text, emphasis_pattern(), style, emphasised, &mut styled);
    }

    styled
        .into_iter()
        .map(|(text, style)| Segment { text, style })
        .collect()
}
