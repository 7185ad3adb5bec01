use serde::{Deserialize, Serialize};

/// Story genres offered by the idea generator
pub const GENRES: &[&str] = &[
    "Fantasy",
    "Science Fiction",
    "Mystery",
    "Romance",
    "Thriller",
    "Horror",
    "Adventure",
    "Drama",
    "Comedy",
    "Historical Fiction",
    "Western",
    "Dystopian",
    "Utopian",
    "Cyberpunk",
    "Steampunk",
];

pub const WRITING_STYLES: &[&str] = &[
    "Descriptive",
    "Minimalist",
    "Stream of consciousness",
    "Dialogue-heavy",
    "Action-packed",
    "Contemplative",
    "Humorous",
    "Dark",
    "Whimsical",
    "Gritty",
    "Poetic",
    "Straightforward",
    "Experimental",
];

pub const PLOT_STRUCTURES: &[&str] = &["Three-Act Structure", "Hero's Journey", "Save the Cat"];

pub const MOODS: &[&str] = &[
    "neutral",
    "tense",
    "romantic",
    "humorous",
    "mysterious",
    "melancholic",
    "hopeful",
    "hostile",
];

pub const PROMPT_TYPES: &[&str] = &["general", "character", "setting", "conflict", "dialogue"];

/// Category of generated content. Decides the endpoint and the parameter shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Idea,
    Plot,
    Dialogue,
    Prompt,
    /// Free-form story drafting from the creation chat
    Story,
    /// Revision suggestions from the improvement chat
    Revision,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Idea => "idea",
            ArtifactKind::Plot => "plot",
            ArtifactKind::Dialogue => "dialogue",
            ArtifactKind::Prompt => "prompt",
            ArtifactKind::Story => "story",
            ArtifactKind::Revision => "revision",
        }
    }

    /// The four single-shot generator kinds, in tab order
    pub fn generators() -> [ArtifactKind; 4] {
        [
            ArtifactKind::Idea,
            ArtifactKind::Plot,
            ArtifactKind::Dialogue,
            ArtifactKind::Prompt,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ArtifactKind::Idea => "Story Ideas",
            ArtifactKind::Plot => "Plot Outline",
            ArtifactKind::Dialogue => "Dialogue",
            ArtifactKind::Prompt => "Writing Prompts",
            ArtifactKind::Story => "Create From Scratch",
            ArtifactKind::Revision => "Refine Your Draft",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            ArtifactKind::Idea => "/generate_idea",
            ArtifactKind::Plot => "/generate_plot",
            ArtifactKind::Dialogue => "/generate_dialogue",
            ArtifactKind::Prompt => "/get_prompt",
            ArtifactKind::Story => "/generate_story",
            ArtifactKind::Revision => "/improve_story",
        }
    }

    /// Fields that must be present and non-blank before a request is sent
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ArtifactKind::Idea | ArtifactKind::Prompt => &[],
            ArtifactKind::Plot => &["story_idea"],
            ArtifactKind::Dialogue => &["characters", "scene_context"],
            ArtifactKind::Story => &["message"],
            ArtifactKind::Revision => &["instructions"],
        }
    }

    pub fn optional_fields(&self) -> &'static [&'static str] {
        match self {
            ArtifactKind::Idea => &["genre", "style", "theme"],
            ArtifactKind::Plot => &["structure"],
            ArtifactKind::Dialogue => &["mood"],
            ArtifactKind::Prompt => &["type"],
            ArtifactKind::Story => &[],
            ArtifactKind::Revision => &["document"],
        }
    }

    /// Response field carrying the generated text
    pub fn content_field(&self) -> &'static str {
        match self {
            ArtifactKind::Idea => "idea",
            ArtifactKind::Plot => "plot",
            ArtifactKind::Dialogue => "dialogue",
            ArtifactKind::Prompt => "prompt",
            ArtifactKind::Story => "story",
            ArtifactKind::Revision => "revision",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            ArtifactKind::Idea => "Failed to generate story idea. Please try again.",
            ArtifactKind::Plot => "Failed to generate plot outline. Please try again.",
            ArtifactKind::Dialogue => "Failed to generate dialogue. Please try again.",
            ArtifactKind::Prompt => "Failed to generate prompt. Please try again.",
            ArtifactKind::Story => "Failed to generate story. Please try again.",
            ArtifactKind::Revision => "Failed to generate revision. Please try again.",
        }
    }

    pub fn validation_message(&self) -> &'static str {
        match self {
            ArtifactKind::Plot => "Please enter a story idea first.",
            ArtifactKind::Dialogue => "Please provide both character descriptions and scene context.",
            ArtifactKind::Story => "Please share an idea first.",
            ArtifactKind::Revision => "Please describe how you'd like to improve your story.",
            ArtifactKind::Idea | ArtifactKind::Prompt => "Please fill in the required fields.",
        }
    }

    pub fn saved_message(&self) -> &'static str {
        match self {
            ArtifactKind::Idea => "Story idea saved locally!",
            ArtifactKind::Plot => "Plot outline saved locally!",
            ArtifactKind::Dialogue => "Dialogue saved locally!",
            ArtifactKind::Prompt => "Prompt saved locally!",
            ArtifactKind::Story => "Story saved locally!",
            ArtifactKind::Revision => "Revision saved locally!",
        }
    }

    /// Key under which saved drafts of this kind accumulate
    pub fn draft_namespace(&self) -> &'static str {
        match self {
            ArtifactKind::Idea => "story-ideas",
            ArtifactKind::Plot => "plot-outlines",
            ArtifactKind::Dialogue => "dialogues",
            ArtifactKind::Prompt => "writing-prompts",
            ArtifactKind::Story => "stories",
            ArtifactKind::Revision => "revisions",
        }
    }
}

/// One self-contained generator or chat unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelId {
    Idea,
    Plot,
    Dialogue,
    Prompt,
    Creation,
    Improvement,
}

impl PanelId {
    pub fn all() -> [PanelId; 6] {
        [
            PanelId::Idea,
            PanelId::Plot,
            PanelId::Dialogue,
            PanelId::Prompt,
            PanelId::Creation,
            PanelId::Improvement,
        ]
    }

    /// The artifact kind this panel requests by default
    pub fn kind(&self) -> ArtifactKind {
        match self {
            PanelId::Idea => ArtifactKind::Idea,
            PanelId::Plot => ArtifactKind::Plot,
            PanelId::Dialogue => ArtifactKind::Dialogue,
            PanelId::Prompt => ArtifactKind::Prompt,
            PanelId::Creation => ArtifactKind::Story,
            PanelId::Improvement => ArtifactKind::Revision,
        }
    }

    pub fn for_generator(kind: ArtifactKind) -> Option<Self> {
        match kind {
            ArtifactKind::Idea => Some(PanelId::Idea),
            ArtifactKind::Plot => Some(PanelId::Plot),
            ArtifactKind::Dialogue => Some(PanelId::Dialogue),
            ArtifactKind::Prompt => Some(PanelId::Prompt),
            ArtifactKind::Story | ArtifactKind::Revision => None,
        }
    }

    /// Chat panels own a transcript; generator panels only keep their last result
    pub fn is_chat(&self) -> bool {
        matches!(self, PanelId::Creation | PanelId::Improvement)
    }

    pub fn display_name(&self) -> &'static str {
        self.kind().display_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_as_str() {
        for kind in [
            ArtifactKind::Idea,
            ArtifactKind::Plot,
            ArtifactKind::Dialogue,
            ArtifactKind::Prompt,
            ArtifactKind::Story,
            ArtifactKind::Revision,
        ] {
            let wire = serde_json::to_string(&kind).unwrap();
            assert_eq!(wire, format!("\"{}\"", kind.as_str()));
            assert_eq!(serde_json::from_str::<ArtifactKind>(&wire).unwrap(), kind);
        }
        assert!(serde_json::from_str::<ArtifactKind>("\"poem\"").is_err());
    }

    #[test]
    fn test_generator_endpoints_match_backend_routes() {
        let endpoints: Vec<&str> = ArtifactKind::generators().iter().map(|k| k.endpoint()).collect();
        assert_eq!(
            endpoints,
            ["/generate_idea", "/generate_plot", "/generate_dialogue", "/get_prompt"]
        );
    }

    #[test]
    fn test_required_and_optional_fields_are_disjoint() {
        for kind in ArtifactKind::generators() {
            for field in kind.required_fields() {
                assert!(!kind.optional_fields().contains(field), "{field} listed twice");
            }
        }
    }

    #[test]
    fn test_only_chat_panels_are_chat() {
        let chat: Vec<PanelId> = PanelId::all().into_iter().filter(PanelId::is_chat).collect();
        assert_eq!(chat, [PanelId::Creation, PanelId::Improvement]);
        assert_eq!(PanelId::Improvement.kind(), ArtifactKind::Revision);
        assert_eq!(PanelId::for_generator(ArtifactKind::Story), None);
        assert_eq!(PanelId::for_generator(ArtifactKind::Dialogue), Some(PanelId::Dialogue));
    }
}
