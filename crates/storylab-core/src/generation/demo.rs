use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;

use super::{GenerationBackend, GenerationRequest, GenerationResult};
use crate::artifact::ArtifactKind;
use crate::error::GenerationError;

/// Simulated response latency of the offline backend
pub const DEMO_DELAY: Duration = Duration::from_secs(1);

/// Offline backend that answers every kind with canned text.
///
/// Used when no generation service is configured, and as a test fixture.
#[derive(Debug, Clone)]
pub struct DemoBackend {
    delay: Duration,
}

impl DemoBackend {
    pub fn new() -> Self {
        Self { delay: DEMO_DELAY }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    fn reply(request: &GenerationRequest) -> String {
        match request.kind() {
            ArtifactKind::Idea => {
                let genre = request.get("genre").unwrap_or("Fantasy");
                format!(
                    "**Title: The Cartographer's Debt**\n\n\
                     **Premise:** A {genre} tale about a mapmaker who can redraw borders, \
                     and the city that comes to collect on every line she has ever inked.\n\n\
                     **Main Character:** Ines Vale, a forger of coastlines who has never left her harbour.\n\n\
                     **Central Conflict:** The maps she sold to pay her brother's debts are \
                     starting to come true, one drowned village at a time.\n\n\
                     **Twist:** The last unfinished map is of her own house."
                )
            }
            ArtifactKind::Plot => {
                let structure = request.get("structure").unwrap_or("Three-Act Structure");
                format!(
                    "**Plot Outline - {structure}**\n\n\
                     **Beginning:**\n- Ines refuses a commission from the harbour council\n\
                     - Her brother disappears the same night\n\n\
                     **Middle:**\n- She follows her own forged maps inland\n\
                     - Each landmark she invented is real and waiting\n\n\
                     **End:**\n- She burns the final map and lets the coastline settle\n\
                     - The council's debt passes to the sea"
                )
            }
            ArtifactKind::Dialogue => {
                let mood = request.get("mood").unwrap_or("neutral");
                format!(
                    "**Scene ({mood})**\n\n\
                     INES: You said the ferry would wait.\n\
                     BROM: *(not looking up)* I said it would wait for you. Not for her.\n\
                     INES: She has my maps, Brom.\n\
                     BROM: Then you'd better hope she can't read them."
                )
            }
            ArtifactKind::Prompt => {
                let kind = request.get("type").unwrap_or("general");
                format!(
                    "**Writing Prompt ({kind})**\n\n\
                     A letter arrives addressed to you, postmarked thirty years from now. \
                     It is an apology. Write the day you finally understand what for."
                )
            }
            ArtifactKind::Story => {
                "Here's a creative story beginning based on your idea. \
                 The rain had stopped an hour ago, but the city was still listening for it..."
                    .to_string()
            }
            ArtifactKind::Revision => {
                "I'll help you refine your story. Here's my suggestion for improving that section: \
                 tighten the opening paragraph and let the first line of dialogue carry the tension."
                    .to_string()
            }
        }
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for DemoBackend {
    fn name(&self) -> &str {
        "demo"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(GenerationResult {
            content: Self::reply(request),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            echoed_parameters: request.parameters().clone(),
        })
    }
}
