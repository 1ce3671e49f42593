//! Recall intents and their activation configurations.

use serde::{Deserialize, Serialize};

use crate::config::RecallConfig;
use crate::graph::ActivationConfig;

/// What the caller is trying to do with the recalled memory. Broad intents
/// get deeper, more permissive activation; tactical intents stay narrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecallIntent {
    /// Deep background and world lore.
    Lore,
    /// "What do I know about X" — broad associative recall.
    Recall,
    /// Conversation context for an NPC exchange.
    Dialogue,
    /// Tactical context — high-confidence matches only.
    Combat,
}

impl RecallIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lore => "lore",
            Self::Recall => "recall",
            Self::Dialogue => "dialogue",
            Self::Combat => "combat",
        }
    }
}

impl std::fmt::Display for RecallIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecallIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lore" => Ok(Self::Lore),
            "recall" => Ok(Self::Recall),
            "dialogue" => Ok(Self::Dialogue),
            "combat" => Ok(Self::Combat),
            _ => Err(format!("unknown recall intent: {s}")),
        }
    }
}

/// Build the per-call [`ActivationConfig`] for an intent. Absent intent gets
/// the conservative default threshold.
pub fn activation_config_for(
    intent: Option<RecallIntent>,
    config: &RecallConfig,
    current_chapter_id: Option<String>,
) -> ActivationConfig {
    let output_threshold = match intent {
        Some(RecallIntent::Lore) => config.intents.lore,
        Some(RecallIntent::Recall) => config.intents.recall,
        Some(RecallIntent::Dialogue) => config.intents.dialogue,
        Some(RecallIntent::Combat) => config.intents.combat,
        None => config.intents.default,
    };
    ActivationConfig {
        output_threshold,
        decay: config.activation.decay,
        chapter_boost: config.activation.chapter_boost,
        current_chapter_id,
    }
}
