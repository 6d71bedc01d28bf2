//! Structured adventure extraction.
//!
//! The text → structure step (PDF parsing and the LLM call) lives outside this
//! crate. What comes back is an [`AdventureExtraction`]: the campaign header
//! and flat entity lists, with cross references expressed by name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CodexError, CodexResult};

// ============================================================================
// Extraction Model
// ============================================================================

/// Structured content of one adventure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdventureExtraction {
    pub name: String,
    pub description: Option<String>,
    /// Game system tag; the configured default applies when absent
    pub system: Option<String>,
    pub sessions: Vec<ExtractedSession>,
    pub events: Vec<ExtractedEvent>,
    pub npcs: Vec<ExtractedNpc>,
    pub locations: Vec<ExtractedLocation>,
    pub items: Vec<ExtractedItem>,
    pub encounters: Vec<ExtractedEncounter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedSession {
    pub name: String,
    pub session_number: Option<i64>,
    pub summary: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedEvent {
    pub name: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    /// Name of the session the event belongs to
    pub session: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedNpc {
    pub name: String,
    pub role: Option<String>,
    pub description: Option<String>,
    pub motivation: Option<String>,
    pub stats: Option<serde_json::Value>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedLocation {
    pub name: String,
    pub location_type: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedItem {
    pub name: String,
    pub item_type: Option<String>,
    pub description: Option<String>,
    pub rarity: Option<String>,
    pub properties: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedEncounter {
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub encounter_type: Option<String>,
    pub session: Option<String>,
    pub location: Option<String>,
    pub related_npcs: Vec<String>,
    pub related_items: Vec<String>,
    pub related_locations: Vec<String>,
    pub related_events: Vec<String>,
}

impl AdventureExtraction {
    /// Reject extractions that cannot become a template.
    pub fn validate(&self) -> CodexResult<()> {
        if self.name.trim().is_empty() {
            return Err(CodexError::Extraction("adventure has no name".to_string()));
        }

        let unnamed = [
            ("session", self.sessions.iter().any(|e| e.name.trim().is_empty())),
            ("event", self.events.iter().any(|e| e.name.trim().is_empty())),
            ("npc", self.npcs.iter().any(|e| e.name.trim().is_empty())),
            ("location", self.locations.iter().any(|e| e.name.trim().is_empty())),
            ("item", self.items.iter().any(|e| e.name.trim().is_empty())),
            ("encounter", self.encounters.iter().any(|e| e.name.trim().is_empty())),
        ];
        if let Some((kind, _)) = unnamed.iter().find(|(_, missing)| *missing) {
            return Err(CodexError::Extraction(format!("{kind} without a name")));
        }

        Ok(())
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// Turns adventure source text into structured content
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodexExtractor: Send + Sync {
    async fn extract(&self, source_text: &str) -> CodexResult<AdventureExtraction>;
}

/// Extractor for model output that is already JSON, bare or inside a
/// Markdown code fence.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl JsonExtractor {
    pub fn parse(&self, output: &str) -> CodexResult<AdventureExtraction> {
        let extraction: AdventureExtraction = serde_json::from_str(strip_code_fence(output))
            .map_err(|e| CodexError::Extraction(format!("invalid extraction JSON: {e}")))?;
        extraction.validate()?;
        Ok(extraction)
    }
}

#[async_trait]
impl CodexExtractor for JsonExtractor {
    async fn extract(&self, source_text: &str) -> CodexResult<AdventureExtraction> {
        self.parse(source_text)
    }
}

/// Body of the first fenced block, or the trimmed input when unfenced
fn strip_code_fence(output: &str) -> &str {
    let trimmed = output.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[start + 3..];
    // Skip the info string ("json") up to the end of the fence line
    let body_start = after_fence.find('\n').map_or(after_fence.len(), |i| i + 1);
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
