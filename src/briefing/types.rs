//! Briefing Types
//!
//! Sections, per-section lifecycle state and the record shapes parsed
//! out of provider payloads. Wire field names follow the JSON the
//! prompts request, so these deserialize straight from sanitized
//! provider output.

use serde::{Deserialize, Deserializer, Serialize};

/// One independently-lifecycled content category within a briefing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Phrases,
    Trivia,
    Glossary,
    KeyPersons,
    Synthesis,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Phrases,
        Section::Trivia,
        Section::Glossary,
        Section::KeyPersons,
        Section::Synthesis,
    ];

    /// Human-readable label used in diagnostics and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Section::Phrases => "phrases",
            Section::Trivia => "trivia",
            Section::Glossary => "glossary",
            Section::KeyPersons => "key persons",
            Section::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of one section. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Mutable cell for one section: status, the last successful record
/// list and the last failure message.
///
/// A fresh attempt clears `error` but keeps the previous `data` visible
/// until the attempt settles, so a failed retry shows the stale records
/// alongside the new error.
#[derive(Debug, Clone, Serialize)]
pub struct SectionState<T> {
    pub status: SectionStatus,
    pub data: Vec<T>,
    pub error: Option<String>,
}

impl<T> Default for SectionState<T> {
    fn default() -> Self {
        Self {
            status: SectionStatus::Idle,
            data: Vec::new(),
            error: None,
        }
    }
}

impl<T> SectionState<T> {
    pub fn loading() -> Self {
        Self {
            status: SectionStatus::Loading,
            data: Vec::new(),
            error: None,
        }
    }

    /// Start a new attempt: Loading, error cleared, stale data kept.
    pub fn begin(&mut self) {
        self.status = SectionStatus::Loading;
        self.error = None;
    }

    pub fn succeed(&mut self, data: Vec<T>) {
        self.status = SectionStatus::Success;
        self.data = data;
        self.error = None;
    }

    pub fn fail(&mut self, message: String) {
        self.status = SectionStatus::Error;
        self.error = Some(message);
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.status, SectionStatus::Success | SectionStatus::Error)
    }
}

// ── Records ─────────────────────────────────────────────────────────────────

/// Classification tags the phrase prompt asks the model to assign.
/// Wire labels are the Japanese strings the prompt specifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhraseTag {
    #[serde(rename = "トレンド")]
    Trend,
    #[serde(rename = "問題提起")]
    Issue,
    #[serde(rename = "競合情報")]
    Competitive,
    #[serde(rename = "表彰・称賛")]
    Commendation,
}

impl PhraseTag {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "トレンド" => Some(PhraseTag::Trend),
            "問題提起" => Some(PhraseTag::Issue),
            "競合情報" => Some(PhraseTag::Competitive),
            "表彰・称賛" => Some(PhraseTag::Commendation),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhraseTag::Trend => "トレンド",
            PhraseTag::Issue => "問題提起",
            PhraseTag::Competitive => "競合情報",
            PhraseTag::Commendation => "表彰・称賛",
        }
    }
}

/// A smart-sounding phrase: a quotable line (with emphasis markers)
/// plus a plain-text background explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phrase {
    pub quote: String,
    pub background: String,
    #[serde(default)]
    pub rating: f32,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<PhraseTag>,
}

/// The model occasionally invents tag labels; unknown ones are dropped
/// rather than failing the whole payload.
fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<PhraseTag>, D::Error>
where
    D: Deserializer<'de>,
{
    let labels: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(labels
        .iter()
        .filter_map(|label| PhraseTag::from_label(label))
        .collect())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trivia {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPerson {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// One synthesized conversational remark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Remark {
    pub content: String,
}
