//! Generic Section Generator
//!
//! The four first-stage sections share one control flow and differ only
//! in prompt, payload key and record mapping, so a single data-driven
//! plan covers all of them. A plan says nothing about lifecycle; the
//! orchestrator owns the section state around each fetch.

use super::markup;
use super::prompts;
use super::sanitize::{self, SanitizeError};
use super::types::{GlossaryEntry, KeyPerson, Phrase, Section, Trivia};
use crate::llm::{CompletionRequest, ProviderError, TextProvider};
use serde::de::DeserializeOwned;

/// Everything that can fail while producing one section's records.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Sanitize(#[from] SanitizeError),

    #[error("{section} response is missing the \"{key}\" array")]
    MissingField {
        section: Section,
        key: &'static str,
    },

    #[error("{section} response is not a JSON array")]
    NotAnArray { section: Section },

    #[error("{section} records did not match the expected shape: {source}")]
    Shape {
        section: Section,
        #[source]
        source: serde_json::Error,
    },
}

/// One first-stage section: prompt, expected payload key, record
/// post-processing.
pub(crate) struct SectionPlan<T> {
    pub section: Section,
    pub system: &'static str,
    pub build_prompt: fn(&str) -> String,
    pub payload_key: &'static str,
    pub map_record: fn(T) -> T,
}

pub(crate) fn phrases_plan() -> SectionPlan<Phrase> {
    SectionPlan {
        section: Section::Phrases,
        system: prompts::SECTION_SYSTEM,
        build_prompt: prompts::phrases_prompt,
        payload_key: "phrases",
        // Markers stay in the quote; the background is plain prose.
        map_record: |mut phrase| {
            phrase.background = markup::strip(&phrase.background);
            phrase
        },
    }
}

pub(crate) fn trivia_plan() -> SectionPlan<Trivia> {
    SectionPlan {
        section: Section::Trivia,
        system: prompts::SECTION_SYSTEM,
        build_prompt: prompts::trivia_prompt,
        payload_key: "trivia",
        map_record: |trivia| trivia,
    }
}

pub(crate) fn glossary_plan() -> SectionPlan<GlossaryEntry> {
    SectionPlan {
        section: Section::Glossary,
        system: prompts::SECTION_SYSTEM,
        build_prompt: prompts::glossary_prompt,
        payload_key: "glossary",
        map_record: |entry| entry,
    }
}

pub(crate) fn key_persons_plan() -> SectionPlan<KeyPerson> {
    SectionPlan {
        section: Section::KeyPersons,
        system: prompts::SECTION_SYSTEM,
        build_prompt: prompts::key_persons_prompt,
        payload_key: "keyPersons",
        map_record: |person| person,
    }
}

/// Run one section fetch end to end: prompt, complete, sanitize,
/// validate the payload shape, deserialize and post-process.
pub(crate) async fn fetch_records<T>(
    plan: &SectionPlan<T>,
    provider: &dyn TextProvider,
    topic: &str,
) -> Result<Vec<T>, GenerateError>
where
    T: DeserializeOwned,
{
    let request = CompletionRequest::with_system(plan.system, (plan.build_prompt)(topic));
    let raw = provider.complete(request).await?;

    let payload = sanitize::parse_payload(plan.section, &raw, topic)?;
    let records = payload
        .get(plan.payload_key)
        .and_then(|value| value.as_array())
        .ok_or(GenerateError::MissingField {
            section: plan.section,
            key: plan.payload_key,
        })?
        .clone();

    let records: Vec<T> = serde_json::from_value(serde_json::Value::Array(records)).map_err(
        |source| GenerateError::Shape {
            section: plan.section,
            source,
        },
    )?;

    Ok(records.into_iter().map(plan.map_record).collect())
}
