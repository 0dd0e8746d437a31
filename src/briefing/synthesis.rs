//! Synthesis Generator
//!
//! Second stage: once the four section fetches have settled, their
//! results are flattened into one context block and condensed into
//! short conversational remarks. The response is a bare JSON array,
//! unlike the keyed first-stage payloads.

use super::generator::GenerateError;
use super::markup;
use super::prompts;
use super::sanitize;
use super::types::{GlossaryEntry, KeyPerson, Phrase, Remark, Section, Trivia};
use crate::llm::{CompletionRequest, TextProvider};

/// Flatten the first-stage results field by field. Failed sections
/// contribute nothing; the synthesis prompt works with whatever
/// survived.
pub(crate) fn context_block(
    phrases: &[Phrase],
    trivia: &[Trivia],
    glossary: &[GlossaryEntry],
    key_persons: &[KeyPerson],
) -> String {
    let mut block = String::new();

    if !phrases.is_empty() {
        block.push_str("【セリフ】\n");
        for phrase in phrases {
            block.push_str(&format!("- {}\n", markup::strip(&phrase.quote)));
        }
    }
    if !trivia.is_empty() {
        block.push_str("【豆知識】\n");
        for item in trivia {
            block.push_str(&format!("- {}\n", markup::strip(&item.content)));
        }
    }
    if !glossary.is_empty() {
        block.push_str("【用語】\n");
        for entry in glossary {
            block.push_str(&format!("- {}: {}\n", entry.term, entry.definition));
        }
    }
    if !key_persons.is_empty() {
        block.push_str("【キーパーソン】\n");
        for person in key_persons {
            block.push_str(&format!("- {}: {}\n", person.name, person.description));
        }
    }

    block
}

/// Fetch the synthesized remarks for a settled set of section results.
pub(crate) async fn fetch_remarks(
    provider: &dyn TextProvider,
    topic: &str,
    phrases: &[Phrase],
    trivia: &[Trivia],
    glossary: &[GlossaryEntry],
    key_persons: &[KeyPerson],
) -> Result<Vec<Remark>, GenerateError> {
    let context = context_block(phrases, trivia, glossary, key_persons);
    let prompt = prompts::synthesis_prompt(topic, &context);

    let raw = provider.complete(CompletionRequest::prompt(prompt)).await?;

    let payload = sanitize::parse_payload(Section::Synthesis, &raw, topic)?;
    let records = payload
        .as_array()
        .ok_or(GenerateError::NotAnArray {
            section: Section::Synthesis,
        })?
        .clone();

    serde_json::from_value(serde_json::Value::Array(records)).map_err(|source| {
        GenerateError::Shape {
            section: Section::Synthesis,
            source,
        }
    })
}
