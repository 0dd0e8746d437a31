//! Topic Briefing Engine
//!
//! One submitted topic fans out into four concurrent generation
//! requests (phrases, trivia, glossary, key persons) plus a dependent
//! second-stage synthesis request. Each section carries its own
//! Idle/Loading/Success/Error lifecycle and can be retried on its own.
//!
//! # Module Structure
//!
//! - `types`: sections, lifecycle states and record shapes
//! - `markup`: emphasis-marker segmentation and stripping
//! - `sanitize`: provider output cleaning and JSON parsing
//! - `prompts`: per-section prompt templates
//! - `orchestrator`: session state machine, concurrency and retry

pub mod markup;
pub mod orchestrator;
pub mod prompts;
pub mod sanitize;
pub mod types;

mod generator;
mod synthesis;

#[cfg(test)]
mod tests;

pub use orchestrator::{Briefing, Orchestrator, SessionError};
pub use sanitize::SanitizeError;
pub use types::{
    GlossaryEntry, KeyPerson, Phrase, PhraseTag, Remark, Section, SectionState, SectionStatus,
    Trivia,
};
