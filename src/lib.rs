/// Savvy - AI-Powered Topic Briefing Engine
///
/// Core library turning a single topic string into a multi-section
/// briefing (smart-sounding phrases, trivia, a glossary, key persons,
/// and a synthesized set of conversational remarks) by orchestrating
/// concurrent LLM provider calls with per-section lifecycle and retry.

pub mod briefing;
pub mod config;
pub mod llm;
pub mod logging;
pub mod relay;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
