//! Briefing Orchestrator
//!
//! Drives one generation session per submitted topic: resets the five
//! sections, launches the four first-stage generators concurrently,
//! joins them regardless of individual failure, then runs the
//! synthesis stage over whatever survived. Sections are only ever
//! mutated here; the presentation layer observes snapshots through a
//! `watch` channel.
//!
//! A failed section never fails the session. Partial failure is a
//! normal terminal state, and every section exposes an independent
//! retry that leaves its siblings untouched.

use super::generator::{self, SectionPlan};
use super::synthesis;
use super::types::{
    GlossaryEntry, KeyPerson, Phrase, Remark, Section, SectionState, Trivia,
};
use crate::llm::TextProvider;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Number of generators that settle over a full session: the four
/// first-stage sections plus synthesis.
pub const GENERATOR_COUNT: u8 = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("no briefing session has been started")]
    NoSession,
}

/// Full session state for one topic. Cloned as a snapshot for
/// observers; never handed out mutably.
#[derive(Debug, Clone, Serialize)]
pub struct Briefing {
    pub topic: String,
    /// Monotonically increasing session id. In-flight work launched
    /// under an older id is discarded on completion.
    pub session: u64,
    pub generating: bool,
    /// Settled generators this session, 0..=5. Monotonic.
    pub settled_count: u8,
    pub phrases: SectionState<Phrase>,
    pub trivia: SectionState<Trivia>,
    pub glossary: SectionState<GlossaryEntry>,
    pub key_persons: SectionState<KeyPerson>,
    pub synthesis: SectionState<Remark>,
}

impl Briefing {
    fn idle() -> Self {
        Self {
            topic: String::new(),
            session: 0,
            generating: false,
            settled_count: 0,
            phrases: SectionState::default(),
            trivia: SectionState::default(),
            glossary: SectionState::default(),
            key_persons: SectionState::default(),
            synthesis: SectionState::default(),
        }
    }

    /// Fresh session: every section goes straight to Loading.
    fn started(topic: &str, session: u64) -> Self {
        Self {
            topic: topic.to_string(),
            session,
            generating: true,
            settled_count: 0,
            phrases: SectionState::loading(),
            trivia: SectionState::loading(),
            glossary: SectionState::loading(),
            key_persons: SectionState::loading(),
            synthesis: SectionState::loading(),
        }
    }
}

pub struct Orchestrator {
    research: Arc<dyn TextProvider>,
    synthesizer: Arc<dyn TextProvider>,
    state: Arc<RwLock<Briefing>>,
    updates: watch::Sender<Briefing>,
}

impl Orchestrator {
    /// `research` serves the four first-stage sections, `synthesizer`
    /// the second stage.
    pub fn new(research: Arc<dyn TextProvider>, synthesizer: Arc<dyn TextProvider>) -> Self {
        let initial = Briefing::idle();
        let (updates, _) = watch::channel(initial.clone());
        Self {
            research,
            synthesizer,
            state: Arc::new(RwLock::new(initial)),
            updates,
        }
    }

    /// Subscribe to state snapshots. The receiver always holds the
    /// latest snapshot; intermediate ones may be skipped.
    pub fn subscribe(&self) -> watch::Receiver<Briefing> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> Briefing {
        self.state.read().await.clone()
    }

    /// Run one full session for `topic`. Supersedes any in-flight
    /// session: its late results are discarded on arrival.
    pub async fn start(&self, topic: &str) -> Result<u64, SessionError> {
        let topic = topic.trim().to_string();
        if topic.is_empty() {
            return Err(SessionError::EmptyTopic);
        }

        let session = {
            let mut state = self.state.write().await;
            let session = state.session + 1;
            *state = Briefing::started(&topic, session);
            let snapshot = state.clone();
            drop(state);
            self.publish(snapshot);
            session
        };

        tracing::info!(topic = %topic, session, "briefing session started");

        let (phrases, trivia, glossary, key_persons) = tokio::join!(
            self.run_section(session, &topic, generator::phrases_plan(), |b| &mut b.phrases),
            self.run_section(session, &topic, generator::trivia_plan(), |b| &mut b.trivia),
            self.run_section(session, &topic, generator::glossary_plan(), |b| &mut b.glossary),
            self.run_section(session, &topic, generator::key_persons_plan(), |b| {
                &mut b.key_persons
            }),
        );

        self.run_synthesis(session, &topic, &phrases, &trivia, &glossary, &key_persons)
            .await;

        let snapshot = {
            let mut state = self.state.write().await;
            if state.session != session {
                return Ok(session);
            }
            state.generating = false;
            state.clone()
        };
        self.publish(snapshot);

        tracing::info!(topic = %topic, session, "briefing session settled");
        Ok(session)
    }

    /// Re-run one section against the current topic, leaving every
    /// other section's state untouched. No session-level reset.
    pub async fn retry(&self, section: Section) -> Result<(), SessionError> {
        let (session, topic) = {
            let state = self.state.read().await;
            if state.session == 0 {
                return Err(SessionError::NoSession);
            }
            (state.session, state.topic.clone())
        };

        tracing::info!(topic = %topic, section = %section, "section retry requested");

        match section {
            Section::Phrases => {
                self.run_section(session, &topic, generator::phrases_plan(), |b| &mut b.phrases)
                    .await;
            }
            Section::Trivia => {
                self.run_section(session, &topic, generator::trivia_plan(), |b| &mut b.trivia)
                    .await;
            }
            Section::Glossary => {
                self.run_section(session, &topic, generator::glossary_plan(), |b| {
                    &mut b.glossary
                })
                .await;
            }
            Section::KeyPersons => {
                self.run_section(session, &topic, generator::key_persons_plan(), |b| {
                    &mut b.key_persons
                })
                .await;
            }
            Section::Synthesis => {
                let (phrases, trivia, glossary, key_persons) = {
                    let state = self.state.read().await;
                    (
                        state.phrases.data.clone(),
                        state.trivia.data.clone(),
                        state.glossary.data.clone(),
                        state.key_persons.data.clone(),
                    )
                };
                self.run_synthesis(session, &topic, &phrases, &trivia, &glossary, &key_persons)
                    .await;
            }
        }

        Ok(())
    }

    /// One first-stage generator run. Failures settle the section as
    /// Error and resolve to an empty list so sibling generators and
    /// the join are unaffected. Every path leaves Loading.
    async fn run_section<T>(
        &self,
        session: u64,
        topic: &str,
        plan: SectionPlan<T>,
        select: fn(&mut Briefing) -> &mut SectionState<T>,
    ) -> Vec<T>
    where
        T: DeserializeOwned + Clone,
    {
        if !self.begin_section(session, |state| select(state).begin()).await {
            return Vec::new();
        }

        let outcome = generator::fetch_records(&plan, self.research.as_ref(), topic).await;

        let (snapshot, records) = {
            let mut state = self.state.write().await;
            if state.session != session {
                log::debug!("discarding stale {} result for superseded session", plan.section);
                return Vec::new();
            }
            let records = match outcome {
                Ok(records) => {
                    select(&mut state).succeed(records.clone());
                    records
                }
                Err(err) => {
                    tracing::warn!(
                        topic = %topic,
                        section = %plan.section,
                        error = %err,
                        "section generation failed"
                    );
                    select(&mut state).fail(format!("{} generation failed: {err}", plan.section));
                    Vec::new()
                }
            };
            if state.generating && state.settled_count < GENERATOR_COUNT {
                state.settled_count += 1;
            }
            (state.clone(), records)
        };
        self.publish(snapshot);

        records
    }

    /// Second-stage run over the joined first-stage results. Same
    /// lifecycle discipline as the sections.
    async fn run_synthesis(
        &self,
        session: u64,
        topic: &str,
        phrases: &[Phrase],
        trivia: &[Trivia],
        glossary: &[GlossaryEntry],
        key_persons: &[KeyPerson],
    ) {
        if !self.begin_section(session, |state| state.synthesis.begin()).await {
            return;
        }

        let outcome = synthesis::fetch_remarks(
            self.synthesizer.as_ref(),
            topic,
            phrases,
            trivia,
            glossary,
            key_persons,
        )
        .await;

        let snapshot = {
            let mut state = self.state.write().await;
            if state.session != session {
                log::debug!("discarding stale synthesis result for superseded session");
                return;
            }
            match outcome {
                Ok(remarks) => state.synthesis.succeed(remarks),
                Err(err) => {
                    tracing::warn!(
                        topic = %topic,
                        section = %Section::Synthesis,
                        error = %err,
                        "section generation failed"
                    );
                    state
                        .synthesis
                        .fail(format!("{} generation failed: {err}", Section::Synthesis));
                }
            }
            if state.generating && state.settled_count < GENERATOR_COUNT {
                state.settled_count += 1;
            }
            state.clone()
        };
        self.publish(snapshot);
    }

    /// Mark a section Loading for this session. Returns false when the
    /// session has been superseded and the run should be abandoned.
    async fn begin_section(&self, session: u64, begin: impl FnOnce(&mut Briefing)) -> bool {
        let snapshot = {
            let mut state = self.state.write().await;
            if state.session != session {
                return false;
            }
            begin(&mut state);
            state.clone()
        };
        self.publish(snapshot);
        true
    }

    fn publish(&self, snapshot: Briefing) {
        // send_replace never fails, with or without live receivers.
        self.updates.send_replace(snapshot);
    }
}
