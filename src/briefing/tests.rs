//! Briefing Orchestrator Tests
//!
//! Exercises the session state machine against a scripted mock
//! provider: lifecycle transitions, concurrency, partial failure,
//! retry isolation, progress tracking and stale-session discard.

use super::orchestrator::GENERATOR_COUNT;
use super::*;
use crate::llm::{CompletionRequest, ProviderError, Result as LlmResult, TextProvider};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

// ========================================================================
// Mock Provider
// ========================================================================

/// Scripted response for one prompt family, matched by substring.
#[derive(Clone)]
enum Scripted {
    Ok(String),
    Api { status: u16, message: String },
}

impl Scripted {
    fn to_result(&self) -> LlmResult<String> {
        match self {
            Scripted::Ok(body) => Ok(body.clone()),
            Scripted::Api { status, message } => Err(ProviderError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

/// Mock provider with swappable scripts, optional latency and call
/// accounting.
struct MockProvider {
    scripts: RwLock<Vec<(&'static str, Scripted)>>,
    delay: RwLock<Option<Duration>>,
    calls: AtomicU32,
    last_prompt: RwLock<Option<String>>,
}

impl MockProvider {
    fn new(scripts: Vec<(&'static str, Scripted)>) -> Arc<Self> {
        Arc::new(Self {
            scripts: RwLock::new(scripts),
            delay: RwLock::new(None),
            calls: AtomicU32::new(0),
            last_prompt: RwLock::new(None),
        })
    }

    async fn set_scripts(&self, scripts: Vec<(&'static str, Scripted)>) {
        *self.scripts.write().await = scripts;
    }

    async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn last_prompt(&self) -> Option<String> {
        self.last_prompt.read().await.clone()
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    fn id(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.write().await = Some(request.user.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripts = self.scripts.read().await;
        for (needle, response) in scripts.iter() {
            if request.user.contains(needle) {
                return response.to_result();
            }
        }
        Err(ProviderError::InvalidResponse(
            "no scripted response matched".into(),
        ))
    }
}

// ========================================================================
// Payload Builders
// ========================================================================

fn phrases_payload(flavor: &str) -> String {
    let records: Vec<_> = (1..=5)
        .map(|i| {
            json!({
                "quote": format!("{flavor}のセリフ{i}は<keyword>用語{i}</keyword>が鍵"),
                "background": format!("背景には<keyword>注釈{i}</keyword>が残っている"),
                "rating": 4.0,
                "tags": ["トレンド", "謎のタグ"]
            })
        })
        .collect();
    json!({ "phrases": records }).to_string()
}

fn trivia_payload(flavor: &str) -> String {
    let records: Vec<_> = (1..=5)
        .map(|i| json!({ "content": format!("{flavor}の豆知識{i}は<keyword>意外</keyword>だ") }))
        .collect();
    json!({ "trivia": records }).to_string()
}

fn glossary_payload(flavor: &str) -> String {
    let records: Vec<_> = (1..=8)
        .map(|i| json!({ "term": format!("{flavor}用語{i}"), "definition": format!("定義{i}") }))
        .collect();
    json!({ "glossary": records }).to_string()
}

fn key_persons_payload(flavor: &str) -> String {
    let records: Vec<_> = (1..=5)
        .map(|i| {
            json!({
                "name": format!("{flavor}人物{i}"),
                "description": format!("説明{i}"),
                "twitter": format!("https://twitter.com/example{i}")
            })
        })
        .collect();
    json!({ "keyPersons": records }).to_string()
}

fn remarks_payload() -> String {
    let records: Vec<_> = (1..=6)
        .map(|i| json!({ "content": format!("そういえば<keyword>一言{i}</keyword>だね") }))
        .collect();
    serde_json::Value::Array(records).to_string()
}

/// Prompt-substring keys: each section prompt embeds its own payload
/// key in the JSON format example.
fn research_scripts(flavor: &str) -> Vec<(&'static str, Scripted)> {
    vec![
        ("\"phrases\"", Scripted::Ok(phrases_payload(flavor))),
        ("\"trivia\"", Scripted::Ok(trivia_payload(flavor))),
        ("\"glossary\"", Scripted::Ok(glossary_payload(flavor))),
        ("\"keyPersons\"", Scripted::Ok(key_persons_payload(flavor))),
    ]
}

fn synthesis_scripts() -> Vec<(&'static str, Scripted)> {
    // The synthesis prompt always matches; it is the only prompt the
    // synthesizer mock ever sees.
    vec![("一言", Scripted::Ok(remarks_payload()))]
}

fn orchestrator(
    research: &Arc<MockProvider>,
    synthesizer: &Arc<MockProvider>,
) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(research.clone(), synthesizer.clone()))
}

// ========================================================================
// Full-Session Tests
// ========================================================================

#[tokio::test]
async fn full_session_settles_every_section_successfully() {
    let research = MockProvider::new(research_scripts("本命"));
    let synthesizer = MockProvider::new(synthesis_scripts());
    let orch = orchestrator(&research, &synthesizer);

    let session = orch.start("大谷翔平").await.unwrap();
    assert_eq!(session, 1);

    let snap = orch.snapshot().await;
    assert_eq!(snap.topic, "大谷翔平");
    assert!(!snap.generating);
    assert_eq!(snap.settled_count, GENERATOR_COUNT);

    assert_eq!(snap.phrases.status, SectionStatus::Success);
    assert_eq!(snap.phrases.data.len(), 5);
    assert_eq!(snap.trivia.status, SectionStatus::Success);
    assert_eq!(snap.trivia.data.len(), 5);
    assert_eq!(snap.glossary.status, SectionStatus::Success);
    assert_eq!(snap.glossary.data.len(), 8);
    assert_eq!(snap.key_persons.status, SectionStatus::Success);
    assert_eq!(snap.key_persons.data.len(), 5);
    assert_eq!(snap.synthesis.status, SectionStatus::Success);
    assert_eq!(snap.synthesis.data.len(), 6);

    // Four research calls plus one synthesis call.
    assert_eq!(research.call_count(), 4);
    assert_eq!(synthesizer.call_count(), 1);
}

#[tokio::test]
async fn markers_are_stripped_from_backgrounds_but_kept_in_quotes() {
    let research = MockProvider::new(research_scripts("本命"));
    let synthesizer = MockProvider::new(synthesis_scripts());
    let orch = orchestrator(&research, &synthesizer);

    orch.start("生成AI").await.unwrap();
    let snap = orch.snapshot().await;

    for phrase in &snap.phrases.data {
        assert!(phrase.quote.contains(markup::OPEN));
        assert!(!phrase.background.contains(markup::OPEN));
        assert!(!phrase.background.contains(markup::CLOSE));
        // Unknown tag labels are dropped, known ones survive.
        assert_eq!(phrase.tags, vec![PhraseTag::Trend]);
    }
    for trivia in &snap.trivia.data {
        assert!(trivia.content.contains(markup::OPEN));
    }
    for remark in &snap.synthesis.data {
        assert!(remark.content.contains(markup::OPEN));
    }
}

#[tokio::test]
async fn every_section_is_loading_immediately_after_start() {
    let research = MockProvider::new(research_scripts("本命"));
    research.set_delay(Some(Duration::from_millis(100))).await;
    let synthesizer = MockProvider::new(synthesis_scripts());
    let orch = orchestrator(&research, &synthesizer);

    let handle = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.start("大谷翔平").await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    let snap = orch.snapshot().await;
    assert!(snap.generating);
    assert_eq!(snap.phrases.status, SectionStatus::Loading);
    assert_eq!(snap.trivia.status, SectionStatus::Loading);
    assert_eq!(snap.glossary.status, SectionStatus::Loading);
    assert_eq!(snap.key_persons.status, SectionStatus::Loading);
    assert_eq!(snap.synthesis.status, SectionStatus::Loading);

    handle.await.unwrap().unwrap();
    let snap = orch.snapshot().await;
    assert!(snap.phrases.is_settled());
    assert!(snap.synthesis.is_settled());
}

#[tokio::test]
async fn empty_topic_is_rejected() {
    let research = MockProvider::new(Vec::new());
    let synthesizer = MockProvider::new(Vec::new());
    let orch = orchestrator(&research, &synthesizer);

    assert_eq!(orch.start("   ").await.unwrap_err(), SessionError::EmptyTopic);
    let snap = orch.snapshot().await;
    assert_eq!(snap.session, 0);
    assert_eq!(research.call_count(), 0);
}

// ========================================================================
// Failure Handling
// ========================================================================

#[tokio::test]
async fn failed_section_settles_as_error_and_synthesis_still_runs() {
    let mut scripts = research_scripts("本命");
    scripts[2] = (
        "\"glossary\"",
        Scripted::Api {
            status: 500,
            message: "internal".to_string(),
        },
    );
    let research = MockProvider::new(scripts);
    let synthesizer = MockProvider::new(synthesis_scripts());
    let orch = orchestrator(&research, &synthesizer);

    orch.start("大谷翔平").await.unwrap();
    let snap = orch.snapshot().await;

    assert_eq!(snap.glossary.status, SectionStatus::Error);
    let message = snap.glossary.error.as_deref().unwrap();
    assert!(message.contains("glossary"));
    assert!(message.contains("500"));
    assert!(snap.glossary.data.is_empty());

    // Siblings and synthesis are unaffected; the session settles.
    assert_eq!(snap.phrases.status, SectionStatus::Success);
    assert_eq!(snap.trivia.status, SectionStatus::Success);
    assert_eq!(snap.key_persons.status, SectionStatus::Success);
    assert_eq!(snap.synthesis.status, SectionStatus::Success);
    assert!(!snap.generating);
    assert_eq!(snap.settled_count, GENERATOR_COUNT);

    // The synthesis context was built from the three surviving lists.
    let prompt = synthesizer.last_prompt().await.unwrap();
    assert!(prompt.contains("【セリフ】"));
    assert!(prompt.contains("【キーパーソン】"));
    assert!(!prompt.contains("【用語】"));
}

#[tokio::test]
async fn synthesis_failure_does_not_disturb_settled_sections() {
    let research = MockProvider::new(research_scripts("本命"));
    let synthesizer = MockProvider::new(vec![(
        "一言",
        Scripted::Api {
            status: 500,
            message: "{\"error\":\"internal\"}".to_string(),
        },
    )]);
    let orch = orchestrator(&research, &synthesizer);

    orch.start("大谷翔平").await.unwrap();
    let snap = orch.snapshot().await;

    assert_eq!(snap.synthesis.status, SectionStatus::Error);
    assert!(snap.synthesis.error.as_deref().unwrap().contains("500"));
    assert_eq!(snap.phrases.status, SectionStatus::Success);
    assert_eq!(snap.glossary.status, SectionStatus::Success);
    assert!(!snap.generating);
}

#[tokio::test]
async fn missing_payload_key_is_a_section_error() {
    let mut scripts = research_scripts("本命");
    scripts[2] = (
        "\"glossary\"",
        Scripted::Ok(json!({ "items": [] }).to_string()),
    );
    let research = MockProvider::new(scripts);
    let synthesizer = MockProvider::new(synthesis_scripts());
    let orch = orchestrator(&research, &synthesizer);

    orch.start("大谷翔平").await.unwrap();
    let snap = orch.snapshot().await;

    assert_eq!(snap.glossary.status, SectionStatus::Error);
    assert!(snap.glossary.error.as_deref().unwrap().contains("glossary"));
}

#[tokio::test]
async fn unparseable_payload_is_a_section_error() {
    let mut scripts = research_scripts("本命");
    scripts[1] = ("\"trivia\"", Scripted::Ok("ここにJSONはありません".to_string()));
    let research = MockProvider::new(scripts);
    let synthesizer = MockProvider::new(synthesis_scripts());
    let orch = orchestrator(&research, &synthesizer);

    orch.start("大谷翔平").await.unwrap();
    let snap = orch.snapshot().await;

    assert_eq!(snap.trivia.status, SectionStatus::Error);
    assert!(snap.trivia.error.as_deref().unwrap().contains("trivia"));
}

// ========================================================================
// Retry
// ========================================================================

#[tokio::test]
async fn retry_refetches_only_the_requested_section() {
    let mut scripts = research_scripts("本命");
    scripts[2] = (
        "\"glossary\"",
        Scripted::Api {
            status: 503,
            message: "unavailable".to_string(),
        },
    );
    let research = MockProvider::new(scripts);
    let synthesizer = MockProvider::new(synthesis_scripts());
    let orch = orchestrator(&research, &synthesizer);

    orch.start("大谷翔平").await.unwrap();
    let before = orch.snapshot().await;
    assert_eq!(before.glossary.status, SectionStatus::Error);
    let calls_before = research.call_count();

    // The provider recovers; only the glossary is refetched.
    research.set_scripts(research_scripts("本命")).await;
    orch.retry(Section::Glossary).await.unwrap();

    let after = orch.snapshot().await;
    assert_eq!(after.glossary.status, SectionStatus::Success);
    assert_eq!(after.glossary.data.len(), 8);
    assert!(after.glossary.error.is_none());
    assert_eq!(research.call_count(), calls_before + 1);

    // Siblings keep their records and statuses; the counter is frozen
    // once the session has settled.
    assert_eq!(after.phrases.data.len(), before.phrases.data.len());
    assert_eq!(after.trivia.status, before.trivia.status);
    assert_eq!(after.key_persons.data.len(), before.key_persons.data.len());
    assert_eq!(after.synthesis.data.len(), before.synthesis.data.len());
    assert_eq!(after.settled_count, GENERATOR_COUNT);
    assert_eq!(synthesizer.call_count(), 1);
}

#[tokio::test]
async fn failed_retry_keeps_stale_data_visible() {
    let research = MockProvider::new(research_scripts("本命"));
    let synthesizer = MockProvider::new(synthesis_scripts());
    let orch = orchestrator(&research, &synthesizer);

    orch.start("大谷翔平").await.unwrap();
    assert_eq!(orch.snapshot().await.glossary.data.len(), 8);

    let mut scripts = research_scripts("本命");
    scripts[2] = (
        "\"glossary\"",
        Scripted::Api {
            status: 502,
            message: "bad gateway".to_string(),
        },
    );
    research.set_scripts(scripts).await;
    orch.retry(Section::Glossary).await.unwrap();

    let snap = orch.snapshot().await;
    assert_eq!(snap.glossary.status, SectionStatus::Error);
    assert!(snap.glossary.error.is_some());
    // Previous records stay visible next to the new error.
    assert_eq!(snap.glossary.data.len(), 8);
}

#[tokio::test]
async fn synthesis_retry_uses_current_section_data() {
    let research = MockProvider::new(research_scripts("本命"));
    let synthesizer = MockProvider::new(vec![(
        "一言",
        Scripted::Api {
            status: 500,
            message: "internal".to_string(),
        },
    )]);
    let orch = orchestrator(&research, &synthesizer);

    orch.start("大谷翔平").await.unwrap();
    assert_eq!(orch.snapshot().await.synthesis.status, SectionStatus::Error);

    synthesizer.set_scripts(synthesis_scripts()).await;
    orch.retry(Section::Synthesis).await.unwrap();

    let snap = orch.snapshot().await;
    assert_eq!(snap.synthesis.status, SectionStatus::Success);
    assert_eq!(snap.synthesis.data.len(), 6);

    let prompt = synthesizer.last_prompt().await.unwrap();
    assert!(prompt.contains("【用語】"));
    assert_eq!(research.call_count(), 4);
}

#[tokio::test]
async fn retry_without_a_session_is_rejected() {
    let research = MockProvider::new(Vec::new());
    let synthesizer = MockProvider::new(Vec::new());
    let orch = orchestrator(&research, &synthesizer);

    assert_eq!(
        orch.retry(Section::Glossary).await.unwrap_err(),
        SessionError::NoSession
    );
}

// ========================================================================
// Progress and Session Supersession
// ========================================================================

#[tokio::test]
async fn progress_counter_is_monotonic_and_terminates_at_five() {
    let research = MockProvider::new(research_scripts("本命"));
    research.set_delay(Some(Duration::from_millis(10))).await;
    let synthesizer = MockProvider::new(synthesis_scripts());
    let orch = orchestrator(&research, &synthesizer);

    let mut rx = orch.subscribe();
    let collector = tokio::spawn(async move {
        let mut counts = Vec::new();
        loop {
            if rx.changed().await.is_err() {
                break;
            }
            let snap = rx.borrow_and_update().clone();
            counts.push(snap.settled_count);
            if !snap.generating && snap.settled_count == GENERATOR_COUNT {
                break;
            }
        }
        counts
    });

    orch.start("大谷翔平").await.unwrap();
    let counts = collector.await.unwrap();

    assert!(counts.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(*counts.last().unwrap(), GENERATOR_COUNT);
}

#[tokio::test]
async fn new_session_discards_in_flight_results() {
    let research = MockProvider::new(research_scripts("旧"));
    research.set_delay(Some(Duration::from_millis(100))).await;
    let synthesizer = MockProvider::new(synthesis_scripts());
    let orch = orchestrator(&research, &synthesizer);

    let first = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.start("古い話題").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Second submission supersedes the in-flight session.
    research.set_delay(None).await;
    research.set_scripts(research_scripts("新")).await;
    let second = orch.start("新しい話題").await.unwrap();
    first.await.unwrap().unwrap();

    let snap = orch.snapshot().await;
    assert_eq!(snap.session, second);
    assert_eq!(snap.topic, "新しい話題");
    assert!(!snap.generating);
    assert_eq!(snap.settled_count, GENERATOR_COUNT);

    // No record from the superseded session leaked in.
    assert!(snap.glossary.data.iter().all(|e| e.term.starts_with("新")));
    assert!(snap.phrases.data.iter().all(|p| p.quote.contains("新")));
}
