use std::env;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};

use savvy::briefing::{markup, Briefing, Orchestrator, Phrase, SectionState, SectionStatus};
use savvy::config::AppConfig;
use savvy::llm::{GeminiClient, PerplexityClient, TextProvider};
use savvy::relay::{self, RelayState};

#[tokio::main]
async fn main() {
    // Initialize logging
    let _log_guard = savvy::logging::init();
    log::info!("{} v{} starting", savvy::NAME, savvy::VERSION);

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let config = AppConfig::load();

    match args.first().map(String::as_str) {
        Some("serve") => serve(config).await,
        Some(topic) => brief(config, topic).await,
        None => {
            eprintln!("Usage: savvy <topic>   generate a briefing for a topic");
            eprintln!("       savvy serve     start the provider relay");
            process::exit(2);
        }
    }
}

fn build_providers(config: &AppConfig) -> Result<(Arc<dyn TextProvider>, Arc<dyn TextProvider>)> {
    let research_key = config
        .research_api_key()
        .context("PERPLEXITY_API_KEY is not set and [research].api_key is missing")?;
    let synthesis_key = config
        .synthesis_api_key()
        .context("GEMINI_API_KEY is not set and [synthesis].api_key is missing")?;

    let research = PerplexityClient::with_base_url(
        config.research.base_url.clone(),
        research_key,
        config.research.model.clone(),
        config.research_timeout(),
    );
    let synthesizer = GeminiClient::with_base_url(
        config.synthesis.base_url.clone(),
        synthesis_key,
        config.synthesis.model.clone(),
        config.synthesis_timeout(),
    );

    Ok((Arc::new(research), Arc::new(synthesizer)))
}

async fn serve(config: AppConfig) -> Result<()> {
    let (research, synthesizer) = build_providers(&config)?;
    relay::serve(
        RelayState {
            research,
            synthesizer,
        },
        config.relay.port,
    )
    .await
}

/// One-shot mode: run a full briefing session and print the result.
/// Partial failure is a normal outcome; failed sections print their
/// error and the process still exits cleanly.
async fn brief(config: AppConfig, topic: &str) -> Result<()> {
    let (research, synthesizer) = build_providers(&config)?;
    let orch = Orchestrator::new(research, synthesizer);

    let mut updates = orch.subscribe();
    let progress = tokio::spawn(async move {
        let mut last = 0;
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.settled_count != last {
                last = snapshot.settled_count;
                log::info!("progress: {last}/5 generators settled");
            }
            if !snapshot.generating {
                break;
            }
        }
    });

    orch.start(topic).await?;
    progress.abort();

    print_briefing(&orch.snapshot().await);
    Ok(())
}

fn print_briefing(briefing: &Briefing) {
    println!("━━ {} ━━", briefing.topic);

    print_section("賢く聞こえるセリフ", &briefing.phrases, render_phrase);
    print_section("豆知識", &briefing.trivia, |t| {
        format!("・{}", render_marked(&t.content))
    });
    print_section("関連用語", &briefing.glossary, |g| {
        format!("・{}: {}", g.term, g.definition)
    });
    print_section("キーパーソン", &briefing.key_persons, |k| {
        let mut line = format!("・{} — {}", k.name, k.description);
        for link in [&k.twitter, &k.linkedin, &k.website].into_iter().flatten() {
            line.push_str(&format!("\n    {link}"));
        }
        line
    });
    print_section("会話で使える一言", &briefing.synthesis, |r| {
        format!("・{}", render_marked(&r.content))
    });
}

fn print_section<T>(title: &str, state: &SectionState<T>, render: impl Fn(&T) -> String) {
    println!("\n■ {title}");
    match state.status {
        SectionStatus::Success => {
            for item in &state.data {
                println!("{}", render(item));
            }
        }
        SectionStatus::Error => {
            println!("  [error] {}", state.error.as_deref().unwrap_or("unknown"));
        }
        SectionStatus::Loading => println!("  [loading]"),
        SectionStatus::Idle => println!("  [idle]"),
    }
}

fn render_phrase(phrase: &Phrase) -> String {
    let tags: String = phrase
        .tags
        .iter()
        .map(|tag| format!("[{}]", tag.label()))
        .collect();
    format!(
        "・{} {}（★{:.1}）\n    {}",
        render_marked(&phrase.quote),
        tags,
        phrase.rating,
        phrase.background
    )
}

/// Render emphasis segments with brackets for terminal output.
fn render_marked(text: &str) -> String {
    markup::segments(text)
        .into_iter()
        .map(|segment| {
            if segment.emphasized {
                format!("『{}』", segment.text)
            } else {
                segment.text
            }
        })
        .collect()
}
