use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use lingo_core::board::{SortOrder, filter_and_sort, review_count};
use lingo_core::capture::CaptureOutcome;
use lingo_core::notes::set_sentence_note;
use lingo_core::notify::NoopNotifier;
use lingo_core::preprocess::normalize_word;
use lingo_types::{CaptureRequest, TextSource, VocabularyEntry};
use tokio_util::sync::CancellationToken;

use crate::controller::AppController;
use crate::picker::TerminalPicker;
use crate::review_view::render_board;
use crate::state::AppState;

/// Token cancelled on Ctrl+C, so a pending pick can be abandoned
fn ctrl_c_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    cancel
}

fn print_outcome(outcome: &CaptureOutcome) {
    println!("{}", outcome.message());
}

pub async fn capture(
    state: &AppState,
    text: String,
    url: Option<String>,
    title: Option<String>,
) -> anyhow::Result<()> {
    let resolver = state.resolver(Arc::new(TerminalPicker::new()), Arc::new(NoopNotifier));
    let request = CaptureRequest {
        source_url: url.unwrap_or_default(),
        source_title: title.unwrap_or_default(),
        ..CaptureRequest::new(text, TextSource::Manual)
    };

    let outcome = resolver
        .resolve(&state.account, &request, &ctrl_c_token())
        .await
        .context("Capture failed")?;

    print_outcome(&outcome);
    Ok(())
}

pub async fn add(state: &AppState, word: &str) -> anyhow::Result<()> {
    let resolver = state.resolver(Arc::new(TerminalPicker::new()), Arc::new(NoopNotifier));

    let outcome = resolver
        .add_word(&state.account, word, &ctrl_c_token())
        .await
        .with_context(|| format!("Could not add \"{}\"", word.trim()))?;

    print_outcome(&outcome);
    Ok(())
}

pub async fn enrich(state: &AppState, word: &str) -> anyhow::Result<()> {
    if state.analyzer.is_none() {
        bail!("Word analysis is disabled in this profile");
    }
    let entry = find_entry(state, word).await?;
    let resolver = state.resolver(Arc::new(TerminalPicker::new()), Arc::new(NoopNotifier));

    match resolver
        .refresh_enrichment(&state.account, &entry.id, &ctrl_c_token())
        .await
        .with_context(|| format!("Could not refresh \"{}\"", entry.word))?
    {
        Some(updated) => println!(
            "Refreshed \"{}\" {}",
            updated.word,
            updated.enrichment.phonetic.as_deref().unwrap_or("")
        ),
        None => println!("Nothing new for \"{}\"", entry.word),
    }
    Ok(())
}

pub async fn review(state: &AppState) -> anyhow::Result<()> {
    let board = state.scheduler().board(&state.account).await;
    print!("{}", render_board(&board));
    Ok(())
}

async fn find_entry(state: &AppState, word: &str) -> anyhow::Result<VocabularyEntry> {
    let key = normalize_word(word);
    match state.store.find_by_word(&state.account, &key).await? {
        Some(entry) => Ok(entry),
        None => bail!("\"{}\" is not in your vocabulary", key),
    }
}

pub async fn mark(state: &AppState, word: &str, undo: bool) -> anyhow::Result<()> {
    let entry = find_entry(state, word).await?;
    let now = state.clock.now_ms();

    let updated = state
        .scheduler()
        .set_reviewed(&state.account, &entry.id, now, !undo)
        .await?
        .with_context(|| format!("\"{}\" was deleted meanwhile", entry.word))?;

    if undo {
        println!("Unmarked today's review of \"{}\"", updated.word);
    } else {
        println!(
            "Reviewed \"{}\" ({} reviews)",
            updated.word,
            review_count(&updated)
        );
    }
    Ok(())
}

pub async fn note(
    state: &AppState,
    word: &str,
    sentence: &str,
    markdown: Option<String>,
) -> anyhow::Result<()> {
    let entry = find_entry(state, word).await?;
    let markdown = markdown.unwrap_or_default();

    set_sentence_note(
        state.store.as_ref(),
        &state.account,
        &entry.id,
        sentence,
        &markdown,
    )
    .await?
    .with_context(|| format!("\"{}\" was deleted meanwhile", entry.word))?;

    if markdown.trim().is_empty() {
        println!("Note cleared");
    } else {
        println!("Note saved");
    }
    Ok(())
}

pub async fn list(state: &AppState, query: &str, sort: SortOrder) -> anyhow::Result<()> {
    let entries = state.store.list_all(&state.account).await?;

    for entry in filter_and_sort(&entries, query, sort) {
        println!(
            "{:<24} {:>3} sentences {:>3} reviews",
            entry.word,
            entry.sentences.len(),
            review_count(&entry)
        );
    }
    Ok(())
}

pub async fn export(state: &AppState, path: &Path) -> anyhow::Result<()> {
    let entries = state.store.list_all(&state.account).await?;
    let json = serde_json::to_string_pretty(&entries)?;

    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Exported {} words to {}", entries.len(), path.display());
    Ok(())
}

/// Run capture sources, the event loop and the review view until Ctrl+C
pub async fn watch(state: Arc<AppState>) -> anyhow::Result<()> {
    match state.check_store().await {
        Some(Ok(count)) => tracing::info!("Word store reachable, {} words saved", count),
        Some(Err(e)) => tracing::warn!("Word store check failed: {:#}", e),
        None => {}
    }

    let controller = AppController::new(state);
    let mut tasks = controller
        .spawn_tasks(Arc::new(TerminalPicker::new()))
        .await;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::warn!("A task exited early"),
                Ok(Err(e)) => tracing::error!("Task failed: {:#}", e),
                Err(e) => tracing::error!("Task panicked: {}", e),
            }
        }
    }

    controller.shutdown();
    while let Some(result) = tasks.join_next().await {
        if let Ok(Err(e)) = result {
            tracing::debug!("Task ended with error during shutdown: {:#}", e);
        }
    }

    Ok(())
}
