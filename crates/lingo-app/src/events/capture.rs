use lingo_core::capture::CaptureOutcome;
use lingo_core::error::CaptureError;
use lingo_types::{AppEvent, CaptureRequest, TextSource};
use tokio_util::sync::CancellationToken;

use super::EventContext;

pub async fn handle_capture(
    ctx: &EventContext,
    request: CaptureRequest,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::debug!(
        "Capture from {:?}: {} chars",
        request.source,
        request.text.chars().count()
    );

    let result = ctx
        .resolver
        .resolve(&ctx.state.account, &request, &cancel)
        .await;

    report(ctx, status_line(&result, request.source));
    Ok(())
}

pub async fn handle_add_word(
    ctx: &EventContext,
    word: String,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let result = ctx
        .resolver
        .add_word(&ctx.state.account, &word, &cancel)
        .await;

    report(ctx, status_line(&result, TextSource::Manual));
    Ok(())
}

/// User-facing status for a capture result, `None` when it is not worth
/// showing.
///
/// Clipboard contents that are not words are routine and stay quiet.
pub fn status_line(
    result: &Result<CaptureOutcome, CaptureError>,
    source: TextSource,
) -> Option<(String, bool)> {
    match result {
        Ok(outcome) => Some((
            outcome.message(),
            !matches!(outcome, CaptureOutcome::Cancelled),
        )),
        Err(CaptureError::Validation(e)) if source == TextSource::Clipboard => {
            tracing::debug!("Ignoring clipboard text: {}", e);
            None
        }
        Err(CaptureError::Validation(e)) => Some((e.to_string(), false)),
        Err(e) => {
            tracing::error!("Capture failed: {}", e);
            Some((format!("Capture failed: {}", e), false))
        }
    }
}

fn report(ctx: &EventContext, status: Option<(String, bool)>) {
    let Some((message, success)) = status else {
        return;
    };

    if let Err(e) = ctx
        .status_tx
        .try_send(AppEvent::CaptureStatus { message, success })
    {
        tracing::warn!("Status not delivered: {}", e);
    }
}
