use std::sync::Arc;

use kanal::{AsyncReceiver, AsyncSender};
use lingo_core::capture::CaptureResolver;
use lingo_core::review::{ReviewScheduler, ReviewSession};
use lingo_types::AppEvent;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub mod capture;
pub mod review;

use capture::{handle_add_word, handle_capture};
use review::handle_review_toggle;

/// Review toggles shared between the event loop and the review view
pub type SharedSession = Arc<Mutex<ReviewSession>>;

/// Everything the event handlers need
pub struct EventContext {
    pub state: Arc<AppState>,
    pub resolver: CaptureResolver,
    pub scheduler: Arc<ReviewScheduler>,
    pub session: SharedSession,
    /// Status lines for the review view
    pub status_tx: AsyncSender<AppEvent>,
}

/// App's main loop. Events are handled one at a time, so a pending token
/// pick holds back later captures.
pub async fn event_loop(
    mut ctx: EventContext,
    rx: AsyncReceiver<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!("[EVENT_LOOP] Waiting for captures");

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => event?,
        };

        tracing::debug!(
            "[EVENT_LOOP] Event received: {:?}",
            std::mem::discriminant(&event)
        );
        handle_events(&mut ctx, event, &cancel).await?;
    }

    tracing::info!("[EVENT_LOOP] Stopping");
    Ok(())
}

async fn handle_events(
    ctx: &mut EventContext,
    event: AppEvent,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    match event {
        AppEvent::Capture(request) => {
            handle_capture(ctx, request, cancel.child_token()).await?;
        }
        AppEvent::AddWord(word) => {
            handle_add_word(ctx, word, cancel.child_token()).await?;
        }
        AppEvent::ToggleReview { id, checked } => {
            handle_review_toggle(ctx, id, checked).await?;
        }
        AppEvent::RefreshVocabulary | AppEvent::CaptureStatus { .. } => {
            // View-side events, nothing to do here
        }
    }

    Ok(())
}
