use std::sync::Arc;
use std::time::Duration;

use kanal::AsyncSender;
use lingo_io::message::parse_frame;
use lingo_types::{AppEvent, CaptureRequest, TextSource};
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Watcher for websocket or clipboard
pub async fn watcher_io(
    state: Arc<AppState>,
    cancel: CancellationToken,
    event_tx: AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    let capture = {
        let config = state.config.read().await;
        config.capture.clone()
    };

    if capture.listen_to_ws {
        tracing::info!("Starting WebSocket listener on {}", capture.ws_url);

        lingo_io::ws::start_ws_listener(&capture.ws_url, move |text| {
            let tx = event_tx.clone();
            let event = parse_frame(&text, TextSource::Websocket);
            tokio::spawn(async move {
                if let Err(e) = tx.send(event).await {
                    tracing::error!("Failed to send WebSocket frame to app: {}", e);
                }
            });
        })
        .await?;

        // Wait for cancellation
        cancel.cancelled().await;
        tracing::info!("WebSocket listener stopping");
    } else {
        let poll = Duration::from_millis(capture.clipboard_poll_ms);
        tracing::info!("Starting clipboard watcher, polling every {:?}", poll);

        let tx = event_tx.clone();
        tokio::select! {
            result = lingo_io::clipboard::watch_clipboard(poll, move |text| {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let event = AppEvent::Capture(CaptureRequest::new(text, TextSource::Clipboard));
                    if let Err(e) = tx.send(event).await {
                        tracing::error!("Failed to send clipboard text to app: {}", e);
                    }
                });
            }) => {
                if let Err(e) = result {
                    tracing::error!("Clipboard watcher error: {}", e);
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("Clipboard watcher stopping");
            }
        }
    }

    Ok(())
}
