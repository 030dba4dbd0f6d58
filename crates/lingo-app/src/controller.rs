use std::sync::Arc;
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender};
use lingo_core::capture::TokenPicker;
use lingo_types::AppEvent;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::events::{EventContext, SharedSession, event_loop};
use crate::io::watcher_io;
use crate::notifier::ChannelNotifier;
use crate::review_view::{TerminalView, review_loop};
use crate::state::AppState;

/// Centralized channel management
pub struct ChannelSet {
    pub sources_to_app: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
    pub app_to_view: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            sources_to_app: kanal::bounded_async(64), // clipboard and socket frames
            app_to_view: kanal::bounded_async(16),    // refresh signals and status lines
        }
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    state: Arc<AppState>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            channels: ChannelSet::new(),
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    pub async fn spawn_tasks(&self, picker: Arc<dyn TokenPicker>) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        let notifier = Arc::new(ChannelNotifier::new(self.channels.app_to_view.0.clone()));
        let scheduler = Arc::new(self.state.scheduler());
        let debounce = {
            let config = self.state.config.read().await;
            Duration::from_millis(config.review.refresh_debounce_ms)
        };

        let session = SharedSession::default();

        // Event loop
        let ctx = EventContext {
            state: self.state.clone(),
            resolver: self.state.resolver(picker, notifier),
            scheduler: scheduler.clone(),
            session: session.clone(),
            status_tx: self.channels.app_to_view.0.clone(),
        };
        tasks.spawn(event_loop(
            ctx,
            self.channels.sources_to_app.1.clone(),
            self.cancel_token.child_token(),
        ));

        // Review view
        tasks.spawn(review_loop(
            scheduler,
            self.state.account.clone(),
            session,
            self.channels.app_to_view.1.clone(),
            debounce,
            self.cancel_token.child_token(),
            TerminalView,
        ));

        // Watcher IO
        tasks.spawn(watcher_io(
            self.state.clone(),
            self.cancel_token.child_token(),
            self.channels.sources_to_app.0.clone(),
        ));

        tasks
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
