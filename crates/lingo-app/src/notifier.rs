use kanal::AsyncSender;
use lingo_core::notify::RefreshNotifier;
use lingo_types::AppEvent;

/// Pushes refresh signals to the review view without ever waiting
pub struct ChannelNotifier {
    tx: AsyncSender<AppEvent>,
}

impl ChannelNotifier {
    pub fn new(tx: AsyncSender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl RefreshNotifier for ChannelNotifier {
    fn notify(&self) {
        match self.tx.try_send(AppEvent::RefreshVocabulary) {
            Ok(true) => tracing::debug!("Refresh signal sent"),
            // A refresh is already queued, the view will pick this change up too
            Ok(false) => tracing::debug!("Refresh channel full, signal dropped"),
            Err(e) => tracing::warn!("Refresh signal not delivered: {}", e),
        }
    }
}
