use std::time::Duration;

use arboard::Clipboard;
use tokio::time;

/// Poll the clipboard and report each new non-empty text once
pub async fn watch_clipboard<F>(poll: Duration, mut on_text: F) -> Result<(), anyhow::Error>
where
    F: FnMut(String) + Send + 'static,
{
    let mut clipboard = Clipboard::new()?;
    // Whatever is on the clipboard at startup was not a capture
    let mut last_text = clipboard.get_text().unwrap_or_default();

    let mut interval = time::interval(poll);

    loop {
        interval.tick().await;
        if let Ok(text) = clipboard.get_text()
            && !text.trim().is_empty()
            && text != last_text
        {
            last_text = text.clone();
            on_text(text);
        }
    }
}
