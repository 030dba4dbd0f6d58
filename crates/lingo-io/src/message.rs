use lingo_types::{AppEvent, CaptureRequest, TextSource};
use serde::Deserialize;

/// Frames the browser side sends
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum Frame {
    SaveSelection(Selection),
    AddWord { word: String },
    Review { id: String, checked: bool },
}

#[derive(Debug, Deserialize)]
struct Selection {
    text: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
}

impl Selection {
    fn into_request(self, source: TextSource) -> CaptureRequest {
        CaptureRequest {
            text: self.text,
            source_url: self.url,
            source_title: self.title,
            source,
        }
    }
}

/// Turn a raw frame into an app event.
///
/// JSON frames are tagged by `type` (`save-selection`, `add-word`,
/// `review`). An untagged `{ "text", "url", "title" }` object is a
/// selection. Anything else is plain selected text.
pub fn parse_frame(raw: &str, source: TextSource) -> AppEvent {
    let trimmed = raw.trim_start();

    if trimmed.starts_with('{') {
        if let Ok(frame) = serde_json::from_str::<Frame>(trimmed) {
            return match frame {
                Frame::SaveSelection(selection) => {
                    AppEvent::Capture(selection.into_request(source))
                }
                Frame::AddWord { word } => AppEvent::AddWord(word),
                Frame::Review { id, checked } => AppEvent::ToggleReview { id, checked },
            };
        }

        if let Ok(selection) = serde_json::from_str::<Selection>(trimmed) {
            return AppEvent::Capture(selection.into_request(source));
        }

        tracing::debug!("Frame is not a known message, treating it as text");
    }

    AppEvent::Capture(CaptureRequest::new(raw, source))
}
