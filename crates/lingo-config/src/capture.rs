use std::env;

use serde::{Deserialize, Serialize};

fn default_ws_url() -> String {
    "ws://localhost:8080".to_string()
}

fn default_clipboard_poll_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Listen to websocket, if false use clipboard watcher
    #[serde(default)]
    pub listen_to_ws: bool,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_clipboard_poll_ms")]
    pub clipboard_poll_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            listen_to_ws: false,
            ws_url: default_ws_url(),
            clipboard_poll_ms: default_clipboard_poll_ms(),
        }
    }
}

impl CaptureConfig {
    pub fn new() -> Self {
        let listen_to_ws = env::var("LINGO_LISTEN_TO_WS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);

        let ws_url = env::var("LINGO_WS_URL").unwrap_or_else(|_| default_ws_url());

        let clipboard_poll_ms = env::var("LINGO_CLIPBOARD_POLL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_clipboard_poll_ms);

        Self {
            listen_to_ws,
            ws_url,
            clipboard_poll_ms,
        }
    }
}
