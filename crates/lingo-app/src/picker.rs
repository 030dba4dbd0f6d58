use async_trait::async_trait;
use lingo_core::capture::TokenPicker;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// Asks on the terminal which token a sentence belongs to
pub struct TerminalPicker {
    stdin: Mutex<BufReader<Stdin>>,
}

impl TerminalPicker {
    pub fn new() -> Self {
        Self {
            stdin: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for TerminalPicker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenPicker for TerminalPicker {
    async fn pick(&self, candidates: &[String]) -> Option<String> {
        // One prompt at a time
        let mut stdin = self.stdin.lock().await;

        eprintln!("No saved word found in this sentence. Which word is it for?");
        for (i, token) in candidates.iter().enumerate() {
            eprintln!("  {:>2}. {}", i + 1, token);
        }
        eprintln!("Number or word, empty line or q to cancel:");

        let mut line = String::new();
        match stdin.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => parse_choice(&line, candidates),
            Err(e) => {
                tracing::warn!("Failed to read choice: {}", e);
                None
            }
        }
    }
}

/// A 1-based index or the token itself. Anything else cancels.
pub fn parse_choice(line: &str, candidates: &[String]) -> Option<String> {
    let line = line.trim();

    if line.is_empty() || line.eq_ignore_ascii_case("q") || line.starts_with('\u{1b}') {
        return None;
    }

    if let Ok(n) = line.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| candidates.get(i))
            .cloned();
    }

    let line = line.to_lowercase();
    candidates.iter().find(|c| **c == line).cloned()
}
