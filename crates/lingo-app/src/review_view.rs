use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use kanal::AsyncReceiver;
use lingo_core::board::review_count;
use lingo_core::review::{DayWindow, ReviewBoard, ReviewScheduler};
use lingo_core::store::AccountId;
use lingo_types::AppEvent;
use tokio_util::sync::CancellationToken;

use crate::events::SharedSession;

/// Where the review loop sends its output
pub trait ReviewView: Send {
    fn show_board(&mut self, board: &ReviewBoard);
    fn show_status(&mut self, message: &str, success: bool);
}

/// Prints to stdout
pub struct TerminalView;

impl ReviewView for TerminalView {
    fn show_board(&mut self, board: &ReviewBoard) {
        print!("{}", render_board(board));
    }

    fn show_status(&mut self, message: &str, success: bool) {
        if success {
            println!("✓ {}", message);
        } else {
            println!("✗ {}", message);
        }
    }
}

pub fn render_board(board: &ReviewBoard) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Due today ({})", board.due_today.len());
    for entry in &board.due_today {
        let mark = if board.reviewed.contains(&entry.id) { "x" } else { " " };
        let _ = writeln!(
            out,
            "  [{}] {:<24} reviewed {} times",
            mark,
            entry.word,
            review_count(entry)
        );
    }

    let _ = writeln!(out, "Overdue ({})", board.overdue.len());
    for item in &board.overdue {
        let _ = writeln!(
            out,
            "  {:<24} due {}",
            item.entry.word,
            format_day(item.checkpoint)
        );
    }

    out
}

fn format_day(ts: i64) -> String {
    DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Keep the review board current.
///
/// Renders once at start, then once per burst of refresh signals: after the
/// first signal, further signals arriving within `debounce` of each other are
/// folded into the same recomputation. Status messages are shown as they
/// arrive.
///
/// Toggles in `session` are laid over every render. The start of the loop
/// and the first render of a new day are full reloads and clear them.
pub async fn review_loop<Tz, V>(
    scheduler: Arc<ReviewScheduler<Tz>>,
    account: AccountId,
    session: SharedSession,
    rx: AsyncReceiver<AppEvent>,
    debounce: Duration,
    cancel: CancellationToken,
    mut view: V,
) -> anyhow::Result<()>
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Send + Sync,
    V: ReviewView,
{
    let mut day = None;
    view.show_board(&reload(&scheduler, &account, &session, &mut day).await);

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Ok(event) => event,
                Err(_) => break,
            },
        };

        match event {
            AppEvent::RefreshVocabulary => {
                let folded = absorb_burst(&rx, debounce, &mut view).await;
                tracing::debug!("Refreshing review board after {} signals", folded + 1);
                view.show_board(&reload(&scheduler, &account, &session, &mut day).await);
            }
            AppEvent::CaptureStatus { message, success } => view.show_status(&message, success),
            _ => {}
        }
    }

    tracing::info!("Review view stopping");
    Ok(())
}

/// Recompute the board, clearing the session when `day` has moved on
async fn reload<Tz>(
    scheduler: &ReviewScheduler<Tz>,
    account: &AccountId,
    session: &SharedSession,
    day: &mut Option<DayWindow>,
) -> ReviewBoard
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Send + Sync,
{
    let today = scheduler.today();
    let snapshot = {
        let mut session = session.lock().await;
        if *day != Some(today) {
            if !session.is_empty() {
                tracing::debug!("Full reload, dropping {} session toggles", session.len());
            }
            session.reset();
            *day = Some(today);
        }
        session.clone()
    };

    scheduler.session_board(account, &snapshot).await
}

/// Swallow refresh signals until the channel stays quiet for `window`.
/// Returns how many were folded.
pub async fn absorb_burst<V: ReviewView>(
    rx: &AsyncReceiver<AppEvent>,
    window: Duration,
    view: &mut V,
) -> usize {
    let mut folded = 0;

    loop {
        match tokio::time::timeout(window, rx.recv()).await {
            Ok(Ok(AppEvent::RefreshVocabulary)) => folded += 1,
            Ok(Ok(AppEvent::CaptureStatus { message, success })) => {
                view.show_status(&message, success)
            }
            Ok(Ok(_)) => {}
            Ok(Err(_)) | Err(_) => return folded,
        }
    }
}
