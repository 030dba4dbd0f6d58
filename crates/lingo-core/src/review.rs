use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Timelike};
use lingo_types::{EntryId, EntryPatch, VocabularyEntry};

use crate::clock::Clock;
use crate::store::{AccountId, StoreError, VocabularyStore};

pub const DAY_MS: i64 = 86_400_000;

/// Review checkpoints, in days after creation
pub const REVIEW_OFFSETS_DAYS: [i64; 5] = [1, 3, 7, 15, 30];

/// Half-open `[start, start + 24h)` window beginning at a local midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayWindow {
    start: i64,
}

impl DayWindow {
    pub fn starting_at(start: i64) -> Self {
        Self { start }
    }

    /// Window of the local calendar day that contains `ts`
    pub fn containing<Tz: TimeZone>(ts: i64, tz: &Tz) -> Self {
        let Some(utc) = DateTime::from_timestamp_millis(ts) else {
            return Self::starting_at(ts - ts.rem_euclid(DAY_MS));
        };
        let local = utc.with_timezone(tz);

        let midnight = local
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest());

        let start = match midnight {
            Some(midnight) => midnight.timestamp_millis(),
            // No midnight that day (DST gap), count back from the wall clock
            None => {
                let since_midnight = i64::from(local.num_seconds_from_midnight()) * 1_000
                    + i64::from(local.timestamp_subsec_millis());
                ts - since_midnight
            }
        };

        Self::starting_at(start)
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.start + DAY_MS
    }

    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start && ts < self.end()
    }

    pub fn any_within(&self, timestamps: &[i64]) -> bool {
        timestamps.iter().any(|&t| self.contains(t))
    }
}

/// Checkpoint timestamps for an entry, earliest first
pub fn checkpoints(created_at: i64) -> impl Iterator<Item = i64> {
    REVIEW_OFFSETS_DAYS
        .into_iter()
        .map(move |days| created_at + days * DAY_MS)
}

/// Entries with a checkpoint inside `today` and no review inside `today`.
///
/// Entries without a creation time never come due.
pub fn due_today(entries: &[VocabularyEntry], today: DayWindow) -> Vec<VocabularyEntry> {
    entries
        .iter()
        .filter(|e| e.created_at > 0)
        .filter(|e| checkpoints(e.created_at).any(|cp| today.contains(cp)))
        .filter(|e| !today.any_within(&e.review_times))
        .cloned()
        .collect()
}

/// Today's due list as seen through `session`.
///
/// Toggled entries stay listed with the state the user last chose, even when
/// the loaded review times say otherwise. Returns the list and the ids in it
/// to show as reviewed.
pub fn session_due_today(
    entries: &[VocabularyEntry],
    today: DayWindow,
    session: &ReviewSession,
) -> (Vec<VocabularyEntry>, HashSet<EntryId>) {
    let mut due = Vec::new();
    let mut reviewed = HashSet::new();

    for entry in entries.iter().filter(|e| e.created_at > 0) {
        if !checkpoints(entry.created_at).any(|cp| today.contains(cp)) {
            continue;
        }

        let stored = today.any_within(&entry.review_times);
        let chosen = session.choice(&entry.id);
        if stored && chosen.is_none() {
            continue;
        }

        if chosen.unwrap_or(stored) {
            reviewed.insert(entry.id.clone());
        }
        due.push(entry.clone());
    }

    (due, reviewed)
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverdueReview {
    pub entry: VocabularyEntry,
    /// Earliest missed checkpoint, epoch milliseconds
    pub checkpoint: i64,
}

/// Past checkpoints never reviewed on their own local day, one per entry.
///
/// Each entry keeps only its earliest missed checkpoint. Order follows the
/// input list.
pub fn overdue_history<Tz: TimeZone>(
    entries: &[VocabularyEntry],
    today: DayWindow,
    tz: &Tz,
) -> Vec<OverdueReview> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut overdue = Vec::new();

    for entry in entries.iter().filter(|e| e.created_at > 0) {
        if seen.contains(entry.id.as_str()) {
            continue;
        }

        let missed = checkpoints(entry.created_at)
            .filter(|&cp| cp < today.start())
            .find(|&cp| !DayWindow::containing(cp, tz).any_within(&entry.review_times));

        if let Some(checkpoint) = missed {
            seen.insert(&entry.id);
            overdue.push(OverdueReview {
                entry: entry.clone(),
                checkpoint,
            });
        }
    }

    overdue
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewBoard {
    pub due_today: Vec<VocabularyEntry>,
    pub overdue: Vec<OverdueReview>,
    /// Ids in `due_today` checked off during the session
    pub reviewed: HashSet<EntryId>,
}

impl ReviewBoard {
    pub fn is_empty(&self) -> bool {
        self.due_today.is_empty() && self.overdue.is_empty()
    }
}

/// Entries the user toggled during this session.
///
/// These stay authoritative over freshly loaded data until [`reset`] is
/// called on a full reload.
///
/// [`reset`]: ReviewSession::reset
#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    choices: HashMap<EntryId, bool>,
}

impl ReviewSession {
    pub fn is_checked(&self, id: &str) -> bool {
        self.choice(id) == Some(true)
    }

    /// Last state the user chose for `id`, if they touched it
    pub fn choice(&self, id: &str) -> Option<bool> {
        self.choices.get(id).copied()
    }

    pub fn mark(&mut self, id: &str, checked: bool) {
        self.choices.insert(id.to_string(), checked);
    }

    pub fn reset(&mut self) {
        self.choices.clear();
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

pub struct ReviewScheduler<Tz: TimeZone = Local> {
    store: Arc<dyn VocabularyStore>,
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl ReviewScheduler<Local> {
    pub fn new(store: Arc<dyn VocabularyStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_timezone(store, clock, Local)
    }
}

impl<Tz: TimeZone> ReviewScheduler<Tz> {
    pub fn with_timezone(store: Arc<dyn VocabularyStore>, clock: Arc<dyn Clock>, tz: Tz) -> Self {
        Self { store, clock, tz }
    }

    pub fn today(&self) -> DayWindow {
        self.day_of(self.clock.now_ms())
    }

    pub fn day_of(&self, ts: i64) -> DayWindow {
        DayWindow::containing(ts, &self.tz)
    }

    /// Partition the account's vocabulary for today.
    ///
    /// A failed read yields an empty board.
    pub async fn board(&self, account: &AccountId) -> ReviewBoard {
        self.session_board(account, &ReviewSession::default()).await
    }

    /// Like [`board`](Self::board), with the session's toggles laid over the
    /// loaded data
    pub async fn session_board(
        &self,
        account: &AccountId,
        session: &ReviewSession,
    ) -> ReviewBoard {
        let entries = match self.store.list_all(account).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Failed to load vocabulary for review: {}", e);
                return ReviewBoard::default();
            }
        };

        let today = self.today();
        let (due_today, reviewed) = session_due_today(&entries, today, session);
        let board = ReviewBoard {
            due_today,
            overdue: overdue_history(&entries, today, &self.tz),
            reviewed,
        };

        tracing::debug!(
            "Review board: {} due today, {} overdue of {} entries",
            board.due_today.len(),
            board.overdue.len(),
            entries.len()
        );

        board
    }

    /// Record or undo the review of `id` on the day containing `date_ms`.
    ///
    /// Checking appends the current time when `date_ms` falls on today. For
    /// any other day it appends that day's local midnight instead, so the
    /// stamp always lands inside the day being marked.
    ///
    /// The entry is re-read right before the write, but the write itself
    /// replaces `reviewTimes` wholesale: a concurrent update of the same
    /// field between the read and the write is lost. Returns `None` if the
    /// entry no longer exists.
    pub async fn set_reviewed(
        &self,
        account: &AccountId,
        id: &str,
        date_ms: i64,
        checked: bool,
    ) -> Result<Option<VocabularyEntry>, StoreError> {
        let Some(entry) = self.store.get(account, id).await? else {
            tracing::warn!("Review toggle for missing entry {}", id);
            return Ok(None);
        };

        let window = self.day_of(date_ms);
        let mut review_times = entry.review_times.clone();

        if checked {
            if window.any_within(&review_times) {
                return Ok(Some(entry));
            }
            let now = self.clock.now_ms();
            review_times.push(if window.contains(now) { now } else { window.start() });
        } else {
            review_times.retain(|&t| !window.contains(t));
            if review_times.len() == entry.review_times.len() {
                return Ok(Some(entry));
            }
        }

        let updated = self
            .store
            .update(account, id, EntryPatch::review_times(review_times))
            .await?;

        if let Some(updated) = &updated {
            tracing::info!(
                "Review {} for '{}' ({} total)",
                if checked { "recorded" } else { "removed" },
                updated.word,
                updated.review_times.len()
            );
        }

        Ok(updated)
    }

    /// Toggle today's review and remember the choice in `session`
    pub async fn toggle(
        &self,
        session: &mut ReviewSession,
        account: &AccountId,
        id: &str,
        checked: bool,
    ) -> Result<Option<VocabularyEntry>, StoreError> {
        let updated = self
            .set_reviewed(account, id, self.clock.now_ms(), checked)
            .await?;

        if updated.is_some() {
            session.mark(id, checked);
        }

        Ok(updated)
    }
}
