use std::cmp::Reverse;
use std::str::FromStr;

use lingo_types::VocabularyEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    AlphaAsc,
    AlphaDesc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newest" | "time-desc" => Ok(SortOrder::NewestFirst),
            "oldest" | "time-asc" => Ok(SortOrder::OldestFirst),
            "alpha" | "alpha-asc" => Ok(SortOrder::AlphaAsc),
            "alpha-desc" => Ok(SortOrder::AlphaDesc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Entries whose word contains `query` (case-insensitive), sorted
pub fn filter_and_sort(
    entries: &[VocabularyEntry],
    query: &str,
    order: SortOrder,
) -> Vec<VocabularyEntry> {
    let query = query.trim().to_lowercase();

    let mut matched: Vec<VocabularyEntry> = entries
        .iter()
        .filter(|e| query.is_empty() || e.word.to_lowercase().contains(&query))
        .cloned()
        .collect();

    // Stable sorts, ties keep store order
    match order {
        SortOrder::NewestFirst => matched.sort_by_key(|e| Reverse(e.created_at)),
        SortOrder::OldestFirst => matched.sort_by_key(|e| e.created_at),
        SortOrder::AlphaAsc => matched.sort_by(|a, b| a.word.cmp(&b.word)),
        SortOrder::AlphaDesc => matched.sort_by(|a, b| b.word.cmp(&a.word)),
    }

    matched
}

pub fn review_count(entry: &VocabularyEntry) -> usize {
    entry.review_times.len()
}
