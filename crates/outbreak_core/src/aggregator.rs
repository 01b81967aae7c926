//! crates/outbreak_core/src/aggregator.rs
//!
//! Daily bucketing of incoming symptom reports, and trailing-window summaries
//! of the stored buckets for outbreak analysis.

use crate::domain::{DayEntry, DayIndex, SymptomCounts};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("Report day {day} is earlier than the latest stored day {latest}")]
    DayBeforeLatest { day: DayIndex, latest: DayIndex },
}

/// What a merge did to the entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Today's entry already existed and was incremented.
    Incremented,
    /// A new entry was appended for today.
    Appended,
}

/// Merges one report into a ZIP's entry list.
///
/// Counts for `today` are added to the last entry if it belongs to `today`;
/// otherwise a fresh entry is appended. Earlier entries are never touched.
pub fn merge_daily_report(
    entries: &mut Vec<DayEntry>,
    incoming: &SymptomCounts,
    today: DayIndex,
) -> Result<MergeOutcome, AggregateError> {
    if let Some(last) = entries.last_mut() {
        if last.day == today {
            last.symptoms.accumulate(incoming);
            return Ok(MergeOutcome::Incremented);
        }
        if last.day > today {
            return Err(AggregateError::DayBeforeLatest {
                day: today,
                latest: last.day,
            });
        }
    }

    entries.push(DayEntry {
        day: today,
        symptoms: *incoming,
    });
    Ok(MergeOutcome::Appended)
}

/// Per-symptom totals over a trailing window of entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowSummary {
    pub totals: SymptomCounts,
    /// Number of day entries that fell inside the window. Not a head count.
    pub entries_included: usize,
}

/// Sums every entry within `window_days` of the latest entry's day, inclusive of that day.
pub fn summarize_window(entries: &[DayEntry], window_days: u32) -> WindowSummary {
    let Some(latest) = entries.last().map(|entry| entry.day) else {
        return WindowSummary::default();
    };
    let oldest_excluded = latest.saturating_sub(i64::from(window_days));

    entries
        .iter()
        .filter(|entry| entry.day > oldest_excluded && entry.day <= latest)
        .fold(WindowSummary::default(), |mut summary, entry| {
            summary.totals.accumulate(&entry.symptoms);
            summary.entries_included += 1;
            summary
        })
}
