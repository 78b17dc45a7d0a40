//! Reconstructs the lifecycle of one label from an issue timeline.

use super::timeline::TimelineEvent;
use chrono::{DateTime, Utc};

/// Label tracked when none is configured.
pub const DEFAULT_LABEL: &str = "type:bug";

/// What the timeline says about the tracked label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelVerdict {
    /// The label never appears in a label event.
    NeverLabeled,
    /// Only removals were recorded.
    NeverApplied,
    /// The latest change applied the label.
    StillApplied,
    /// The latest change removed the label.
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Added,
    Removed,
}

/// The label's changes in fetch order, paired with their timestamps.
fn label_changes<'a>(
    events: &'a [TimelineEvent],
    label: &'a str,
) -> impl Iterator<Item = (Change, DateTime<Utc>)> + 'a {
    events.iter().filter_map(move |event| match event {
        TimelineEvent::Labeled { label: name, created_at } if name == label => {
            Some((Change::Added, *created_at))
        }
        TimelineEvent::Unlabeled { label: name, created_at } if name == label => {
            Some((Change::Removed, *created_at))
        }
        _ => None,
    })
}

/// Judges the history of `label` within `events`.
///
/// The most recent change decides. Changes sharing the latest timestamp are
/// resolved in favour of the one fetched last.
pub fn assess(events: &[TimelineEvent], label: &str) -> LabelVerdict {
    let changes: Vec<(Change, DateTime<Utc>)> = label_changes(events, label).collect();

    if changes.is_empty() {
        return LabelVerdict::NeverLabeled;
    }
    if !changes.iter().any(|(change, _)| *change == Change::Added) {
        return LabelVerdict::NeverApplied;
    }

    // max_by_key returns the last of several equal maxima.
    match changes.iter().max_by_key(|(_, created_at)| *created_at) {
        Some((Change::Removed, _)) => LabelVerdict::Removed,
        _ => LabelVerdict::StillApplied,
    }
}

/// True when `label` was applied at some point and its latest change removed it.
pub fn classify(events: &[TimelineEvent], label: &str) -> bool {
    assess(events, label) == LabelVerdict::Removed
}
