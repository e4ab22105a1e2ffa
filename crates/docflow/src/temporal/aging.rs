//! Age buckets for SLA monitoring.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::stage::Stage;

/// Derived age classification of a document. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgingBucket {
    OnTrack,
    /// Exactly two whole days old.
    NearDue,
    /// Three or more whole days old.
    Overdue,
    /// Closed documents, and documents whose age cannot be determined.
    NotApplicable,
}

/// Whole days elapsed from `created` to `now`, truncated toward zero.
pub fn elapsed_days(created: OffsetDateTime, now: OffsetDateTime) -> i64 {
    (now - created).whole_days()
}

/// Classify a document created at `created` and currently in `status`.
///
/// Day 2 and day 3+ are separate predicates: there is no escalation below
/// day 2 and nothing beyond "overdue".
pub fn classify(created: OffsetDateTime, now: OffsetDateTime, status: Stage) -> AgingBucket {
    if status.is_closed() {
        return AgingBucket::NotApplicable;
    }

    match elapsed_days(created, now) {
        2 => AgingBucket::NearDue,
        days if days >= 3 => AgingBucket::Overdue,
        _ => AgingBucket::OnTrack,
    }
}
