//! Locale-aware timestamp parsing and age classification.
//!
//! Creation timestamps are produced by a Thai locale formatter and are not
//! ISO-normalized. They may contain:
//!
//! - Thai numeral glyphs instead of ASCII digits (`๑๔-๑๐-๒๕๖๗ ๐๙:๓๐`)
//! - `/` or `-` as the date separator
//! - a Buddhist-era year (Gregorian + 543)
//!
//! [`TemporalClassifier`] parses them strictly into instants and buckets open
//! documents by age against an injected `now`:
//!
//! | Whole days since creation | Bucket |
//! |---------------------------|--------|
//! | < 2 | [`AgingBucket::OnTrack`] |
//! | = 2 | [`AgingBucket::NearDue`] |
//! | ≥ 3 | [`AgingBucket::Overdue`] |
//!
//! Closed documents (Completed, Rejected, Paid) are always
//! [`AgingBucket::NotApplicable`], as are documents whose timestamp does not
//! parse.

mod aging;
mod parse;

pub use aging::{AgingBucket, classify, elapsed_days};
pub use parse::{BUDDHIST_ERA_OFFSET, format_timestamp, normalize, parse_timestamp};

use time::macros::offset;
use time::{OffsetDateTime, UtcOffset};
use tracing::debug;

use crate::error::Result;
use crate::stage::Stage;

/// Offset of the locale the timestamps are written in (Indochina Time).
pub const DEFAULT_UTC_OFFSET: UtcOffset = offset!(+7);

/// Parses stored timestamps and classifies document age.
///
/// Stateless apart from locale settings; safe to share between any number of
/// concurrent readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalClassifier {
    offset: UtcOffset,
    thai_numerals: bool,
}

impl TemporalClassifier {
    pub fn new(offset: UtcOffset) -> Self {
        Self {
            offset,
            thai_numerals: false,
        }
    }

    /// Emit Thai numeral glyphs when formatting.
    pub fn with_thai_numerals(mut self, thai_numerals: bool) -> Self {
        self.thai_numerals = thai_numerals;
        self
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    /// Parse a stored timestamp into an absolute instant.
    pub fn parse(&self, raw: &str) -> Result<OffsetDateTime> {
        Ok(parse_timestamp(raw)?.assume_offset(self.offset))
    }

    /// Parse, treating failure as "no instant".
    pub fn parse_lenient(&self, raw: &str) -> Option<OffsetDateTime> {
        match self.parse(raw) {
            Ok(instant) => Some(instant),
            Err(err) => {
                debug!(raw, error = %err, "Excluding timestamp from aging");
                None
            }
        }
    }

    /// Format `instant` as a stored timestamp.
    pub fn format(&self, instant: OffsetDateTime) -> String {
        format_timestamp(instant, self.offset, self.thai_numerals)
    }

    /// Classify a parsed creation instant.
    pub fn classify(&self, created: OffsetDateTime, now: OffsetDateTime, status: Stage) -> AgingBucket {
        classify(created, now, status)
    }

    /// Classify from a stored timestamp string.
    pub fn classify_raw(&self, raw: &str, now: OffsetDateTime, status: Stage) -> AgingBucket {
        if status.is_closed() {
            return AgingBucket::NotApplicable;
        }
        self.parse_lenient(raw)
            .map_or(AgingBucket::NotApplicable, |created| classify(created, now, status))
    }
}

impl Default for TemporalClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_UTC_OFFSET)
    }
}
