//! Service configuration.

use time::UtcOffset;

use crate::query::DEFAULT_PAGE_SIZE;
use crate::temporal::{DEFAULT_UTC_OFFSET, TemporalClassifier};

/// Configuration for [`DocumentService`](crate::DocumentService).
///
/// # Example
///
/// ```
/// use docflow::ServiceConfig;
/// use time::macros::offset;
///
/// let config = ServiceConfig {
///     page_size: 50,
///     utc_offset: offset!(+7),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Documents per dashboard page.
    ///
    /// Values below 1 are treated as 1. Default: 20.
    pub page_size: usize,

    /// Offset of the locale the stored timestamps are written in.
    ///
    /// Used both to parse creation timestamps and to stamp history entries.
    /// Default: +07:00.
    pub utc_offset: UtcOffset,

    /// Write generated timestamps with Thai numeral glyphs.
    ///
    /// Parsing accepts both digit forms regardless. Default: false.
    pub thai_numerals: bool,
}

impl ServiceConfig {
    pub fn classifier(&self) -> TemporalClassifier {
        TemporalClassifier::new(self.utc_offset).with_thai_numerals(self.thai_numerals)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            utc_offset: DEFAULT_UTC_OFFSET,
            thai_numerals: false,
        }
    }
}
