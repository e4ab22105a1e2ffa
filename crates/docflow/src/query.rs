//! Dashboard filtering, aggregation and pagination.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::document::Document;
use crate::error::Result;
use crate::stage::Stage;
use crate::temporal::{AgingBucket, TemporalClassifier};

/// Documents per dashboard page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Exact status filter, or the `"All"` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Stage),
}

impl StatusFilter {
    pub fn matches(self, status: Stage) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(stage) => stage == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "All" {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Summary card selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardFilter {
    #[default]
    All,
    /// Open documents: not Completed, Rejected or Paid.
    Pending,
    Completed,
    Rejected,
    /// Open and exactly two days old.
    Near3,
    /// Open and three or more days old.
    Over3,
}

impl CardFilter {
    /// Selecting the active card again clears the selection.
    pub fn toggle(self, card: CardFilter) -> CardFilter {
        if self == card { CardFilter::All } else { card }
    }

    fn matches(self, status: Stage, bucket: AgingBucket) -> bool {
        match self {
            CardFilter::All => true,
            CardFilter::Pending => !status.is_closed(),
            CardFilter::Completed => status == Stage::Completed,
            CardFilter::Rejected => status == Stage::Rejected,
            CardFilter::Near3 => bucket == AgingBucket::NearDue,
            CardFilter::Over3 => bucket == AgingBucket::Overdue,
        }
    }
}

/// Filter inputs for a dashboard query. All predicates must pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentQuery {
    /// Case-insensitive substring of the document number or description.
    pub text_search: String,
    /// Stage filter from the status dropdown.
    pub status: StatusFilter,
    /// Active summary card.
    pub card: CardFilter,
}

impl DocumentQuery {
    /// Match a case-insensitive substring of the number or description.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_search = text.into();
        self
    }

    /// Restrict to one stage, or [`StatusFilter::All`].
    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Restrict to the documents counted by one summary card.
    pub fn with_card(mut self, card: CardFilter) -> Self {
        self.card = card;
        self
    }

    fn matches_text(&self, document: &Document) -> bool {
        let needle = self.text_search.to_lowercase();
        document.document_number.to_lowercase().contains(&needle)
            || document.description.to_lowercase().contains(&needle)
    }
}

/// Summary card counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub rejected: usize,
    pub near3: usize,
    pub over3: usize,
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page index actually shown.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    /// 1-based row number of the first item on this page.
    pub fn first_row(&self) -> usize {
        (self.page - 1) * self.page_size + 1
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            total_pages: self.total_pages,
            total_items: self.total_items,
            page_size: self.page_size,
        }
    }
}

/// Filters, sorts, counts and pages documents for the dashboard.
///
/// Pure over its inputs: the document collection and `now` are supplied by
/// the caller on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryEngine {
    classifier: TemporalClassifier,
    page_size: usize,
}

impl QueryEngine {
    pub fn new(classifier: TemporalClassifier, page_size: usize) -> Self {
        Self {
            classifier,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn classifier(&self) -> &TemporalClassifier {
        &self.classifier
    }

    /// Matching documents, most recently created first.
    ///
    /// Documents with unparseable timestamps come after all others, in no
    /// particular order.
    pub fn query<'a>(
        &self,
        documents: &'a [Document],
        query: &DocumentQuery,
        now: OffsetDateTime,
    ) -> Vec<&'a Document> {
        let mut matched: Vec<(Option<OffsetDateTime>, &Document)> = documents
            .iter()
            .filter_map(|document| {
                let created = self.classifier.parse_lenient(&document.created_at);
                let bucket = self.bucket(created, now, document.current_status);

                let keep = query.card.matches(document.current_status, bucket)
                    && query.status.matches(document.current_status)
                    && query.matches_text(document);
                keep.then_some((created, document))
            })
            .collect();

        matched.sort_by(|(a, _), (b, _)| newest_first(*a, *b));
        matched.into_iter().map(|(_, document)| document).collect()
    }

    /// Summary card counts over the whole collection.
    pub fn aggregate(&self, documents: &[Document], now: OffsetDateTime) -> DashboardStats {
        documents
            .iter()
            .fold(DashboardStats::default(), |mut stats, document| {
                let status = document.current_status;
                stats.total += 1;
                if !status.is_closed() {
                    stats.pending += 1;
                }
                match status {
                    Stage::Completed => stats.completed += 1,
                    Stage::Rejected => stats.rejected += 1,
                    _ => {}
                }
                match self.classifier.classify_raw(&document.created_at, now, status) {
                    AgingBucket::NearDue => stats.near3 += 1,
                    AgingBucket::Overdue => stats.over3 += 1,
                    AgingBucket::OnTrack | AgingBucket::NotApplicable => {}
                }
                stats
            })
    }

    /// Slice out one page. Out-of-range pages are clamped.
    pub fn paginate<T: Clone>(&self, items: &[T], page: usize) -> Page<T> {
        let total_items = items.len();
        let total_pages = total_items.div_ceil(self.page_size);
        let page = page.clamp(1, total_pages.max(1));
        let start = (page - 1) * self.page_size;
        let end = (start + self.page_size).min(total_items);

        Page {
            items: items[start.min(end)..end].to_vec(),
            page,
            total_pages,
            total_items,
            page_size: self.page_size,
        }
    }

    fn bucket(&self, created: Option<OffsetDateTime>, now: OffsetDateTime, status: Stage) -> AgingBucket {
        match created {
            Some(created) => self.classifier.classify(created, now, status),
            None => AgingBucket::NotApplicable,
        }
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new(TemporalClassifier::default(), DEFAULT_PAGE_SIZE)
    }
}

fn newest_first(a: Option<OffsetDateTime>, b: Option<OffsetDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Request-scoped dashboard inputs: filters plus the page being viewed.
///
/// Changing any filter input sends the view back to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardState {
    query: DocumentQuery,
    page: usize,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            query: DocumentQuery::default(),
            page: 1,
        }
    }

    pub fn query(&self) -> &DocumentQuery {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_text_search(&mut self, text: impl Into<String>) {
        self.query.text_search = text.into();
        self.page = 1;
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.query.status = status;
        self.page = 1;
    }

    /// Select a summary card, or clear it if it is already selected.
    pub fn toggle_card(&mut self, card: CardFilter) {
        self.query.card = self.query.card.toggle(card);
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        self.page = (self.page + 1).min(total_pages.max(1));
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}
