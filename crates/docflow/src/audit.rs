//! Append-only audit trail of accepted transitions.

use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentId};
use crate::error::{Error, Result};
use crate::stage::Stage;
use crate::transition::TransitionEngine;

/// Insertion-ordered identifier of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(pub i64);

impl std::fmt::Display for HistoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A history entry that has not been recorded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub document_id: DocumentId,
    pub from_status: Stage,
    pub to_status: Stage,
    /// Human description of the move.
    pub action_label: String,
    /// Role and generic actor label, e.g. `"Manager User"`.
    pub acted_by: String,
    pub acted_at: String,
    pub comment: Option<String>,
}

impl NewHistoryEntry {
    /// Check required fields and chain contiguity.
    ///
    /// `previous` is the `to_status` of the latest recorded entry for the same
    /// document, if any.
    pub fn validate(&self, previous: Option<Stage>) -> Result<()> {
        let malformed = |reason| Err(Error::malformed_entry(self.document_id.as_str(), reason));

        if self.document_id.is_empty() {
            return malformed("missing document id");
        }
        if self.acted_by.trim().is_empty() {
            return malformed("missing actor");
        }
        if self.from_status == self.to_status {
            return malformed("from and to status are the same");
        }
        if previous.is_some_and(|previous| previous != self.from_status) {
            return malformed("from status does not continue the history chain");
        }
        Ok(())
    }

    /// Attach a recorded id.
    pub fn into_entry(self, id: HistoryId) -> HistoryEntry {
        HistoryEntry {
            id,
            document_id: self.document_id,
            from_status: self.from_status,
            to_status: self.to_status,
            action_label: self.action_label,
            acted_by: self.acted_by,
            acted_at: self.acted_at,
            comment: self.comment,
        }
    }
}

/// An immutable record of one accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub document_id: DocumentId,
    pub from_status: Stage,
    pub to_status: Stage,
    pub action_label: String,
    pub acted_by: String,
    pub acted_at: String,
    pub comment: Option<String>,
}

/// Insertion-ordered collection of history entries across documents.
///
/// Entries can only be appended. Ids increase strictly with insertion.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<HistoryEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from entries read back from storage, ordered by id.
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.sort_by_key(|entry| entry.id);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_id(&self) -> HistoryId {
        HistoryId(self.entries.last().map_or(1, |entry| entry.id.0 + 1))
    }

    /// Validate and record an entry. Malformed entries are not recorded.
    pub fn append(&mut self, entry: NewHistoryEntry) -> Result<&HistoryEntry> {
        let previous = self.latest(&entry.document_id).map(|e| e.to_status);
        entry.validate(previous)?;

        let id = self.next_id();
        self.entries.push(entry.into_entry(id));
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Entries for a document, oldest first.
    pub fn chain<'a>(&'a self, document_id: &'a DocumentId) -> impl Iterator<Item = &'a HistoryEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| &entry.document_id == document_id)
    }

    /// Entries for a document, newest first.
    pub fn history(&self, document_id: &DocumentId) -> Vec<HistoryEntry> {
        let mut entries: Vec<_> = self.chain(document_id).cloned().collect();
        entries.reverse();
        entries
    }

    /// The most recent entry for a document.
    pub fn latest(&self, document_id: &DocumentId) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .rev()
            .find(|entry| &entry.document_id == document_id)
    }

    /// Status reached by replaying a document's entries from `initial`.
    pub fn replay(&self, document_id: &DocumentId, initial: Stage) -> Stage {
        TransitionEngine::replay(initial, self.chain(document_id))
    }

    /// Check that the recorded history explains `document`'s stored status.
    ///
    /// The chain must start at Draft, be contiguous, and end at the current status.
    pub fn verify(&self, document: &Document) -> Result<()> {
        let mut expected_from = Stage::Draft;
        for entry in self.chain(&document.id) {
            if entry.from_status != expected_from {
                return Err(Error::malformed_entry(
                    document.id.as_str(),
                    "history chain is not contiguous",
                ));
            }
            expected_from = entry.to_status;
        }

        if expected_from != document.current_status {
            return Err(Error::malformed_entry(
                document.id.as_str(),
                "history does not end at the current status",
            ));
        }
        Ok(())
    }
}
