//! Role-gated transition table and decision logic.
//!
//! The whole business rule is one static table of
//! `(role, from-states) → target` rows. Both the enforcement point
//! ([`TransitionEngine::decide`]) and any UI deciding which actions to offer
//! ([`TransitionTable::options`]) query the same rows.
//!
//! ```text
//! Draft ─┬─► Submitted ─► Review ─► Verified ─► Approval ─► Approved ─► Accounting
//!        │      ▲                                                           │
//! Rejected ─────┘          ◄── reject from any open stage ──               ▼
//!                                         Completed ◄─ Paid ◄─ Payment ◄─ Posted
//! ```

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::audit::{HistoryEntry, NewHistoryEntry};
use crate::document::{Document, DocumentId};
use crate::error::{Error, Result};
use crate::role::{Owner, Role};
use crate::stage::{Stage, StageRegistry};
use crate::temporal::TemporalClassifier;

/// Whether a rule moves the document forward or sends it back for rework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Advances the document along the normal path.
    Forward,
    /// Returns the document to its requester.
    Reject,
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// Roles permitted to take this action.
    pub roles: &'static [Role],
    /// Stages the action is available from.
    pub from: &'static [Stage],
    /// Stage the document moves to.
    pub to: Stage,
    pub kind: TransitionKind,
    /// Short name of the action, as shown on its button.
    pub action: &'static str,
}

impl TransitionRule {
    fn matches(&self, role: Role, from: Stage) -> bool {
        self.roles.contains(&role) && self.from.contains(&from)
    }
}

/// Every stage a document can be rejected from.
const REJECTABLE: [Stage; 9] = [
    Stage::Submitted,
    Stage::Review,
    Stage::Verified,
    Stage::Approval,
    Stage::Approved,
    Stage::Accounting,
    Stage::Posted,
    Stage::Payment,
    Stage::Failed,
];

const REQUESTER: &[Role] = &[Role::Requester];
const FINANCE: &[Role] = &[Role::FinanceActor];
const MANAGER: &[Role] = &[Role::ApprovingManager];
const REVIEWERS: &[Role] = &[Role::FinanceActor, Role::ApprovingManager];

const fn forward(
    roles: &'static [Role],
    from: &'static [Stage],
    to: Stage,
    action: &'static str,
) -> TransitionRule {
    TransitionRule {
        roles,
        from,
        to,
        kind: TransitionKind::Forward,
        action,
    }
}

/// The complete workflow. Administrator appears in no row.
pub static RULES: [TransitionRule; 11] = [
    forward(REQUESTER, &[Stage::Draft, Stage::Rejected], Stage::Submitted, "Submit"),
    forward(FINANCE, &[Stage::Submitted], Stage::Review, "Start review"),
    forward(FINANCE, &[Stage::Review], Stage::Verified, "Verify"),
    forward(FINANCE, &[Stage::Verified], Stage::Approval, "Request approval"),
    forward(MANAGER, &[Stage::Approval], Stage::Approved, "Approve"),
    forward(FINANCE, &[Stage::Approved], Stage::Accounting, "Take for accounting"),
    forward(FINANCE, &[Stage::Accounting], Stage::Posted, "Post"),
    forward(FINANCE, &[Stage::Posted], Stage::Payment, "Prepare payment"),
    forward(FINANCE, &[Stage::Payment], Stage::Paid, "Confirm paid"),
    forward(FINANCE, &[Stage::Paid, Stage::Failed], Stage::Completed, "Archive"),
    TransitionRule {
        roles: REVIEWERS,
        from: &REJECTABLE,
        to: Stage::Rejected,
        kind: TransitionKind::Reject,
        action: "Reject",
    },
];

/// A legal action for a role on a document in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionOption {
    /// Stage the action moves the document to.
    pub target: Stage,
    pub kind: TransitionKind,
    /// Button label, taken from the rule.
    pub action: &'static str,
}

impl From<&TransitionRule> for TransitionOption {
    fn from(rule: &TransitionRule) -> Self {
        Self {
            target: rule.to,
            kind: rule.kind,
            action: rule.action,
        }
    }
}

/// Query interface over [`RULES`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionTable;

impl TransitionTable {
    /// Every rule, in table order.
    pub fn rules(&self) -> &'static [TransitionRule] {
        &RULES
    }

    /// Actions `role` may take on a document in `current`, forward first.
    pub fn options(&self, role: Role, current: Stage) -> Vec<TransitionOption> {
        RULES
            .iter()
            .filter(|rule| rule.matches(role, current))
            .map(TransitionOption::from)
            .collect()
    }

    /// The rule permitting `role` to move a document from `from` to `to`.
    pub fn find(&self, role: Role, from: Stage, to: Stage) -> Option<&'static TransitionRule> {
        RULES
            .iter()
            .find(|rule| rule.to == to && rule.matches(role, from))
    }

    /// Whether `role` may move a document from `from` to `to`.
    pub fn is_allowed(&self, role: Role, from: Stage, to: Stage) -> bool {
        self.find(role, from, to).is_some()
    }

    /// Whether any role can leave `stage`.
    pub fn has_exit(&self, stage: Stage) -> bool {
        RULES.iter().any(|rule| rule.from.contains(&stage))
    }
}

/// A request to move a document from `expected_status` to `target`.
///
/// `expected_status` is the status the caller saw when it chose the action.
/// If the document has moved on since, the request fails with
/// [`Error::Conflict`] instead of being re-validated against the new status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    /// Document to move.
    pub document_id: DocumentId,
    /// Status the caller validated against.
    pub expected_status: Stage,
    /// Role the actor is acting as.
    pub role: Role,
    /// Requested next status.
    pub target: Stage,
    /// Optional free-text note, recorded on the history entry.
    pub comment: Option<String>,
}

impl TransitionRequest {
    pub fn new(
        document_id: impl Into<DocumentId>,
        expected_status: Stage,
        role: Role,
        target: Stage,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            expected_status,
            role,
            target,
            comment: None,
        }
    }

    /// Attach a comment. Blank comments are dropped when the entry is built.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// An accepted transition, ready to be written.
///
/// The store must apply the status/owner change and append `entry` as one
/// unit, and only if the document is still in `expected_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub document_id: DocumentId,
    pub expected_status: Stage,
    pub new_status: Stage,
    pub new_owner: Owner,
    pub entry: NewHistoryEntry,
}

impl Transition {
    /// The document as it looks once this transition is applied.
    pub fn apply_to(&self, document: &Document) -> Document {
        Document {
            current_status: self.new_status,
            owner: self.new_owner,
            ..document.clone()
        }
    }

    /// Check that `entry` records exactly this transition.
    ///
    /// Stores call this before writing so a status change can never be
    /// stored next to an entry for another document or another move.
    pub fn check_entry(&self) -> Result<()> {
        let id = self.document_id.as_str();
        if self.entry.document_id != self.document_id {
            return Err(Error::malformed_entry(id, "entry belongs to another document"));
        }
        if self.entry.from_status != self.expected_status {
            return Err(Error::malformed_entry(id, "entry does not start at the expected status"));
        }
        if self.entry.to_status != self.new_status {
            return Err(Error::malformed_entry(id, "entry does not end at the new status"));
        }
        Ok(())
    }
}

/// Validates transition requests and derives their outcome.
///
/// Pure: reads nothing but its arguments, writes nothing.
#[derive(Debug, Clone, Default)]
pub struct TransitionEngine {
    registry: StageRegistry,
    classifier: TemporalClassifier,
    table: TransitionTable,
}

impl TransitionEngine {
    pub fn new(registry: StageRegistry, classifier: TemporalClassifier) -> Self {
        Self {
            registry,
            classifier,
            table: TransitionTable,
        }
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Legal next actions for `role` on `document`.
    pub fn options(&self, document: &Document, role: Role) -> Vec<TransitionOption> {
        if self.registry.is_terminal(document.current_status) {
            return Vec::new();
        }
        self.table.options(role, document.current_status)
    }

    /// Decide whether `request` is legal against `document` as read.
    ///
    /// Returns the new status, the owner for that status and a complete
    /// history entry stamped with `now`. Fails with [`Error::Conflict`] if
    /// `document` is no longer in the request's expected status.
    pub fn decide(
        &self,
        document: &Document,
        request: &TransitionRequest,
        now: OffsetDateTime,
    ) -> Result<Transition> {
        let from = document.current_status;
        let illegal = || Error::illegal_transition(request.role, from, request.target);

        if from != request.expected_status {
            debug!(
                document_id = %document.id,
                expected = %request.expected_status,
                actual = %from,
                "Request is stale"
            );
            return Err(Error::conflict(
                document.id.clone(),
                request.expected_status,
                from,
            ));
        }

        if self.registry.is_terminal(from) {
            debug!(document_id = %document.id, status = %from, "Document is terminal");
            return Err(illegal());
        }
        if self.table.find(request.role, from, request.target).is_none() {
            return Err(illegal());
        }

        let new_status = request.target;
        let entry = NewHistoryEntry {
            document_id: document.id.clone(),
            from_status: from,
            to_status: new_status,
            action_label: format!("Changed status to {}", self.registry.label(new_status)),
            acted_by: request.role.actor_label(),
            acted_at: self.classifier.format(now),
            comment: request
                .comment
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned),
        };

        Ok(Transition {
            document_id: document.id.clone(),
            expected_status: from,
            new_status,
            new_owner: Owner::for_stage(new_status),
            entry,
        })
    }

    /// Fold one recorded history entry into a document.
    pub fn evolve(mut document: Document, entry: &HistoryEntry) -> Document {
        document.current_status = entry.to_status;
        document.owner = Owner::for_stage(entry.to_status);
        document
    }

    /// Status reached by replaying `entries` (oldest first) from `initial`.
    pub fn replay<'a>(initial: Stage, entries: impl IntoIterator<Item = &'a HistoryEntry>) -> Stage {
        entries
            .into_iter()
            .fold(initial, |_, entry| entry.to_status)
    }
}
