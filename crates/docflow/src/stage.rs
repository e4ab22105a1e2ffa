//! Workflow stages and the ordered stage registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One named step of the approval workflow.
///
/// The string id of each variant is the label stored in documents and
/// history rows (`"Draft"`, `"Submitted"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Draft,
    Submitted,
    Review,
    Verified,
    Approval,
    Approved,
    Accounting,
    Posted,
    Payment,
    Paid,
    Failed,
    Completed,
    Rejected,
}

impl Stage {
    /// Every stage, in canonical workflow order.
    pub const ALL: [Stage; 13] = [
        Stage::Draft,
        Stage::Submitted,
        Stage::Review,
        Stage::Verified,
        Stage::Approval,
        Stage::Approved,
        Stage::Accounting,
        Stage::Posted,
        Stage::Payment,
        Stage::Paid,
        Stage::Failed,
        Stage::Completed,
        Stage::Rejected,
    ];

    /// The stage id as stored.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Draft => "Draft",
            Stage::Submitted => "Submitted",
            Stage::Review => "Review",
            Stage::Verified => "Verified",
            Stage::Approval => "Approval",
            Stage::Approved => "Approved",
            Stage::Accounting => "Accounting",
            Stage::Posted => "Posted",
            Stage::Payment => "Payment",
            Stage::Paid => "Paid",
            Stage::Failed => "Failed",
            Stage::Completed => "Completed",
            Stage::Rejected => "Rejected",
        }
    }

    /// Closed documents are finished for aging purposes.
    pub fn is_closed(self) -> bool {
        matches!(self, Stage::Completed | Stage::Rejected | Stage::Paid)
    }

    /// Terminal stages have no outgoing transition for any role.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| Error::UnknownStage(s.to_owned()))
    }
}

/// Display metadata for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEntry {
    pub id: Stage,
    pub display_label: String,
    pub display_color: String,
}

impl StageEntry {
    pub fn new(id: Stage, display_label: impl Into<String>, display_color: impl Into<String>) -> Self {
        Self {
            id,
            display_label: display_label.into(),
            display_color: display_color.into(),
        }
    }
}

/// Stages shown on the progress bar, in order.
pub const MILESTONES: [Stage; 6] = [
    Stage::Draft,
    Stage::Review,
    Stage::Approval,
    Stage::Accounting,
    Stage::Payment,
    Stage::Completed,
];

/// How far the connector after a milestone is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Connector {
    Empty,
    Half,
    Full,
}

/// Progress bar state for one milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MilestoneProgress {
    pub stage: Stage,
    pub label: String,
    pub reached: bool,
    /// Fill of the connector towards the next milestone. `None` for the last one.
    pub connector: Option<Connector>,
}

/// Ordered list of workflow stages with their display metadata.
///
/// The order is the canonical workflow order used for progress rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRegistry {
    entries: Vec<StageEntry>,
}

impl StageRegistry {
    /// Build a registry from catalog entries, rejecting repeated stage ids.
    pub fn from_entries(entries: Vec<StageEntry>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|earlier| earlier.id == entry.id) {
                return Err(Error::InvalidCatalog(format!(
                    "stage {} listed more than once",
                    entry.id
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The production stage catalog.
    pub fn standard() -> Self {
        let entries = [
            (Stage::Draft, "Draft", "#64748b"),
            (Stage::Submitted, "Submitted", "#2563eb"),
            (Stage::Review, "In Review", "#eab308"),
            (Stage::Verified, "Verified", "#0891b2"),
            (Stage::Approval, "Pending Approval", "#f97316"),
            (Stage::Approved, "Approved", "#059669"),
            (Stage::Accounting, "Accounting", "#4f46e5"),
            (Stage::Posted, "Posted", "#7c3aed"),
            (Stage::Payment, "Payment", "#9333ea"),
            (Stage::Paid, "Paid", "#16a34a"),
            (Stage::Failed, "Payment Failed", "#dc2626"),
            (Stage::Completed, "Completed", "#1e293b"),
            (Stage::Rejected, "Rejected", "#ef4444"),
        ]
        .into_iter()
        .map(|(id, label, color)| StageEntry::new(id, label, color))
        .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[StageEntry] {
        &self.entries
    }

    pub fn get(&self, stage: Stage) -> Option<&StageEntry> {
        self.entries.iter().find(|entry| entry.id == stage)
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.get(stage).is_some()
    }

    /// Display label for a stage, falling back to its id.
    pub fn label(&self, stage: Stage) -> &str {
        self.get(stage)
            .map(|entry| entry.display_label.as_str())
            .unwrap_or(stage.as_str())
    }

    /// Position of a stage in workflow order.
    pub fn position(&self, stage: Stage) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == stage)
    }

    /// Whether a document in `stage` can never move again.
    pub fn is_terminal(&self, stage: Stage) -> bool {
        stage.is_terminal()
    }

    /// Progress bar state for a document currently in `current`.
    ///
    /// A stage missing from the registry is shown as the first registry stage.
    pub fn progress(&self, current: Stage) -> Vec<MilestoneProgress> {
        let current_idx = self.position(current).or(if self.entries.is_empty() {
            None
        } else {
            Some(0)
        });

        let reached = |stage: Stage| match (current_idx, self.position(stage)) {
            (Some(current), Some(milestone)) => current >= milestone,
            _ => false,
        };

        MILESTONES
            .iter()
            .enumerate()
            .map(|(i, &stage)| {
                let is_reached = reached(stage);
                let connector = MILESTONES.get(i + 1).map(|&next| {
                    if reached(next) {
                        Connector::Full
                    } else if is_reached {
                        Connector::Half
                    } else {
                        Connector::Empty
                    }
                });

                MilestoneProgress {
                    stage,
                    label: self.label(stage).to_owned(),
                    reached: is_reached,
                    connector,
                }
            })
            .collect()
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
