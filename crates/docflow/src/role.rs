//! Acting roles and responsible-party owners.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stage::Stage;

/// One of the four fixed roles. Roles are not hierarchical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Creates and (re)submits documents.
    #[serde(rename = "User")]
    Requester,
    /// Drives review, accounting and payment.
    #[serde(rename = "Accountant")]
    FinanceActor,
    /// Approves documents pending approval.
    #[serde(rename = "Manager")]
    ApprovingManager,
    /// View-only across the workflow.
    #[serde(rename = "Admin")]
    Administrator,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Requester,
        Role::FinanceActor,
        Role::ApprovingManager,
        Role::Administrator,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Requester => "User",
            Role::FinanceActor => "Accountant",
            Role::ApprovingManager => "Manager",
            Role::Administrator => "Admin",
        }
    }

    /// Generic actor label recorded in history entries, e.g. `"Accountant User"`.
    pub fn actor_label(self) -> String {
        format!("{} User", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| Error::UnknownRole(s.to_owned()))
    }
}

/// The department currently responsible for acting on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    #[serde(rename = "User")]
    Requester,
    #[serde(rename = "Accountant Dept")]
    FinanceDepartment,
    Management,
    Archive,
    /// Fallback for statuses outside the workflow.
    System,
}

impl Owner {
    pub fn as_str(self) -> &'static str {
        match self {
            Owner::Requester => "User",
            Owner::FinanceDepartment => "Accountant Dept",
            Owner::Management => "Management",
            Owner::Archive => "Archive",
            Owner::System => "System",
        }
    }

    /// Owner of a document that has just entered `stage`.
    ///
    /// Depends only on the resulting stage, never on who made the move.
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Draft | Stage::Rejected => Owner::Requester,
            Stage::Submitted
            | Stage::Review
            | Stage::Verified
            | Stage::Accounting
            | Stage::Posted
            | Stage::Payment
            | Stage::Paid
            | Stage::Failed => Owner::FinanceDepartment,
            Stage::Approval | Stage::Approved => Owner::Management,
            Stage::Completed => Owner::Archive,
        }
    }

    /// Owner for a raw status label; unknown labels map to [`Owner::System`].
    pub fn for_status_label(label: &str) -> Self {
        label
            .parse::<Stage>()
            .map(Owner::for_stage)
            .unwrap_or(Owner::System)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Owner {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [
            Owner::Requester,
            Owner::FinanceDepartment,
            Owner::Management,
            Owner::Archive,
            Owner::System,
        ]
        .into_iter()
        .find(|owner| owner.as_str() == s)
        .ok_or_else(|| Error::UnknownOwner(s.to_owned()))
    }
}
