//! Role-gated document approval workflow with an audit trail and SLA aging.
//!
//! Docflow moves business documents (invoices, expense records) through a
//! fixed thirteen-stage approval pipeline where:
//!
//! - **One transition table** decides which role may move a document from
//!   which stage to which, for both enforcement and the actions offered in a UI
//! - **Owner is derived** from the target stage alone, never from the actor
//! - **Every accepted move is audited** with one immutable history entry,
//!   written atomically with the status change
//! - **Aging is derived**, not stored: open documents are bucketed by whole
//!   days since creation against an injected clock
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DocumentService<S, C>                            │
//! │                                                                         │
//! │   1. Load document from store                                           │
//! │   2. decide(document, request, now) → status + owner + history entry    │
//! │   3. Store applies it only if the status is still the one validated     │
//! │      (status update and history append commit together)                 │
//! │                                                                         │
//! │   dashboard: list → filter → sort → aggregate → paginate                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docflow::{
//!     DocumentService, InMemoryStore, NewDocument, Role, ServiceConfig, Stage, SystemClock,
//!     TransitionRequest,
//! };
//!
//! let service = DocumentService::new(InMemoryStore::new(), SystemClock, ServiceConfig::default()).await?;
//!
//! let doc = service
//!     .create_document(NewDocument::new("INV-2024-001", "Invoice", "Printer toner", "John Doe"))
//!     .await?;
//!
//! service
//!     .transition(TransitionRequest::new(doc.id.clone(), Stage::Draft, Role::Requester, Stage::Submitted))
//!     .await?;
//! ```
//!
//! # Feature Flags
//!
//! - `postgres`: enables [`PgStore`] for production use with PostgreSQL
//!
//! # Design Documentation
//!
//! See `DESIGN.md` for architectural decisions and open questions.

pub mod audit;
mod clock;
mod config;
mod document;
mod error;
pub mod query;
mod role;
mod service;
mod stage;
pub mod store;
pub mod temporal;
mod transition;
pub mod visualization;

pub use audit::{AuditLog, HistoryEntry, HistoryId, NewHistoryEntry};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ServiceConfig;
pub use document::{Document, DocumentId, NewDocument};
pub use error::{Error, Result};
pub use query::{
    CardFilter, DashboardState, DashboardStats, DocumentQuery, Page, QueryEngine, StatusFilter,
};
pub use role::{Owner, Role};
pub use service::{Dashboard, DocumentService};
pub use stage::{Connector, MILESTONES, MilestoneProgress, Stage, StageEntry, StageRegistry};
#[cfg(feature = "postgres")]
pub use store::PgStore;
pub use store::{AppliedTransition, AuditStore, Catalog, DocumentStore, InMemoryStore};
pub use temporal::{AgingBucket, TemporalClassifier};
pub use transition::{
    RULES, Transition, TransitionEngine, TransitionKind, TransitionOption, TransitionRequest,
    TransitionRule, TransitionTable,
};
pub use visualization::{StateDefinition, StateMachineDefinition, TransitionDefinition};
