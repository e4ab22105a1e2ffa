//! PostgreSQL store implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{AppliedTransition, AuditStore, Catalog, DocumentStore};
use crate::audit::{HistoryEntry, HistoryId};
use crate::document::{Document, DocumentId};
use crate::error::{Error, Result};
use crate::stage::{Stage, StageEntry, StageRegistry};
use crate::transition::Transition;

/// Name of the unique constraint on `documents.document_number`.
const DOCUMENT_NUMBER_KEY: &str = "documents_document_number_key";

const DOCUMENT_COLUMNS: &str = "id, document_number, document_type, description, current_status, \
     created_by, created_at, owner";

const HISTORY_COLUMNS: &str = "id, document_id, from_status, to_status, action_label, acted_by, \
     acted_at, comment";

/// PostgreSQL-backed store for production use.
///
/// Uses row-level locking via `SELECT ... FOR UPDATE` on the `documents`
/// table. The status check, the status/owner update and the history insert
/// run in one transaction, so a concurrent writer either waits for the lock
/// and then sees the new status, or wins and makes the other one conflict.
///
/// # Database Schema
///
/// Requires tables in the `docflow` schema:
///
/// | Table            | Purpose                                          |
/// |------------------|--------------------------------------------------|
/// | `documents`      | Current state, unique `document_number`          |
/// | `history`        | Append-only audit trail with `BIGSERIAL` ids     |
/// | `stages`         | Ordered stage catalog with display metadata      |
/// | `document_types` | Document-type labels                             |
///
/// # Example
///
/// ```ignore
/// use docflow::{DocumentService, PgStore, ServiceConfig, SystemClock};
/// use sqlx::PgPool;
///
/// let pool = PgPool::connect("postgres://...").await?;
/// let store = PgStore::new(pool);
/// let service = DocumentService::new(store, SystemClock, ServiceConfig::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    document_number: String,
    document_type: String,
    description: String,
    current_status: String,
    created_by: String,
    created_at: String,
    owner: String,
}

impl TryFrom<DocumentRow> for Document {
    type Error = Error;

    fn try_from(row: DocumentRow) -> Result<Self> {
        Ok(Document {
            id: DocumentId::from(row.id),
            document_number: row.document_number,
            document_type: row.document_type,
            description: row.description,
            current_status: row.current_status.parse()?,
            created_by: row.created_by,
            created_at: row.created_at,
            owner: row.owner.parse()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: i64,
    document_id: String,
    from_status: String,
    to_status: String,
    action_label: String,
    acted_by: String,
    acted_at: String,
    comment: Option<String>,
}

impl TryFrom<HistoryRow> for HistoryEntry {
    type Error = Error;

    fn try_from(row: HistoryRow) -> Result<Self> {
        Ok(HistoryEntry {
            id: HistoryId(row.id),
            document_id: DocumentId::from(row.document_id),
            from_status: row.from_status.parse()?,
            to_status: row.to_status.parse()?,
            action_label: row.action_label,
            acted_by: row.acted_by,
            acted_at: row.acted_at,
            comment: row.comment,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StageRow {
    id: String,
    display_label: String,
    display_color: String,
}

impl PgStore {
    /// Create a new PostgreSQL store from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_duplicate_number(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(DOCUMENT_NUMBER_KEY)
        }
        _ => false,
    }
}

impl DocumentStore for PgStore {
    async fn create_document(&self, document: Document) -> Result<Document> {
        let result = sqlx::query(
            r#"INSERT INTO docflow.documents
               (id, document_number, document_type, description, current_status,
                created_by, created_at, owner)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(document.id.as_str())
        .bind(&document.document_number)
        .bind(&document.document_type)
        .bind(&document.description)
        .bind(document.current_status.as_str())
        .bind(&document.created_by)
        .bind(&document.created_at)
        .bind(document.owner.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(document),
            Err(err) if is_duplicate_number(&err) => {
                Err(Error::DuplicateDocumentNumber(document.document_number))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get_document(&self, id: &DocumentId) -> Result<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM docflow.documents WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Document::try_from).transpose()
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM docflow.documents ORDER BY inserted_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    async fn apply_transition(&self, transition: Transition) -> Result<AppliedTransition> {
        transition.check_entry()?;
        let mut tx = self.pool.begin().await?;
        let document_id = transition.document_id.as_str();

        // Acquire row-level lock and read the status as of now
        let status: Option<String> = sqlx::query_scalar(
            "SELECT current_status FROM docflow.documents WHERE id = $1 FOR UPDATE",
        )
        .bind(document_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(status) = status else {
            return Err(Error::DocumentNotFound(transition.document_id));
        };

        let actual: Stage = status.parse()?;
        if actual != transition.expected_status {
            debug!(
                document_id = %transition.document_id,
                expected = %transition.expected_status,
                actual = %actual,
                "Status changed before write"
            );
            // Transaction is rolled back on drop, releasing the lock
            return Err(Error::conflict(
                transition.document_id,
                transition.expected_status,
                actual,
            ));
        }

        let previous: Option<String> = sqlx::query_scalar(
            "SELECT to_status FROM docflow.history WHERE document_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(document_id)
        .fetch_optional(&mut *tx)
        .await?;
        let previous = previous.map(|s| s.parse::<Stage>()).transpose()?;
        transition.entry.validate(previous)?;

        let document: DocumentRow = sqlx::query_as(&format!(
            "UPDATE docflow.documents SET current_status = $2, owner = $3
             WHERE id = $1
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(document_id)
        .bind(transition.new_status.as_str())
        .bind(transition.new_owner.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let entry = &transition.entry;
        let recorded: HistoryRow = sqlx::query_as(&format!(
            "INSERT INTO docflow.history
             (document_id, from_status, to_status, action_label, acted_by, acted_at, comment)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {HISTORY_COLUMNS}"
        ))
        .bind(entry.document_id.as_str())
        .bind(entry.from_status.as_str())
        .bind(entry.to_status.as_str())
        .bind(&entry.action_label)
        .bind(&entry.acted_by)
        .bind(&entry.acted_at)
        .bind(entry.comment.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AppliedTransition {
            document: document.try_into()?,
            entry: recorded.try_into()?,
        })
    }
}

impl AuditStore for PgStore {
    async fn list_history(&self, id: &DocumentId) -> Result<Vec<HistoryEntry>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(&format!(
            "SELECT {HISTORY_COLUMNS} FROM docflow.history WHERE document_id = $1 ORDER BY id"
        ))
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HistoryEntry::try_from).collect()
    }
}

#[async_trait]
impl Catalog for PgStore {
    async fn stage_registry(&self) -> Result<StageRegistry> {
        let rows: Vec<StageRow> = sqlx::query_as(
            "SELECT id, display_label, display_color FROM docflow.stages ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| -> Result<StageEntry> {
                Ok(StageEntry::new(row.id.parse()?, row.display_label, row.display_color))
            })
            .collect::<Result<Vec<_>>>()?;

        StageRegistry::from_entries(entries)
    }

    async fn document_types(&self) -> Result<Vec<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM docflow.document_types ORDER BY position, name")
                .fetch_all(&self.pool)
                .await?;
        Ok(names)
    }
}
