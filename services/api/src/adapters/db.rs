//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Every statement touching a document carries the owner in its `WHERE` clause,
//! so a missing row and a row owned by someone else fail the same way.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use documind_core::domain::{
    Account, Document, DocumentPatch, DocumentStatus, Generation, Identity, NewDocument,
    Provisioned,
};
use documind_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct AccountRecord {
    id: String,
    email: String,
    is_pro: bool,
    created_at: DateTime<Utc>,
}
impl AccountRecord {
    fn to_domain(self) -> Account {
        Account {
            id: self.id,
            email: self.email,
            is_pro: self.is_pro,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    user_id: String,
    title: String,
    content: String,
    status: String,
    created_at: DateTime<Utc>,
}
impl DocumentRecord {
    fn to_domain(self) -> PortResult<Document> {
        let status = self
            .status
            .parse::<DocumentStatus>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Document {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct GenerationRecord {
    id: Uuid,
    document_id: Uuid,
    original_prompt: String,
    ai_output: String,
    created_at: DateTime<Utc>,
}
impl GenerationRecord {
    fn to_domain(self) -> Generation {
        Generation {
            id: self.id,
            document_id: self.document_id,
            original_prompt: self.original_prompt,
            ai_output: self.ai_output,
            created_at: self.created_at,
        }
    }
}

const DOCUMENT_COLUMNS: &str = "id, user_id, title, content, status, created_at";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn document_not_found(document_id: Uuid) -> PortError {
    PortError::NotFound(format!("Document {} not found", document_id))
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn ensure_account(&self, identity: &Identity) -> PortResult<Provisioned> {
        let inserted = sqlx::query(
            "INSERT INTO users (id, email, is_pro) VALUES ($1, $2, FALSE) ON CONFLICT (id) DO NOTHING",
        )
        .bind(&identity.user_id)
        .bind(identity.email_or_sentinel())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?
        .rows_affected();

        let record = sqlx::query_as::<_, AccountRecord>(
            "SELECT id, email, is_pro, created_at FROM users WHERE id = $1",
        )
        .bind(&identity.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("User {} not found", identity.user_id))
            }
            _ => unexpected(e),
        })?;

        Ok(Provisioned {
            account: record.to_domain(),
            created: inserted == 1,
        })
    }

    async fn delete_account(&self, user_id: &str) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn create_document(&self, owner: &str, document: &NewDocument) -> PortResult<Document> {
        let sql = format!(
            "INSERT INTO documents (id, user_id, title, content, status) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            DOCUMENT_COLUMNS
        );
        sqlx::query_as::<_, DocumentRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner)
            .bind(document.title())
            .bind(document.content())
            .bind(DocumentStatus::default().as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }

    async fn list_documents(&self, owner: &str) -> PortResult<Vec<Document>> {
        let sql = format!(
            "SELECT {} FROM documents WHERE user_id = $1 ORDER BY created_at DESC",
            DOCUMENT_COLUMNS
        );
        let records = sqlx::query_as::<_, DocumentRecord>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_owned_document(&self, owner: &str, document_id: Uuid) -> PortResult<Document> {
        let sql = format!(
            "SELECT {} FROM documents WHERE id = $1 AND user_id = $2",
            DOCUMENT_COLUMNS
        );
        sqlx::query_as::<_, DocumentRecord>(&sql)
            .bind(document_id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| document_not_found(document_id))?
            .to_domain()
    }

    async fn update_owned_document(
        &self,
        owner: &str,
        document_id: Uuid,
        patch: &DocumentPatch,
    ) -> PortResult<Document> {
        let sql = format!(
            "UPDATE documents SET title = COALESCE($3, title), content = COALESCE($4, content), \
             status = COALESCE($5, status) WHERE id = $1 AND user_id = $2 RETURNING {}",
            DOCUMENT_COLUMNS
        );
        sqlx::query_as::<_, DocumentRecord>(&sql)
            .bind(document_id)
            .bind(owner)
            .bind(patch.title.as_deref())
            .bind(patch.content.as_deref())
            .bind(patch.status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| document_not_found(document_id))?
            .to_domain()
    }

    async fn delete_owned_document(&self, owner: &str, document_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND user_id = $2")
            .bind(document_id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(document_not_found(document_id));
        }
        Ok(())
    }

    async fn create_generation(
        &self,
        owner: &str,
        document_id: Uuid,
        original_prompt: &str,
        ai_output: &str,
    ) -> PortResult<Generation> {
        // The SELECT yields no row unless the caller owns the document.
        let record = sqlx::query_as::<_, GenerationRecord>(
            "INSERT INTO generations (id, document_id, original_prompt, ai_output) \
             SELECT $1, d.id, $3, $4 FROM documents d WHERE d.id = $2 AND d.user_id = $5 \
             RETURNING id, document_id, original_prompt, ai_output, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(document_id)
        .bind(original_prompt)
        .bind(ai_output)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| document_not_found(document_id))?;

        Ok(record.to_domain())
    }

    async fn list_generations(
        &self,
        owner: &str,
        document_id: Uuid,
    ) -> PortResult<Vec<Generation>> {
        let records = sqlx::query_as::<_, GenerationRecord>(
            "SELECT g.id, g.document_id, g.original_prompt, g.ai_output, g.created_at \
             FROM generations g JOIN documents d ON d.id = g.document_id \
             WHERE g.document_id = $1 AND d.user_id = $2 \
             ORDER BY g.created_at DESC",
        )
        .bind(document_id)
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
