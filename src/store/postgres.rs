//! PostgreSQL implementation of the relational store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::{InvestmentFilter, InvestmentRepository, StatusUpdate, StoreError};
use crate::config::AppConfig;
use crate::domain::{
    FileId, Investment, InvestmentEvent, InvestmentFile, InvestmentId, InvestmentStatus, Offer,
    OfferId, Role, UserId, UserProfile,
};

const INVESTMENT_COLUMNS: &str = "id, user_id, offer_id, amount, status, reason, created_at, \
     updated_at, completed_at, deleted_at";

const FILE_COLUMNS: &str =
    "id, investment_id, file_name, file_size, mime_type, storage_path, created_at, uploaded_by";

#[derive(sqlx::FromRow)]
struct InvestmentRow {
    id: Uuid,
    user_id: Uuid,
    offer_id: Uuid,
    amount: i64,
    status: String,
    reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<InvestmentRow> for Investment {
    type Error = StoreError;

    fn try_from(row: InvestmentRow) -> Result<Self, Self::Error> {
        let status: InvestmentStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("investment {}: {e}", row.id)))?;
        Ok(Self {
            id: InvestmentId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            offer_id: OfferId::from_uuid(row.offer_id),
            amount: row.amount,
            status,
            reason: row.reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FileRow {
    id: Uuid,
    investment_id: Uuid,
    file_name: String,
    file_size: i64,
    mime_type: String,
    storage_path: String,
    created_at: DateTime<Utc>,
    uploaded_by: Uuid,
}

impl From<FileRow> for InvestmentFile {
    fn from(row: FileRow) -> Self {
        Self {
            id: FileId::from_uuid(row.id),
            investment_id: InvestmentId::from_uuid(row.investment_id),
            file_name: row.file_name,
            file_size: row.file_size,
            mime_type: row.mime_type,
            storage_path: row.storage_path,
            created_at: row.created_at,
            uploaded_by: UserId::from_uuid(row.uploaded_by),
        }
    }
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the pool settings from `config` and applies pending
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database is unreachable or a migration
    /// fails.
    pub async fn connect(config: &AppConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl InvestmentRepository for PgStore {
    async fn find_investment(&self, id: InvestmentId) -> Result<Option<Investment>, StoreError> {
        let row = sqlx::query_as::<_, InvestmentRow>(&format!(
            "SELECT {INVESTMENT_COLUMNS} FROM investments WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Investment::try_from).transpose()
    }

    async fn list_investments(
        &self,
        filter: &InvestmentFilter,
    ) -> Result<(Vec<Investment>, u64), StoreError> {
        let owner = filter.owner.map(Uuid::from);
        let status = filter.status.map(InvestmentStatus::as_str);
        let limit = i64::try_from(filter.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(filter.offset).unwrap_or(i64::MAX);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM investments \
             WHERE deleted_at IS NULL \
               AND ($1::uuid IS NULL OR user_id = $1) \
               AND ($2::text IS NULL OR status = $2)",
        )
        .bind(owner)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, InvestmentRow>(&format!(
            "SELECT {INVESTMENT_COLUMNS} FROM investments \
             WHERE deleted_at IS NULL \
               AND ($1::uuid IS NULL OR user_id = $1) \
               AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(owner)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let investments = rows
            .into_iter()
            .map(Investment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((investments, u64::try_from(total).unwrap_or_default()))
    }

    async fn find_offer(&self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        let row = sqlx::query_as::<
            _,
            (
                Uuid,
                String,
                String,
                i64,
                i64,
                String,
                DateTime<Utc>,
                DateTime<Utc>,
                DateTime<Utc>,
            ),
        >(
            "SELECT id, name, description, target_amount, min_investment, status, end_at, \
             created_at, updated_at FROM offers WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(
                id,
                name,
                description,
                target_amount,
                min_investment,
                status,
                end_at,
                created_at,
                updated_at,
            )| Offer {
                id: OfferId::from_uuid(id),
                name,
                description,
                target_amount,
                min_investment,
                status,
                end_at,
                created_at,
                updated_at,
            },
        ))
    }

    async fn find_user(&self, id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, Option<String>, Option<String>, String)>(
            "SELECT id, email, first_name, last_name, role FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, email, first_name, last_name, role)| {
            let role: Role = role
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("user {id}: {e}")))?;
            Ok(UserProfile {
                id: UserId::from_uuid(id),
                email,
                first_name,
                last_name,
                role,
            })
        })
        .transpose()
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<Option<Investment>, StoreError> {
        let row = sqlx::query_as::<_, InvestmentRow>(&format!(
            "UPDATE investments \
             SET status = $3, reason = COALESCE($4, reason), \
                 completed_at = COALESCE($5, completed_at), updated_at = $6 \
             WHERE id = $1 AND status = $2 AND deleted_at IS NULL \
             RETURNING {INVESTMENT_COLUMNS}"
        ))
        .bind(update.investment_id.as_uuid())
        .bind(update.expected.as_str())
        .bind(update.next.as_str())
        .bind(update.reason.as_deref())
        .bind(update.completed_at())
        .bind(update.at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Investment::try_from).transpose()
    }

    async fn list_files(
        &self,
        investment_id: InvestmentId,
    ) -> Result<Vec<InvestmentFile>, StoreError> {
        let rows = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {FILE_COLUMNS} FROM investment_files \
             WHERE investment_id = $1 ORDER BY created_at ASC"
        ))
        .bind(investment_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(InvestmentFile::from).collect())
    }

    async fn find_file(
        &self,
        investment_id: InvestmentId,
        file_id: FileId,
    ) -> Result<Option<InvestmentFile>, StoreError> {
        let row = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {FILE_COLUMNS} FROM investment_files WHERE id = $1 AND investment_id = $2"
        ))
        .bind(file_id.as_uuid())
        .bind(investment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(InvestmentFile::from))
    }

    async fn insert_file(&self, file: &InvestmentFile) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO investment_files ({FILE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(file.id.as_uuid())
        .bind(file.investment_id.as_uuid())
        .bind(&file.file_name)
        .bind(file.file_size)
        .bind(&file.mime_type)
        .bind(&file.storage_path)
        .bind(file.created_at)
        .bind(file.uploaded_by.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_file(
        &self,
        investment_id: InvestmentId,
        file_id: FileId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM investment_files WHERE id = $1 AND investment_id = $2")
            .bind(file_id.as_uuid())
            .bind(investment_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_event(&self, event: &InvestmentEvent) -> Result<(), StoreError> {
        let payload = serde_json::to_value(event)?;
        sqlx::query(
            "INSERT INTO investment_events (investment_id, event_type, actor_id, payload) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(event.investment_id().as_uuid())
        .bind(event.event_type_str())
        .bind(event.actor().as_uuid())
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
