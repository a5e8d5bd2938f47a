//! Storage layer: relational records and attachment blobs.
//!
//! The relational side sits behind [`InvestmentRepository`] with a
//! PostgreSQL implementation ([`PgStore`]) and an in-memory one
//! ([`MemoryStore`]). File contents go through [`BlobStore`], backed by the
//! local filesystem ([`FsBlobStore`]) or memory ([`MemoryBlobStore`]).

pub mod blob;
pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    FileId, Investment, InvestmentEvent, InvestmentFile, InvestmentId, InvestmentStatus, Offer,
    OfferId, UserId, UserProfile,
};

pub use blob::{BlobError, BlobStore, FsBlobStore, MemoryBlobStore};
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Relational storage failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failure at startup.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Event payload could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row holds a value the domain does not recognise.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Filter and page for [`InvestmentRepository::list_investments`].
#[derive(Debug, Clone, Default)]
pub struct InvestmentFilter {
    /// Restrict to investments owned by this user.
    pub owner: Option<UserId>,
    /// Restrict to one status.
    pub status: Option<InvestmentStatus>,
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

/// Conditional status change.
///
/// Applied only if the stored status still equals `expected`.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    /// Target investment.
    pub investment_id: InvestmentId,
    /// Status observed when the transition was authorized.
    pub expected: InvestmentStatus,
    /// New status.
    pub next: InvestmentStatus,
    /// Justification to store; `None` keeps the stored value.
    pub reason: Option<String>,
    /// Mutation time; also the completion time when `next` is `completed`.
    pub at: DateTime<Utc>,
}

impl StatusUpdate {
    /// Completion timestamp to store for this update.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        (self.next == InvestmentStatus::Completed).then_some(self.at)
    }
}

/// Relational data access used by the service layer.
#[async_trait]
pub trait InvestmentRepository: Send + Sync + fmt::Debug {
    /// Loads an investment, soft-deleted rows included.
    async fn find_investment(&self, id: InvestmentId) -> Result<Option<Investment>, StoreError>;

    /// Lists live investments newest first; returns the page and the total
    /// number of matching rows.
    async fn list_investments(
        &self,
        filter: &InvestmentFilter,
    ) -> Result<(Vec<Investment>, u64), StoreError>;

    /// Loads an offer.
    async fn find_offer(&self, id: OfferId) -> Result<Option<Offer>, StoreError>;

    /// Loads a user profile.
    async fn find_user(&self, id: UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Applies a conditional status change. Returns `None` when the stored
    /// status no longer matches [`StatusUpdate::expected`].
    async fn update_status(&self, update: &StatusUpdate) -> Result<Option<Investment>, StoreError>;

    /// Lists attachment metadata of an investment, oldest first.
    async fn list_files(&self, investment_id: InvestmentId)
    -> Result<Vec<InvestmentFile>, StoreError>;

    /// Loads one attachment of an investment.
    async fn find_file(
        &self,
        investment_id: InvestmentId,
        file_id: FileId,
    ) -> Result<Option<InvestmentFile>, StoreError>;

    /// Stores attachment metadata.
    async fn insert_file(&self, file: &InvestmentFile) -> Result<(), StoreError>;

    /// Deletes attachment metadata. Returns `false` if nothing matched.
    async fn delete_file(
        &self,
        investment_id: InvestmentId,
        file_id: FileId,
    ) -> Result<bool, StoreError>;

    /// Appends an event to the audit log.
    async fn append_event(&self, event: &InvestmentEvent) -> Result<(), StoreError>;
}
