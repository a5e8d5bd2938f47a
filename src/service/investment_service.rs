//! Investment service: workflow transitions and attachment management.

use std::sync::Arc;

use axum::body::Bytes;
use chrono::Utc;

use crate::domain::file_policy::{self, sanitize_file_name};
use crate::domain::{
    ActionDenied, Caller, FileId, Investment, InvestmentAction, InvestmentEvent,
    InvestmentFile, InvestmentId, InvestmentStatus, Offer, UploadPolicy, UserId, UserProfile,
};
use crate::error::{ApiError, messages};
use super::EventSink;
use crate::store::{BlobStore, InvestmentFilter, InvestmentRepository, StatusUpdate};

/// Investment together with the records rendered next to it.
#[derive(Debug, Clone)]
pub struct InvestmentDetail {
    /// The investment.
    pub investment: Investment,
    /// Offer it was placed against, if it still exists.
    pub offer: Option<Offer>,
    /// Owner profile; only loaded for administrators.
    pub owner: Option<UserProfile>,
}

/// A validated upload ready to be stored.
#[derive(Debug, Clone)]
pub struct NewUpload {
    /// Original file name.
    pub file_name: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// File contents.
    pub bytes: Bytes,
}

/// Orchestration layer for investment operations.
///
/// Every mutation follows the same pattern: load → ownership check →
/// policy check → one store mutation → emit event → return result.
#[derive(Debug, Clone)]
pub struct InvestmentService {
    repo: Arc<dyn InvestmentRepository>,
    blobs: Arc<dyn BlobStore>,
    events: EventSink,
    upload_policy: UploadPolicy,
}

impl InvestmentService {
    /// Creates a new `InvestmentService`.
    #[must_use]
    pub fn new(
        repo: Arc<dyn InvestmentRepository>,
        blobs: Arc<dyn BlobStore>,
        events: EventSink,
        upload_policy: UploadPolicy,
    ) -> Self {
        Self {
            repo,
            blobs,
            events,
            upload_policy,
        }
    }

    /// Sink receiving the events of every mutation.
    #[must_use]
    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Upload limits enforced by [`Self::upload_file`].
    #[must_use]
    pub fn upload_policy(&self) -> &UploadPolicy {
        &self.upload_policy
    }

    /// Maps a verified token subject to a caller.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on store failure.
    pub async fn resolve_caller(&self, user_id: UserId) -> Result<Option<Caller>, ApiError> {
        Ok(self
            .repo
            .find_user(user_id)
            .await?
            .map(|profile| Caller {
                user_id: profile.id,
                role: profile.role,
            }))
    }

    /// Loads a live investment the caller may access.
    async fn load_accessible(
        &self,
        caller: &Caller,
        id: InvestmentId,
    ) -> Result<Investment, ApiError> {
        let investment = self
            .repo
            .find_investment(id)
            .await?
            .filter(Investment::is_live)
            .ok_or(ApiError::NotFound(messages::INVESTMENT_NOT_FOUND))?;
        if !caller.may_access(investment.user_id) {
            tracing::warn!(user_id = %caller.user_id, investment_id = %id, "ownership check failed");
            return Err(ApiError::Forbidden(messages::FORBIDDEN));
        }
        Ok(investment)
    }

    /// Returns an investment with its offer and, for administrators, its
    /// owner profile.
    ///
    /// # Errors
    ///
    /// 404 if absent, 403 if a signer asks for someone else's investment.
    pub async fn get_detail(
        &self,
        caller: &Caller,
        id: InvestmentId,
    ) -> Result<InvestmentDetail, ApiError> {
        let investment = self.load_accessible(caller, id).await?;
        let offer = self.repo.find_offer(investment.offer_id).await?;
        let owner = if caller.role.is_admin() {
            self.repo.find_user(investment.user_id).await?
        } else {
            None
        };
        Ok(InvestmentDetail {
            investment,
            offer,
            owner,
        })
    }

    /// Lists investments visible to the caller: all for administrators, own
    /// for signers.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on store failure.
    pub async fn list_investments(
        &self,
        caller: &Caller,
        status: Option<InvestmentStatus>,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Investment>, u64), ApiError> {
        let filter = InvestmentFilter {
            owner: (!caller.role.is_admin()).then_some(caller.user_id),
            status,
            offset,
            limit,
        };
        Ok(self.repo.list_investments(&filter).await?)
    }

    /// Applies a workflow action.
    ///
    /// `reason` must already be validated for actions that require one; it
    /// is ignored for the others.
    ///
    /// # Errors
    ///
    /// 404 if absent, 403 on role or ownership mismatch, 400 when the
    /// transition table forbids the move or the status changed concurrently.
    pub async fn apply_action(
        &self,
        caller: &Caller,
        id: InvestmentId,
        action: InvestmentAction,
        reason: Option<String>,
    ) -> Result<Investment, ApiError> {
        let investment = self.load_accessible(caller, id).await?;
        let from = investment.status;

        action
            .authorize(caller, investment.user_id, from)
            .map_err(|denied| match denied {
                ActionDenied::NotPermitted => ApiError::Forbidden(messages::FORBIDDEN),
                ActionDenied::IllegalTransition { from, to } => ApiError::invalid(
                    "status",
                    format!("Niedozwolona zmiana statusu z „{from}” na „{to}”"),
                ),
            })?;

        let reason = if action.requires_reason() {
            reason
        } else {
            None
        };
        let update = StatusUpdate {
            investment_id: id,
            expected: from,
            next: action.target_status(),
            reason: reason.clone(),
            at: Utc::now(),
        };
        let updated = self.repo.update_status(&update).await?.ok_or_else(|| {
            ApiError::invalid(
                "status",
                "Status inwestycji został w międzyczasie zmieniony, odśwież dane",
            )
        })?;

        self.events
            .record(InvestmentEvent::StatusChanged {
                investment_id: id,
                action,
                from,
                to: updated.status,
                reason,
                actor: caller.user_id,
                timestamp: update.at,
            })
            .await;

        tracing::info!(investment_id = %id, ?action, %from, to = %updated.status, "investment status changed");
        Ok(updated)
    }

    /// Lists attachments of an investment.
    ///
    /// # Errors
    ///
    /// 404 if absent, 403 for foreign investments or while files are hidden
    /// for the current status.
    pub async fn list_files(
        &self,
        caller: &Caller,
        id: InvestmentId,
    ) -> Result<Vec<InvestmentFile>, ApiError> {
        let investment = self.load_accessible(caller, id).await?;
        if !file_policy::files_visible(investment.status) {
            return Err(ApiError::Forbidden(messages::FILES_UNAVAILABLE));
        }
        Ok(self.repo.list_files(id).await?)
    }

    /// Stores an attachment. The caller's role has already been checked and
    /// the upload validated against [`Self::upload_policy`].
    ///
    /// # Errors
    ///
    /// 404 if absent, 403 unless the caller is an administrator and the
    /// investment is `accepted`.
    pub async fn upload_file(
        &self,
        caller: &Caller,
        id: InvestmentId,
        upload: NewUpload,
    ) -> Result<InvestmentFile, ApiError> {
        let investment = self.load_accessible(caller, id).await?;
        if !file_policy::can_upload(caller.role, investment.status) {
            return Err(ApiError::Forbidden(messages::FILES_READ_ONLY));
        }

        let file_id = FileId::new();
        let storage_path = format!(
            "investments/{id}/{file_id}/{}",
            sanitize_file_name(&upload.file_name)
        );
        let file_size = i64::try_from(upload.bytes.len())
            .map_err(|_| ApiError::invalid("file", "Plik jest za duży"))?;

        self.blobs.put(&storage_path, upload.bytes).await?;

        let file = InvestmentFile {
            id: file_id,
            investment_id: id,
            file_name: upload.file_name,
            file_size,
            mime_type: upload.mime_type,
            storage_path,
            created_at: Utc::now(),
            uploaded_by: caller.user_id,
        };
        if let Err(e) = self.repo.insert_file(&file).await {
            if let Err(cleanup) = self.blobs.delete(&file.storage_path).await {
                tracing::warn!(key = %file.storage_path, error = %cleanup, "orphaned blob after failed insert");
            }
            return Err(e.into());
        }

        self.events
            .record(InvestmentEvent::FileUploaded {
                investment_id: id,
                file_id,
                file_name: file.file_name.clone(),
                file_size,
                actor: caller.user_id,
                timestamp: file.created_at,
            })
            .await;

        tracing::info!(investment_id = %id, %file_id, file_size, "file uploaded");
        Ok(file)
    }

    /// Loads an attachment and its contents.
    ///
    /// # Errors
    ///
    /// 404 if the investment, the file record or the stored object is
    /// absent; 403 as for [`Self::list_files`].
    pub async fn download_file(
        &self,
        caller: &Caller,
        id: InvestmentId,
        file_id: FileId,
    ) -> Result<(InvestmentFile, Bytes), ApiError> {
        let investment = self.load_accessible(caller, id).await?;
        if !file_policy::files_visible(investment.status) {
            return Err(ApiError::Forbidden(messages::FILES_UNAVAILABLE));
        }
        let file = self
            .repo
            .find_file(id, file_id)
            .await?
            .ok_or(ApiError::NotFound(messages::FILE_NOT_FOUND))?;
        let bytes = self.blobs.get(&file.storage_path).await?;
        Ok((file, bytes))
    }

    /// Deletes an attachment. The caller's role has already been checked.
    ///
    /// # Errors
    ///
    /// 404 if the investment or file is absent, 403 unless the investment
    /// is `accepted`.
    pub async fn delete_file(
        &self,
        caller: &Caller,
        id: InvestmentId,
        file_id: FileId,
    ) -> Result<(), ApiError> {
        let investment = self.load_accessible(caller, id).await?;
        if !file_policy::can_delete(caller.role, investment.status) {
            return Err(ApiError::Forbidden(messages::FILES_READ_ONLY));
        }
        let file = self
            .repo
            .find_file(id, file_id)
            .await?
            .ok_or(ApiError::NotFound(messages::FILE_NOT_FOUND))?;

        if !self.repo.delete_file(id, file_id).await? {
            return Err(ApiError::NotFound(messages::FILE_NOT_FOUND));
        }
        if let Err(e) = self.blobs.delete(&file.storage_path).await {
            tracing::warn!(key = %file.storage_path, error = %e, "blob removal failed");
        }

        self.events
            .record(InvestmentEvent::FileDeleted {
                investment_id: id,
                file_id,
                actor: caller.user_id,
                timestamp: Utc::now(),
            })
            .await;

        tracing::info!(investment_id = %id, %file_id, "file deleted");
        Ok(())
    }
}
