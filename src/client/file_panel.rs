//! Attachment controls of an investment view.

use axum::body::Bytes;

use super::{InvestmentApi, Notice, PanelError};
use crate::domain::{
    Caller, FileCapabilities, FileId, InvestmentFile, InvestmentId, InvestmentStatus,
    UploadPolicy, UserId,
};

/// Per-view state of the attachment list, upload control and delete
/// confirmation.
#[derive(Debug, Clone)]
pub struct FilePanel {
    caller: Caller,
    investment_id: InvestmentId,
    owner: UserId,
    status: InvestmentStatus,
    policy: UploadPolicy,
    files: Vec<InvestmentFile>,
    pending_delete: Option<FileId>,
    in_flight: bool,
    notice: Option<Notice>,
}

impl FilePanel {
    /// Creates the panel for an investment owned by `owner` in `status`.
    #[must_use]
    pub fn new(
        caller: Caller,
        investment_id: InvestmentId,
        owner: UserId,
        status: InvestmentStatus,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            caller,
            investment_id,
            owner,
            status,
            policy,
            files: Vec::new(),
            pending_delete: None,
            in_flight: false,
            notice: None,
        }
    }

    /// What the caller may do in the current status.
    #[must_use]
    pub fn capabilities(&self) -> FileCapabilities {
        FileCapabilities::for_viewer(&self.caller, self.owner, self.status)
    }

    /// Loaded attachments.
    #[must_use]
    pub fn files(&self) -> &[InvestmentFile] {
        &self.files
    }

    /// File awaiting delete confirmation.
    #[must_use]
    pub const fn pending_delete(&self) -> Option<FileId> {
        self.pending_delete
    }

    /// Whether the controls are disabled.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Last notice, if not dismissed.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Hides the current notice.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Applies a status change observed by the action panel. Drops the
    /// list when files become hidden.
    pub fn set_status(&mut self, status: InvestmentStatus) {
        self.status = status;
        if !self.capabilities().can_view {
            self.files.clear();
        }
        if !self.capabilities().can_delete {
            self.pending_delete = None;
        }
    }

    /// Reloads the list. Does nothing while files are hidden.
    ///
    /// # Errors
    ///
    /// [`PanelError::Request`] when the request fails.
    pub async fn refresh(&mut self, api: &dyn InvestmentApi) -> Result<(), PanelError> {
        if !self.capabilities().can_view {
            self.files.clear();
            return Ok(());
        }
        match api.list_files(self.investment_id).await {
            Ok(files) => {
                self.files = files;
                Ok(())
            }
            Err(e) => {
                self.notice = Some(Notice::error(e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Validates and uploads a file, then reloads the list.
    ///
    /// # Errors
    ///
    /// [`PanelError::FilesUnavailable`] when the upload control is not
    /// rendered, [`PanelError::Busy`] while a request is in flight,
    /// [`PanelError::Invalid`] when the file fails the size, type or name
    /// checks (nothing is sent), [`PanelError::Request`] when the upload
    /// fails.
    pub async fn upload(
        &mut self,
        api: &dyn InvestmentApi,
        file_name: &str,
        mime_type: &str,
        bytes: Bytes,
    ) -> Result<InvestmentFile, PanelError> {
        if !self.capabilities().can_upload {
            return Err(PanelError::FilesUnavailable);
        }
        if self.in_flight {
            return Err(PanelError::Busy);
        }
        let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        self.policy
            .validate(file_name, size, mime_type)
            .map_err(PanelError::Invalid)?;

        self.in_flight = true;
        let result = api
            .upload_file(self.investment_id, file_name, mime_type, bytes)
            .await;
        self.in_flight = false;

        match result {
            Ok(file) => {
                self.notice = Some(Notice::success("Plik został przesłany"));
                if let Err(e) = self.refresh(api).await {
                    tracing::warn!(error = %e, "file list refresh after upload failed");
                }
                Ok(file)
            }
            Err(e) => {
                self.notice = Some(Notice::error(e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Opens the delete confirmation for `file_id`.
    ///
    /// # Errors
    ///
    /// [`PanelError::FilesUnavailable`] when delete buttons are not
    /// rendered or the file is not in the list, [`PanelError::Busy`] while a
    /// request is in flight.
    pub fn request_delete(&mut self, file_id: FileId) -> Result<(), PanelError> {
        if self.in_flight {
            return Err(PanelError::Busy);
        }
        if !self.capabilities().can_delete || !self.files.iter().any(|f| f.id == file_id) {
            return Err(PanelError::FilesUnavailable);
        }
        self.pending_delete = Some(file_id);
        Ok(())
    }

    /// Closes the delete confirmation.
    pub fn cancel_delete(&mut self) {
        if !self.in_flight {
            self.pending_delete = None;
        }
    }

    /// Sends the confirmed delete and removes the file from the list.
    ///
    /// # Errors
    ///
    /// [`PanelError::NothingToConfirm`] without an open confirmation,
    /// [`PanelError::Busy`] while a request is in flight,
    /// [`PanelError::Request`] when the delete fails; the file stays listed.
    pub async fn confirm_delete(&mut self, api: &dyn InvestmentApi) -> Result<(), PanelError> {
        if self.in_flight {
            return Err(PanelError::Busy);
        }
        let Some(file_id) = self.pending_delete else {
            return Err(PanelError::NothingToConfirm);
        };

        self.in_flight = true;
        let result = api.delete_file(self.investment_id, file_id).await;
        self.in_flight = false;

        match result {
            Ok(()) => {
                self.pending_delete = None;
                self.files.retain(|f| f.id != file_id);
                self.notice = Some(Notice::success("Plik został usunięty"));
                Ok(())
            }
            Err(e) => {
                self.notice = Some(Notice::error(e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Downloads a listed file.
    ///
    /// # Errors
    ///
    /// [`PanelError::FilesUnavailable`] while files are hidden,
    /// [`PanelError::Request`] when the download fails.
    pub async fn download(
        &mut self,
        api: &dyn InvestmentApi,
        file_id: FileId,
    ) -> Result<Bytes, PanelError> {
        if !self.capabilities().can_view {
            return Err(PanelError::FilesUnavailable);
        }
        api.download_file(self.investment_id, file_id)
            .await
            .map_err(|e| {
                self.notice = Some(Notice::error(e.user_message()));
                e.into()
            })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::client::fake::{Call, FakeApi};
    use crate::domain::Role;

    fn panel(role: Role, owner: UserId, status: InvestmentStatus) -> FilePanel {
        let caller = Caller {
            user_id: if role.is_admin() { UserId::new() } else { owner },
            role,
        };
        FilePanel::new(caller, InvestmentId::new(), owner, status, UploadPolicy::default())
    }

    #[test]
    fn upload_control_only_for_admin_on_accepted() {
        let owner = UserId::new();
        for status in InvestmentStatus::ALL {
            assert_eq!(
                panel(Role::Admin, owner, status).capabilities().can_upload,
                status == InvestmentStatus::Accepted
            );
            assert!(!panel(Role::Signer, owner, status).capabilities().can_upload);
        }
    }

    #[tokio::test]
    async fn pending_upload_is_not_offered_and_sends_nothing() {
        let api = FakeApi::new(UserId::new(), InvestmentStatus::Pending);
        let mut admin = panel(Role::Admin, UserId::new(), InvestmentStatus::Pending);
        let result = admin
            .upload(&api, "umowa.pdf", "application/pdf", Bytes::from_static(b"%PDF"))
            .await;
        assert!(matches!(result, Err(PanelError::FilesUnavailable)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_upload_is_rejected_before_transmission() {
        let api = FakeApi::new(UserId::new(), InvestmentStatus::Accepted);
        let mut admin = panel(Role::Admin, UserId::new(), InvestmentStatus::Accepted);

        let Err(PanelError::Invalid(errors)) = admin
            .upload(&api, "skrypt.exe", "application/x-msdownload", Bytes::new())
            .await
        else {
            panic!("invalid file must be refused");
        };
        assert_eq!(errors.len(), 2);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn upload_refreshes_list() {
        let api = FakeApi::new(UserId::new(), InvestmentStatus::Accepted);
        let mut admin = panel(Role::Admin, UserId::new(), InvestmentStatus::Accepted);

        let result = admin
            .upload(&api, "umowa.pdf", "application/pdf", Bytes::from_static(b"%PDF"))
            .await;
        assert!(result.is_ok());
        assert_eq!(admin.files().len(), 1);
        assert_eq!(
            api.calls(),
            vec![
                Call::Upload {
                    file_name: "umowa.pdf".to_string(),
                    mime_type: "application/pdf".to_string()
                },
                Call::ListFiles,
            ]
        );
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let api = FakeApi::new(UserId::new(), InvestmentStatus::Accepted);
        let file_id = api.add_file("umowa.pdf");
        let mut admin = panel(Role::Admin, UserId::new(), InvestmentStatus::Accepted);
        assert!(admin.refresh(&api).await.is_ok());

        assert!(matches!(
            admin.confirm_delete(&api).await,
            Err(PanelError::NothingToConfirm)
        ));
        assert!(admin.request_delete(file_id).is_ok());
        admin.cancel_delete();
        assert!(admin.pending_delete().is_none());

        assert!(admin.request_delete(file_id).is_ok());
        assert!(admin.confirm_delete(&api).await.is_ok());
        assert!(admin.files().is_empty());
        assert_eq!(api.calls().last(), Some(&Call::Delete(file_id)));
    }

    #[tokio::test]
    async fn failed_delete_keeps_file_listed() {
        let api = FakeApi::new(UserId::new(), InvestmentStatus::Accepted);
        let file_id = api.add_file("umowa.pdf");
        let mut admin = panel(Role::Admin, UserId::new(), InvestmentStatus::Accepted);
        assert!(admin.refresh(&api).await.is_ok());
        assert!(admin.request_delete(file_id).is_ok());

        api.fail_next_mutation();
        assert!(matches!(
            admin.confirm_delete(&api).await,
            Err(PanelError::Request(_))
        ));
        assert_eq!(admin.files().len(), 1);
        assert_eq!(admin.pending_delete(), Some(file_id));
        assert!(!admin.is_busy());
    }

    #[tokio::test]
    async fn owner_lists_and_downloads_after_completion_but_cannot_delete() {
        let owner = UserId::new();
        let api = FakeApi::new(owner, InvestmentStatus::Completed);
        let file_id = api.add_file("raport.pdf");
        let mut signer = panel(Role::Signer, owner, InvestmentStatus::Completed);

        assert!(signer.refresh(&api).await.is_ok());
        assert_eq!(signer.files().len(), 1);
        assert!(signer.download(&api, file_id).await.is_ok());
        assert!(matches!(
            signer.request_delete(file_id),
            Err(PanelError::FilesUnavailable)
        ));
    }

    #[tokio::test]
    async fn hidden_files_are_never_requested() {
        let owner = UserId::new();
        let api = FakeApi::new(owner, InvestmentStatus::Pending);
        let mut signer = panel(Role::Signer, owner, InvestmentStatus::Pending);
        assert!(signer.refresh(&api).await.is_ok());
        assert!(api.calls().is_empty());

        signer.set_status(InvestmentStatus::Accepted);
        assert!(signer.capabilities().can_view);
    }
}
