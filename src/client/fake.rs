//! Recording [`InvestmentApi`] double for panel tests.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;

use super::{ClientError, InvestmentApi};
use crate::api::dto::{InvestmentDetailDto, InvestmentDto};
use crate::domain::{
    FileCapabilities, FileId, Investment, InvestmentFile, InvestmentId, InvestmentStatus, OfferId,
    UserId,
};

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    GetInvestment,
    UpdateStatus {
        status: InvestmentStatus,
        reason: Option<String>,
    },
    Cancel {
        reason: String,
    },
    ListFiles,
    Upload {
        file_name: String,
        mime_type: String,
    },
    Download(FileId),
    Delete(FileId),
}

#[derive(Debug)]
struct FakeState {
    view: InvestmentDetailDto,
    files: Vec<InvestmentFile>,
    calls: Vec<Call>,
    fail_next_mutation: bool,
}

/// In-process server stand-in that records every call.
#[derive(Debug)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub(crate) fn new(owner: UserId, status: InvestmentStatus) -> Self {
        let mut investment = Investment::new(owner, OfferId::new(), 50_000);
        investment.status = status;
        let view = InvestmentDetailDto {
            status_badge: status.badge(),
            investment,
            offer: None,
            owner: None,
            available_actions: Vec::new(),
            files: FileCapabilities {
                can_view: false,
                can_upload: false,
                can_delete: false,
            },
        };
        Self {
            state: Mutex::new(FakeState {
                view,
                files: Vec::new(),
                calls: Vec::new(),
                fail_next_mutation: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn view(&self) -> InvestmentDetailDto {
        self.lock().view.clone()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub(crate) fn fail_next_mutation(&self) {
        self.lock().fail_next_mutation = true;
    }

    pub(crate) fn add_file(&self, file_name: &str) -> FileId {
        let mut state = self.lock();
        let file = InvestmentFile {
            id: FileId::new(),
            investment_id: state.view.investment.id,
            file_name: file_name.to_string(),
            file_size: 3,
            mime_type: "application/pdf".to_string(),
            storage_path: String::new(),
            created_at: Utc::now(),
            uploaded_by: UserId::new(),
        };
        let id = file.id;
        state.files.push(file);
        id
    }
}

fn server_error() -> ClientError {
    ClientError::Api {
        status: 500,
        error: "internal_error".to_string(),
        message: "Wystąpił nieoczekiwany błąd serwera".to_string(),
        details: Vec::new(),
    }
}

impl FakeState {
    fn mutation(&mut self, call: Call) -> Result<(), ClientError> {
        self.calls.push(call);
        if std::mem::take(&mut self.fail_next_mutation) {
            Err(server_error())
        } else {
            Ok(())
        }
    }

    fn set_status(&mut self, status: InvestmentStatus) -> InvestmentDto {
        self.view.investment.status = status;
        self.view.status_badge = status.badge();
        InvestmentDto::from(self.view.investment.clone())
    }
}

#[async_trait]
impl InvestmentApi for FakeApi {
    async fn get_investment(
        &self,
        _id: InvestmentId,
    ) -> Result<InvestmentDetailDto, ClientError> {
        let mut state = self.lock();
        state.calls.push(Call::GetInvestment);
        Ok(state.view.clone())
    }

    async fn update_status(
        &self,
        _id: InvestmentId,
        status: InvestmentStatus,
        reason: Option<&str>,
    ) -> Result<InvestmentDto, ClientError> {
        let mut state = self.lock();
        state.mutation(Call::UpdateStatus {
            status,
            reason: reason.map(str::to_string),
        })?;
        Ok(state.set_status(status))
    }

    async fn cancel(&self, _id: InvestmentId, reason: &str) -> Result<InvestmentDto, ClientError> {
        let mut state = self.lock();
        state.mutation(Call::Cancel {
            reason: reason.to_string(),
        })?;
        Ok(state.set_status(InvestmentStatus::Cancelled))
    }

    async fn list_files(&self, _id: InvestmentId) -> Result<Vec<InvestmentFile>, ClientError> {
        let mut state = self.lock();
        state.calls.push(Call::ListFiles);
        Ok(state.files.clone())
    }

    async fn upload_file(
        &self,
        id: InvestmentId,
        file_name: &str,
        mime_type: &str,
        bytes: Bytes,
    ) -> Result<InvestmentFile, ClientError> {
        let mut state = self.lock();
        state.mutation(Call::Upload {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
        })?;
        let file = InvestmentFile {
            id: FileId::new(),
            investment_id: id,
            file_name: file_name.to_string(),
            file_size: i64::try_from(bytes.len()).unwrap_or(i64::MAX),
            mime_type: mime_type.to_string(),
            storage_path: String::new(),
            created_at: Utc::now(),
            uploaded_by: UserId::new(),
        };
        state.files.push(file.clone());
        Ok(file)
    }

    async fn download_file(
        &self,
        _id: InvestmentId,
        file_id: FileId,
    ) -> Result<Bytes, ClientError> {
        self.lock().calls.push(Call::Download(file_id));
        Ok(Bytes::from_static(b"%PDF"))
    }

    async fn delete_file(&self, _id: InvestmentId, file_id: FileId) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.mutation(Call::Delete(file_id))?;
        state.files.retain(|f| f.id != file_id);
        Ok(())
    }
}
