//! HTTP client for the investment endpoints.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::dto::{DataResponse, InvestmentDetailDto, InvestmentDto};
use crate::domain::{FileId, InvestmentFile, InvestmentId, InvestmentStatus};
use crate::error::{ErrorDetail, ErrorResponse};

/// Failure of a client call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure or undecodable response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code.
        error: String,
        /// User-facing message.
        message: String,
        /// Field-level validation failures.
        details: Vec<ErrorDetail>,
    },
}

impl ClientError {
    /// Message suitable for an error notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) => "Nie udało się połączyć z serwerem. Spróbuj ponownie.".to_string(),
            Self::Api {
                message, details, ..
            } => match details.first() {
                Some(detail) => format!("{message}: {}", detail.message),
                None => message.clone(),
            },
        }
    }

    /// HTTP status of an API error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(_) => None,
        }
    }
}

/// Investment operations used by the action and file panels.
#[async_trait]
pub trait InvestmentApi: Send + Sync {
    /// `GET /api/investments/{id}`.
    async fn get_investment(&self, id: InvestmentId)
    -> Result<InvestmentDetailDto, ClientError>;

    /// `PUT /api/investments/{id}` with `{status, reason?}`.
    async fn update_status(
        &self,
        id: InvestmentId,
        status: InvestmentStatus,
        reason: Option<&str>,
    ) -> Result<InvestmentDto, ClientError>;

    /// `PUT /api/investments/{id}/cancel` with `{reason}`.
    async fn cancel(&self, id: InvestmentId, reason: &str) -> Result<InvestmentDto, ClientError>;

    /// `GET /api/investments/{id}/files`.
    async fn list_files(&self, id: InvestmentId) -> Result<Vec<InvestmentFile>, ClientError>;

    /// `POST /api/investments/{id}/files` with a multipart `file` part.
    async fn upload_file(
        &self,
        id: InvestmentId,
        file_name: &str,
        mime_type: &str,
        bytes: Bytes,
    ) -> Result<InvestmentFile, ClientError>;

    /// `GET /api/investments/{id}/files/{file_id}`.
    async fn download_file(&self, id: InvestmentId, file_id: FileId)
    -> Result<Bytes, ClientError>;

    /// `DELETE /api/investments/{id}/files/{file_id}`.
    async fn delete_file(&self, id: InvestmentId, file_id: FileId) -> Result<(), ClientError>;
}

/// [`InvestmentApi`] over HTTP with a bearer token.
#[derive(Debug, Clone)]
pub struct InvestmentClient {
    client: Client,
    base_url: String,
    token: String,
}

impl InvestmentClient {
    /// Creates a client for the server at `base_url`, authenticating with
    /// `token`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/investments{path}", self.base_url)
    }

    async fn data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let response = Self::check(response).await?;
        Ok(response.json::<DataResponse<T>>().await?.data)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .json::<ErrorResponse>()
            .await
            .unwrap_or_else(|_| ErrorResponse {
                error: "unexpected_response".to_string(),
                message: "Nieoczekiwana odpowiedź serwera".to_string(),
                details: None,
            });
        Err(ClientError::Api {
            status: status.as_u16(),
            error: body.error,
            message: body.message,
            details: body.details.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl InvestmentApi for InvestmentClient {
    async fn get_investment(
        &self,
        id: InvestmentId,
    ) -> Result<InvestmentDetailDto, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::data(response).await
    }

    async fn update_status(
        &self,
        id: InvestmentId,
        status: InvestmentStatus,
        reason: Option<&str>,
    ) -> Result<InvestmentDto, ClientError> {
        let body = match reason {
            Some(reason) => json!({ "status": status, "reason": reason }),
            None => json!({ "status": status }),
        };
        let response = self
            .client
            .put(self.url(&format!("/{id}")))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::data(response).await
    }

    async fn cancel(&self, id: InvestmentId, reason: &str) -> Result<InvestmentDto, ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/{id}/cancel")))
            .bearer_auth(&self.token)
            .json(&json!({ "reason": reason }))
            .send()
            .await?;
        Self::data(response).await
    }

    async fn list_files(&self, id: InvestmentId) -> Result<Vec<InvestmentFile>, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/{id}/files")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::data(response).await
    }

    async fn upload_file(
        &self,
        id: InvestmentId,
        file_name: &str,
        mime_type: &str,
        bytes: Bytes,
    ) -> Result<InvestmentFile, ClientError> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let response = self
            .client
            .post(self.url(&format!("/{id}/files")))
            .bearer_auth(&self.token)
            .multipart(Form::new().part("file", part))
            .send()
            .await?;
        Self::data(response).await
    }

    async fn download_file(
        &self,
        id: InvestmentId,
        file_id: FileId,
    ) -> Result<Bytes, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/{id}/files/{file_id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.bytes().await?)
    }

    async fn delete_file(&self, id: InvestmentId, file_id: FileId) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/{id}/files/{file_id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
