//! Attachment response bodies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::FileId;

/// Multipart form accepted by the upload endpoint.
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    /// The file part.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Identifier of a removed attachment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletedFileDto {
    /// Removed file.
    #[schema(value_type = uuid::Uuid)]
    pub id: FileId,
}
