//! Attachment handlers: list, upload, download, delete.

use std::fmt::Write as _;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use super::require_role;
use crate::api::dto::{DataResponse, DeletedFileDto, UploadForm};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::{FileId, InvestmentFile, InvestmentId, Role};
use crate::error::{ApiError, ErrorResponse};
use crate::service::NewUpload;
use crate::validation::parse_id;

const FALLBACK_MIME: &str = "application/octet-stream";

/// `GET /api/investments/{id}/files` — List attachments.
///
/// # Errors
///
/// 401, 400 on a malformed id, 403 for foreign investments or while files
/// are hidden, 404 if absent.
#[utoipa::path(
    get,
    path = "/api/investments/{id}/files",
    tag = "Files",
    summary = "List attachments",
    description = "Available to administrators and the owning signer once the investment is \
                   accepted or completed.",
    params(("id" = uuid::Uuid, Path, description = "Investment UUID")),
    responses(
        (status = 200, description = "Attachment metadata", body = DataResponse<Vec<InvestmentFile>>),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not permitted in this status", body = ErrorResponse),
        (status = 404, description = "Investment not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_files(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: InvestmentId = parse_id("id", &raw_id)?;
    let files = state.investment_service.list_files(&caller, id).await?;
    Ok(Json(DataResponse::new(files)))
}

/// `POST /api/investments/{id}/files` — Upload an attachment.
///
/// # Errors
///
/// 401, 403 for non-administrators or outside `accepted`, 400 on a missing,
/// empty, oversized or disallowed file, 404 if absent.
#[utoipa::path(
    post,
    path = "/api/investments/{id}/files",
    tag = "Files",
    summary = "Upload an attachment",
    description = "Administrators only, while the investment is accepted. The multipart form \
                   carries a single `file` part.",
    params(("id" = uuid::Uuid, Path, description = "Investment UUID")),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = DataResponse<InvestmentFile>),
        (status = 400, description = "Invalid file", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 404, description = "Investment not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn upload_file(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(raw_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&caller, Role::Admin)?;

    let id: InvestmentId = parse_id("id", &raw_id)?;
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "rejected multipart body");
        ApiError::invalid("file", "Oczekiwano formularza multipart z polem „file”")
    })?;
    let upload = read_file_part(&mut multipart).await?;

    let size = u64::try_from(upload.bytes.len()).unwrap_or(u64::MAX);
    state
        .investment_service
        .upload_policy()
        .validate(&upload.file_name, size, &upload.mime_type)
        .map_err(ApiError::Validation)?;

    let file = state
        .investment_service
        .upload_file(&caller, id, upload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(file, "Plik został przesłany")),
    ))
}

/// Reads the `file` part, skipping any other fields.
async fn read_file_part(multipart: &mut Multipart) -> Result<NewUpload, ApiError> {
    loop {
        let field = multipart.next_field().await.map_err(|e| {
            tracing::debug!(error = %e, "multipart read failed");
            multipart_error(e.status())
        })?;
        let Some(field) = field else {
            return Err(ApiError::invalid("file", "Plik jest wymagany"));
        };
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field.content_type().unwrap_or(FALLBACK_MIME).to_string();
        let bytes = field.bytes().await.map_err(|e| {
            tracing::debug!(error = %e, "multipart field read failed");
            multipart_error(e.status())
        })?;
        return Ok(NewUpload {
            file_name,
            mime_type,
            bytes,
        });
    }
}

fn multipart_error(status: StatusCode) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::invalid("file", "Plik przekracza maksymalny dozwolony rozmiar")
    } else {
        ApiError::invalid("file", "Nie udało się odczytać przesłanego pliku")
    }
}

/// `GET /api/investments/{id}/files/{file_id}` — Download an attachment.
///
/// # Errors
///
/// As for [`list_files`]; 404 if the file record or stored object is absent.
#[utoipa::path(
    get,
    path = "/api/investments/{id}/files/{file_id}",
    tag = "Files",
    summary = "Download an attachment",
    params(
        ("id" = uuid::Uuid, Path, description = "Investment UUID"),
        ("file_id" = uuid::Uuid, Path, description = "File UUID"),
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not permitted in this status", body = ErrorResponse),
        (status = 404, description = "Investment or file not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn download_file(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path((raw_id, raw_file_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (id, file_id) = parse_ids(&raw_id, &raw_file_id)?;
    let (file, bytes) = state
        .investment_service
        .download_file(&caller, id, file_id)
        .await?;

    let content_type =
        HeaderValue::from_str(&file.mime_type).unwrap_or(HeaderValue::from_static(FALLBACK_MIME));
    let disposition = HeaderValue::from_str(&content_disposition(&file.file_name))
        .map_err(|e| ApiError::Internal(format!("content-disposition for {file_id}: {e}")))?;
    let headers = [
        (CONTENT_TYPE, content_type),
        (CONTENT_DISPOSITION, disposition),
        (CONTENT_LENGTH, HeaderValue::from(bytes.len())),
    ];
    Ok((headers, bytes))
}

/// `DELETE /api/investments/{id}/files/{file_id}` — Delete an attachment.
///
/// # Errors
///
/// 401, 403 for non-administrators or outside `accepted`, 400 on malformed
/// ids, 404 if the investment or file is absent.
#[utoipa::path(
    delete,
    path = "/api/investments/{id}/files/{file_id}",
    tag = "Files",
    summary = "Delete an attachment",
    params(
        ("id" = uuid::Uuid, Path, description = "Investment UUID"),
        ("file_id" = uuid::Uuid, Path, description = "File UUID"),
    ),
    responses(
        (status = 200, description = "File deleted", body = DataResponse<DeletedFileDto>),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 404, description = "Investment or file not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_file(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path((raw_id, raw_file_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&caller, Role::Admin)?;

    let (id, file_id) = parse_ids(&raw_id, &raw_file_id)?;
    state
        .investment_service
        .delete_file(&caller, id, file_id)
        .await?;
    Ok(Json(DataResponse::with_message(
        DeletedFileDto { id: file_id },
        "Plik został usunięty",
    )))
}

fn parse_ids(raw_id: &str, raw_file_id: &str) -> Result<(InvestmentId, FileId), ApiError> {
    match (parse_id("id", raw_id), parse_id("file_id", raw_file_id)) {
        (Ok(id), Ok(file_id)) => Ok((id, file_id)),
        (id, file_id) => Err(ApiError::Validation(
            [id.err(), file_id.err()].into_iter().flatten().collect(),
        )),
    }
}

/// Builds an `attachment` disposition with an ASCII fallback name and the
/// RFC 5987 encoded original.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut encoded = String::with_capacity(file_name.len() * 3);
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

/// Attachment routes, nested under `/api/investments`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/files", get(list_files).post(upload_file))
        .route("/{id}/files/{file_id}", get(download_file).delete(delete_file))
}
