use std::fmt::Write as _;
use std::io;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use futures::SinkExt;
use futures::channel::mpsc;
use tokio_util::io::StreamReader;

use dropshare_core::ShareCode;
use dropshare_share::FileUpload;

use crate::error::ServerError;

use super::AppState;
use super::schemas::{ErrorResponse, FileUploadForm, ShareCodeResponse};

/// Multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// Chunks buffered between the request body and the blob store.
const UPLOAD_CHANNEL_DEPTH: usize = 8;

/// `POST /api/file` -- store an uploaded file and return its code.
///
/// Only the first field named `file` that carries a file name is stored;
/// other fields are skipped. A browser form submitted with no file chosen
/// sends `filename=""`, which counts as having no file, as does a request
/// that is not `multipart/form-data`.
#[utoipa::path(
    post,
    path = "/api/file",
    tag = "Shares",
    summary = "Share file",
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = ShareCodeResponse),
        (status = 400, description = "No file uploaded", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
pub async fn share_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ShareCodeResponse>, ServerError> {
    if let Ok(mut multipart) = multipart {
        while let Some(field) = multipart.next_field().await? {
            if is_file_field(&field) {
                let code = upload_field(&state, field).await?;
                return Ok(Json(ShareCodeResponse { code }));
            }
        }
    }

    let code = state.service.share_file(None).await?;
    Ok(Json(ShareCodeResponse { code }))
}

fn is_file_field(field: &Field<'_>) -> bool {
    field.name() == Some(FILE_FIELD) && field.file_name().is_some_and(|name| !name.is_empty())
}

/// Feed one multipart field to the share service without buffering it.
///
/// The field borrows the request, so its chunks are forwarded over a
/// bounded channel that the blob store reads from.
async fn upload_field(state: &AppState, mut field: Field<'_>) -> Result<ShareCode, ServerError> {
    let original_name = field.file_name().unwrap_or_default().to_owned();
    let content_type = field.content_type().map(str::to_owned);

    let (mut tx, rx) = mpsc::channel::<io::Result<Bytes>>(UPLOAD_CHANNEL_DEPTH);
    let mut upload = FileUpload::new(Box::new(StreamReader::new(rx)), original_name);
    if let Some(content_type) = content_type {
        upload = upload.with_content_type(content_type);
    }

    let pump = async move {
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    // The reader is gone once the blob store has given up.
                    if tx.send(Ok(chunk)).await.is_err() {
                        return None;
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    let _ = tx.send(Err(io::Error::other(e.body_text()))).await;
                    return Some(e);
                }
            }
        }
    };

    let (body_error, shared) = tokio::join!(pump, state.service.share_file(Some(upload)));
    match (shared, body_error) {
        (Ok(code), _) => Ok(code),
        (Err(_), Some(e)) => Err(ServerError::Upload(e)),
        (Err(e), None) => Err(e.into()),
    }
}

/// `GET /api/file/{code}` -- redeem a file share.
///
/// The body is streamed from the blob store. The file is deleted once the
/// response body has been sent or abandoned.
#[utoipa::path(
    get,
    path = "/api/file/{code}",
    tag = "Shares",
    summary = "Retrieve file",
    params(("code" = String, Path, description = "Share code")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 404, description = "Invalid or expired code", body = ErrorResponse)
    )
)]
pub async fn retrieve_file(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ServerError> {
    let download = state.service.retrieve_file(&code).await?;

    let content_type = HeaderValue::from_str(&download.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = content_disposition(&download.original_name);
    let content_length = HeaderValue::from(download.size_bytes);
    let body = Body::from_stream(download.into_stream());

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, content_length),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// `attachment` disposition carrying an ASCII fallback name and the exact
/// name in RFC 5987 form.
fn content_disposition(name: &str) -> HeaderValue {
    let fallback: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let value = format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        encode_ext_value(name)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn encode_ext_value(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}
