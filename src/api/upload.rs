//! CSV upload extractor.
//!
//! Accepts the table either as the raw request body or as the `file` field of
//! a `multipart/form-data` form.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, StatusCode};
use axum::response::Response;

use super::envelope::ApiErrorResponse;

/// Form field carrying the table in multipart uploads.
pub const FILE_FIELD: &str = "file";

/// Uploaded table as UTF-8 text.
#[derive(Debug, Clone)]
pub struct CsvUpload(pub String);

#[axum::async_trait]
impl<S> FromRequest<S> for CsvUpload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|e| reject(e.status(), e.body_text()))?;
            return decode(&bytes);
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| reject(e.status(), e.body_text()))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| reject(e.status(), e.body_text()))?
        {
            if field.name() == Some(FILE_FIELD) {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| reject(e.status(), e.body_text()))?;
                return decode(&bytes);
            }
        }
        Err(ApiErrorResponse::bad_request(format!(
            "multipart upload has no '{FILE_FIELD}' field"
        )))
    }
}

fn reject(status: StatusCode, text: String) -> Response {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiErrorResponse::payload_too_large(text)
    } else {
        ApiErrorResponse::bad_request(text)
    }
}

fn decode(bytes: &[u8]) -> Result<CsvUpload, Response> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiErrorResponse::bad_request("upload is empty"));
    }
    String::from_utf8(bytes.to_vec())
        .map(CsvUpload)
        .map_err(|_| ApiErrorResponse::bad_request("upload is not valid UTF-8 text"))
}
