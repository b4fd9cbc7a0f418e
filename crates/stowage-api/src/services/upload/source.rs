//! Payload sources
//!
//! The request content type is resolved once into a [`PayloadSource`]; each
//! source parses its own envelope into the same [`ParsedUpload`].

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::StatusCode,
};
use bytes::BytesMut;
use serde::Deserialize;
use stowage_core::AppError;

use super::types::{too_large, EncodedPayload, ParsedUpload};

const MIME_JSON: &str = "application/json";
const MIME_MULTIPART: &str = "multipart/form-data";

const FIELD_PATH: &str = "path";
const FIELD_FILE: &str = "file";
const FIELD_MIME_TYPE: &str = "mimeType";
const FIELD_FILE_NAME: &str = "fileName";

/// Transport encoding of an upload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// `application/json` envelope with a base64 `fileData` field
    JsonBase64,
    /// `multipart/form-data` with a `file` part
    MultipartForm,
}

impl PayloadSource {
    /// Resolve the source from a `Content-Type` header value.
    /// Parameters (charset, boundary) and case are ignored.
    pub fn from_content_type(header: Option<&str>) -> Result<Self, AppError> {
        let raw = header.unwrap_or("").trim();
        let media_type = raw
            .split(';')
            .next()
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match media_type.as_str() {
            MIME_JSON => Ok(PayloadSource::JsonBase64),
            MIME_MULTIPART => Ok(PayloadSource::MultipartForm),
            "" => Err(AppError::UnsupportedMediaType(
                "Missing Content-Type; expected application/json or multipart/form-data"
                    .to_string(),
            )),
            other => Err(AppError::UnsupportedMediaType(format!(
                "Unsupported content type '{}'; expected application/json or multipart/form-data",
                other
            ))),
        }
    }

    /// Read and parse the request body. `max_upload_bytes` bounds multipart file parts
    /// while they stream in.
    pub async fn parse(
        self,
        request: Request,
        max_upload_bytes: usize,
    ) -> Result<ParsedUpload, AppError> {
        match self {
            PayloadSource::JsonBase64 => {
                let body = Bytes::from_request(request, &()).await.map_err(|rejection| {
                    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                        too_large(max_upload_bytes)
                    } else {
                        AppError::MalformedPayload(format!(
                            "Failed to read request body: {}",
                            rejection.body_text()
                        ))
                    }
                })?;
                parse_json(&body)
            }
            PayloadSource::MultipartForm => {
                let multipart = Multipart::from_request(request, &()).await.map_err(|rejection| {
                    AppError::MalformedPayload(format!(
                        "Invalid multipart request: {}",
                        rejection.body_text()
                    ))
                })?;
                parse_multipart(multipart, max_upload_bytes).await
            }
        }
    }
}

/// JSON upload envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonEnvelope {
    #[serde(default)]
    path: Option<Vec<String>>,
    #[serde(default, alias = "file")]
    file_data: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
}

/// Parse a JSON envelope. Base64 is left encoded so path validation runs first.
pub fn parse_json(body: &[u8]) -> Result<ParsedUpload, AppError> {
    let envelope: JsonEnvelope = serde_json::from_slice(body)
        .map_err(|e| AppError::MalformedPayload(format!("Invalid JSON body: {}", e)))?;

    Ok(ParsedUpload {
        path: envelope.path.unwrap_or_default(),
        payload: EncodedPayload::Base64(envelope.file_data.unwrap_or_default()),
        mime_type: envelope.mime_type,
        file_name: envelope.file_name,
    })
}

fn multipart_error(err: MultipartError, max_upload_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_upload_bytes)
    } else {
        AppError::MalformedPayload(format!("Failed to read multipart: {}", err.body_text()))
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Walk the multipart form. Exactly one `file` part is accepted; it is read chunk
/// by chunk and rejected as soon as it exceeds `max_upload_bytes`.
pub async fn parse_multipart(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<ParsedUpload, AppError> {
    let mut path: Option<Vec<String>> = None;
    let mut file: Option<Bytes> = None;
    let mut part_mime: Option<String> = None;
    let mut part_file_name: Option<String> = None;
    let mut mime_field: Option<String> = None;
    let mut file_name_field: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_bytes))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            FIELD_FILE => {
                if file.is_some() {
                    return Err(AppError::MalformedPayload(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                part_file_name = field.file_name().map(str::to_string);
                part_mime = field.content_type().map(str::to_string);

                let mut buffer = BytesMut::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_bytes))?
                {
                    if buffer.len().saturating_add(chunk.len()) > max_upload_bytes {
                        return Err(too_large(max_upload_bytes));
                    }
                    buffer.extend_from_slice(&chunk);
                }
                file = Some(buffer.freeze());
            }
            FIELD_PATH => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_bytes))?;
                let segments: Vec<String> = serde_json::from_str(&text).map_err(|e| {
                    AppError::MalformedPayload(format!(
                        "Field 'path' must be a JSON array of strings: {}",
                        e
                    ))
                })?;
                path = Some(segments);
            }
            FIELD_MIME_TYPE => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_bytes))?;
                mime_field = non_empty(text);
            }
            FIELD_FILE_NAME => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_bytes))?;
                file_name_field = non_empty(text);
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
                while field
                    .chunk()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_bytes))?
                    .is_some()
                {}
            }
        }
    }

    let file = file.ok_or_else(|| {
        AppError::MalformedPayload("No file provided; send one field named 'file'".to_string())
    })?;

    Ok(ParsedUpload {
        path: path.unwrap_or_default(),
        payload: EncodedPayload::Raw(file),
        mime_type: mime_field.or(part_mime),
        file_name: file_name_field.or(part_file_name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_source_from_content_type() {
        assert_eq!(
            PayloadSource::from_content_type(Some("application/json")).unwrap(),
            PayloadSource::JsonBase64
        );
        assert_eq!(
            PayloadSource::from_content_type(Some("Application/JSON; charset=utf-8")).unwrap(),
            PayloadSource::JsonBase64
        );
        assert_eq!(
            PayloadSource::from_content_type(Some("multipart/form-data; boundary=xyz")).unwrap(),
            PayloadSource::MultipartForm
        );
    }

    #[test]
    fn rejects_other_content_types() {
        for header in [Some("text/xml"), Some("text/plain"), None] {
            assert!(matches!(
                PayloadSource::from_content_type(header),
                Err(AppError::UnsupportedMediaType(_))
            ));
        }
    }

    #[test]
    fn parses_json_envelope() {
        let parsed = parse_json(
            br#"{"path":["test","hello.txt"],"fileData":"SGVsbG8gV29ybGQ=","mimeType":"text/plain","fileName":"greeting.txt"}"#,
        )
        .unwrap();
        assert_eq!(parsed.path, vec!["test", "hello.txt"]);
        assert_eq!(parsed.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(parsed.file_name.as_deref(), Some("greeting.txt"));
        assert!(matches!(parsed.payload, EncodedPayload::Base64(ref s) if s == "SGVsbG8gV29ybGQ="));
    }

    #[test]
    fn accepts_file_alias_and_missing_path() {
        let parsed = parse_json(br#"{"file":"AA=="}"#).unwrap();
        assert!(parsed.path.is_empty());
        assert!(matches!(parsed.payload, EncodedPayload::Base64(ref s) if s == "AA=="));
    }

    #[test]
    fn wrong_field_types_are_malformed() {
        for body in [
            &br#"{"path":"test/hello.txt","fileData":"AA=="}"#[..],
            &br#"{"path":[1,2],"fileData":"AA=="}"#[..],
            &b"not json"[..],
        ] {
            assert!(matches!(
                parse_json(body),
                Err(AppError::MalformedPayload(_))
            ));
        }
    }
}
