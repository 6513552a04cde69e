//! Remote notes API client.
//!
//! # Responsibility
//! - Map note use-cases onto the REST endpoints (`/notes`, `/notes/{id}`).
//! - Read response bodies leniently: empty or non-JSON bodies become `null`.
//! - Surface failures as typed `ApiError` values for the controller.
//!
//! # Invariants
//! - Without a configured base URL every call fails with `NoBaseUrl`.
//! - Note ids are percent-encoded as one path segment.
//! - An id that cannot be one segment (`""`, `.`, `..`) never yields a
//!   collection URL.
//! - Non-2xx responses are errors carrying the status and parsed body.

use crate::config::ClientConfig;
use crate::model::note::{NoteDraft, NoteId};
use log::{debug, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const NOTES_PATH_SEGMENT: &str = "notes";
const JSON_MEDIA_TYPE: &str = "application/json";

/// Characters `encodeURIComponent` leaves alone.
const ID_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of one remote API exchange.
#[derive(Debug)]
pub enum ApiError {
    /// No API base URL is configured (local-only mode).
    NoBaseUrl,
    /// The configured base URL cannot be used to build request URLs.
    InvalidBaseUrl(String),
    /// The id would be collapsed out of the request path.
    UnaddressableId(String),
    /// Connection, timeout or body-read failure.
    Transport(reqwest::Error),
    /// Server answered with a non-success status.
    Status { status: u16, body: Value },
}

impl ApiError {
    /// Stable machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoBaseUrl => "NO_BASE_URL",
            Self::InvalidBaseUrl(_) => "INVALID_BASE_URL",
            Self::UnaddressableId(_) => "UNADDRESSABLE_ID",
            Self::Transport(_) => "TRANSPORT",
            Self::Status { .. } => "HTTP_STATUS",
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoBaseUrl => f.write_str("No API base URL configured"),
            Self::InvalidBaseUrl(value) => write!(f, "invalid API base URL: `{value}`"),
            Self::UnaddressableId(value) => write!(f, "note id `{value}` cannot be used in a URL"),
            Self::Transport(err) => write!(f, "request could not be completed: {err}"),
            Self::Status { status, .. } => write!(f, "Request failed ({status})"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

/// Remote note operations.
///
/// Payloads are returned as raw JSON; callers coerce them into notes.
pub trait NotesApi {
    /// `GET /notes`.
    fn list_notes(&self) -> ApiResult<Value>;
    /// `POST /notes` with `{title, content}`.
    fn create_note(&self, draft: &NoteDraft) -> ApiResult<Value>;
    /// `PUT /notes/{id}` with `{title, content}`.
    fn update_note(&self, id: &NoteId, draft: &NoteDraft) -> ApiResult<Value>;
    /// `DELETE /notes/{id}`. An empty body yields `null`.
    fn delete_note(&self, id: &NoteId) -> ApiResult<Value>;
}

/// Blocking HTTP implementation of [`NotesApi`].
pub struct HttpNotesApi {
    base_url: Option<String>,
    client: Client,
}

impl HttpNotesApi {
    /// Builds a client from session config.
    ///
    /// # Errors
    /// - Returns `Transport` when the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            base_url: config.api_base.clone(),
            client,
        })
    }

    /// Builds `{base}/notes[/{id}]`.
    ///
    /// # Errors
    /// - `UnaddressableId` for ids the URL parser would drop from the path.
    pub fn notes_url(&self, id: Option<&NoteId>) -> ApiResult<Url> {
        let base = self.base_url.as_deref().ok_or(ApiError::NoBaseUrl)?;
        let mut url =
            Url::parse(base).map_err(|_| ApiError::InvalidBaseUrl(base.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(base.to_string()))?
            .pop_if_empty()
            .push(NOTES_PATH_SEGMENT);
        if let Some(id) = id {
            let path = format!("{}/{}", url.path(), encode_id_segment(id)?);
            url.set_path(&path);
        }
        Ok(url)
    }

    fn request(&self, method: Method, id: Option<&NoteId>) -> ApiResult<RequestBuilder> {
        let url = self.notes_url(id)?;
        Ok(self
            .client
            .request(method, url)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE))
    }

    fn execute(&self, op: &'static str, request: RequestBuilder) -> ApiResult<Value> {
        let started_at = Instant::now();
        let response = match request.send() {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "event=api_request module=api status=error op={op} duration_ms={} error_code=TRANSPORT",
                    started_at.elapsed().as_millis()
                );
                return Err(err.into());
            }
        };

        let status = response.status();
        let body = safe_read_json(response)?;
        if !status.is_success() {
            warn!(
                "event=api_request module=api status=error op={op} duration_ms={} http_status={} error_code=HTTP_STATUS",
                started_at.elapsed().as_millis(),
                status.as_u16()
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            "event=api_request module=api status=ok op={op} duration_ms={} http_status={}",
            started_at.elapsed().as_millis(),
            status.as_u16()
        );
        Ok(body)
    }
}

impl NotesApi for HttpNotesApi {
    fn list_notes(&self) -> ApiResult<Value> {
        self.execute("list", self.request(Method::GET, None)?)
    }

    fn create_note(&self, draft: &NoteDraft) -> ApiResult<Value> {
        self.execute("create", self.request(Method::POST, None)?.json(draft))
    }

    fn update_note(&self, id: &NoteId, draft: &NoteDraft) -> ApiResult<Value> {
        self.execute("update", self.request(Method::PUT, Some(id))?.json(draft))
    }

    fn delete_note(&self, id: &NoteId) -> ApiResult<Value> {
        self.execute("delete", self.request(Method::DELETE, Some(id))?)
    }
}

/// Percent-encodes an id the way `encodeURIComponent` does.
///
/// Dot segments are refused: URL parsing removes them even when escaped as
/// `%2E`, which would retarget the request at `/notes`.
fn encode_id_segment(id: &NoteId) -> ApiResult<String> {
    let raw = id.to_string();
    if matches!(raw.as_str(), "" | "." | "..") {
        return Err(ApiError::UnaddressableId(raw));
    }
    Ok(utf8_percent_encode(&raw, ID_SEGMENT).to_string())
}

/// Reads a body as JSON, mapping empty or malformed text to `null`.
fn safe_read_json(response: Response) -> ApiResult<Value> {
    let text = response.text()?;
    Ok(parse_lenient_json(&text))
}

pub(crate) fn parse_lenient_json(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or(Value::Null)
}
