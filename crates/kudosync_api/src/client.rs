//! The remote API trait and its HTTP implementation.

use crate::error::{ApiError, ApiResult};
use kudosync_model::Exercise;
use tracing::debug;

/// Base URL used when the host configures none: a root-relative path
/// resolved against the serving origin.
pub const DEFAULT_BASE_URL: &str = "/api";

/// The remote operations the sync engine relies on.
///
/// One method per domain operation; implementations are stateless
/// wrappers over the transport.
pub trait RemoteApi: Send + Sync {
    /// Fetches the full canonical record set (`GET /exercises`).
    fn fetch_exercises(&self) -> ApiResult<Vec<Exercise>>;

    /// Creates a record (`POST /exercises`); the response is the stored
    /// canonical record with a `server_id` assigned.
    fn create_exercise(&self, exercise: &Exercise) -> ApiResult<Exercise>;

    /// Increments the thanks counter (`POST /exercises/{id}/thanks`).
    ///
    /// `id` may be the client id or the server id; the server resolves
    /// both. Returns the canonical record after the increment.
    fn thank_exercise(&self, id: &str) -> ApiResult<Exercise>;
}

/// A minimal HTTP response: status code plus body text.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// HTTP client abstraction.
///
/// Implement this to plug in the host's HTTP library. Errors are
/// transport-level only ("the request never completed"); a completed
/// request with a failure status is returned as a normal
/// [`HttpResponse`].
pub trait HttpClient: Send + Sync {
    /// Sends a GET request.
    fn get(&self, url: &str) -> Result<HttpResponse, String>;

    /// Sends a POST request with a JSON body.
    fn post(&self, url: &str, body: String) -> Result<HttpResponse, String>;
}

/// [`RemoteApi`] over HTTP with JSON bodies.
pub struct HttpApi<C: HttpClient> {
    base_url: String,
    client: C,
}

impl<C: HttpClient> HttpApi<C> {
    /// Creates a client against [`DEFAULT_BASE_URL`].
    pub fn new(client: C) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, client)
    }

    /// Creates a client against the given base URL.
    pub fn with_base_url(base_url: impl Into<String>, client: C) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, client }
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Maps a completed response to success or [`ApiError::Status`].
    fn check(response: HttpResponse) -> ApiResult<HttpResponse> {
        if (200..300).contains(&response.status) {
            Ok(response)
        } else {
            Err(ApiError::Status {
                status: response.status,
                message: response.body,
            })
        }
    }

    fn decode_record(response: HttpResponse) -> ApiResult<Exercise> {
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl<C: HttpClient> RemoteApi for HttpApi<C> {
    fn fetch_exercises(&self) -> ApiResult<Vec<Exercise>> {
        let response = self
            .client
            .get(&self.url("/exercises"))
            .map_err(ApiError::Transport)?;
        let response = Self::check(response)?;

        // 204 (or an empty 200) is a valid empty record set.
        if response.status == 204 || response.body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<Exercise> =
            serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))?;
        debug!(count = records.len(), "fetched exercises");
        Ok(records)
    }

    fn create_exercise(&self, exercise: &Exercise) -> ApiResult<Exercise> {
        debug!(id = %exercise.id, "creating exercise");
        let body = serde_json::to_string(exercise).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self
            .client
            .post(&self.url("/exercises"), body)
            .map_err(ApiError::Transport)?;
        Self::decode_record(Self::check(response)?)
    }

    fn thank_exercise(&self, id: &str) -> ApiResult<Exercise> {
        debug!(id, "thanking exercise");
        let response = self
            .client
            .post(&self.url(&format!("/exercises/{id}/thanks")), String::new())
            .map_err(ApiError::Transport)?;
        Self::decode_record(Self::check(response)?)
    }
}
