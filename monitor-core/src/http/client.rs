use reqwest::{header::ACCEPT, Client, Url};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on how much of an error response body is kept for diagnostics.
pub const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("error preparing http client")]
    Build(#[source] reqwest::Error),

    #[error("error making http request to {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API returned an error. URL: {url}, Code: {status}, Body: {body}")]
    Status { url: String, status: u16, body: String },
}

impl HttpError {
    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Username / app-password pair sent as HTTP basic auth.
#[derive(Clone, Debug)]
pub struct BasicAuth {
    pub username: String,
    pub password: Secret<String>,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: Secret<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Client for read-only calls against an authenticated JSON API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    auth: BasicAuth,
}

impl ApiClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(auth: BasicAuth, timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self { client, auth })
    }

    /// `GET url?query` and return the raw body of a 2xx response.
    ///
    /// Any other status becomes [`HttpError::Status`] carrying the request
    /// URL and (truncated) response body.
    pub async fn get_bytes(&self, url: &Url, query: &[(&str, String)]) -> Result<Vec<u8>, HttpError> {
        let mut url = url.clone();
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        let url_text = url.to_string();

        let response = self
            .client
            .get(url)
            .basic_auth(&self.auth.username, Some(self.auth.password.expose_secret()))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| HttpError::Request {
                url: url_text.clone(),
                source,
            })?;

        let status = response.status();
        let read_error = |source: reqwest::Error| HttpError::Request {
            url: url_text.clone(),
            source,
        };

        if !status.is_success() {
            let body = read_body_with_limit(response, MAX_ERROR_BODY_BYTES)
                .await
                .map_err(read_error)?;
            tracing::debug!(url = %url_text, status = %status, bytes = body.len(), "API error response");
            return Err(HttpError::Status {
                url: url_text,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let body = response.bytes().await.map_err(read_error)?;
        tracing::debug!(url = %url_text, status = %status, bytes = body.len(), "API response");

        Ok(body.to_vec())
    }
}

/// Read at most `limit` bytes of the body, leaving the rest unread.
async fn read_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    while body.len() < limit {
        let Some(chunk) = response.chunk().await? else {
            break;
        };
        let take = chunk.len().min(limit - body.len());
        body.extend_from_slice(&chunk[..take]);
    }
    Ok(body)
}
