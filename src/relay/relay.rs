// ────────────────────────────────
// src/relay/relay.rs
// Per-request dispatch: CORS preflight, backend forwarding, static files.
// ────────────────────────────────

use hyper::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, CONTENT_TYPE,
};
use hyper::{Body, Method, Request, Response, StatusCode};
use tracing::warn;

use super::forward::Forwarder;
use super::static_files::StaticFiles;

pub struct Relay {
    prefix: String,
    forwarder: Forwarder,
    statics: StaticFiles,
}

impl Relay {
    pub fn new(prefix: String, forwarder: Forwarder, statics: StaticFiles) -> Self {
        Self {
            prefix,
            forwarder,
            statics,
        }
    }

    /// Handle one inbound request to completion. Every failure is converted
    /// to an HTTP response here; nothing propagates past this boundary.
    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        if req.method() == Method::OPTIONS {
            return preflight_response();
        }

        let path = req.uri().path().to_owned();
        let query = req.uri().query().map(str::to_owned);

        let result = if let Some(rest) = path.strip_prefix(self.prefix.as_str()) {
            self.forwarder.forward(req, rest, query.as_deref()).await
        } else if req.method() == Method::GET {
            self.statics.serve(&path).await
        } else {
            Err(RelayError::Unsupported)
        };

        result.unwrap_or_else(|err| {
            warn!("Request for {} failed: {}", path, err);
            Response::from(err)
        })
    }
}

/// Browser preflight answer. Must short-circuit before routing so an
/// OPTIONS request never reaches the backend or the file tree.
fn preflight_response() -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS")
        .header(ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type")
        .header(ACCESS_CONTROL_MAX_AGE, "86400")
        .body(Body::empty())
        .unwrap()
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Error communicating with backend: {0}")]
    Backend(#[from] reqwest::Error),

    #[error("Missing or invalid Content-Length header")]
    MissingContentLength,

    #[error("Failed to read request body: {0}")]
    BodyRead(#[from] hyper::Error),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Unsupported method or path")]
    Unsupported,

    #[error("Static file error: {0}")]
    Io(#[from] std::io::Error),
}

// Convert RelayError to a hyper Response at the request boundary.
impl From<RelayError> for Response<Body> {
    fn from(err: RelayError) -> Self {
        let status = match &err {
            RelayError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::MissingContentLength => StatusCode::LENGTH_REQUIRED,
            RelayError::BodyRead(_) => StatusCode::BAD_REQUEST,
            RelayError::NotFound(_) => StatusCode::NOT_FOUND,
            RelayError::Unsupported => StatusCode::NOT_FOUND,
            RelayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Body::from(err.to_string()))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_carries_all_cors_headers() {
        let resp = preflight_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[test]
    fn not_found_error_names_the_path() {
        let resp: Response<Body> = RelayError::NotFound("/missing.html".to_string()).into();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn missing_length_maps_to_411() {
        let resp: Response<Body> = RelayError::MissingContentLength.into();
        assert_eq!(resp.status(), StatusCode::LENGTH_REQUIRED);
    }
}
