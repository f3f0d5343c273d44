// src/relay/static_files.rs
use anyhow::{Context, Result};
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Response, StatusCode};
use percent_encoding::percent_decode_str;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::relay::RelayError;

/// Serves files from a fixed root directory. The root is canonicalized once
/// at startup; every resolved path must stay under it, so `..` tricks and
/// symlinks pointing outside the tree both come back as 404.
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = std::fs::canonicalize(root.as_ref()).with_context(|| {
            format!("Static root {} is not accessible", root.as_ref().display())
        })?;
        Ok(Self { root })
    }

    pub async fn serve(&self, request_path: &str) -> Result<Response<Body>, RelayError> {
        let not_found = || RelayError::NotFound(request_path.to_string());

        // Browsers percent-encode spaces and the like; decode before
        // resolving so `/my%20file.html` finds `my file.html`. A decoded
        // `..` still has to pass the canonicalize containment check below.
        let decoded = percent_decode_str(request_path)
            .decode_utf8()
            .map_err(|_| not_found())?;

        let relative = if decoded == "/" {
            "index.html".to_string()
        } else {
            decoded.trim_start_matches('/').to_string()
        };

        let resolved = tokio::fs::canonicalize(self.root.join(&relative))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => not_found(),
                _ => RelayError::Io(e),
            })?;

        if !resolved.starts_with(&self.root) {
            return Err(not_found());
        }

        let metadata = tokio::fs::metadata(&resolved).await.map_err(RelayError::Io)?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        let bytes = tokio::fs::read(&resolved).await.map_err(RelayError::Io)?;

        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, content_type_for(&resolved))
            .body(Body::from(bytes))
            .unwrap())
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
