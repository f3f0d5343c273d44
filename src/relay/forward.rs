// src/relay/forward.rs
use anyhow::{Context, Result};
use hyper::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::relay::RelayError;
use crate::locator::ResolvedBackend;

/// Forwards prefix-matched requests to the resolved backend and relays the
/// response verbatim. The backend never changes after startup; a dead
/// backend surfaces per request as a 500, never as a re-probe.
pub struct Forwarder {
    client: Client,
    backend: Arc<ResolvedBackend>,
}

impl Forwarder {
    pub fn new(backend: Arc<ResolvedBackend>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create forwarding HTTP client")?;
        Ok(Self { client, backend })
    }

    /// `rest` is the request path with the forward prefix already stripped.
    pub async fn forward(
        &self,
        req: Request<Body>,
        rest: &str,
        query: Option<&str>,
    ) -> Result<Response<Body>, RelayError> {
        let target = self.target_url(rest, query);

        match *req.method() {
            Method::GET => {
                info!("Forwarding GET request to: {}", target);
                let response = self.client.get(&target).send().await?;
                relay_response(response).await
            }
            Method::POST => {
                // The body length must be declared up front; a POST without
                // it fails here instead of blocking on an unbounded read.
                let has_length = req
                    .headers()
                    .get(CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .is_some();
                if !has_length {
                    return Err(RelayError::MissingContentLength);
                }

                let body = hyper::body::to_bytes(req.into_body()).await?;

                info!("Forwarding POST request to: {}", target);
                let response = self
                    .client
                    .post(&target)
                    .header(CONTENT_TYPE, "application/json")
                    .body(body)
                    .send()
                    .await?;
                relay_response(response).await
            }
            _ => Err(RelayError::Unsupported),
        }
    }

    fn target_url(&self, rest: &str, query: Option<&str>) -> String {
        let base = self.backend.base_url.as_str().trim_end_matches('/');
        match query {
            Some(q) => format!("{}/{}?{}", base, rest, q),
            None => format!("{}/{}", base, rest),
        }
    }
}

/// Relay the backend response as-is: exact status code, exact body bytes.
/// The payload is never parsed or transformed.
async fn relay_response(response: reqwest::Response) -> Result<Response<Body>, RelayError> {
    let status = response.status();
    info!("Backend response status: {}", status);

    let bytes = response.bytes().await?;

    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Body::from(bytes))
        .unwrap())
}
