// src/locator/resolver.rs
use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Health probe path on each candidate; also what Ollama serves its model
/// list from.
const PROBE_PATH: &str = "api/tags";

/// The backend selected at startup. Write-once: handlers share it behind an
/// `Arc` and it never changes for the life of the process, even if the
/// backend later goes away.
#[derive(Debug, Clone)]
pub struct ResolvedBackend {
    pub base_url: Url,
    pub healthy: bool,
}

/// One-shot backend discovery. Probes an ordered candidate list and settles
/// on the first that answers; never re-runs.
pub struct Locator {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TagsPayload {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

impl Locator {
    pub fn new(probe_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(probe_timeout)
            .build()
            .context("Failed to create probe HTTP client")?;
        Ok(Self { client })
    }

    /// Walk the candidates in order and return the first one that responds
    /// 200 to the probe. If none do, fall back to the first candidate in
    /// degraded mode so the relay still has something to forward to.
    pub async fn resolve(&self, candidates: &[Url]) -> Result<ResolvedBackend> {
        if candidates.is_empty() {
            bail!("no backend candidates configured");
        }

        for candidate in candidates {
            match self.probe(candidate).await {
                Ok(models) => {
                    if models.is_empty() {
                        info!("Selected backend {} (no models reported)", candidate);
                    } else {
                        info!(
                            "Selected backend {} with models: {}",
                            candidate,
                            models.join(", ")
                        );
                    }
                    return Ok(ResolvedBackend {
                        base_url: candidate.clone(),
                        healthy: true,
                    });
                }
                Err(e) => {
                    warn!("Backend candidate {} unavailable: {}", candidate, e);
                }
            }
        }

        let fallback = candidates[0].clone();
        warn!(
            "No backend candidate answered; starting in degraded mode with {}",
            fallback
        );
        Ok(ResolvedBackend {
            base_url: fallback,
            healthy: false,
        })
    }

    /// Probe one candidate. Success is a 200 on the probe path; the model
    /// names in the payload are only used for the startup log, so a 200
    /// with an unexpected body still counts.
    async fn probe(&self, candidate: &Url) -> Result<Vec<String>> {
        let url = candidate.join(PROBE_PATH)?;
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            bail!("HTTP {}", status);
        }

        let models = match response.json::<TagsPayload>().await {
            Ok(payload) => payload.models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                debug!("Probe payload from {} not parseable: {}", candidate, e);
                Vec::new()
            }
        };
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn selects_first_reachable_candidate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"models": [{"name": "llama3"}, {"name": "mistral"}]}"#)
            .create_async()
            .await;

        let locator = Locator::new(Duration::from_secs(1)).unwrap();
        let resolved = locator.resolve(&[url(&server.url())]).await.unwrap();

        mock.assert_async().await;
        assert!(resolved.healthy);
        assert_eq!(resolved.base_url, url(&server.url()));
    }

    #[tokio::test]
    async fn skips_failing_candidate() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_body(r#"{"models": []}"#)
            .create_async()
            .await;

        // Port 9 (discard) refuses connections; the locator should move on.
        let dead = url("http://127.0.0.1:9");
        let locator = Locator::new(Duration::from_secs(1)).unwrap();
        let resolved = locator
            .resolve(&[dead, url(&server.url())])
            .await
            .unwrap();

        assert!(resolved.healthy);
        assert_eq!(resolved.base_url, url(&server.url()));
    }

    #[tokio::test]
    async fn non_ok_status_is_not_a_match() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(503)
            .create_async()
            .await;

        let locator = Locator::new(Duration::from_secs(1)).unwrap();
        let resolved = locator.resolve(&[url(&server.url())]).await.unwrap();

        assert!(!resolved.healthy);
        assert_eq!(resolved.base_url, url(&server.url()));
    }

    #[tokio::test]
    async fn falls_back_to_first_candidate_when_all_fail() {
        let first = url("http://127.0.0.1:9");
        let second = url("http://127.0.0.1:10");

        let locator = Locator::new(Duration::from_secs(1)).unwrap();
        let resolved = locator
            .resolve(&[first.clone(), second])
            .await
            .unwrap();

        assert!(!resolved.healthy);
        assert_eq!(resolved.base_url, first);
    }

    #[tokio::test]
    async fn unparseable_probe_body_still_selects() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let locator = Locator::new(Duration::from_secs(1)).unwrap();
        let resolved = locator.resolve(&[url(&server.url())]).await.unwrap();

        assert!(resolved.healthy);
    }

    #[tokio::test]
    async fn empty_candidate_list_is_an_error() {
        let locator = Locator::new(Duration::from_secs(1)).unwrap();
        assert!(locator.resolve(&[]).await.is_err());
    }
}
