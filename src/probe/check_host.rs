// src/probe/check_host.rs
//
// check-host.net ping API: `check-ping` submits a job for one node,
// `check-result/{id}` returns per-node ping replies once they are in.

use super::provider::{JobId, ProbeError, ProbeProvider, Verdict};
use crate::config::ProbeConfig;
use crate::registry::Host;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

pub struct CheckHostProvider {
    client: Client,
    base_url: Url,
    node: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: Option<String>,
    error: Option<String>,
}

impl CheckHostProvider {
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        // `Url::join` drops the last path segment unless it ends in '/'.
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            node: config.node.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProbeError> {
        self.base_url
            .join(path)
            .map_err(|e| ProbeError::Transport(format!("invalid endpoint {}: {}", path, e)))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ProbeError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ProbeProvider for CheckHostProvider {
    async fn submit(&self, host: &Host) -> Result<JobId, ProbeError> {
        let mut url = self.endpoint("check-ping")?;
        url.query_pairs_mut()
            .append_pair("host", host.as_str())
            .append_pair("node", &self.node);

        let body: SubmitResponse = self.get_json(url).await?;

        match (body.request_id, body.error) {
            (Some(id), _) if !id.is_empty() => Ok(JobId::new(id)),
            (_, Some(error)) => Err(ProbeError::Malformed(format!(
                "provider rejected {}: {}",
                host, error
            ))),
            _ => Err(ProbeError::Malformed("missing request_id".to_string())),
        }
    }

    async fn fetch(&self, job: &JobId) -> Result<Verdict, ProbeError> {
        let url = self.endpoint(&format!("check-result/{}", job))?;
        let body: Value = self.get_json(url).await?;
        classify(&body, &self.node)
    }

    fn name(&self) -> &'static str {
        "check-host"
    }
}

/// Read the verdict for `node` out of a `check-result` body.
///
/// `null` means the node has not answered yet. Otherwise the value is a list of
/// batches, each a list of ping replies `[status, rtt, ip?]`; a `null` batch
/// means the node could not resolve the host. One `"OK"` reply is enough for
/// `Reachable`.
fn classify(body: &Value, node: &str) -> Result<Verdict, ProbeError> {
    let results = body
        .as_object()
        .ok_or_else(|| ProbeError::Malformed("expected a JSON object".to_string()))?;

    let batches = match results.get(node) {
        None => {
            return Err(ProbeError::Malformed(format!("no entry for node {}", node)));
        }
        Some(Value::Null) => return Err(ProbeError::Pending),
        Some(Value::Array(batches)) => batches,
        Some(other) => {
            return Err(ProbeError::Malformed(format!(
                "unexpected node entry: {}",
                other
            )));
        }
    };

    for batch in batches {
        let replies = match batch {
            Value::Null => continue,
            Value::Array(replies) => replies,
            other => {
                return Err(ProbeError::Malformed(format!("unexpected batch: {}", other)));
            }
        };

        for reply in replies {
            if reply.is_null() {
                continue;
            }

            let status = reply
                .get(0)
                .and_then(Value::as_str)
                .ok_or_else(|| ProbeError::Malformed(format!("unexpected reply: {}", reply)))?;

            if status == "OK" {
                return Ok(Verdict::Reachable);
            }
        }
    }

    Ok(Verdict::Unreachable)
}
