use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::client::worker::{ProofWorker, WorkerContext, WorkerError, WorkerRegistry};
use crate::types::params::WorkerParams;

#[derive(Serialize, Debug)]
struct CreateProofRequest<'a> {
    input: &'a str,
    worker_version: Option<&'a str>,
}

#[derive(Serialize, Debug)]
struct MergeProofRequest<'a> {
    left: &'a str,
    right: &'a str,
    worker_version: Option<&'a str>,
}

#[derive(Serialize, Debug)]
struct RestartRequest<'a> {
    job_id: &'a str,
    step_id: &'a str,
    worker_version: Option<&'a str>,
    reason: &'a str,
}

#[derive(Deserialize, Debug)]
struct ProofResponse {
    proof: Option<String>,
}

/// Resolves workers served over HTTP at `{registry_url}/{developer}/{repo}`.
pub struct HttpWorkerRegistry {
    client: Client,
    registry_url: Url,
}

impl HttpWorkerRegistry {
    pub fn new(params: &WorkerParams) -> Result<Self, WorkerError> {
        let client = Client::builder().timeout(params.call_timeout).build()?;
        Ok(Self { client, registry_url: params.registry_url.clone() })
    }

    fn endpoint(&self, context: &WorkerContext, operation: &str) -> Result<Url, WorkerError> {
        endpoint_url(&self.registry_url, &context.developer, &context.repo, operation)
    }
}

/// Appends `developer/repo/operation` to `base`, percent-encoding each segment.
pub fn endpoint_url(base: &Url, developer: &str, repo: &str, operation: &str) -> Result<Url, WorkerError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| WorkerError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend([developer, repo, operation]);
    Ok(url)
}

#[async_trait]
impl WorkerRegistry for HttpWorkerRegistry {
    async fn get_worker(&self, context: &WorkerContext) -> Result<Arc<dyn ProofWorker>, WorkerError> {
        if context.developer.is_empty() || context.repo.is_empty() {
            return Err(WorkerError::Unavailable { developer: context.developer.clone(), repo: context.repo.clone() });
        }
        Ok(Arc::new(HttpProofWorker {
            client: self.client.clone(),
            create_url: self.endpoint(context, "create")?,
            merge_url: self.endpoint(context, "merge")?,
            worker_version: context.worker_version.clone(),
        }))
    }

    async fn restart(&self, context: &WorkerContext, reason: &str) -> Result<(), WorkerError> {
        let response = self
            .client
            .post(self.endpoint(context, "restart")?)
            .json(&RestartRequest {
                job_id: &context.job_id,
                step_id: &context.step_id,
                worker_version: context.worker_version.as_deref(),
                reason,
            })
            .send()
            .await?;

        match response.status().is_success() {
            true => Ok(()),
            false => Err(WorkerError::WorkerService(response.status())),
        }
    }
}

pub struct HttpProofWorker {
    client: Client,
    create_url: Url,
    merge_url: Url,
    worker_version: Option<String>,
}

impl HttpProofWorker {
    async fn post_for_proof<B: Serialize + Sync>(&self, url: &Url, body: &B) -> Result<Option<String>, WorkerError> {
        let response = self.client.post(url.clone()).json(body).send().await?;
        match response.status().is_success() {
            true => Ok(response.json::<ProofResponse>().await?.proof),
            false => Err(WorkerError::WorkerService(response.status())),
        }
    }
}

#[async_trait]
impl ProofWorker for HttpProofWorker {
    async fn create(&self, input: &str) -> Result<Option<String>, WorkerError> {
        self.post_for_proof(&self.create_url, &CreateProofRequest { input, worker_version: self.worker_version.as_deref() })
            .await
    }

    async fn merge(&self, left: &str, right: &str) -> Result<Option<String>, WorkerError> {
        self.post_for_proof(
            &self.merge_url,
            &MergeProofRequest { left, right, worker_version: self.worker_version.as_deref() },
        )
        .await
    }
}

/// Bounds a worker future by `limit`, mapping expiry to [`WorkerError::Timeout`].
pub async fn with_timeout<F, T>(limit: Duration, call: F) -> Result<T, WorkerError>
where
    F: std::future::Future<Output = Result<T, WorkerError>>,
{
    tokio::time::timeout(limit, call).await.map_err(|_| WorkerError::Timeout(limit))?
}
