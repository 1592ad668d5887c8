use std::time::Duration;

use serde::Serialize;

use crate::types::constant::WEBHOOK_TIMEOUT;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::types::JobStatus;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WebhookPayload<'a> {
    pub job_id: &'a str,
    pub status: JobStatus,
    pub result: Option<&'a str>,
}

/// Best-effort notification of a job's terminal outcome. Errors are logged
/// and swallowed.
pub async fn notify_webhook(job: &JobItem) {
    notify_webhook_within(job, WEBHOOK_TIMEOUT).await
}

/// [`notify_webhook`] giving up after `timeout`.
pub async fn notify_webhook_within(job: &JobItem, timeout: Duration) {
    let Some(url) = job.webhook.as_deref() else { return };

    let payload = WebhookPayload { job_id: &job.id, status: job.status, result: job.result.as_deref() };
    match reqwest::Client::new().post(url).timeout(timeout).json(&payload).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::debug!(job_id = %job.id, status = %job.status, "Webhook notified");
        }
        Ok(response) => {
            tracing::warn!(job_id = %job.id, status_code = %response.status(), "Webhook rejected notification");
        }
        Err(e) => {
            tracing::warn!(job_id = %job.id, error = %e, "Failed to notify webhook");
        }
    }
}
