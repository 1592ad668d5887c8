pub mod error;
pub mod http;

use async_trait::async_trait;
pub use error::BillingError;
use serde::{Deserialize, Serialize};

/// One charge per finished job. `id` is the account being charged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub id: String,
    pub job_id: String,
    /// Milliseconds
    pub billed_duration: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingClient: Send + Sync {
    async fn charge(&self, request: ChargeRequest) -> Result<(), BillingError>;
}

/// Records charges in the log only, for deployments without a billing service.
#[derive(Debug, Default)]
pub struct LogBillingClient;

#[async_trait]
impl BillingClient for LogBillingClient {
    async fn charge(&self, request: ChargeRequest) -> Result<(), BillingError> {
        tracing::info!(
            account = %request.id,
            job_id = %request.job_id,
            billed_duration_ms = request.billed_duration,
            "Charge recorded"
        );
        Ok(())
    }
}
