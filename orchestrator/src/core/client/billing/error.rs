use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Billing request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Billing service returned status {0}")]
    BillingService(StatusCode),
}
