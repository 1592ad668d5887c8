pub mod constant;
pub mod jobs;
pub mod params;
pub mod proof_marker;
pub mod queue;
pub mod steps;

use serde::{Deserialize, Serialize};

use crate::types::constant::TRANSACTIONS_FILE_SUFFIX;

/// Input blob of a job as stored in the BlobStore.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionsBlob {
    pub transactions: Vec<String>,
}

impl TransactionsBlob {
    pub fn key_for(job_id: &str) -> String {
        format!("{}{}", job_id, TRANSACTIONS_FILE_SUFFIX)
    }
}
