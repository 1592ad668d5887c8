pub mod billing;
pub mod database;
pub mod queue;
pub mod storage;
pub mod worker;

pub use billing::BillingClient;
pub use database::DatabaseClient;
pub use queue::QueueClient;
pub use storage::StorageClient;
pub use worker::{ProofWorker, WorkerRegistry};
