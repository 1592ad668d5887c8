use std::time::Duration;

pub const JOBS_COLLECTION: &str = "jobs";
pub const STEPS_COLLECTION: &str = "steps";
pub const PROOF_MARKERS_COLLECTION: &str = "proof_markers";

/// Suffix of the BlobStore key holding a job's input transactions
pub const TRANSACTIONS_FILE_SUFFIX: &str = ".json";
/// Prefix of the BlobStore keys holding per-attempt step log excerpts
pub const STEP_LOGS_PREFIX: &str = "logs";

pub const JOB_ID_SUFFIX_LENGTH: usize = 12;

/// Upper bound on reload-and-retry cycles when a versioned job update races
pub const MAX_JOB_UPDATE_RETRIES: usize = 3;

/// Upper bound of one webhook notification
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
