use std::sync::Arc;
use std::time::Duration;

use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::cli::provider::aws::AWSConfigCliArgs;
use crate::cli::RunCmd;
use crate::core::client::billing::http::HttpBillingClient;
use crate::core::client::billing::LogBillingClient;
use crate::core::client::database::memory::MemoryDatabase;
use crate::core::client::database::mongodb::MongoDbClient;
use crate::core::client::queue::memory::MemoryQueue;
use crate::core::client::queue::sqs::SQS;
use crate::core::client::storage::memory::MemoryStorage;
use crate::core::client::storage::s3::AWSS3;
use crate::core::client::worker::http::HttpWorkerRegistry;
use crate::core::client::{BillingClient, DatabaseClient, QueueClient, StorageClient, WorkerRegistry};
use crate::sequencer::health::{LogOnlyPolicy, StuckStepPolicy};
use crate::types::params::sequencer::SequencerParams;
use crate::types::params::service::{ServerParams, ServiceParams, WorkerParams};
use crate::types::params::{DatabaseArgs, OrchestratorParams, QueueArgs, StorageArgs};
use crate::OrchestratorResult;

/// The app config. Built once at start-up and shared as `Arc<Config>` by the
/// sequencer, the step runner, the queue consumers and the HTTP server.
pub struct Config {
    /// Timing and concurrency parameters
    params: OrchestratorParams,
    /// Jobs, steps and proof markers
    database: Arc<dyn DatabaseClient>,
    /// Input transactions and step log excerpts
    storage: Arc<dyn StorageClient>,
    /// Dispatcher
    queue: Arc<dyn QueueClient>,
    /// Resolves the proof worker of a developer/repo pair
    workers: Arc<dyn WorkerRegistry>,
    /// Charged once per finished job
    billing: Arc<dyn BillingClient>,
    /// What the health check does about stuck steps
    stuck_step_policy: Arc<dyn StuckStepPolicy>,
}

impl Config {
    pub fn new(
        params: OrchestratorParams,
        database: Arc<dyn DatabaseClient>,
        storage: Arc<dyn StorageClient>,
        queue: Arc<dyn QueueClient>,
        workers: Arc<dyn WorkerRegistry>,
        billing: Arc<dyn BillingClient>,
        stuck_step_policy: Arc<dyn StuckStepPolicy>,
    ) -> Self {
        Self { params, database, storage, queue, workers, billing, stuck_step_policy }
    }

    /// Setup the orchestrator from the `run` command
    pub async fn setup(run_cmd: &RunCmd) -> OrchestratorResult<Self> {
        let params = OrchestratorParams::from(run_cmd);
        let aws_config = Self::build_aws_config(&run_cmd.aws_config_args).await;

        let database = Self::build_database_client(run_cmd).await?;
        let storage = Self::build_storage_client(run_cmd, &aws_config)?;
        let queue = Self::build_queue_client(run_cmd, &aws_config).await?;

        let worker_params = WorkerParams::from(run_cmd.worker_args.clone());
        let workers: Arc<dyn WorkerRegistry> = Arc::new(HttpWorkerRegistry::new(&worker_params)?);

        let billing: Arc<dyn BillingClient> = match run_cmd.billing_args.billing_url.clone() {
            Some(url) => {
                let timeout = Duration::from_secs(run_cmd.billing_args.billing_timeout_seconds);
                Arc::new(HttpBillingClient::new(url, timeout)?)
            }
            None => Arc::new(LogBillingClient),
        };

        Ok(Self::new(params, database, storage, queue, workers, billing, Arc::new(LogOnlyPolicy)))
    }

    async fn build_aws_config(args: &AWSConfigCliArgs) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = args.aws_region.clone() {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint) = args.aws_endpoint_url.as_deref() {
            loader = loader.endpoint_url(endpoint);
        }
        loader.load().await
    }

    async fn build_database_client(run_cmd: &RunCmd) -> OrchestratorResult<Arc<dyn DatabaseClient>> {
        if run_cmd.memory_database {
            return Ok(Arc::new(MemoryDatabase::new()));
        }
        let database_args = DatabaseArgs::try_from(run_cmd)?;
        Ok(Arc::new(MongoDbClient::new(&database_args).await?))
    }

    fn build_storage_client(run_cmd: &RunCmd, aws_config: &SdkConfig) -> OrchestratorResult<Arc<dyn StorageClient>> {
        if run_cmd.memory_storage {
            return Ok(Arc::new(MemoryStorage::new()));
        }
        let storage_args = StorageArgs::try_from(run_cmd)?;
        Ok(Arc::new(AWSS3::new(aws_config, &storage_args)))
    }

    async fn build_queue_client(run_cmd: &RunCmd, aws_config: &SdkConfig) -> OrchestratorResult<Arc<dyn QueueClient>> {
        if run_cmd.memory_queue {
            return Ok(Arc::new(MemoryQueue::new().await?));
        }
        let queue_args = QueueArgs::try_from(run_cmd)?;
        Ok(Arc::new(SQS::new(aws_config, &queue_args)))
    }

    pub fn params(&self) -> &OrchestratorParams {
        &self.params
    }

    /// Returns the sequencer timings
    pub fn sequencer_params(&self) -> &SequencerParams {
        &self.params.sequencer
    }

    /// Returns the service config
    pub fn service_config(&self) -> &ServiceParams {
        &self.params.service
    }

    /// Returns the server config
    pub fn server_config(&self) -> &ServerParams {
        &self.params.server
    }

    /// Returns the database client
    pub fn database(&self) -> &dyn DatabaseClient {
        self.database.as_ref()
    }

    /// Returns the storage provider
    pub fn storage(&self) -> &dyn StorageClient {
        self.storage.as_ref()
    }

    /// Returns the queue provider
    pub fn queue(&self) -> &dyn QueueClient {
        self.queue.as_ref()
    }

    pub fn workers(&self) -> &dyn WorkerRegistry {
        self.workers.as_ref()
    }

    pub fn billing(&self) -> &dyn BillingClient {
        self.billing.as_ref()
    }

    pub fn stuck_step_policy(&self) -> &dyn StuckStepPolicy {
        self.stuck_step_policy.as_ref()
    }
}
