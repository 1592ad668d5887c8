use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument, UpdateOptions};
use mongodb::{bson, Client, Collection, Database, IndexModel};
use opentelemetry::KeyValue;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::DatabaseError;
use crate::core::client::database::DatabaseClient;
use crate::types::constant::{JOBS_COLLECTION, PROOF_MARKERS_COLLECTION, STEPS_COLLECTION};
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::JobStatus;
use crate::types::params::DatabaseArgs;
use crate::types::proof_marker::ProofMarker;
use crate::types::steps::step_item::{StepHealthView, StepItem};
use crate::types::steps::step_updates::StepItemUpdates;
use crate::types::steps::types::StepStatus;
use crate::utils::metrics::ORCHESTRATOR_METRICS;

pub trait ToDocument {
    fn to_document(&self) -> Result<Document, DatabaseError>;
}

impl<T: Serialize> ToDocument for T {
    fn to_document(&self) -> Result<Document, DatabaseError> {
        let doc = bson::to_bson(self)?;

        if let Bson::Document(doc) = doc {
            Ok(doc)
        } else {
            Err(DatabaseError::FailedToSerializeDocument(format!("Failed to serialize document: {}", doc)))
        }
    }
}

/// Builds the `$set` body of a versioned update: null fields are dropped and
/// `version`/`updated_at` are always bumped.
fn versioned_set<U: Serialize>(update: &U, current_version: i32) -> Result<Document, DatabaseError> {
    let updates = update.to_document()?;

    let mut non_null_updates = Document::new();
    updates.into_iter().for_each(|(k, v)| {
        if v != Bson::Null {
            non_null_updates.insert(k, v);
        }
    });

    if non_null_updates.is_empty() {
        return Err(DatabaseError::NoUpdateFound("No field to be updated, likely a false call".to_string()));
    }

    non_null_updates.insert("version", Bson::Int32(current_version + 1));
    non_null_updates.insert("updated_at", bson::to_bson(&Utc::now())?);

    Ok(doc! { "$set": non_null_updates })
}

fn record_db_call(operation: &'static str, start: Instant) {
    let attributes = [KeyValue::new("db_operation_name", operation)];
    ORCHESTRATOR_METRICS.db_calls_response_time.record(start.elapsed().as_secs_f64(), &attributes);
}

/// MongoDB client implementation
pub struct MongoDbClient {
    client: Client,
    database: Arc<Database>,
}

impl MongoDbClient {
    pub async fn new(config: &DatabaseArgs) -> Result<Self, DatabaseError> {
        let client = Client::with_uri_str(&config.connection_uri).await?;
        let database = Arc::new(client.database(&config.database_name));
        let db = Self { client, database };
        db.ensure_indexes().await?;
        Ok(db)
    }

    /// Mongodb client uses Arc internally, reducing the cost of clone.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    fn jobs_collection(&self) -> Collection<JobItem> {
        self.database.collection(JOBS_COLLECTION)
    }

    fn steps_collection(&self) -> Collection<StepItem> {
        self.database.collection(STEPS_COLLECTION)
    }

    fn markers_collection(&self) -> Collection<ProofMarker> {
        self.database.collection(PROOF_MARKERS_COLLECTION)
    }

    /// Unique indexes back the insert-if-absent semantics of the create calls.
    async fn ensure_indexes(&self) -> Result<(), DatabaseError> {
        let unique = || IndexOptions::builder().unique(true).build();
        self.jobs_collection()
            .create_index(IndexModel::builder().keys(doc! { "id": 1 }).options(unique()).build(), None)
            .await?;
        self.steps_collection()
            .create_index(IndexModel::builder().keys(doc! { "job_id": 1, "step_id": 1 }).options(unique()).build(), None)
            .await?;
        self.markers_collection()
            .create_index(IndexModel::builder().keys(doc! { "job_id": 1, "step_id": 1 }).options(unique()).build(), None)
            .await?;
        Ok(())
    }

    /// Inserts `document` unless a document matching `filter` exists.
    /// Returns false when it already existed.
    async fn insert_if_absent<T>(
        &self,
        collection: Collection<T>,
        filter: Document,
        document: &T,
    ) -> Result<bool, DatabaseError>
    where
        T: Serialize,
    {
        let options = UpdateOptions::builder().upsert(true).build();
        let updates = doc! {
            // only set when the document is inserted for the first time
            "$setOnInsert": document.to_document()?
        };
        let result = collection.update_one(filter, updates, options).await?;
        Ok(result.matched_count == 0)
    }

    /// Conditional status transition on a step, the compare-and-swap the
    /// reduction tree relies on.
    async fn swap_step_status(
        &self,
        job_id: &str,
        step_id: &str,
        expected: StepStatus,
        new: StepStatus,
    ) -> Result<Option<StepItem>, DatabaseError> {
        let filter = doc! {
            "job_id": job_id,
            "step_id": step_id,
            "status": bson::to_bson(&expected)?,
        };
        let update = doc! {
            "$set": { "status": bson::to_bson(&new)?, "updated_at": bson::to_bson(&Utc::now())? },
            "$inc": { "version": 1 },
        };
        let options = FindOneAndUpdateOptions::builder().upsert(false).return_document(ReturnDocument::After).build();
        Ok(self.steps_collection().find_one_and_update(filter, update, options).await?)
    }
}

#[async_trait]
impl DatabaseClient for MongoDbClient {
    async fn create_job(&self, job: JobItem) -> Result<JobItem, DatabaseError> {
        let start = Instant::now();
        let filter = doc! { "id": job.id.as_str() };
        if self.insert_if_absent(self.jobs_collection(), filter, &job).await? {
            debug!(job_id = %job.id, "Job created in MongoDB successfully");
            record_db_call("create_job", start);
            Ok(job)
        } else {
            Err(DatabaseError::ItemAlreadyExists(format!("Job already exists for id {}", job.id)))
        }
    }

    async fn get_job(&self, id: &str) -> Result<Option<JobItem>, DatabaseError> {
        let start = Instant::now();
        let job = self.jobs_collection().find_one(doc! { "id": id }, None).await?;
        record_db_call("get_job", start);
        Ok(job)
    }

    async fn update_job(&self, current: &JobItem, update: JobItemUpdates) -> Result<JobItem, DatabaseError> {
        let start = Instant::now();
        let filter = doc! {
            "id": current.id.as_str(),
            "version": current.version,
        };
        let options = FindOneAndUpdateOptions::builder().upsert(false).return_document(ReturnDocument::After).build();
        let update = versioned_set(&update, current.version)?;

        match self.jobs_collection().find_one_and_update(filter, update, options).await? {
            Some(job) => {
                debug!(job_id = %current.id, "Job updated successfully");
                record_db_call("update_job", start);
                Ok(job)
            }
            None => {
                warn!(job_id = %current.id, version = %current.version, "Failed to update job. Job version is likely outdated");
                Err(DatabaseError::UpdateFailed(format!("Failed to update job. Identifier - {}", current.id)))
            }
        }
    }

    async fn update_job_status_if(
        &self,
        id: &str,
        expected: JobStatus,
        new: JobStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<JobItem>, DatabaseError> {
        let start = Instant::now();
        let filter = doc! { "id": id, "status": bson::to_bson(&expected)? };
        let mut set = doc! { "status": bson::to_bson(&new)?, "updated_at": bson::to_bson(&Utc::now())? };
        let stamp = match new {
            JobStatus::Created => None,
            JobStatus::Started => Some("started_at"),
            JobStatus::Finished => Some("finished_at"),
            JobStatus::Failed => Some("failed_at"),
            JobStatus::Used => Some("used_at"),
        };
        if let Some(field) = stamp {
            set.insert(field, bson::to_bson(&at)?);
        }
        let update = doc! { "$set": set, "$inc": { "version": 1 } };
        let options = FindOneAndUpdateOptions::builder().upsert(false).return_document(ReturnDocument::After).build();
        let job = self.jobs_collection().find_one_and_update(filter, update, options).await?;
        record_db_call("update_job_status_if", start);
        Ok(job)
    }

    async fn create_step(&self, step: StepItem) -> Result<StepItem, DatabaseError> {
        let start = Instant::now();
        let filter = doc! { "job_id": step.job_id.as_str(), "step_id": step.step_id.as_str() };
        if self.insert_if_absent(self.steps_collection(), filter, &step).await? {
            record_db_call("create_step", start);
            Ok(step)
        } else {
            Err(DatabaseError::ItemAlreadyExists(format!(
                "Step {} already exists for job {}",
                step.step_id, step.job_id
            )))
        }
    }

    async fn get_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError> {
        let start = Instant::now();
        let step = self.steps_collection().find_one(doc! { "job_id": job_id, "step_id": step_id }, None).await?;
        record_db_call("get_step", start);
        Ok(step)
    }

    async fn update_step(&self, current: &StepItem, update: StepItemUpdates) -> Result<StepItem, DatabaseError> {
        let start = Instant::now();
        let filter = doc! {
            "job_id": current.job_id.as_str(),
            "step_id": current.step_id.as_str(),
            "version": current.version,
        };
        let options = FindOneAndUpdateOptions::builder().upsert(false).return_document(ReturnDocument::After).build();
        let update = versioned_set(&update, current.version)?;

        match self.steps_collection().find_one_and_update(filter, update, options).await? {
            Some(step) => {
                record_db_call("update_step", start);
                Ok(step)
            }
            None => {
                warn!(
                    job_id = %current.job_id,
                    step_id = %current.step_id,
                    version = %current.version,
                    "Failed to update step. Step version is likely outdated"
                );
                Err(DatabaseError::UpdateFailed(format!(
                    "Failed to update step. Identifier - {}/{}",
                    current.job_id, current.step_id
                )))
            }
        }
    }

    async fn delete_step(&self, job_id: &str, step_id: &str) -> Result<(), DatabaseError> {
        let start = Instant::now();
        self.steps_collection().delete_one(doc! { "job_id": job_id, "step_id": step_id }, None).await?;
        record_db_call("delete_step", start);
        Ok(())
    }

    async fn claim_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError> {
        let start = Instant::now();
        let claimed = self.swap_step_status(job_id, step_id, StepStatus::Finished, StepStatus::Used).await?;
        record_db_call("claim_step", start);
        Ok(claimed)
    }

    async fn release_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError> {
        let start = Instant::now();
        let released = self.swap_step_status(job_id, step_id, StepStatus::Used, StepStatus::Finished).await?;
        record_db_call("release_step", start);
        Ok(released)
    }

    async fn get_step_health(&self, job_id: &str) -> Result<Vec<StepHealthView>, DatabaseError> {
        let start = Instant::now();
        let projection = doc! {
            "_id": 0,
            "step_id": 1,
            "task": 1,
            "status": 1,
            "attempts": 1,
            "created_at": 1,
            "started_at": 1,
            "updated_at": 1,
        };
        let options = FindOptions::builder().projection(projection).build();
        let cursor = self
            .steps_collection()
            .clone_with_type::<StepHealthView>()
            .find(doc! { "job_id": job_id }, options)
            .await?;
        let views: Vec<StepHealthView> = cursor.try_collect().await?;
        record_db_call("get_step_health", start);
        Ok(views)
    }

    async fn create_proof_marker(&self, marker: ProofMarker) -> Result<(), DatabaseError> {
        let start = Instant::now();
        let filter = doc! { "job_id": marker.job_id.as_str(), "step_id": marker.step_id.as_str() };
        // a duplicate marker for the same step is harmless
        self.insert_if_absent(self.markers_collection(), filter, &marker).await?;
        record_db_call("create_proof_marker", start);
        Ok(())
    }

    async fn get_proof_markers(&self, job_id: &str) -> Result<Vec<ProofMarker>, DatabaseError> {
        let start = Instant::now();
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        let cursor = self.markers_collection().find(doc! { "job_id": job_id }, options).await?;
        let markers: Vec<ProofMarker> = cursor.try_collect().await?;
        record_db_call("get_proof_markers", start);
        Ok(markers)
    }

    async fn delete_proof_marker(&self, job_id: &str, step_id: &str) -> Result<(), DatabaseError> {
        let start = Instant::now();
        self.markers_collection().delete_one(doc! { "job_id": job_id, "step_id": step_id }, None).await?;
        record_db_call("delete_proof_marker", start);
        Ok(())
    }
}
