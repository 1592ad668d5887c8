use mongodb::bson;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),

    #[error("Failed to serialize document: {0}")]
    BsonSerializationError(#[from] bson::ser::Error),

    #[error("Failed to serialize document: {0}")]
    FailedToSerializeDocument(String),

    #[error("Item already exists: {0}")]
    ItemAlreadyExists(String),

    /// A versioned update whose expected version no longer matches
    #[error("Update failed: {0}")]
    UpdateFailed(String),

    #[error("No update found: {0}")]
    NoUpdateFound(String),

    #[error("Database lock poisoned: {0}")]
    LockPoisoned(String),
}
