use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::delete_object::DeleteObjectError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::put_object::PutObjectError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to put object : {0}")]
    UnableToPutObject(#[from] SdkError<PutObjectError>),
    #[error("Unable to delete object : {0}")]
    DeleteObjectError(#[from] SdkError<DeleteObjectError>),
    #[error("Failed to get data from S3: {0}")]
    GetObjectError(#[from] SdkError<GetObjectError>),
    #[error("Object not found: {0}")]
    ObjectNotFound(String),
    #[error("Failed to stream object: {0}")]
    ObjectStreamError(String),
    #[error("Invalid Bucket Name is given: {0}")]
    InvalidBucketName(String),
    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(String),
}
