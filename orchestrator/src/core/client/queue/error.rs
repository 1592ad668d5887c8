use aws_sdk_sqs::error::SdkError;
use aws_sdk_sqs::operation::get_queue_url::GetQueueUrlError;
use aws_sdk_sqs::operation::receive_message::ReceiveMessageError;
use aws_sdk_sqs::operation::send_message::SendMessageError;
use omniqueue::QueueError as OmniQueueError;
use thiserror::Error;

use crate::types::queue::QueueType;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Failed to get queue url: {0}")]
    GetQueueUrlError(#[from] SdkError<GetQueueUrlError>),

    #[error("Failed to send message: {0}")]
    SendMessageError(#[from] SdkError<SendMessageError>),

    #[error("Failed to receive message: {0}")]
    ReceiveMessageError(#[from] SdkError<ReceiveMessageError>),

    #[error("Failed to get queue url: {0}")]
    ErrorFromQueueError(#[from] OmniQueueError),

    #[error("Failed to get queue url for queue name : {0}")]
    FailedToGetQueueUrl(String),

    #[error("No queue configured for queue type : {0}")]
    QueueNotConfigured(QueueType),
}
