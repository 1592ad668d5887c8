use omniqueue::Delivery;

use crate::error::event::{EventSystemError, EventSystemResult};
use crate::types::queue::StepQueueMessage;
use crate::worker::parser::payload_str;
use crate::worker::traits::message::MessageParser;

impl MessageParser for StepQueueMessage {
    fn parse_message(message: &Delivery) -> EventSystemResult<Box<Self>> {
        let payload = payload_str(message)?;
        let parsed: StepQueueMessage =
            serde_json::from_str(&payload).map_err(|e| EventSystemError::PayloadSerdeError(e.to_string()))?;
        Ok(Box::new(parsed))
    }
}
