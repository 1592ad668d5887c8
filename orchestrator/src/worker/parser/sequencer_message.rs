use omniqueue::Delivery;

use crate::error::event::{EventSystemError, EventSystemResult};
use crate::types::queue::SequencerQueueMessage;
use crate::worker::parser::payload_str;
use crate::worker::traits::message::MessageParser;

impl MessageParser for SequencerQueueMessage {
    fn parse_message(message: &Delivery) -> EventSystemResult<Box<Self>> {
        let payload = payload_str(message)?;
        let parsed: SequencerQueueMessage =
            serde_json::from_str(&payload).map_err(|e| EventSystemError::PayloadSerdeError(e.to_string()))?;
        Ok(Box::new(parsed))
    }
}
