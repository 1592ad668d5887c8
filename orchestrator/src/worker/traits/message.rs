use omniqueue::Delivery;

use crate::error::event::EventSystemResult;
use crate::types::queue::{SequencerQueueMessage, StepQueueMessage};

#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Step(Box<StepQueueMessage>),
    Sequencer(Box<SequencerQueueMessage>),
}

impl ParsedMessage {
    pub fn job_id(&self) -> &str {
        match self {
            ParsedMessage::Step(msg) => &msg.job_id,
            ParsedMessage::Sequencer(msg) => &msg.job_id,
        }
    }
}

/// MessageParser - Trait to parse the message from the queue
/// and convert it into the required format for the worker
pub trait MessageParser: Send + Sync {
    fn parse_message(message: &Delivery) -> EventSystemResult<Box<Self>>;
}
