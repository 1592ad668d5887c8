pub mod sequencer_message;
pub mod step_message;

use omniqueue::Delivery;

use crate::error::event::{EventSystemError, EventSystemResult};

/// Raw JSON payload of a delivery.
pub(crate) fn payload_str(message: &Delivery) -> EventSystemResult<String> {
    let payload = message
        .borrow_payload()
        .ok_or_else(|| EventSystemError::PayloadSerdeError("Empty payload".to_string()))?;
    Ok(String::from_utf8_lossy(payload).to_string())
}
