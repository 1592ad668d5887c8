
pub mod common;
pub mod sequencer;
pub mod workers;
