pub mod step_item;
pub mod step_updates;
pub mod types;
