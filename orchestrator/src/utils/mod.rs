pub mod helpers;
pub mod logging;
pub mod metrics;
pub mod webhook;
