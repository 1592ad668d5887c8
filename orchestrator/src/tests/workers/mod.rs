pub mod controller;
pub mod service;
pub mod step_runner;
