pub mod health;
pub mod pairing;
pub mod run_loop;
pub mod start;
