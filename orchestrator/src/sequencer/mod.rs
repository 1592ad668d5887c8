//! Drives a job from `created` to a terminal status.
//!
//! The sequencer keeps no state between iterations: everything it needs is
//! re-read from the store on every pass, and every mutation that races with a
//! concurrent sequencer goes through a conditional write. Several sequencers
//! may therefore run the same job at once without corrupting it.

pub mod finalize;
pub mod health;
pub mod iteration;
pub mod pairing;
pub mod run_loop;
pub mod start;

use chrono::{DateTime, Utc};

use crate::types::jobs::job_item::JobItem;
use crate::types::params::sequencer::SequencerParams;

pub struct Sequencer;

impl Sequencer {
    /// True once the job has outlived `max_job_time`.
    pub fn is_expired(job: &JobItem, params: &SequencerParams, now: DateTime<Utc>) -> bool {
        job.age_ms(now) > params.max_job_time.as_millis() as i64
    }
}
