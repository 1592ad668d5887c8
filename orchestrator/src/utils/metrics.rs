use once_cell::sync::Lazy;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram, Meter};

pub static ORCHESTRATOR_METRICS: Lazy<OrchestratorMetrics> = Lazy::new(OrchestratorMetrics::register);

pub struct OrchestratorMetrics {
    pub jobs_submitted: Counter<u64>,
    pub jobs_finished: Counter<u64>,
    pub jobs_failed: Counter<u64>,
    pub steps_finished: Counter<u64>,
    pub steps_failed: Counter<u64>,
    pub merges_created: Counter<u64>,
    pub claims_lost: Counter<u64>,
    pub iteration_duration: Histogram<f64>,
    pub db_calls_response_time: Histogram<f64>,
}

impl OrchestratorMetrics {
    pub fn register() -> Self {
        let meter: Meter = global::meter("crates.proof_orchestrator.opentelemetry");

        let jobs_submitted = meter
            .u64_counter("jobs_submitted")
            .with_description("Count of jobs accepted by the submission path")
            .with_unit("jobs")
            .build();

        let jobs_finished = meter
            .u64_counter("jobs_finished")
            .with_description("Count of jobs finalized with a result")
            .with_unit("jobs")
            .build();

        let jobs_failed = meter
            .u64_counter("jobs_failed")
            .with_description("Count of failed jobs over time")
            .with_unit("jobs")
            .build();

        let steps_finished = meter
            .u64_counter("steps_finished")
            .with_description("Count of steps whose worker call produced a proof")
            .with_unit("steps")
            .build();

        let steps_failed = meter
            .u64_counter("steps_failed")
            .with_description("Count of failed steps over time")
            .with_unit("steps")
            .build();

        let merges_created = meter
            .u64_counter("merges_created")
            .with_description("Count of merge steps created by the sequencer")
            .with_unit("steps")
            .build();

        let claims_lost = meter
            .u64_counter("claims_lost")
            .with_description("Count of finished -> used claims lost to a concurrent iteration")
            .with_unit("claims")
            .build();

        let iteration_duration = meter
            .f64_histogram("iteration_duration")
            .with_description("Time taken by one sequencer iteration")
            .with_unit("ms")
            .build();

        let db_calls_response_time = meter
            .f64_histogram("db_calls_response_time")
            .with_description("Response time of DB calls over time")
            .with_unit("s")
            .build();

        Self {
            jobs_submitted,
            jobs_finished,
            jobs_failed,
            steps_finished,
            steps_failed,
            merges_created,
            claims_lost,
            iteration_duration,
            db_calls_response_time,
        }
    }
}
