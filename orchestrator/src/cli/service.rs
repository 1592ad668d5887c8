use clap::Args;

fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(value)
}

#[derive(Debug, Clone, Args)]
pub struct ServiceCliArgs {
    /// Maximum number of step runs handled concurrently by this instance.
    #[arg(env = "PROOF_ORCHESTRATOR_MAX_CONCURRENT_STEPS", long, default_value = "16", value_parser = parse_positive_usize)]
    pub max_concurrent_steps: usize,

    /// Maximum number of sequencer loops driven concurrently by this instance.
    #[arg(env = "PROOF_ORCHESTRATOR_MAX_CONCURRENT_SEQUENCERS", long, default_value = "8", value_parser = parse_positive_usize)]
    pub max_concurrent_sequencers: usize,
}
