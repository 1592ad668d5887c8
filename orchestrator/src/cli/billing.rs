use clap::Args;
use url::Url;

/// Parameters used to config the billing hook.
#[derive(Debug, Clone, Args)]
pub struct BillingCliArgs {
    /// Charge endpoint. Charges are only logged when unset.
    #[arg(env = "PROOF_ORCHESTRATOR_BILLING_URL", long)]
    pub billing_url: Option<Url>,

    /// Upper bound of one charge request.
    #[arg(env = "PROOF_ORCHESTRATOR_BILLING_TIMEOUT_SECONDS", long, default_value = "30")]
    pub billing_timeout_seconds: u64,
}
