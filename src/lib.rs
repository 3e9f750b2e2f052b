//! End-to-end harness for NEAR contracts that consume signed RedStone oracle payloads.
//!
//! Each scenario runs in its own ephemeral sandbox: the contract artifact is deployed
//! into a fresh account, a payload is fetched from the RedStone gateways and passed
//! verbatim to the contract.

pub mod config;
pub mod contract;
pub mod error;
pub mod lifecycle;
pub mod payload;
pub mod sandbox;
pub mod scenarios;

pub use config::HarnessConfig;
pub use error::HarnessError;
pub use lifecycle::{ScenarioContext, run_scenario, run_with};
pub use payload::{OraclePayload, PayloadError, PayloadFetcher, PayloadRequest, get_redstone_payload};
pub use sandbox::{Environment, SandboxEnvironment, SandboxError, TestAccount};

/// Installs a `tracing` subscriber honouring `RUST_LOG`, defaulting to `info`.
/// Safe to call more than once.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
