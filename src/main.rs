use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use redstone_near_e2e::config::{DEFAULT_DATA_SERVICE_ID, DEFAULT_SYMBOL, DEFAULT_UNIQUE_SIGNERS_COUNT};
use redstone_near_e2e::{HarnessConfig, init_tracing, scenarios};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    Read,
    Mutate,
    All,
}

/// Runs the RedStone oracle scenarios against a contract in a local NEAR sandbox.
#[derive(Debug, Parser)]
#[command(name = "redstone-near-e2e", version)]
struct Cli {
    /// Path to the compiled contract wasm.
    wasm_path: PathBuf,

    #[arg(long, default_value = DEFAULT_SYMBOL)]
    symbol: String,

    #[arg(long, default_value = DEFAULT_DATA_SERVICE_ID)]
    data_service_id: String,

    #[arg(long, default_value_t = DEFAULT_UNIQUE_SIGNERS_COUNT)]
    unique_signers_count: u32,

    /// Gateway URL; repeat to set the fallback order. Defaults to the RedStone gateways.
    #[arg(long = "gateway")]
    gateways: Vec<String>,

    #[arg(long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,
}

impl Cli {
    fn into_config(self) -> (HarnessConfig, Scenario) {
        let mut config = HarnessConfig::with_wasm_path(self.wasm_path).with_symbol(self.symbol);
        config.payload.data_service_id = self.data_service_id;
        config.payload.unique_signers_count = self.unique_signers_count;
        if !self.gateways.is_empty() {
            config = config.with_gateways(self.gateways);
        }
        (config, self.scenario)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let (config, scenario) = Cli::parse().into_config();

    let mut failed = false;
    if matches!(scenario, Scenario::Read | Scenario::All) {
        match scenarios::run_read_scenario(&config).await {
            Ok(value) => info!(%value, "can get oracle value: passed"),
            Err(e) => {
                error!(error = %e, "can get oracle value: failed");
                failed = true;
            }
        }
    }
    if matches!(scenario, Scenario::Mutate | Scenario::All) {
        match scenarios::run_mutation_scenario(&config).await {
            Ok(()) => info!("can do smth with oracle value: passed"),
            Err(e) => {
                error!(error = %e, "can do smth with oracle value: failed");
                failed = true;
            }
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
