use std::path::PathBuf;
use std::time::Duration;

use near_api::NearToken;

use crate::payload::PayloadRequest;

pub const DEFAULT_DATA_SERVICE_ID: &str = "redstone-main-demo";
pub const DEFAULT_UNIQUE_SIGNERS_COUNT: u32 = 1;
pub const DEFAULT_SYMBOL: &str = "BTC";
pub const DEFAULT_INITIAL_BALANCE_NEAR: u128 = 30;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable holding the contract artifact path used by the test suite.
pub const CONTRACT_WASM_ENV: &str = "REDSTONE_CONTRACT_WASM";
pub const DEFAULT_CONTRACT_WASM_PATH: &str = "res/redstone_oracle_example.wasm";

/// Gateways serving RedStone data packages, tried in order.
pub const REDSTONE_DATA_GATEWAYS: [&str; 2] = [
    "https://cache-service-direct-1.b.redstone.finance",
    "https://d33trozg86ya9x.cloudfront.net",
];

/// Everything a scenario run needs besides the sandbox itself.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub payload: PayloadRequest,
    pub gateways: Vec<String>,
    /// Symbol passed to the contract alongside the payload.
    pub symbol: String,
    pub initial_balance: NearToken,
    pub wasm_path: PathBuf,
    pub request_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            payload: PayloadRequest::new(
                DEFAULT_DATA_SERVICE_ID,
                DEFAULT_UNIQUE_SIGNERS_COUNT,
                [DEFAULT_SYMBOL],
            ),
            gateways: REDSTONE_DATA_GATEWAYS.iter().map(|g| g.to_string()).collect(),
            symbol: DEFAULT_SYMBOL.to_string(),
            initial_balance: NearToken::from_near(DEFAULT_INITIAL_BALANCE_NEAR),
            wasm_path: PathBuf::from(DEFAULT_CONTRACT_WASM_PATH),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl HarnessConfig {
    /// Default config deploying the given contract artifact.
    pub fn with_wasm_path(wasm_path: impl Into<PathBuf>) -> Self {
        Self {
            wasm_path: wasm_path.into(),
            ..Self::default()
        }
    }

    /// Default config with the artifact path taken from `REDSTONE_CONTRACT_WASM`, if set.
    pub fn from_env() -> Self {
        match std::env::var_os(CONTRACT_WASM_ENV) {
            Some(path) => Self::with_wasm_path(path),
            None => Self::default(),
        }
    }

    /// Requests a single feed and uses it as the scenario symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        self.payload.data_feeds = vec![symbol.clone()];
        self.symbol = symbol;
        self
    }

    pub fn with_gateways<I, S>(mut self, gateways: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gateways = gateways.into_iter().map(Into::into).collect();
        self
    }
}
