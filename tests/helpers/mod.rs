// Test Helpers
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use redstone_near_e2e::{Environment, HarnessConfig, SandboxError};
use tokio::net::TcpListener;

#[derive(Clone)]
struct GatewayState {
    status: StatusCode,
    body: String,
    queries: Arc<Mutex<Vec<String>>>,
}

/// Local stand-in for a RedStone gateway serving a fixed response.
#[allow(dead_code)]
pub struct MockGateway {
    pub url: String,
    queries: Arc<Mutex<Vec<String>>>,
    server: tokio::task::JoinHandle<()>,
}

#[allow(dead_code)]
impl MockGateway {
    pub async fn start(status: StatusCode, body: &str) -> Self {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let state = GatewayState {
            status,
            body: body.to_string(),
            queries: queries.clone(),
        };
        let router = Router::new()
            .route("/data-packages/payload", get(serve_payload))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            url: format!("http://{addr}"),
            queries,
            server,
        }
    }

    pub async fn ok(body: &str) -> Self {
        Self::start(StatusCode::OK, body).await
    }

    /// Raw query strings of every request received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn serve_payload(
    State(state): State<GatewayState>,
    RawQuery(query): RawQuery,
) -> (StatusCode, String) {
    state.queries.lock().unwrap().push(query.unwrap_or_default());
    (state.status, state.body.clone())
}

/// URL of a local port nothing listens on.
#[allow(dead_code)]
pub async fn unreachable_gateway() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Config for the live scenarios: artifact from `REDSTONE_CONTRACT_WASM`, else the
/// default path under the crate root.
#[allow(dead_code)]
pub fn live_config() -> HarnessConfig {
    redstone_near_e2e::init_tracing();
    HarnessConfig::from_env()
}

/// In-memory environment counting its teardowns.
#[allow(dead_code)]
pub struct FakeEnvironment {
    pub id: usize,
    teardowns: Arc<AtomicUsize>,
    fail_teardown: bool,
}

#[allow(dead_code)]
impl FakeEnvironment {
    pub fn new(id: usize, teardowns: Arc<AtomicUsize>) -> Self {
        Self {
            id,
            teardowns,
            fail_teardown: false,
        }
    }

    pub fn failing(id: usize, teardowns: Arc<AtomicUsize>) -> Self {
        Self {
            fail_teardown: true,
            ..Self::new(id, teardowns)
        }
    }
}

impl Environment for FakeEnvironment {
    async fn teardown(self) -> Result<(), SandboxError> {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        if self.fail_teardown {
            return Err(SandboxError::Teardown("simulated shutdown failure".into()));
        }
        Ok(())
    }
}
