//! Per-scenario setup and teardown.
//!
//! `run_scenario` acquires a fresh sandbox, hands the context to the scenario body and
//! always tears the sandbox down afterwards. A teardown failure is logged and never
//! replaces the body's result.

use std::collections::HashMap;
use std::future::Future;

use tracing::{info, warn};

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::sandbox::{Environment, SandboxEnvironment, TestAccount};

pub const ALICE: &str = "alice";
pub const CONTRACT: &str = "contract";

/// State shared by the before-hook, the scenario body and the after-hook.
pub struct ScenarioContext<E> {
    pub env: E,
    pub accounts: HashMap<String, TestAccount>,
}

impl<E> ScenarioContext<E> {
    pub fn new(env: E) -> Self {
        Self {
            env,
            accounts: HashMap::new(),
        }
    }

    pub fn account(&self, name: &str) -> Result<&TestAccount, HarnessError> {
        self.accounts
            .get(name)
            .ok_or_else(|| HarnessError::MissingAccount(name.to_string()))
    }

    pub fn alice(&self) -> Result<&TestAccount, HarnessError> {
        self.account(ALICE)
    }

    pub fn contract(&self) -> Result<&TestAccount, HarnessError> {
        self.account(CONTRACT)
    }
}

/// Starts a sandbox, creates `alice` and `contract` and deploys the configured
/// artifact into `contract`. On failure the sandbox is dropped, which stops it.
pub async fn before_each(
    config: &HarnessConfig,
) -> Result<ScenarioContext<SandboxEnvironment>, HarnessError> {
    let env = SandboxEnvironment::provision().await?;
    let root = env.root_account().clone();

    let alice = env
        .create_funded_account(&root, ALICE, config.initial_balance)
        .await?;
    let contract = env
        .create_funded_account(&root, CONTRACT, config.initial_balance)
        .await?;
    env.deploy_contract(&contract, &config.wasm_path).await?;

    let mut ctx = ScenarioContext::new(env);
    ctx.accounts.insert(ALICE.to_string(), alice);
    ctx.accounts.insert(CONTRACT.to_string(), contract);
    Ok(ctx)
}

/// Tears the environment down, logging instead of propagating failures.
pub async fn after_each<E: Environment>(env: E) {
    if let Err(error) = env.teardown().await {
        warn!(%error, "Failed to stop the Sandbox");
    }
}

/// Acquires a context via `setup`, runs `body` against it and always releases it.
///
/// Bodies should report failures as `Err`. A panic unwinds past `after_each`; the
/// environment is then only released by its `Drop`, and teardown errors go unlogged.
pub async fn run_with<E, S, F, T>(setup: S, body: F) -> Result<T, HarnessError>
where
    E: Environment,
    S: Future<Output = Result<ScenarioContext<E>, HarnessError>>,
    F: AsyncFnOnce(&mut ScenarioContext<E>) -> Result<T, HarnessError>,
{
    let mut ctx = setup.await?;
    let outcome = body(&mut ctx).await;
    if let Err(error) = &outcome {
        info!(%error, "Scenario failed, tearing down");
    }
    after_each(ctx.env).await;
    outcome
}

/// Runs `body` in a freshly provisioned sandbox.
pub async fn run_scenario<F, T>(config: &HarnessConfig, body: F) -> Result<T, HarnessError>
where
    F: AsyncFnOnce(&mut ScenarioContext<SandboxEnvironment>) -> Result<T, HarnessError>,
{
    run_with(before_each(config), body).await
}
