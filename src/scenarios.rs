//! The two oracle scenarios. Each fetches its own payload right before the call,
//! since payloads are time-sensitive.

use tracing::info;

use crate::config::HarnessConfig;
use crate::contract;
use crate::error::HarnessError;
use crate::lifecycle::{self, ScenarioContext};
use crate::payload::get_redstone_payload;
use crate::sandbox::SandboxEnvironment;

/// Views `get_oracle_value` and returns the (non-null) value.
pub async fn can_get_oracle_value(
    ctx: &mut ScenarioContext<SandboxEnvironment>,
    config: &HarnessConfig,
) -> Result<serde_json::Value, HarnessError> {
    let contract_id = ctx.contract()?.id.clone();
    let payload = get_redstone_payload(config).await?;

    let value = contract::get_oracle_value(
        ctx.env.network_config(),
        &contract_id,
        &payload,
        &config.symbol,
    )
    .await?;
    info!(symbol = %config.symbol, oracle_value_from_contract = %value, "Oracle value from contract");

    if value.is_null() {
        return Err(HarnessError::Assertion(format!(
            "{} returned null for {}",
            contract::GET_ORACLE_VALUE,
            config.symbol
        )));
    }
    Ok(value)
}

/// Calls `do_something_with_oracle_value` as `alice` and checks the contract
/// account still holds the same code.
pub async fn can_do_something_with_oracle_value(
    ctx: &mut ScenarioContext<SandboxEnvironment>,
    config: &HarnessConfig,
) -> Result<(), HarnessError> {
    let alice = ctx.alice()?.clone();
    let contract_id = ctx.contract()?.id.clone();
    let payload = get_redstone_payload(config).await?;

    let code_hash_before = ctx.env.code_hash(&contract_id).await?;
    contract::do_something_with_oracle_value(
        ctx.env.network_config(),
        &alice,
        &contract_id,
        &payload,
        &config.symbol,
    )
    .await?;

    let code_hash_after = ctx.env.code_hash(&contract_id).await?;
    if code_hash_before != code_hash_after {
        return Err(HarnessError::Assertion(format!(
            "code on {contract_id} changed from {code_hash_before} to {code_hash_after}"
        )));
    }
    Ok(())
}

/// Read scenario wrapped in its own sandbox lifecycle.
pub async fn run_read_scenario(config: &HarnessConfig) -> Result<serde_json::Value, HarnessError> {
    lifecycle::run_scenario(config, async |ctx| can_get_oracle_value(ctx, config).await).await
}

/// Mutation scenario wrapped in its own sandbox lifecycle.
pub async fn run_mutation_scenario(config: &HarnessConfig) -> Result<(), HarnessError> {
    lifecycle::run_scenario(config, async |ctx| {
        can_do_something_with_oracle_value(ctx, config).await
    })
    .await
}
