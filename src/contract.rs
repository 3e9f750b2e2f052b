use near_api::{AccountId, Contract, Data, NetworkConfig};
use tracing::{debug, info};

use crate::payload::OraclePayload;
use crate::sandbox::TestAccount;

pub const GET_ORACLE_VALUE: &str = "get_oracle_value";
pub const DO_SOMETHING_WITH_ORACLE_VALUE: &str = "do_something_with_oracle_value";

#[derive(Debug, thiserror::Error)]
pub enum ContractCallError {
    #[error("view `{method}` on {contract_id} failed: {reason}")]
    View {
        contract_id: AccountId,
        method: String,
        reason: String,
    },
    #[error("transaction `{method}` on {contract_id} could not be sent: {reason}")]
    Transaction {
        contract_id: AccountId,
        method: String,
        reason: String,
    },
    #[error("`{method}` on {contract_id} failed: {reason}")]
    Failed {
        contract_id: AccountId,
        method: String,
        reason: String,
    },
}

/// Read-only `get_oracle_value` call. The returned value is opaque to the harness.
pub async fn get_oracle_value(
    network_config: &NetworkConfig,
    contract_id: &AccountId,
    payload: &OraclePayload,
    symbol: &str,
) -> Result<serde_json::Value, ContractCallError> {
    let result: Data<serde_json::Value> = Contract(contract_id.clone())
        .call_function(GET_ORACLE_VALUE, payload.contract_args(symbol))
        .read_only()
        .fetch_from(network_config)
        .await
        .map_err(|e| ContractCallError::View {
            contract_id: contract_id.clone(),
            method: GET_ORACLE_VALUE.to_string(),
            reason: e.to_string(),
        })?;

    debug!(%contract_id, %symbol, value = %result.data, "Oracle value viewed");
    Ok(result.data)
}

/// State-changing `do_something_with_oracle_value` call signed by `caller`.
pub async fn do_something_with_oracle_value(
    network_config: &NetworkConfig,
    caller: &TestAccount,
    contract_id: &AccountId,
    payload: &OraclePayload,
    symbol: &str,
) -> Result<(), ContractCallError> {
    let method = DO_SOMETHING_WITH_ORACLE_VALUE;
    let result = Contract(contract_id.clone())
        .call_function(method, payload.contract_args(symbol))
        .transaction()
        .with_signer(caller.id.clone(), caller.signer.clone())
        .send_to(network_config)
        .await
        .map_err(|e| ContractCallError::Transaction {
            contract_id: contract_id.clone(),
            method: method.to_string(),
            reason: e.to_string(),
        })?;

    result
        .into_result()
        .map_err(|e| ContractCallError::Failed {
            contract_id: contract_id.clone(),
            method: method.to_string(),
            reason: format!("{e:?}"),
        })?;

    info!(caller = %caller.id, %contract_id, %symbol, "Oracle value consumed");
    Ok(())
}
