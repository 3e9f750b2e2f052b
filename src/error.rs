use crate::contract::ContractCallError;
use crate::payload::PayloadError;
use crate::sandbox::SandboxError;

/// Any failure that ends a scenario.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error(transparent)]
    ContractCall(#[from] ContractCallError),
    #[error("account `{0}` is not part of the scenario context")]
    MissingAccount(String),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

impl HarnessError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Payload(PayloadError::Network { .. }))
    }

    pub fn is_deployment(&self) -> bool {
        matches!(self, Self::Sandbox(SandboxError::Deployment(_)))
    }
}
