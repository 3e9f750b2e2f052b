//! Ephemeral NEAR sandbox provisioning.
//!
//! Every scenario gets its own sandbox process. Accounts are created as
//! sub-accounts of the genesis account and funded by it.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use near_api::{Account, AccountId, Contract, NearToken, NetworkConfig, RPCEndpoint, Signer, signer};
use near_sandbox::{GenesisAccount, Sandbox};
use tokio::net::TcpStream;
use tokio::time::{Duration, sleep};
use tracing::{debug, info};

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);
const SHUTDOWN_POLL_ATTEMPTS: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("failed to start sandbox: {0}")]
    Provision(String),
    #[error("failed to create account {account_id}: {reason}")]
    Account { account_id: String, reason: String },
    #[error("failed to deploy contract: {0}")]
    Deployment(String),
    #[error("sandbox RPC request failed: {0}")]
    Rpc(String),
    #[error("failed to stop sandbox: {0}")]
    Teardown(String),
}

/// Resource released once at the end of every scenario.
pub trait Environment {
    fn teardown(self) -> impl Future<Output = Result<(), SandboxError>>;
}

/// A sandbox identity and the key it signs with.
#[derive(Clone)]
pub struct TestAccount {
    pub id: AccountId,
    pub signer: Arc<Signer>,
}

impl std::fmt::Debug for TestAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestAccount").field("id", &self.id).finish_non_exhaustive()
    }
}

/// A running sandbox node with its network config and root identity.
pub struct SandboxEnvironment {
    sandbox: Sandbox,
    network_config: NetworkConfig,
    root: TestAccount,
}

impl SandboxEnvironment {
    /// Starts a fresh sandbox node, independent of any other running instance.
    pub async fn provision() -> Result<Self, SandboxError> {
        let sandbox = Sandbox::start_sandbox()
            .await
            .map_err(|e| SandboxError::Provision(e.to_string()))?;
        let network_config = create_network_config(&sandbox)?;
        let root = genesis_account()?;
        info!(rpc_addr = %sandbox.rpc_addr, root = %root.id, "Sandbox started");

        Ok(Self {
            sandbox,
            network_config,
            root,
        })
    }

    pub fn root_account(&self) -> &TestAccount {
        &self.root
    }

    pub fn network_config(&self) -> &NetworkConfig {
        &self.network_config
    }

    pub fn rpc_addr(&self) -> &str {
        &self.sandbox.rpc_addr
    }

    /// Creates `<name>.<parent>` with a fresh key, funded by `parent`.
    pub async fn create_funded_account(
        &self,
        parent: &TestAccount,
        name: &str,
        initial_balance: NearToken,
    ) -> Result<TestAccount, SandboxError> {
        let account_id = format!("{}.{}", name, parent.id);
        let account_error = |reason: String| SandboxError::Account {
            account_id: account_id.clone(),
            reason,
        };

        let id: AccountId = account_id.parse().map_err(|e| account_error(format!("{e}")))?;
        let secret_key = signer::generate_secret_key().map_err(|e| account_error(e.to_string()))?;
        let account_signer =
            Signer::from_secret_key(secret_key.clone()).map_err(|e| account_error(e.to_string()))?;

        Account::create_account(id.clone())
            .fund_myself(parent.id.clone(), initial_balance)
            .with_public_key(secret_key.public_key())
            .with_signer(parent.signer.clone())
            .send_to(&self.network_config)
            .await
            .map_err(|e| account_error(e.to_string()))?
            .into_result()
            .map_err(|e| account_error(format!("{e:?}")))?;

        debug!(account_id = %id, balance = %initial_balance, "Created sandbox account");
        Ok(TestAccount {
            id,
            signer: account_signer,
        })
    }

    /// Deploys the wasm at `artifact_path` into `account` without an init call.
    pub async fn deploy_contract(
        &self,
        account: &TestAccount,
        artifact_path: &Path,
    ) -> Result<(), SandboxError> {
        let wasm_bytes = std::fs::read(artifact_path).map_err(|e| {
            SandboxError::Deployment(format!("cannot read {}: {e}", artifact_path.display()))
        })?;
        if wasm_bytes.is_empty() {
            return Err(SandboxError::Deployment(format!(
                "{} is empty",
                artifact_path.display()
            )));
        }

        Contract::deploy(account.id.clone())
            .use_code(wasm_bytes)
            .without_init_call()
            .with_signer(account.signer.clone())
            .send_to(&self.network_config)
            .await
            .map_err(|e| SandboxError::Deployment(e.to_string()))?
            .into_result()
            .map_err(|e| SandboxError::Deployment(format!("{e:?}")))?;

        info!(account_id = %account.id, artifact = %artifact_path.display(), "Contract deployed");
        Ok(())
    }

    /// Base58 hash of the code currently deployed on `account_id`.
    pub async fn code_hash(&self, account_id: &AccountId) -> Result<String, SandboxError> {
        let account = Account(account_id.clone())
            .view()
            .fetch_from(&self.network_config)
            .await
            .map_err(|e| SandboxError::Rpc(format!("view account {account_id}: {e}")))?;
        let code_hash = match account.data.contract_state {
            near_api::types::account::ContractState::LocalHash(hash) => hash,
            _ => near_api::types::CryptoHash::default(),
        };
        Ok(code_hash.to_string())
    }
}

impl Environment for SandboxEnvironment {
    /// Kills the node and waits until its RPC port is closed.
    async fn teardown(self) -> Result<(), SandboxError> {
        let rpc_url = reqwest::Url::parse(&self.sandbox.rpc_addr)
            .map_err(|e| SandboxError::Teardown(e.to_string()))?;
        let host = rpc_url.host_str().unwrap_or("127.0.0.1").to_string();
        let port = rpc_url
            .port_or_known_default()
            .ok_or_else(|| SandboxError::Teardown(format!("no port in {rpc_url}")))?;

        // Dropping the handle kills the node process.
        drop(self.sandbox);

        for _ in 0..SHUTDOWN_POLL_ATTEMPTS {
            if TcpStream::connect((host.as_str(), port)).await.is_err() {
                info!(%rpc_url, "Sandbox stopped");
                return Ok(());
            }
            sleep(SHUTDOWN_POLL_INTERVAL).await;
        }
        Err(SandboxError::Teardown(format!(
            "{rpc_url} still accepting connections"
        )))
    }
}

pub fn create_network_config(sandbox: &Sandbox) -> Result<NetworkConfig, SandboxError> {
    let rpc_url = reqwest::Url::parse(&sandbox.rpc_addr)
        .map_err(|e| SandboxError::Provision(e.to_string()))?;
    Ok(NetworkConfig {
        network_name: "sandbox".to_string(),
        rpc_endpoints: vec![RPCEndpoint::new(rpc_url)],
        ..NetworkConfig::testnet()
    })
}

/// The genesis account every sandbox starts with.
pub fn genesis_account() -> Result<TestAccount, SandboxError> {
    let genesis = GenesisAccount::default();
    let id: AccountId = genesis
        .account_id
        .to_string()
        .parse()
        .map_err(|e| SandboxError::Provision(format!("genesis account id: {e}")))?;
    let signer = Signer::from_secret_key(
        genesis
            .private_key
            .parse()
            .map_err(|e| SandboxError::Provision(format!("genesis key: {e}")))?,
    )
    .map_err(|e| SandboxError::Provision(format!("genesis signer: {e}")))?;

    Ok(TestAccount { id, signer })
}
