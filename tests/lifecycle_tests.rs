mod helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use helpers::*;
use near_api::signer;
use near_api::{AccountId, Signer};
use redstone_near_e2e::{
    HarnessConfig, HarnessError, PayloadError, ScenarioContext, SandboxError, TestAccount,
    get_redstone_payload, run_with,
};

fn fake_setup(
    id: usize,
    teardowns: &Arc<AtomicUsize>,
) -> impl Future<Output = Result<ScenarioContext<FakeEnvironment>, HarnessError>> {
    let env = FakeEnvironment::new(id, teardowns.clone());
    async move { Ok(ScenarioContext::new(env)) }
}

fn test_account(name: &str) -> TestAccount {
    let secret_key = signer::generate_secret_key().unwrap();
    let id: AccountId = format!("{name}.test.near").parse().unwrap();
    TestAccount {
        id,
        signer: Signer::from_secret_key(secret_key).unwrap(),
    }
}

/// Tests that a passing scenario tears its environment down exactly once
#[tokio::test]
async fn test_teardown_runs_once_after_success() {
    let teardowns = Arc::new(AtomicUsize::new(0));

    let result = run_with(fake_setup(1, &teardowns), async |ctx| Ok(ctx.env.id)).await;

    assert_eq!(result.unwrap(), 1);
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}

/// Tests that a failing scenario still tears down and keeps its own error
#[tokio::test]
async fn test_teardown_runs_once_after_failure() {
    let teardowns = Arc::new(AtomicUsize::new(0));

    let result: Result<(), _> = run_with(fake_setup(1, &teardowns), async |_ctx| {
        Err(HarnessError::Assertion("scenario body failed".into()))
    })
    .await;

    assert!(matches!(result, Err(HarnessError::Assertion(ref msg)) if msg == "scenario body failed"));
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}

/// Tests that a teardown failure does not turn a pass into a failure
#[tokio::test]
async fn test_teardown_failure_is_swallowed() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let env = FakeEnvironment::failing(1, teardowns.clone());

    let result = run_with(async { Ok(ScenarioContext::new(env)) }, async |_ctx| Ok("passed")).await;

    assert_eq!(result.unwrap(), "passed");
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}

/// Tests that a teardown failure does not replace the scenario's own error
#[tokio::test]
async fn test_teardown_failure_keeps_scenario_error() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let env = FakeEnvironment::failing(1, teardowns.clone());

    let result: Result<(), _> = run_with(async { Ok(ScenarioContext::new(env)) }, async |_ctx| {
        Err(HarnessError::Sandbox(SandboxError::Deployment("missing artifact".into())))
    })
    .await;

    assert!(result.unwrap_err().is_deployment());
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}

/// Tests that a failed setup never runs the body
#[tokio::test]
async fn test_failed_setup_skips_body() {
    let body_runs = AtomicUsize::new(0);
    let setup = async {
        Err::<ScenarioContext<FakeEnvironment>, _>(HarnessError::Sandbox(SandboxError::Provision(
            "sandbox binary missing".into(),
        )))
    };

    let result = run_with(setup, async |_ctx| {
        body_runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .await;

    assert!(matches!(result, Err(HarnessError::Sandbox(SandboxError::Provision(_)))));
    assert_eq!(body_runs.load(Ordering::SeqCst), 0);
}

/// Tests that every scenario starts from an empty, freshly created context
#[tokio::test]
async fn test_scenarios_do_not_share_context() {
    let teardowns = Arc::new(AtomicUsize::new(0));

    for id in [1, 2] {
        let seen = run_with(fake_setup(id, &teardowns), async |ctx| {
            let before = ctx.accounts.len();
            ctx.accounts.insert("alice".to_string(), test_account("alice"));
            ctx.accounts.insert("contract".to_string(), test_account("contract"));
            Ok((ctx.env.id, before, ctx.alice()?.id.to_string()))
        })
        .await
        .unwrap();

        assert_eq!(seen.0, id);
        assert_eq!(seen.1, 0, "scenario {id} saw accounts from a previous run");
        assert_eq!(seen.2, "alice.test.near");
    }
    assert_eq!(teardowns.load(Ordering::SeqCst), 2);
}

/// Tests that a missing account is reported rather than panicking
#[tokio::test]
async fn test_missing_account_is_an_error() {
    let teardowns = Arc::new(AtomicUsize::new(0));

    let result = run_with(fake_setup(1, &teardowns), async |ctx| {
        ctx.contract().map(|account| account.id.clone())
    })
    .await;

    assert!(matches!(result, Err(HarnessError::MissingAccount(ref name)) if name == "contract"));
}

/// Tests that an unreachable oracle network fails the scenario before any contract call
#[tokio::test]
async fn test_network_error_prevents_contract_call() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let contract_calls = AtomicUsize::new(0);
    let config = HarnessConfig::default().with_gateways([unreachable_gateway().await]);

    let result = run_with(fake_setup(1, &teardowns), async |_ctx| {
        let _payload = get_redstone_payload(&config).await?;
        contract_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .await;

    let error = result.unwrap_err();
    assert!(error.is_network(), "{error}");
    assert!(matches!(error, HarnessError::Payload(PayloadError::Network { .. })));
    assert_eq!(contract_calls.load(Ordering::SeqCst), 0);
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}
