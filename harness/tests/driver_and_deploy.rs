// Outcome classification and deploy idempotence against a scripted runner:
// the drivers never notice they are not talking to the real client.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use leodev_common::accounts::TestAccount;
use leodev_common::config::HarnessConfig;
use leodev_common::error::{CommandError, HarnessError};
use leodev_common::outcome::OutcomeRules;
use leodev_harness::command::{CommandOutput, CommandRunner, CommandSpec};
use leodev_harness::deploy::DeploymentCoordinator;
use leodev_harness::driver::{Execution, TransactionDriver};
use leodev_harness::query::ChainClient;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Scripted runner: pops one canned result per invocation and records every
/// spec it was asked to run.
#[derive(Default)]
struct MockRunner {
    script: Mutex<VecDeque<Result<CommandOutput, CommandError>>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl MockRunner {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push_ok(&self, stdout: &str) {
        self.script.lock().unwrap().push_back(Ok(CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
        }));
    }

    fn push_failed(&self, label: &str, stdout: &str, stderr: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(CommandError::Failed {
                label: label.to_string(),
                code: Some(1),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }));
    }

    fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(spec.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => panic!("unscripted invocation: {}", spec.label),
        }
    }
}

/// Status server answering every request with a fixed height, for the
/// confirmation tests.
async fn spawn_height_stub(height: u64) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = height.to_string();

    let server = tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), server)
}

/// Endpoint on the discard port: every status probe fails fast, so the
/// submission watermark is simply absent.
fn offline_config() -> HarnessConfig {
    HarnessConfig::default()
        .with_endpoint("http://127.0.0.1:9")
        .with_leo_bin("/usr/local/bin/leo")
        .with_poll_interval(Duration::from_millis(50))
}

fn driver_with(runner: Arc<MockRunner>, config: HarnessConfig) -> TransactionDriver {
    let client = ChainClient::new(config.clone(), runner.clone());
    TransactionDriver::new(runner, client, config)
}

fn coordinator_with(runner: Arc<MockRunner>, config: HarnessConfig) -> DeploymentCoordinator {
    let client = ChainClient::new(config.clone(), runner.clone());
    DeploymentCoordinator::new(runner, client, config)
}

fn inputs(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn rejection_marker_on_clean_exit_raises_rejected() {
    let runner = MockRunner::new();
    runner.push_ok("Broadcasting...\nTransaction rejected by the ledger\n");
    let driver = driver_with(runner.clone(), offline_config());

    let err = driver
        .execute(
            Path::new("/tmp/wrapped_credits"),
            "transfer_public",
            &inputs(&["aleo1destination", "321u128"]),
            TestAccount::nth(0),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::Rejected { .. }));
}

#[tokio::test]
async fn rejection_marker_on_failed_exit_still_raises_rejected() {
    let runner = MockRunner::new();
    runner.push_failed("leo execute transfer_public", "", "Transaction rejected\n");
    let driver = driver_with(runner.clone(), offline_config());

    let err = driver
        .execute(
            Path::new("/tmp/wrapped_credits"),
            "transfer_public",
            &inputs(&["aleo1destination", "321u128"]),
            TestAccount::nth(0),
        )
        .await
        .unwrap_err();

    assert!(
        matches!(err, HarnessError::Rejected { .. }),
        "marker must win over the exit code, got {err:?}"
    );
}

#[tokio::test]
async fn failure_without_marker_is_a_command_failure() {
    let runner = MockRunner::new();
    runner.push_failed("leo execute transfer_public", "", "thread panicked\n");
    let driver = driver_with(runner.clone(), offline_config());

    let err = driver
        .execute(
            Path::new("/tmp/wrapped_credits"),
            "transfer_public",
            &inputs(&["aleo1destination", "321u128"]),
            TestAccount::nth(0),
        )
        .await
        .unwrap_err();

    assert!(
        matches!(err, HarnessError::Command(CommandError::Failed { .. })),
        "expected a plain command failure, got {err:?}"
    );
}

#[tokio::test]
async fn swapped_rules_drive_rejection_classification() {
    // A client surface with different wording: the stock marker must stop
    // matching and the custom one must take over.
    let rules = OutcomeRules {
        rejected: vec!["refused by policy".to_string()],
        already_deployed: vec![],
    };

    let runner = MockRunner::new();
    runner.push_ok("Broadcasting...\nrefused by policy\n");
    let driver = driver_with(runner.clone(), offline_config()).with_rules(rules.clone());

    let err = driver
        .execute(
            Path::new("/tmp/wrapped_credits"),
            "transfer_public",
            &inputs(&["aleo1destination", "321u128"]),
            TestAccount::nth(0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Rejected { .. }));

    let runner = MockRunner::new();
    runner.push_failed("leo execute transfer_public", "", "Transaction rejected\n");
    let driver = driver_with(runner.clone(), offline_config()).with_rules(rules);

    let err = driver
        .execute(
            Path::new("/tmp/wrapped_credits"),
            "transfer_public",
            &inputs(&["aleo1destination", "321u128"]),
            TestAccount::nth(0),
        )
        .await
        .unwrap_err();
    assert!(
        matches!(err, HarnessError::Command(CommandError::Failed { .. })),
        "the stock marker must no longer classify as a rejection, got {err:?}"
    );
}

#[tokio::test]
async fn swapped_rules_drive_duplicate_deploy_tolerance() {
    let rules = OutcomeRules {
        rejected: vec![],
        already_deployed: vec!["program id is taken".to_string()],
    };

    let runner = MockRunner::new();
    runner.push_ok("compiled\n");
    runner.push_failed("leo deploy", "", "error: program id is taken\n");
    runner.push_ok("program wrapped_credits.aleo;\n");
    let coordinator = coordinator_with(runner.clone(), offline_config()).with_rules(rules);

    coordinator
        .ensure_deployed("wrapped_credits.aleo", Path::new("/tmp/wrapped_credits"))
        .await
        .unwrap();
    assert_eq!(runner.calls().len(), 3, "post-check must still run");
}

#[tokio::test]
async fn execute_passes_broadcast_flags_verbatim() {
    let runner = MockRunner::new();
    runner.push_ok("Execution confirmed\n");
    let driver = driver_with(runner.clone(), offline_config());

    driver
        .execute(
            Path::new("/tmp/wrapped_credits"),
            "deposit_credits_public",
            &inputs(&["1000u64"]),
            TestAccount::nth(1),
        )
        .await
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    let spec = &calls[0];
    assert_eq!(spec.cwd.as_deref(), Some(Path::new("/tmp/wrapped_credits")));
    let args = &spec.args;
    assert_eq!(args[0], "execute");
    assert_eq!(args[1], "deposit_credits_public");
    assert_eq!(args[2], "1000u64");
    for flag in ["--broadcast", "--yes", "--devnet"] {
        assert!(args.contains(&flag.to_string()), "missing {flag}");
    }
    let key_at = args.iter().position(|a| a == "--private-key").unwrap();
    assert_eq!(args[key_at + 1], TestAccount::nth(1).private_key);
    let wait_at = args.iter().position(|a| a == "--max-wait").unwrap();
    assert_eq!(args[wait_at + 1], "15");
    let blocks_at = args.iter().position(|a| a == "--blocks-to-check").unwrap();
    assert_eq!(args[blocks_at + 1], "15");
}

#[tokio::test]
async fn fresh_deploy_runs_build_deploy_and_post_check() {
    let runner = MockRunner::new();
    runner.push_ok("compiled\n");
    runner.push_ok("Deployment confirmed\n");
    runner.push_ok("program wrapped_credits.aleo;\n");
    let coordinator = coordinator_with(runner.clone(), offline_config());

    coordinator
        .ensure_deployed("wrapped_credits.aleo", Path::new("/tmp/wrapped_credits"))
        .await
        .unwrap();

    let labels: Vec<String> = runner.calls().iter().map(|c| c.label.clone()).collect();
    assert_eq!(labels, ["leo build", "leo deploy", "leo query program"]);
}

#[tokio::test]
async fn second_deploy_of_same_program_never_fails() {
    let runner = MockRunner::new();
    runner.push_ok("compiled\n");
    runner.push_failed(
        "leo deploy",
        "",
        "error: program wrapped_credits.aleo already exists on the network\n",
    );
    runner.push_ok("program wrapped_credits.aleo;\n");
    let coordinator = coordinator_with(runner.clone(), offline_config());

    coordinator
        .ensure_deployed("wrapped_credits.aleo", Path::new("/tmp/wrapped_credits"))
        .await
        .unwrap();
    assert_eq!(runner.calls().len(), 3);
}

#[tokio::test]
async fn deploy_failure_without_marker_propagates_before_the_post_check() {
    let runner = MockRunner::new();
    runner.push_ok("compiled\n");
    runner.push_failed("leo deploy", "", "fee estimation failed\n");
    let coordinator = coordinator_with(runner.clone(), offline_config());

    let err = coordinator
        .ensure_deployed("wrapped_credits.aleo", Path::new("/tmp/wrapped_credits"))
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::Command(_)));
    assert_eq!(runner.calls().len(), 2, "post-check must not run");
}

#[tokio::test]
async fn invisible_program_after_successful_deploy_fails_loudly() {
    let runner = MockRunner::new();
    runner.push_ok("compiled\n");
    runner.push_ok("Deployment confirmed\n");
    runner.push_failed("leo query program", "", "program not found\n");
    let coordinator = coordinator_with(runner.clone(), offline_config());

    let err = coordinator
        .ensure_deployed("wrapped_credits.aleo", Path::new("/tmp/wrapped_credits"))
        .await
        .unwrap_err();

    match err {
        HarnessError::ProgramNotVisible { program } => {
            assert_eq!(program, "wrapped_credits.aleo");
        }
        other => panic!("expected ProgramNotVisible, got {other:?}"),
    }
}

#[tokio::test]
async fn mapping_value_returns_raw_client_output() {
    let runner = MockRunner::new();
    runner.push_ok("balances\naleo1examplekey\n5000u128\n");
    let client = ChainClient::new(offline_config(), runner.clone());

    let raw = client
        .mapping_value("wrapped_credits.aleo", "balances", "aleo1examplekey")
        .await
        .unwrap();
    assert_eq!(raw, "balances\naleo1examplekey\n5000u128\n");
}

#[tokio::test]
async fn program_exists_treats_any_failure_as_absent() {
    let runner = MockRunner::new();
    runner.push_failed("leo query program", "", "connection refused\n");
    let client = ChainClient::new(offline_config(), runner.clone());

    assert!(!client.program_exists("wrapped_credits.aleo").await);
}

#[tokio::test]
async fn confirmation_waits_for_height_past_the_watermark() {
    let (endpoint, server) = spawn_height_stub(7).await;
    let runner = MockRunner::new();
    let config = offline_config().with_endpoint(endpoint);
    let driver = driver_with(runner, config);

    let execution = Execution {
        function: "transfer_public".to_string(),
        output: CommandOutput::default(),
        submitted_at: Some(6),
    };
    let height = driver
        .wait_confirmed(&execution, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(height, 7);
    server.abort();
}

#[tokio::test]
async fn confirmation_times_out_while_the_chain_is_stalled() {
    let (endpoint, server) = spawn_height_stub(7).await;
    let runner = MockRunner::new();
    let config = offline_config().with_endpoint(endpoint);
    let driver = driver_with(runner, config);

    let execution = Execution {
        function: "transfer_public".to_string(),
        output: CommandOutput::default(),
        submitted_at: Some(7),
    };
    let err = driver
        .wait_confirmed(&execution, Duration::from_millis(300))
        .await
        .unwrap_err();

    match err {
        HarnessError::Timeout { last_observed, .. } => {
            assert_eq!(last_observed, "height 7");
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
    server.abort();
}
