//! Transition submission and confirmation.
//!
//! Executions go through the external client with broadcast-and-wait flags,
//! so by the time `leo execute` returns the client has already watched the
//! transaction for a bounded number of blocks. The driver's job on top of
//! that is classification: an explicit rejection marker in the output means
//! the ledger refused the operation ([`HarnessError::Rejected`], the
//! expected outcome of negative tests), while a non-zero exit without one
//! is a tooling or node fault and propagates as a plain command failure.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use leodev_common::accounts::TestAccount;
use leodev_common::config::HarnessConfig;
use leodev_common::error::HarnessError;
use leodev_common::outcome::{Outcome, OutcomeRules};

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::query::ChainClient;
use crate::waiters::wait_for_min_height;

/// A broadcast execution, with everything needed to confirm it later.
#[derive(Debug, Clone)]
pub struct Execution {
    pub function: String,
    pub output: CommandOutput,
    /// Height observed just before the broadcast. Best-effort: `None` when
    /// the status surface dropped the probe, in which case confirmation
    /// falls back to waiting for any progress at all.
    pub submitted_at: Option<u64>,
}

pub struct TransactionDriver {
    runner: Arc<dyn CommandRunner>,
    client: ChainClient,
    config: HarnessConfig,
    rules: OutcomeRules,
}

impl TransactionDriver {
    pub fn new(runner: Arc<dyn CommandRunner>, client: ChainClient, config: HarnessConfig) -> Self {
        Self {
            runner,
            client,
            config,
            rules: OutcomeRules::default(),
        }
    }

    /// Swap the output-classification rules, e.g. for a client surface
    /// with different wording.
    pub fn with_rules(mut self, rules: OutcomeRules) -> Self {
        self.rules = rules;
        self
    }

    /// Broadcast `function` with `inputs`, signed by `signer`.
    ///
    /// The rejection fast path checks the captured output regardless of
    /// exit status: the client synchronously detects some rejections and
    /// reports them on an otherwise clean exit.
    pub async fn execute(
        &self,
        program_dir: &Path,
        function: &str,
        inputs: &[String],
        signer: &TestAccount,
    ) -> Result<Execution, HarnessError> {
        let submitted_at = self.client.latest_height().await.ok();
        debug!("executing {function} (watermark {submitted_at:?})");

        let spec = CommandSpec::new(&self.config.leo_bin, format!("leo execute {function}"))
            .current_dir(program_dir)
            .arg("execute")
            .arg(function)
            .args(inputs.iter().cloned())
            .args([
                "--broadcast",
                "--network",
                &self.config.network,
                "--endpoint",
                &self.config.endpoint,
                "--private-key",
                signer.private_key,
                "--yes",
                "--devnet",
                "--max-wait",
                &self.config.max_wait.to_string(),
                "--blocks-to-check",
                &self.config.blocks_to_check.to_string(),
            ]);

        let output = match self.runner.run(spec).await {
            Ok(output) => output,
            Err(err) => {
                let combined = err.combined_output();
                if self.rules.classify(&combined) == Outcome::Rejected {
                    return Err(HarnessError::Rejected { output: combined });
                }
                return Err(err.into());
            }
        };

        let combined = output.combined();
        if self.rules.classify(&combined) == Outcome::Rejected {
            return Err(HarnessError::Rejected { output: combined });
        }

        info!("executed {function}");
        Ok(Execution {
            function: function.to_string(),
            output,
            submitted_at,
        })
    }

    /// Wait until the chain has moved past the execution's submission
    /// watermark and return the confirming height. The rejection fast path
    /// already ran at submit time, so height progress without a marker is
    /// finality.
    pub async fn wait_confirmed(
        &self,
        execution: &Execution,
        timeout: Duration,
    ) -> Result<u64, HarnessError> {
        let min_height = match execution.submitted_at {
            Some(height) => height + 1,
            None => 1,
        };
        wait_for_min_height(&self.client, min_height, timeout, self.config.poll_interval).await
    }
}
