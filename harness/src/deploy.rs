//! Idempotent program deployment.
//!
//! `ensure_deployed` is safe to call at the top of every suite: a program
//! that is already on the network is success, and a deploy the node
//! accepted but has not indexed yet is caught by the post-condition check
//! instead of surfacing later as a confusing execution failure.

use std::path::Path;
use std::sync::Arc;

use log::info;

use leodev_common::accounts::DEFAULT_ACCOUNTS;
use leodev_common::config::HarnessConfig;
use leodev_common::error::{CommandError, HarnessError};
use leodev_common::outcome::{Outcome, OutcomeRules};

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::query::ChainClient;

pub struct DeploymentCoordinator {
    runner: Arc<dyn CommandRunner>,
    client: ChainClient,
    config: HarnessConfig,
    rules: OutcomeRules,
}

impl DeploymentCoordinator {
    pub fn new(runner: Arc<dyn CommandRunner>, client: ChainClient, config: HarnessConfig) -> Self {
        Self {
            runner,
            client,
            config,
            rules: OutcomeRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: OutcomeRules) -> Self {
        self.rules = rules;
        self
    }

    /// Build and deploy `program_id` from `program_dir`, tolerating "already
    /// exists" as success, then verify the node actually serves the program.
    pub async fn ensure_deployed(
        &self,
        program_id: &str,
        program_dir: &Path,
    ) -> Result<(), HarnessError> {
        self.build(program_dir).await?;

        match self.deploy(program_dir).await {
            Ok(_) => info!("deployed {program_id}"),
            Err(err) => {
                if self.rules.classify(&err.combined_output()) == Outcome::AlreadyDeployed {
                    info!("{program_id} already on the network; treating deploy as success");
                } else {
                    return Err(err.into());
                }
            }
        }

        // Deploy reporting success is not the same as the program being
        // queryable; an accepted-but-unindexed deploy would make every later
        // execution fail with a misleading error.
        if !self.client.program_exists(program_id).await {
            return Err(HarnessError::ProgramNotVisible {
                program: program_id.to_string(),
            });
        }
        Ok(())
    }

    async fn build(&self, program_dir: &Path) -> Result<CommandOutput, CommandError> {
        let spec = CommandSpec::new(&self.config.leo_bin, "leo build")
            .current_dir(program_dir)
            .arg("build");
        self.runner.run(spec).await
    }

    async fn deploy(&self, program_dir: &Path) -> Result<CommandOutput, CommandError> {
        let spec = CommandSpec::new(&self.config.leo_bin, "leo deploy")
            .current_dir(program_dir)
            .args([
                "deploy",
                "--network",
                &self.config.network,
                "--endpoint",
                &self.config.endpoint,
                "--private-key",
                DEFAULT_ACCOUNTS[0].private_key,
                "--broadcast",
                "--yes",
                "--devnet",
                "--max-wait",
                &self.config.max_wait.to_string(),
                "--blocks-to-check",
                &self.config.blocks_to_check.to_string(),
            ]);
        self.runner.run(spec).await
    }
}
