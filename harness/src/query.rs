//! Read path over the supervised node.
//!
//! Height reads go straight to the REST surface; program and mapping reads
//! go through the external client's query subcommand so the harness sees
//! exactly what a user of the tooling would see.

use std::sync::Arc;

use log::debug;

use leodev_common::config::HarnessConfig;
use leodev_common::error::HarnessError;

use crate::command::{CommandRunner, CommandSpec};

#[derive(Clone)]
pub struct ChainClient {
    config: HarnessConfig,
    http: reqwest::Client,
    runner: Arc<dyn CommandRunner>,
}

impl ChainClient {
    pub fn new(config: HarnessConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            runner,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Current block height. Both status URL variants are tried in
    /// preference order and the first parseable success wins; if neither
    /// responds the node is unreachable.
    pub async fn latest_height(&self) -> Result<u64, HarnessError> {
        for url in self.config.status_urls() {
            match self.http.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    let body = match response.text().await {
                        Ok(body) => body,
                        Err(err) => {
                            debug!("status body read from {url} failed: {err}");
                            continue;
                        }
                    };
                    match serde_json::from_str::<u64>(body.trim()) {
                        Ok(height) => return Ok(height),
                        Err(err) => debug!("unparseable height {body:?} from {url}: {err}"),
                    }
                }
                Ok(response) => debug!("status {} from {url}", response.status()),
                Err(err) => debug!("status probe {url} failed: {err}"),
            }
        }
        Err(HarnessError::QueryUnreachable {
            endpoint: self.config.endpoint.clone(),
        })
    }

    /// Raw client output for a public mapping read. Value extraction is the
    /// format adapter's job, not this one's.
    pub async fn mapping_value(
        &self,
        program: &str,
        mapping: &str,
        key: &str,
    ) -> Result<String, HarnessError> {
        let spec = CommandSpec::new(&self.config.leo_bin, "leo query program --mapping-value")
            .args([
                "query",
                "program",
                program,
                "--mapping-value",
                mapping,
                key,
                "--network",
                &self.config.network,
                "--endpoint",
                &self.config.endpoint,
            ]);
        let output = self.runner.run(spec).await?;
        Ok(output.stdout)
    }

    /// Whether `program` is served by the node. Any failure reads as "does
    /// not exist": within a harness a transient network fault on this path
    /// is indistinguishable from absence, and treating it as absence keeps
    /// the deploy post-check conservative.
    pub async fn program_exists(&self, program: &str) -> bool {
        let spec = CommandSpec::new(&self.config.leo_bin, "leo query program").args([
            "query",
            "program",
            program,
            "--network",
            &self.config.network,
            "--endpoint",
            &self.config.endpoint,
        ]);
        match self.runner.run(spec).await {
            Ok(_) => true,
            Err(err) => {
                debug!("program {program} treated as absent: {err}");
                false
            }
        }
    }
}

/// Monotonicity guard over observed block heights.
///
/// Within one node lifetime a valid read never goes backwards; a decrease
/// means the node restarted or reset under us, which invalidates any
/// "wait for height >= N" reasoning built on earlier reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeightWatermark {
    highest: Option<u64>,
}

impl HeightWatermark {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh read, failing on regression.
    pub fn observe(&mut self, height: u64) -> Result<u64, HarnessError> {
        if let Some(previous) = self.highest {
            if height < previous {
                return Err(HarnessError::HeightRegression {
                    previous,
                    observed: height,
                });
            }
        }
        self.highest = Some(height);
        Ok(height)
    }

    pub fn latest(&self) -> Option<u64> {
        self.highest
    }
}
