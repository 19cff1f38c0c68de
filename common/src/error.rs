use std::time::Duration;

use thiserror::Error;

/// Failure of one external-binary invocation.
///
/// `Failed` carries both captured streams verbatim so callers can classify
/// the outcome from domain-specific markers without re-running the command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn {label}: {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{label} failed (code {code:?}).\n\n--- stdout ---\n{stdout}\n\n--- stderr ---\n{stderr}")]
    Failed {
        label: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl CommandError {
    /// Captured stdout and stderr, concatenated, for marker matching.
    /// Spawn failures have no output to match against.
    pub fn combined_output(&self) -> String {
        match self {
            CommandError::Spawn { .. } => String::new(),
            CommandError::Failed { stdout, stderr, .. } => format!("{stdout}\n{stderr}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("devnet at {endpoint} did not accept requests within {waited:?}")]
    StartupTimeout { endpoint: String, waited: Duration },

    #[error(transparent)]
    Command(#[from] CommandError),

    /// The ledger explicitly refused the operation. Expected in
    /// negative-path scenarios; callers match on this variant to tell an
    /// intended rejection apart from a tooling fault.
    #[error("transaction rejected by the network.\n\n{output}")]
    Rejected { output: String },

    #[error("no status endpoint variant responded at {endpoint}")]
    QueryUnreachable { endpoint: String },

    #[error("timed out after {waited:?} waiting for {what} (last observed: {last_observed})")]
    Timeout {
        what: String,
        waited: Duration,
        last_observed: String,
    },

    /// A height read went backwards within one node lifetime, which means
    /// the node restarted or reset under us.
    #[error("block height went backwards: {previous} -> {observed}")]
    HeightRegression { previous: u64, observed: u64 },

    /// Deploy reported success but the node does not serve the program.
    #[error("program {program} not found on the network after deployment")]
    ProgramNotVisible { program: String },

    /// The client produced text the format adapter cannot make sense of.
    #[error("unexpected client output: {output}")]
    UnexpectedOutput { output: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, HarnessError::Rejected { .. })
    }
}
