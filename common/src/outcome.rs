//! Classification of captured CLI output into a closed set of outcomes.
//!
//! The external client reports domain results (rejections, duplicate
//! deployments) as human-readable text on otherwise ordinary exits. Rather
//! than scattering substring checks through the drivers, the matching rules
//! live here as plain data so an adapter for a different client surface only
//! has to swap the rule set.

use serde::{Deserialize, Serialize};

/// What a piece of captured output tells us about the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The ledger explicitly refused the operation.
    Rejected,
    /// The program is already on the network; deploys treat this as success.
    AlreadyDeployed,
    /// No marker matched; the exit status alone decides.
    Unclassified,
}

/// Substring rules, checked in declaration order of the variants below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRules {
    pub rejected: Vec<String>,
    pub already_deployed: Vec<String>,
}

impl Default for OutcomeRules {
    fn default() -> Self {
        Self {
            rejected: vec!["Transaction rejected".to_string()],
            already_deployed: vec!["already exists on the network".to_string()],
        }
    }
}

impl OutcomeRules {
    pub fn classify(&self, output: &str) -> Outcome {
        if self.rejected.iter().any(|m| output.contains(m.as_str())) {
            return Outcome::Rejected;
        }
        if self
            .already_deployed
            .iter()
            .any(|m| output.contains(m.as_str()))
        {
            return Outcome::AlreadyDeployed;
        }
        Outcome::Unclassified
    }
}
