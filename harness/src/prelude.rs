//! One-stop imports for test suites built on the harness.

pub use leodev_common::accounts::{TestAccount, DEFAULT_ACCOUNTS};
pub use leodev_common::config::HarnessConfig;
pub use leodev_common::error::{CommandError, HarnessError};
pub use leodev_common::outcome::{Outcome, OutcomeRules};

pub use crate::adapter::{extract_record_plaintexts, parse_numeric_plaintext};
pub use crate::command::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
pub use crate::contracts::wrapped_credits::WrappedCredits;
pub use crate::deploy::DeploymentCoordinator;
pub use crate::driver::{Execution, TransactionDriver};
pub use crate::node::Devnode;
pub use crate::query::{ChainClient, HeightWatermark};
pub use crate::waiters::{wait_for_min_height, wait_until, Probe};
