//! Harness configuration with environment overrides.
//!
//! Defaults match a stock local devnet: node REST surface on
//! `127.0.0.1:3030`, `testnet` network mode, storage and log next to the
//! working directory. The `leo` binary used for build/deploy/execute/query
//! is the pinned local build when present; the long-lived devnode is driven
//! through the globally installed `leo` unless overridden.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// REST endpoint of the supervised node, overridable via `NETWORK_URL`.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3030";

/// Network mode passed to every client invocation and used as the optional
/// path segment of the status endpoint.
pub const DEFAULT_NETWORK: &str = "testnet";

/// Storage directory the devnode owns for the duration of a run.
pub const DEFAULT_STORAGE_ROOT: &str = ".snarkos-devnet";

/// Append-only sink for the devnode's stdout/stderr across runs.
pub const DEFAULT_LOG_PATH: &str = "snarkos-devnet.log";

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Node REST endpoint, e.g. `http://127.0.0.1:3030`.
    pub endpoint: String,
    /// Network name (`testnet` on a devnet).
    pub network: String,
    /// Client binary for build/deploy/execute/query.
    pub leo_bin: PathBuf,
    /// Binary used to launch the long-lived devnode process.
    pub devnode_bin: PathBuf,
    /// On-disk storage owned by the supervised node.
    pub storage_root: PathBuf,
    /// Append-only devnode log sink.
    pub log_path: PathBuf,
    /// Bound on waiting for the node to accept requests after spawn.
    pub ready_timeout: Duration,
    /// Bound on waiting for the node process to exit after SIGTERM.
    pub stop_timeout: Duration,
    /// Sleep between poll attempts (readiness, height, confirmation).
    pub poll_interval: Duration,
    /// `--max-wait` passed through to broadcast client calls.
    pub max_wait: u32,
    /// `--blocks-to-check` passed through to broadcast client calls.
    pub blocks_to_check: u32,
    /// Wipe `storage_root` before starting the node.
    pub clear_storage: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            endpoint: env::var("NETWORK_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            network: DEFAULT_NETWORK.to_string(),
            leo_bin: resolve_leo_bin(),
            devnode_bin: resolve_devnode_bin(),
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            ready_timeout: Duration::from_secs(120),
            stop_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(1),
            max_wait: 15,
            blocks_to_check: 15,
            clear_storage: true,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both status URL variants in preference order: some node builds serve
    /// the height endpoint bare, others behind a network path segment.
    pub fn status_urls(&self) -> [String; 2] {
        [
            format!("{}/block/height/latest", self.endpoint),
            format!("{}/{}/block/height/latest", self.endpoint, self.network),
        ]
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    pub fn with_leo_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.leo_bin = bin.into();
        self
    }

    pub fn with_devnode_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.devnode_bin = bin.into();
        self
    }

    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_broadcast_bounds(mut self, max_wait: u32, blocks_to_check: u32) -> Self {
        self.max_wait = max_wait;
        self.blocks_to_check = blocks_to_check;
        self
    }

    pub fn with_clear_storage(mut self, clear: bool) -> Self {
        self.clear_storage = clear;
        self
    }
}

/// Build/deploy/execute/query must use the pinned local client build when
/// one exists; `LEO_BIN` is the escape hatch. Falling back to the pinned
/// path even when absent lets spawn fail loudly with the expected location
/// in the error.
fn resolve_leo_bin() -> PathBuf {
    let pinned = pinned_leo_path();
    if pinned.exists() {
        return pinned;
    }
    if let Some(bin) = env::var_os("LEO_BIN") {
        return PathBuf::from(bin);
    }
    pinned
}

/// The devnode runs through the globally installed client unless
/// `LEO_DEVNODE_BIN` says otherwise.
fn resolve_devnode_bin() -> PathBuf {
    env::var_os("LEO_DEVNODE_BIN")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("leo"))
}

fn pinned_leo_path() -> PathBuf {
    let home = env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    home.join("programs")
        .join("leo")
        .join("target")
        .join("release")
        .join("leo")
}
