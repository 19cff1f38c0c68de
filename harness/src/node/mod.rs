//! Lifecycle supervision of the single local devnode.
//!
//! Exactly one [`Devnode`] owns the node process, its storage directory and
//! its log sink for the duration of a test run. Start is idempotent, stop
//! is a bounded graceful shutdown, and dropping an unstopped handle still
//! signals the child so crashed runs do not orphan long-lived nodes. There
//! is no internal locking; callers drive start/stop sequentially.

pub mod cleanup;

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::time::{timeout, Instant};

use leodev_common::accounts::DEFAULT_ACCOUNTS;
use leodev_common::config::HarnessConfig;
use leodev_common::error::{CommandError, HarnessError};

use crate::waiters::{wait_until, Probe};

/// Append-only log file shared across runs, annotated with session
/// start/stop timestamps so flaky integration runs can be reconstructed
/// after the fact.
#[derive(Debug)]
struct LogSink {
    file: std::fs::File,
    path: PathBuf,
}

impl LogSink {
    fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    fn annotate(&mut self, event: &str) -> io::Result<()> {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        writeln!(self.file, "\n=== devnet {event} {stamp} ===")
    }

    /// Handles the node's stdout/stderr are wired into. Attaching the file
    /// directly avoids forwarding tasks; ordering between the two streams
    /// is whatever the kernel interleaves, which is fine for a post-mortem
    /// log.
    fn stdio(&self) -> io::Result<(Stdio, Stdio)> {
        Ok((
            Stdio::from(self.file.try_clone()?),
            Stdio::from(self.file.try_clone()?),
        ))
    }
}

/// The supervised node process. At most one exists per [`Devnode`].
#[derive(Debug)]
pub struct NodeHandle {
    child: Child,
    pid: u32,
    storage_root: PathBuf,
    log: LogSink,
}

impl NodeHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn log_path(&self) -> &Path {
        &self.log.path
    }

    fn signal_term(&self) {
        if let Err(err) = signal::kill(Pid::from_raw(self.pid as i32), Signal::SIGTERM) {
            debug!("SIGTERM to devnode {} failed: {err}", self.pid);
        }
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        // Safety net for panics and early exits: a handle dropped without
        // stop() still signals the child, so a crashed run does not leave
        // a node holding the storage directory and port.
        if matches!(self.child.try_wait(), Ok(None)) {
            self.signal_term();
        }
    }
}

/// Supervisor for the local devnode.
///
/// Owned by the test-run context and passed by reference to whatever needs
/// it; there are no process-wide globals, so independent harness instances
/// can coexist as long as they use disjoint storage roots and ports.
pub struct Devnode {
    config: HarnessConfig,
    handle: Option<NodeHandle>,
}

impl Devnode {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            handle: None,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&NodeHandle> {
        self.handle.as_ref()
    }

    /// Start the node and wait for it to accept requests. Idempotent: if a
    /// node is already supervised the existing handle is returned and no
    /// second process is spawned.
    ///
    /// On a readiness timeout the half-started process stays supervised;
    /// the caller decides between retrying the wait and calling
    /// [`Devnode::stop`].
    pub async fn start(&mut self) -> Result<&NodeHandle, HarnessError> {
        if self.handle.is_none() {
            let handle = self.spawn_node().await?;
            self.handle = Some(handle);
            self.wait_ready().await?;
        } else {
            debug!("devnode already running; returning existing handle");
        }
        Ok(self.handle.as_ref().expect("handle was set above"))
    }

    /// Graceful bounded stop; a no-op when nothing is running. SIGTERM is
    /// never escalated to SIGKILL: a node that refuses to die is left for
    /// the next run's stray sweep rather than hanging the harness.
    pub async fn stop(&mut self) -> Result<(), HarnessError> {
        let Some(mut handle) = self.handle.take() else {
            debug!("stop requested with no devnode running");
            return Ok(());
        };

        info!("stopping devnode (pid {})", handle.pid);
        handle.signal_term();

        match timeout(self.config.stop_timeout, handle.child.wait()).await {
            Ok(Ok(status)) => debug!("devnode exited: {status}"),
            Ok(Err(err)) => warn!("could not await devnode exit: {err}"),
            Err(_) => warn!(
                "devnode still running after {:?}; moving on",
                self.config.stop_timeout
            ),
        }

        if let Err(err) = handle.log.annotate("stop") {
            warn!("could not annotate devnode log: {err}");
        }
        Ok(())
    }

    async fn spawn_node(&self) -> Result<NodeHandle, HarnessError> {
        let storage_root = self.config.storage_root.clone();

        if self.config.clear_storage {
            match tokio::fs::remove_dir_all(&storage_root).await {
                Ok(()) => debug!("cleared {}", storage_root.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => warn!("could not clear {}: {err}", storage_root.display()),
            }
        }
        tokio::fs::create_dir_all(&storage_root).await?;

        // Crashed prior runs can leave a node holding our port and storage.
        let swept = cleanup::terminate_stray_nodes(&storage_root);
        if swept > 0 {
            info!("terminated {swept} stray devnode process(es) before start");
        }

        let mut log = LogSink::open(&self.config.log_path)?;
        log.annotate("start")?;
        let (stdout, stderr) = log.stdio()?;

        info!(
            "starting devnode via {} (storage {})",
            self.config.devnode_bin.display(),
            storage_root.display()
        );
        let child = Command::new(&self.config.devnode_bin)
            .args([
                "devnode",
                "start",
                "--private-key",
                DEFAULT_ACCOUNTS[0].private_key,
                "--network",
                &self.config.network,
            ])
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                label: "leo devnode start".to_string(),
                source,
            })?;

        let Some(pid) = child.id() else {
            return Err(HarnessError::Io(io::Error::other(
                "devnode exited immediately after spawn",
            )));
        };

        Ok(NodeHandle {
            child,
            pid,
            storage_root,
            log,
        })
    }

    async fn wait_ready(&self) -> Result<(), HarnessError> {
        let http = reqwest::Client::new();
        let urls = self.config.status_urls();
        let started = Instant::now();

        let probe = || {
            let http = http.clone();
            let urls = urls.clone();
            async move {
                let mut last = String::new();
                for url in &urls {
                    match http.get(url).send().await {
                        Ok(response) if response.status().is_success() => {
                            return Probe::Ready(());
                        }
                        Ok(response) => last = format!("{} from {url}", response.status()),
                        Err(err) => last = format!("{url}: {err}"),
                    }
                }
                Probe::Pending(last)
            }
        };

        match wait_until(
            "devnet readiness",
            self.config.ready_timeout,
            self.config.poll_interval,
            probe,
        )
        .await
        {
            Ok(()) => {
                info!(
                    "devnet ready at {} after {:?}",
                    self.config.endpoint,
                    started.elapsed()
                );
                Ok(())
            }
            Err(HarnessError::Timeout { waited, .. }) => Err(HarnessError::StartupTimeout {
                endpoint: self.config.endpoint.clone(),
                waited,
            }),
            Err(other) => Err(other),
        }
    }
}
