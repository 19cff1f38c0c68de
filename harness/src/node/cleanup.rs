//! Best-effort reclamation of devnodes left behind by crashed runs.
//!
//! A prior harness that died without stopping its node leaves a process
//! holding the storage directory and REST port, which makes the next
//! `devnode start` fail to bind. The sweep scans the process table and
//! gracefully terminates anything that looks like one of ours.

use std::path::Path;

use log::{info, warn};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use sysinfo::{ProcessesToUpdate, System};

/// Marker that identifies a process as a harness-launched node. Matching on
/// the storage root alone is not enough: editors, shells and the harness
/// itself can all carry that path on their command lines.
const DEVNODE_MARKER: &str = "devnode";

/// Terminate every process whose command line mentions both `storage_root`
/// and the devnode marker. Returns how many were signalled. Processes that
/// are already gone or refuse the signal are tolerated; the sweep never
/// fails the startup it runs in.
pub fn terminate_stray_nodes(storage_root: &Path) -> usize {
    let storage = storage_root.to_string_lossy();
    let own_pid = sysinfo::get_current_pid().ok();

    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);

    let mut terminated = 0;
    for (pid, process) in system.processes() {
        if Some(*pid) == own_pid || pid.as_u32() <= 1 {
            continue;
        }

        let cmdline = process
            .cmd()
            .iter()
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        if !cmdline.contains(storage.as_ref()) || !cmdline.contains(DEVNODE_MARKER) {
            continue;
        }

        info!("terminating stray devnode {pid}: {cmdline}");
        match signal::kill(Pid::from_raw(pid.as_u32() as i32), Signal::SIGTERM) {
            Ok(()) => terminated += 1,
            Err(err) => warn!("could not signal stray devnode {pid}: {err}"),
        }
    }
    terminated
}
