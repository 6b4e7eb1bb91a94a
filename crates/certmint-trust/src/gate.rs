//! Privileged command execution.
//!
//! Trust-store mutations often need superuser rights. The gate builds each
//! command directly when the process already runs as root, wraps it in
//! `sudo` when available, and otherwise runs it unwrapped after warning
//! once per gate instance that the operation may fail.

use std::process::Command;

use tracing::debug;

use crate::store::binary_in_path;

/// Fixed prompt passed to sudo so password requests are attributable.
const SUDO_PROMPT: &str = "--prompt=Sudo password:";

/// Builds possibly-escalated commands for trust-store mutations.
///
/// Privilege state is re-evaluated on every call; nothing is cached and
/// nothing is retried. The missing-sudo warning fires at most once per
/// instance, so independent orchestrators never share warning state.
#[derive(Debug, Default)]
pub struct PrivilegeGate {
    warned: bool,
}

impl PrivilegeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build `program args...`, wrapped for privilege escalation when the
    /// current process is not already privileged.
    pub fn command(&mut self, program: &str, args: &[&str]) -> Command {
        if is_superuser() {
            debug!(program, "already running as root, no escalation");
            let mut cmd = Command::new(program);
            cmd.args(args);
            return cmd;
        }
        if !binary_in_path("sudo") {
            if !self.warned {
                self.warned = true;
                eprintln!(
                    "Warning: \"sudo\" is not available, and certmint is not running as root. \
                     The (un)install operation might fail."
                );
            }
            let mut cmd = Command::new(program);
            cmd.args(args);
            return cmd;
        }
        let mut cmd = Command::new("sudo");
        cmd.arg(SUDO_PROMPT).arg("--").arg(program).args(args);
        cmd
    }

    /// Whether the missing-sudo warning has fired.
    pub const fn has_warned(&self) -> bool {
        self.warned
    }
}

#[cfg(target_os = "linux")]
fn is_superuser() -> bool {
    procfs::process::Process::myself()
        .and_then(|process| process.status())
        .map(|status| status.euid == 0)
        .unwrap_or(false)
}

#[cfg(not(target_os = "linux"))]
fn is_superuser() -> bool {
    std::env::var("USER").map(|user| user == "root").unwrap_or(false)
}
