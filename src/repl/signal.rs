// src/repl/signal.rs

//! SIGINT handling around the Disco child.

use std::sync::{Mutex, MutexGuard, PoisonError};

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;
use tracing::{trace, warn};

/// Serialises overrides so nested or concurrent guards restore in order.
static SIGINT_OVERRIDE: Mutex<()> = Mutex::new(());

/// Resets the process-wide SIGINT disposition to `SIG_DFL` until dropped.
///
/// Signal dispositions set to "ignore" survive `exec`, so a kernel started
/// with SIGINT ignored would otherwise hand an uninterruptible Disco to the
/// user. Hold the guard only around the fork; the previous action (for
/// example tokio's handler) is reinstated on every exit path.
pub struct SigintDefaultGuard {
    previous: SigAction,
    _lock: MutexGuard<'static, ()>,
}

impl SigintDefaultGuard {
    pub fn install() -> nix::Result<Self> {
        let lock = SIGINT_OVERRIDE
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        // SAFETY: SIG_DFL runs no code in signal context.
        let previous = unsafe { signal::sigaction(Signal::SIGINT, &default)? };
        trace!("SIGINT reset to default for child spawn");

        Ok(Self {
            previous,
            _lock: lock,
        })
    }
}

impl Drop for SigintDefaultGuard {
    fn drop(&mut self) {
        // SAFETY: reinstates exactly the action that was active before.
        if let Err(err) = unsafe { signal::sigaction(Signal::SIGINT, &self.previous) } {
            warn!(error = %err, "failed to restore previous SIGINT handler");
        }
    }
}

/// Deliver SIGINT to every process in the child's process group.
pub fn interrupt_process_group(pgid: u32) -> nix::Result<()> {
    signal::killpg(Pid::from_raw(pgid as i32), Signal::SIGINT)
}

/// SIGKILL every process in the child's process group.
pub fn kill_process_group(pgid: u32) -> nix::Result<()> {
    signal::killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL)
}
