//! Cooperative pause/resume between batches.
//!
//! ```text
//!   Running <--toggle--> Paused
//!      |
//!      +--complete--> Completed   (terminal until the next run resets it)
//! ```
//!
//! The scheduler awaits [`PauseController::wait_until_running`] at each
//! batch boundary. Waiting is backed by a `watch` channel, so a paused run
//! sleeps until the state changes instead of polling.

use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
    Completed,
}

#[derive(Debug)]
pub struct PauseController {
    state: watch::Sender<RunState>,
}

impl Default for PauseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseController {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RunState::Running);
        Self { state }
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    pub fn is_paused(&self) -> bool {
        self.state() == RunState::Paused
    }

    /// Flip between running and paused. No effect once completed.
    pub fn toggle(&self) -> RunState {
        if self.is_paused() {
            self.resume()
        } else {
            self.pause()
        }
    }

    pub fn pause(&self) -> RunState {
        self.transition(|s| match s {
            RunState::Running => RunState::Paused,
            other => other,
        })
    }

    pub fn resume(&self) -> RunState {
        self.transition(|s| match s {
            RunState::Paused => RunState::Running,
            other => other,
        })
    }

    pub fn complete(&self) {
        self.state.send_replace(RunState::Completed);
    }

    /// Back to `Running` for a fresh run.
    pub fn reset(&self) {
        self.state.send_replace(RunState::Running);
    }

    /// Return immediately unless paused; otherwise wait for resume (or completion).
    pub async fn wait_until_running(&self) {
        if !self.is_paused() {
            return;
        }
        let mut rx = self.state.subscribe();
        info!("Run paused; waiting for resume");
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|s| *s != RunState::Paused).await;
        info!("Run resumed");
    }

    fn transition(&self, f: impl Fn(RunState) -> RunState) -> RunState {
        let mut next = RunState::Running;
        self.state.send_modify(|s| {
            *s = f(*s);
            next = *s;
        });
        info!(state = ?next, "Run state changed");
        next
    }
}
