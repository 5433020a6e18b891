//! Sacrifice mode - a timed presentational state that follows a capture
//!
//! Has no effect on layers; the shell watches the phase to drive its animation.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SacrificePhase {
    Idle,
    Burning,
}

#[derive(Debug)]
pub struct SacrificeAnimation {
    duration: Duration,
    phase: watch::Sender<SacrificePhase>,
}

impl SacrificeAnimation {
    pub fn new(duration: Duration) -> Self {
        let (phase, _) = watch::channel(SacrificePhase::Idle);
        Self { duration, phase }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn phase(&self) -> SacrificePhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SacrificePhase> {
        self.phase.subscribe()
    }

    /// Enter the burning phase, hold it for the configured duration, then reset.
    ///
    /// Returns `false` without waiting if an animation is already running.
    pub async fn run(&self) -> bool {
        let started = self.phase.send_if_modified(|phase| {
            if *phase == SacrificePhase::Burning {
                return false;
            }
            *phase = SacrificePhase::Burning;
            true
        });
        if !started {
            return false;
        }

        tracing::debug!("Sacrifice animation started for {:?}", self.duration);
        tokio::time::sleep(self.duration).await;
        self.phase.send_replace(SacrificePhase::Idle);
        tracing::debug!("Sacrifice animation reset");
        true
    }
}
