//! Validation scheduling.
//!
//! Three trigger sources feed one validation driver: a fixed periodic
//! timer (to preempt silent server-side expiry), an idle debounce (any
//! recorded user activity resets the idle timer; when it elapses, one
//! validation runs so a session that expired while the user was away is
//! detected before their next action fails), and manual triggers. The
//! driver is a single task, so scheduled validations never overlap each
//! other; direct calls on the reconciler remain safe through its pass-id
//! guard.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep};

use crate::session::reconciler::Reconciler;

enum Trigger {
    /// User activity was recorded; re-arm the idle timer.
    Activity,
    /// Run a validation now.
    Manual,
}

/// Handle to the validation driver task.
///
/// Dropping the handle stops the driver.
pub struct ValidationScheduler {
    triggers: mpsc::UnboundedSender<Trigger>,
    task: JoinHandle<()>,
}

impl ValidationScheduler {
    /// Spawn the driver for the given reconciler.
    ///
    /// `validate_interval` is the periodic re-validation cadence;
    /// `idle_timeout` is how long after the last recorded activity the
    /// idle-elapsed validation fires.
    #[must_use]
    pub fn spawn(
        reconciler: Reconciler,
        validate_interval: Duration,
        idle_timeout: Duration,
    ) -> Self {
        let (triggers, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive(reconciler, rx, validate_interval, idle_timeout));
        Self { triggers, task }
    }

    /// Record user activity, resetting the idle timer.
    ///
    /// Cheap and non-blocking; call it from input event handlers.
    pub fn record_activity(&self) {
        let _ = self.triggers.send(Trigger::Activity);
    }

    /// Request a validation outside the normal cadence.
    pub fn trigger_now(&self) {
        let _ = self.triggers.send(Trigger::Manual);
    }

    /// Stop the driver task.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for ValidationScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn drive(
    reconciler: Reconciler,
    mut triggers: mpsc::UnboundedReceiver<Trigger>,
    validate_interval: Duration,
    idle_timeout: Duration,
) {
    let mut periodic = interval(validate_interval);
    periodic.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of a tokio interval fires immediately; initialize()
    // already validated at startup, so consume it.
    periodic.tick().await;

    let idle = sleep(idle_timeout);
    tokio::pin!(idle);
    // The idle validation only fires after activity has been seen; an
    // untouched client is covered by the periodic timer alone.
    let mut idle_armed = false;

    loop {
        tokio::select! {
            _ = periodic.tick() => {
                tracing::debug!("periodic validation");
                reconciler.validate().await;
            }
            () = &mut idle, if idle_armed => {
                idle_armed = false;
                tracing::debug!("idle timeout elapsed, validating");
                reconciler.validate().await;
            }
            trigger = triggers.recv() => match trigger {
                Some(Trigger::Activity) => {
                    idle.as_mut().reset(Instant::now() + idle_timeout);
                    idle_armed = true;
                }
                Some(Trigger::Manual) => {
                    tracing::debug!("manual validation trigger");
                    reconciler.validate().await;
                }
                // All handles dropped; stop driving.
                None => break,
            },
        }
    }
}
