use std::{
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, PoisonError},
};

use futures::FutureExt;
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{ui::UiDispatcher, worker::PopupWorker, Responsibility};

/// Result of a [`PopupManager::trigger_popups`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Scheduled,
    /// The previous pass has not finished; nothing was scheduled.
    AlreadyRunning,
}

/// What a single evaluation pass ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// A managed popup is already on screen.
    Blocked { visible: &'static str },
    NoneQualified,
    /// Executed on the worker, inside the pass.
    Executed { kind: &'static str },
    /// Re-qualified after its delay and executed on the UI thread.
    Deferred { kind: &'static str },
    /// Stopped qualifying during its delay, or the UI thread never took the
    /// execution.
    Abandoned { kind: &'static str },
    /// Cancelled before the UI thread executed it.
    Cancelled { kind: &'static str },
}

struct Pass {
    task: JoinHandle<()>,
    cancel: CancellationToken,
    outcome: watch::Receiver<Option<PassOutcome>>,
}

impl Pass {
    /// Done once it has reported an outcome, or its task ended without one.
    fn is_running(&self) -> bool {
        self.outcome.borrow().is_none() && !self.task.is_finished()
    }
}

/// Arbitrates between prioritized responsibilities so that at most one popup
/// is shown at a time.
///
/// The manager is owned by whatever screen/session object composes it.
/// Dropping it cancels a pending delayed continuation and stops the worker.
pub struct PopupManager {
    name: String,
    responsibilities: Arc<[Arc<dyn Responsibility>]>,
    ui: Arc<dyn UiDispatcher>,
    worker: PopupWorker,
    current: Mutex<Option<Pass>>,
}

impl PopupManager {
    pub fn new(
        name: impl Into<String>,
        responsibilities: Vec<Arc<dyn Responsibility>>,
        ui: Arc<dyn UiDispatcher>,
    ) -> anyhow::Result<Self> {
        let name = name.into();
        let worker = PopupWorker::spawn(&format!("popups-{name}"))?;
        Ok(Self {
            name,
            responsibilities: responsibilities.into(),
            ui,
            worker,
            current: Mutex::new(None),
        })
    }

    pub fn responsibility_kinds(&self) -> Vec<&'static str> {
        self.responsibilities.iter().map(|r| r.kind()).collect()
    }

    /// Schedules one evaluation pass unless the previous one is still in
    /// flight: qualifying, waiting out a delay, or waiting for the UI thread
    /// to run a delayed execution.
    pub fn trigger_popups(&self) -> TriggerOutcome {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(Pass::is_running) {
            debug!(manager = %self.name, "popup pass already in flight; ignoring trigger");
            return TriggerOutcome::AlreadyRunning;
        }

        let cancel = CancellationToken::new();
        let (outcome_tx, outcome_rx) = watch::channel(None);
        let responsibilities = Arc::clone(&self.responsibilities);
        let ui = Arc::clone(&self.ui);
        let pass_cancel = cancel.clone();
        let manager = self.name.clone();

        let task = self.worker.spawn_pass(async move {
            let outcome = run_pass(&responsibilities, ui.as_ref(), &pass_cancel).await;
            debug!(manager = %manager, outcome = ?outcome, "popup pass finished");
            let _ = outcome_tx.send(Some(outcome));
        });

        *current = Some(Pass {
            task,
            cancel,
            outcome: outcome_rx,
        });
        TriggerOutcome::Scheduled
    }

    pub fn is_pass_in_flight(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Pass::is_running)
    }

    /// Waits for the most recent pass to finish and returns its outcome.
    /// `None` when no pass was ever triggered or the pass died without
    /// reporting. A delayed popup only finishes once the UI queue has run
    /// it, so the UI loop must keep draining while this is awaited.
    pub async fn wait_idle(&self) -> Option<PassOutcome> {
        let mut outcome = {
            let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            current.as_ref()?.outcome.clone()
        };
        let reported = outcome.wait_for(Option::is_some).await.ok()?;
        reported.clone()
    }

    /// Cancels the delayed continuation of the current pass, if any. The
    /// waiting responsibility will not execute, even if its job is already
    /// queued for the UI thread.
    pub fn cancel_pending(&self) {
        if let Some(pass) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            pass.cancel.cancel();
        }
    }

    /// Clears the "already shown" memory of every responsibility of `kind`.
    pub fn reset_has_fired(&self, kind: &str) -> usize {
        let mut reset = 0;
        for responsibility in self.responsibilities.iter().filter(|r| r.kind() == kind) {
            responsibility.reset_has_fired();
            reset += 1;
        }
        debug!(manager = %self.name, kind, reset, "reset popup fired state");
        reset
    }
}

impl Drop for PopupManager {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

async fn run_pass(
    responsibilities: &[Arc<dyn Responsibility>],
    ui: &dyn UiDispatcher,
    cancel: &CancellationToken,
) -> PassOutcome {
    if let Some(visible) = responsibilities.iter().find(|r| r.is_visible()) {
        return PassOutcome::Blocked {
            visible: visible.kind(),
        };
    }

    for responsibility in responsibilities {
        let kind = responsibility.kind();
        if !qualifies(responsibility.as_ref()).await {
            continue;
        }

        let delay = responsibility.execution_delay();
        if delay.is_zero() {
            info!(responsibility = kind, "executing popup");
            responsibility.execute();
            return PassOutcome::Executed { kind };
        }

        debug!(
            responsibility = kind,
            delay = ?delay,
            "popup qualified; re-checking after delay"
        );
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(responsibility = kind, "delayed popup cancelled");
                return PassOutcome::Cancelled { kind };
            }
            _ = tokio::time::sleep(delay) => {}
        }

        if !qualifies(responsibility.as_ref()).await {
            debug!(responsibility = kind, "popup no longer qualifies after delay; abandoning");
            return PassOutcome::Abandoned { kind };
        }
        if cancel.is_cancelled() {
            return PassOutcome::Cancelled { kind };
        }

        return run_on_ui(responsibility, ui, cancel).await;
    }

    PassOutcome::NoneQualified
}

/// Hands execution to the UI thread and waits until it has happened, so the
/// pass stays in flight while the job sits in the queue.
async fn run_on_ui(
    responsibility: &Arc<dyn Responsibility>,
    ui: &dyn UiDispatcher,
    cancel: &CancellationToken,
) -> PassOutcome {
    let kind = responsibility.kind();
    let (ran_tx, ran_rx) = oneshot::channel();
    let deferred = Arc::clone(responsibility);
    let job_cancel = cancel.clone();

    let accepted = ui.dispatch(Box::new(move || {
        if job_cancel.is_cancelled() {
            debug!(responsibility = kind, "delayed popup cancelled while queued");
            let _ = ran_tx.send(false);
            return;
        }
        info!(responsibility = kind, "executing delayed popup");
        deferred.execute();
        let _ = ran_tx.send(true);
    }));
    if !accepted {
        warn!(responsibility = kind, "ui thread rejected delayed popup; abandoning");
        return PassOutcome::Abandoned { kind };
    }

    tokio::select! {
        biased;
        ran = ran_rx => match ran {
            Ok(true) => PassOutcome::Deferred { kind },
            Ok(false) => PassOutcome::Cancelled { kind },
            Err(_) => {
                warn!(responsibility = kind, "delayed popup dropped before the ui ran it");
                PassOutcome::Abandoned { kind }
            }
        },
        _ = cancel.cancelled() => {
            debug!(responsibility = kind, "delayed popup cancelled while queued");
            PassOutcome::Cancelled { kind }
        }
    }
}

async fn qualifies(responsibility: &dyn Responsibility) -> bool {
    let kind = responsibility.kind();
    match AssertUnwindSafe(responsibility.qualify()).catch_unwind().await {
        Ok(Ok(qualified)) => {
            debug!(responsibility = kind, qualified, "popup qualification");
            qualified
        }
        Ok(Err(err)) => {
            debug!(
                responsibility = kind,
                error = %err,
                "popup qualification failed; treating as not qualified"
            );
            false
        }
        Err(_) => {
            debug!(responsibility = kind, "popup qualifier panicked; treating as not qualified");
            false
        }
    }
}

#[cfg(test)]
#[path = "tests/manager_tests.rs"]
mod tests;
