//! Single background worker that runs popup evaluation passes.

use std::{future::Future, thread};

use anyhow::Context;
use tokio::{runtime::Handle, sync::oneshot, task::JoinHandle};
use tracing::debug;

pub(crate) struct PopupWorker {
    handle: Handle,
    shutdown: Option<oneshot::Sender<()>>,
}

impl PopupWorker {
    /// Starts a current-thread runtime on its own OS thread. Every task spawned
    /// through the worker is polled on that one thread.
    pub(crate) fn spawn(name: &str) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .context("failed to build popup worker runtime")?;
        let handle = runtime.handle().clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let thread_name = name.to_string();

        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                runtime.block_on(async {
                    let _ = shutdown_rx.await;
                });
                debug!(worker = %thread_name, "popup worker stopped");
            })
            .with_context(|| format!("failed to spawn popup worker thread '{name}'"))?;

        Ok(Self {
            handle,
            shutdown: Some(shutdown_tx),
        })
    }

    pub(crate) fn spawn_pass<F>(&self, pass: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(pass)
    }
}

impl Drop for PopupWorker {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
