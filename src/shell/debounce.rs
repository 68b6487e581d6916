use std::{sync::Arc, time::Duration};

use tokio::{runtime::Handle, sync::watch, task::JoinHandle};

use crate::{query::QueryAssembler, selection::SelectionState};

/// Coalesces rapid edits into one preview compilation.
///
/// Every [`schedule`](PreviewDebouncer::schedule) cancels the pending timer
/// and starts a new one; only a timer that survives its full delay compiles
/// the snapshot it was given and publishes the result. Without a tokio
/// runtime, or with a zero delay, the preview is compiled immediately.
#[derive(Debug)]
pub struct PreviewDebouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    sender: Arc<watch::Sender<Option<String>>>,
}

impl PreviewDebouncer {
    pub fn new(delay: Duration) -> Self {
        let (sender, _) = watch::channel(None);
        Self { delay, pending: None, sender: Arc::new(sender) }
    }

    /// Receiver that sees every published preview (`None` = nothing to build).
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.sender.subscribe()
    }

    /// Most recently published preview.
    pub fn current(&self) -> Option<String> {
        self.sender.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn schedule(&mut self, snapshot: SelectionState) {
        self.cancel();

        let handle = match Handle::try_current() {
            Ok(handle) if !self.delay.is_zero() => handle,
            _ => {
                publish(&self.sender, &snapshot);
                return;
            }
        };

        let delay = self.delay;
        let sender = Arc::clone(&self.sender);
        self.pending = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            publish(&sender, &snapshot);
        }));
    }

    /// Drop the pending timer, if any, without publishing.
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl Drop for PreviewDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn publish(sender: &watch::Sender<Option<String>>, snapshot: &SelectionState) {
    let preview = QueryAssembler::build_query(snapshot);
    tracing::debug!(preview = ?preview, "preview recompiled");
    sender.send_replace(preview);
}
