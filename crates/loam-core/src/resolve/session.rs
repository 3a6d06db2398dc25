use crate::{Error, Result};

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Schedules resolution tasks and joins their outcomes.
///
/// Every submitted task runs under the session deadline. A task that blocks
/// forever on a fact nobody publishes (a cyclic foreign-key configuration,
/// a reference to a column that does not exist) is cut off and reported as a
/// stalled-resolution error instead of deadlocking the caller.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

struct Shared {
    deadline: Duration,
    pending: AtomicUsize,
    failure: Mutex<Option<Error>>,
    notify: Notify,
}

impl Session {
    pub fn new(deadline: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                deadline,
                pending: AtomicUsize::new(0),
                failure: Mutex::new(None),
                notify: Notify::new(),
            }),
        }
    }

    /// Schedule a unit of resolution work to run concurrently with all other
    /// submitted work. `label` names the task in stall reports.
    pub fn submit<F>(&self, label: impl Into<String>, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let label = label.into();
        let shared = self.shared.clone();
        shared.pending.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(shared.deadline, task).await {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::stalled(label)),
            };

            if let Err(err) = outcome {
                let mut failure = shared.failure.lock().unwrap();
                // First failure wins; later ones are usually knock-on stalls.
                failure.get_or_insert(err);
            }

            shared.pending.fetch_sub(1, Ordering::SeqCst);
            shared.notify.notify_waiters();
        });
    }

    /// Block until every submitted task has completed, returning the first
    /// failure if any task failed. Returns as soon as a failure is recorded;
    /// outstanding tasks are abandoned to their deadlines.
    pub async fn join_all(&self) -> Result<()> {
        loop {
            let notified = self.shared.notify.notified();

            if let Some(err) = self.shared.failure.lock().unwrap().clone() {
                return Err(err);
            }

            if self.shared.pending.load(Ordering::SeqCst) == 0 {
                return Ok(());
            }

            notified.await;
        }
    }
}
