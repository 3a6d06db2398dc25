use std::sync::Mutex;
use tokio::sync::Notify;

/// Shared resolution state with publish/await semantics.
///
/// A mutation is only visible through [`publish`], which wakes every task
/// blocked in [`wait_until`] so it can re-check its predicate. Readers never
/// observe a half-applied mutation.
///
/// [`publish`]: Published::publish
/// [`wait_until`]: Published::wait_until
#[derive(Debug, Default)]
pub struct Published<T> {
    state: Mutex<T>,
    notify: Notify,
}

impl<T> Published<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: Mutex::new(value),
            notify: Notify::new(),
        }
    }

    /// Atomically apply a mutation and wake all waiters.
    pub fn publish<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let ret = f(&mut self.state.lock().unwrap());
        self.notify.notify_waiters();
        ret
    }

    /// Read the current state without waking anyone.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.lock().unwrap())
    }

    /// Block until `f` returns `Some`, re-checking after every publish.
    pub async fn wait_until<R>(&self, f: impl Fn(&T) -> Option<R>) -> R {
        loop {
            // Register interest before checking, otherwise a publish that
            // lands between the check and the await is lost.
            let notified = self.notify.notified();

            if let Some(ret) = f(&self.state.lock().unwrap()) {
                return ret;
            }

            notified.await;
        }
    }
}
