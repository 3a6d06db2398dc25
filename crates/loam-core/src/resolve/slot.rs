use super::Published;

/// A write-once resolution fact.
///
/// The owning task eventually calls [`set`]; any other task can block on
/// [`get`] until the fact is available. Once set, the value is immutable.
///
/// [`set`]: Slot::set
/// [`get`]: Slot::get
#[derive(Debug)]
pub struct Slot<T> {
    inner: Published<Option<T>>,
}

impl<T: Clone> Slot<T> {
    pub fn new() -> Self {
        Self {
            inner: Published::new(None),
        }
    }

    /// Publish the fact. A fact is resolved exactly once.
    pub fn set(&self, value: T) {
        self.inner.publish(|slot| {
            assert!(slot.is_none(), "fact already published");
            *slot = Some(value);
        });
    }

    /// Block until the fact has been published.
    pub async fn get(&self) -> T {
        self.inner.wait_until(|slot| slot.clone()).await
    }

    /// The fact, if already published.
    pub fn peek(&self) -> Option<T> {
        self.inner.read(|slot| slot.clone())
    }
}

impl<T: Clone> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}
