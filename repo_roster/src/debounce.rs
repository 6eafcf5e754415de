use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Cancellable delayed action with at most one pending invocation.
///
/// Re-arming drops the previously scheduled action, so only the last call
/// within the delay window runs. Owned by the caller; dropping the debouncer
/// cancels whatever is pending.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Debouncer::default()
    }

    pub fn call<ACTION>(&mut self, delay: Duration, action: ACTION)
    where
        ACTION: 'static + Future<Output = ()> + Send,
    {
        self.cancel();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Tests
