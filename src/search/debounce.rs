//! Debounce primitive / 防抖原语
//!
//! One pending slot per owner. Scheduling replaces (and aborts) whatever was
//! waiting, so only the last action requested runs once `delay` has passed
//! without a new request. Dropping the debouncer aborts the pending action.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `action` after the quiet period, cancelling the previous one / 调度动作并取消上一个
    ///
    /// The action runs synchronously on the timer task. Async work it starts
    /// must be spawned separately so a later `schedule` cannot abort it
    /// half-way.
    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.delay;
        let mut slot = self.pending.lock();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Drop the pending action, if any / 取消待执行动作
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> Box<dyn FnOnce() + Send>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |n: u32| {
            let sink = sink.clone();
            Box::new(move || sink.lock().push(n)) as Box<dyn FnOnce() + Send>
        };
        (log, make)
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_action_runs() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let (log, make) = recorder();

        for n in 0..5 {
            debouncer.schedule(make(n));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(debouncer.is_pending());
        assert!(log.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(*log.lock(), vec![4]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separated_actions_both_run() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let (log, make) = recorder();

        debouncer.schedule(make(1));
        tokio::time::sleep(Duration::from_millis(600)).await;
        debouncer.schedule(make(2));
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(*log.lock(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let (log, make) = recorder();

        debouncer.schedule(make(1));
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(log.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_pending() {
        let hits = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let counter = hits.clone();
        debouncer.schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(debouncer);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
