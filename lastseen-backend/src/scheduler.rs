//! Named recurring background tasks with graceful shutdown.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

struct RecurringTask {
    name: &'static str,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the recurring tasks of the process.
///
/// Cancellation is only observed between runs, so a run that has started is
/// always allowed to finish. A run that overruns its period makes the next
/// tick get skipped rather than queued.
pub struct Scheduler {
    root: CancellationToken,
    tasks: Vec<RecurringTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Run `job` every `period`, starting immediately.
    pub fn spawn_recurring<F, Fut>(&mut self, name: &'static str, period: Duration, mut job: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.root.child_token();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(task = name, period_secs = period.as_secs(), "recurring task started");

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                job().await;
            }

            tracing::info!(task = name, "recurring task stopped");
        });

        self.tasks.push(RecurringTask {
            name,
            token,
            handle,
        });
    }

    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name).collect()
    }

    /// Stop one task after its current run. Returns false for an unknown name.
    pub fn cancel(&self, name: &str) -> bool {
        match self.tasks.iter().find(|t| t.name == name) {
            Some(task) => {
                task.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Stop every task and wait for in-flight runs to finish.
    pub async fn shutdown(self) {
        self.root.cancel();
        for task in self.tasks {
            if let Err(e) = task.handle.await {
                tracing::error!(task = task.name, error = %e, "recurring task panicked");
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_job(counter: Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> + Send {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_tasks_run_on_their_own_period() {
        let fast = Arc::new(AtomicUsize::new(0));
        let slow = Arc::new(AtomicUsize::new(0));

        let mut scheduler = Scheduler::new();
        scheduler.spawn_recurring("fast", Duration::from_secs(60), counting_job(Arc::clone(&fast)));
        scheduler.spawn_recurring("slow", Duration::from_secs(300), counting_job(Arc::clone(&slow)));

        // first tick fires immediately, then t=60..=600
        tokio::time::sleep(Duration::from_secs(601)).await;

        assert_eq!(fast.load(Ordering::SeqCst), 11);
        assert_eq!(slow.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.task_names(), vec!["fast", "slow"]);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_single_task() {
        let kept = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::new(AtomicUsize::new(0));

        let mut scheduler = Scheduler::new();
        scheduler.spawn_recurring("kept", Duration::from_secs(10), counting_job(Arc::clone(&kept)));
        scheduler.spawn_recurring("cancelled", Duration::from_secs(10), counting_job(Arc::clone(&cancelled)));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(scheduler.cancel("cancelled"));
        assert!(!scheduler.cancel("missing"));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
        assert_eq!(kept.load(Ordering::SeqCst), 4);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_in_flight_run() {
        let finished = Arc::new(AtomicUsize::new(0));

        let mut scheduler = Scheduler::new();
        let job_finished = Arc::clone(&finished);
        scheduler.spawn_recurring("slow-job", Duration::from_secs(60), move || {
            let finished = Arc::clone(&job_finished);
            async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            }
        });

        // let the first run start
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);

        scheduler.shutdown().await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
