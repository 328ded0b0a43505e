//! [`JobScheduler`] running each job as a tokio task.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Local, Utc};
use tokio_util::sync::CancellationToken;

use timeswitch_app::ports::{JobCallback, JobHandle, JobRule, JobScheduler};
use timeswitch_domain::time::Timestamp;

use crate::occurrence::next_occurrence;

type Jobs = Arc<Mutex<HashMap<JobHandle, CancellationToken>>>;

/// Spawns one task per job. Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct TokioJobScheduler {
    next_id: AtomicU64,
    jobs: Jobs,
}

impl TokioJobScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs not yet completed or cancelled.
    #[must_use]
    pub fn active_jobs(&self) -> usize {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Cancel every job.
    pub fn shutdown(&self) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, token) in jobs.drain() {
            token.cancel();
        }
    }
}

impl JobScheduler for TokioJobScheduler {
    fn schedule_job(&self, rule: JobRule, callback: JobCallback) -> JobHandle {
        let handle = JobHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let token = CancellationToken::new();
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, token.clone());
        tracing::debug!(job = handle.id(), %rule, "job scheduled");
        let jobs = Arc::clone(&self.jobs);
        tokio::spawn(async move {
            match rule {
                JobRule::At(at) => {
                    fire_at(at, &callback, &token).await;
                }
                JobRule::Recurring {
                    weekdays,
                    hour,
                    minute,
                } => {
                    let mut after = Local::now();
                    loop {
                        let Some(next) = next_occurrence(&weekdays, hour, minute, after) else {
                            tracing::error!(job = handle.id(), hour, minute, "recurring job never occurs");
                            break;
                        };
                        if !fire_at(next.with_timezone(&Utc), &callback, &token).await {
                            break;
                        }
                        // the timer may wake slightly before the wall clock reaches `next`
                        after = Local::now().max(next);
                    }
                }
            }
            jobs.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&handle);
        });
        handle
    }

    fn cancel_job(&self, handle: JobHandle) -> bool {
        let token = self
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        match token {
            Some(token) => {
                token.cancel();
                tracing::debug!(job = handle.id(), "job cancelled");
                true
            }
            None => false,
        }
    }
}

/// Sleep until `at` and run `callback`. Returns `false` when cancelled first.
async fn fire_at(at: Timestamp, callback: &JobCallback, token: &CancellationToken) -> bool {
    let delay = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    tokio::select! {
        () = token.cancelled() => false,
        () = tokio::time::sleep(delay) => {
            callback().await;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use timeswitch_app::ports::JobFuture;
    use timeswitch_domain::weekday::Weekdays;

    fn counter() -> (Arc<AtomicUsize>, JobCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let callback: JobCallback = Arc::new(move || -> JobFuture {
            inner.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {})
        });
        (count, callback)
    }

    fn in_seconds(seconds: i64) -> JobRule {
        JobRule::At(Utc::now() + chrono::Duration::seconds(seconds))
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_one_shot_job_once_at_its_time() {
        let scheduler = TokioJobScheduler::new();
        let (count, callback) = counter();
        scheduler.schedule_job(in_seconds(60), callback);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.active_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_past_one_shot_job_immediately() {
        let scheduler = TokioJobScheduler::new();
        let (count, callback) = counter();
        scheduler.schedule_job(in_seconds(-5), callback);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_run_cancelled_job() {
        let scheduler = TokioJobScheduler::new();
        let (count, callback) = counter();
        let handle = scheduler.schedule_job(in_seconds(60), callback);

        assert!(scheduler.cancel_job(handle));
        assert!(!scheduler.cancel_job(handle));
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_cancel_recurring_jobs_on_shutdown() {
        let scheduler = TokioJobScheduler::new();
        let (_, first) = counter();
        let (_, second) = counter();
        let rule = JobRule::Recurring {
            weekdays: Weekdays::all(),
            hour: 3,
            minute: 0,
        };
        let handle = scheduler.schedule_job(rule.clone(), first);
        scheduler.schedule_job(rule, second);
        assert_eq!(scheduler.active_jobs(), 2);

        scheduler.shutdown();
        assert_eq!(scheduler.active_jobs(), 0);
        assert!(!scheduler.cancel_job(handle));
    }

    #[test]
    fn should_hand_out_distinct_handles() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let _guard = runtime.enter();
        let scheduler = TokioJobScheduler::new();
        let (_, callback) = counter();
        let first = scheduler.schedule_job(in_seconds(10), Arc::clone(&callback));
        let second = scheduler.schedule_job(in_seconds(10), callback);
        assert_ne!(first, second);
    }
}
