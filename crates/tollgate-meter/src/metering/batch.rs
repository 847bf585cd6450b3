//! Batch scheduler
//!
//! Accumulates tracking events and hands them to an emitter in batches:
//! - Size-triggered flush when the queue reaches `max_size`
//! - Debounced deferred flush `flush_interval` after the latest add
//! - Final flush and retirement on `cleanup`
//!
//! A flush always splices the queue out under the lock before any
//! delivery starts, so events added while a batch is in flight land in
//! the next batch and no event is handed to two flushes.
//!
//! Lifecycle: `Idle -> add -> Armed -> (timer | size) -> Flushing -> Idle`,
//! and `cleanup` moves any state to the terminal `Retired`.

use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tollgate_common::{MeterError, Result, TrackingEvent};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::config::BatchConfig;
use crate::emitter::EventEmitter;
use crate::metrics::MeterMetrics;

/// What happens to events whose delivery failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log and forget (fire-and-forget delivery)
    #[default]
    Drop,
    /// Put failed events back at the head of the queue for the next flush
    Requeue,
}

/// Observable scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing scheduled
    Idle,
    /// A deferred flush timer is pending
    Armed,
    /// At least one batch delivery is in flight
    Flushing,
    /// Cleaned up; terminal
    Retired,
}

/// Why a batch was flushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Size,
    Timer,
    Manual,
    Cleanup,
}

/// Outcome of delivering one batch
#[derive(Debug, Clone)]
pub struct FlushReport {
    pub batch_id: Uuid,
    pub trigger: FlushTrigger,
    /// Events accepted by the emitter
    pub delivered: usize,
    /// Ids of events the emitter failed to deliver
    pub failed: Vec<String>,
}

impl FlushReport {
    fn empty(trigger: FlushTrigger) -> Self {
        Self {
            batch_id: Uuid::nil(),
            trigger,
            delivered: 0,
            failed: Vec::new(),
        }
    }

    /// Number of events that were part of the batch
    pub fn len(&self) -> usize {
        self.delivered + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flush counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub size_flushes: u64,
    pub timer_flushes: u64,
    pub manual_flushes: u64,
    pub pending: usize,
}

/// Callback receiving the ids of undelivered events
pub type FailureCallback = Arc<dyn Fn(&[String]) + Send + Sync>;

struct Queue {
    events: Vec<TrackingEvent>,
    timer: Option<AbortHandle>,
    /// Bumped whenever the timer is re-armed or cancelled
    generation: u64,
    in_flight: usize,
    retired: bool,
}

impl Queue {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation += 1;
    }

    /// Splice out everything queued so far
    fn take_batch(&mut self) -> Option<Vec<TrackingEvent>> {
        if self.events.is_empty() {
            return None;
        }
        self.in_flight += 1;
        Some(std::mem::take(&mut self.events))
    }
}

struct Shared<E> {
    config: BatchConfig,
    emitter: E,
    queue: Mutex<Queue>,
    metrics: Arc<MeterMetrics>,
    on_failure: Option<FailureCallback>,
    size_flushes: AtomicU64,
    timer_flushes: AtomicU64,
    manual_flushes: AtomicU64,
}

impl<E> Drop for Shared<E> {
    fn drop(&mut self) {
        let queue = self.queue.get_mut();
        if let Some(timer) = queue.timer.take() {
            timer.abort();
        }
        if !queue.events.is_empty() {
            warn!(
                pending = queue.events.len(),
                "Batch scheduler dropped without cleanup, pending events lost"
            );
        }
    }
}

/// Size/time-triggered accumulator for tracking events
///
/// Cloning yields another handle to the same queue. `add` must be called
/// from within a tokio runtime since flushes and timers run as tasks.
pub struct BatchScheduler<E> {
    shared: Arc<Shared<E>>,
}

impl<E> Clone for BatchScheduler<E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<E: EventEmitter + 'static> BatchScheduler<E> {
    /// Create a scheduler with default metrics and no failure callback
    pub fn new(emitter: E, config: BatchConfig) -> Self {
        BatchSchedulerBuilder::new(emitter).config(config).build()
    }

    pub fn builder(emitter: E) -> BatchSchedulerBuilder<E> {
        BatchSchedulerBuilder::new(emitter)
    }

    pub fn config(&self) -> &BatchConfig {
        &self.shared.config
    }

    /// Append an event, flushing immediately at `max_size` or (re)arming the timer
    pub fn add(&self, event: TrackingEvent) -> Result<()> {
        let runtime = Handle::try_current()
            .map_err(|_| MeterError::Internal("batch scheduler requires a tokio runtime".into()))?;

        let mut queue = self.shared.queue.lock();
        if queue.retired {
            return Err(MeterError::SchedulerRetired);
        }
        queue.events.push(event);

        if queue.events.len() >= self.shared.config.max_size {
            Shared::spawn_size_flush(&self.shared, &mut queue, &runtime);
        } else {
            Shared::arm_timer(&self.shared, &mut queue, &runtime);
        }
        Ok(())
    }

    /// Cancel the pending timer and deliver everything queued right now
    ///
    /// Events added after this call starts go to the next batch.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> FlushReport {
        let batch = {
            let mut queue = self.shared.queue.lock();
            queue.cancel_timer();
            queue.take_batch()
        };

        match batch {
            Some(events) => {
                self.shared.manual_flushes.fetch_add(1, Ordering::Relaxed);
                Shared::deliver(&self.shared, events, FlushTrigger::Manual).await
            }
            None => FlushReport::empty(FlushTrigger::Manual),
        }
    }

    /// Cancel the timer, deliver what remains and retire the scheduler
    ///
    /// Idempotent: later calls find an empty, retired queue and do nothing.
    #[instrument(skip(self))]
    pub async fn cleanup(&self) -> FlushReport {
        let batch = {
            let mut queue = self.shared.queue.lock();
            queue.cancel_timer();
            queue.retired = true;
            let batch = queue.take_batch();
            queue.events.shrink_to_fit();
            batch
        };

        match batch {
            Some(events) => Shared::deliver(&self.shared, events, FlushTrigger::Cleanup).await,
            None => FlushReport::empty(FlushTrigger::Cleanup),
        }
    }

    pub fn state(&self) -> SchedulerState {
        let queue = self.shared.queue.lock();
        if queue.retired {
            SchedulerState::Retired
        } else if queue.in_flight > 0 {
            SchedulerState::Flushing
        } else if queue.timer.is_some() {
            SchedulerState::Armed
        } else {
            SchedulerState::Idle
        }
    }

    /// Number of queued events not yet handed to a flush
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().events.len()
    }

    pub fn stats(&self) -> BatchStats {
        BatchStats {
            size_flushes: self.shared.size_flushes.load(Ordering::Relaxed),
            timer_flushes: self.shared.timer_flushes.load(Ordering::Relaxed),
            manual_flushes: self.shared.manual_flushes.load(Ordering::Relaxed),
            pending: self.pending(),
        }
    }
}

impl<E: EventEmitter + 'static> Shared<E> {
    /// Replace any pending timer with a fresh one
    ///
    /// The deadline is fixed here, not when the task is first polled. The
    /// task owns a strong handle so queued events outlive the last
    /// scheduler handle until the timer fires or is aborted.
    fn arm_timer(shared: &Arc<Self>, queue: &mut Queue, runtime: &Handle) {
        queue.cancel_timer();
        let generation = queue.generation;
        let deadline = Instant::now() + shared.config.flush_interval();
        let shared = shared.clone();

        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            Shared::fire_timer(&shared, generation).await;
        });
        queue.timer = Some(task.abort_handle());
    }

    /// Splice out a full queue and deliver it in the background
    fn spawn_size_flush(shared: &Arc<Self>, queue: &mut Queue, runtime: &Handle) {
        queue.cancel_timer();
        if let Some(events) = queue.take_batch() {
            shared.size_flushes.fetch_add(1, Ordering::Relaxed);
            let shared = shared.clone();
            runtime.spawn(async move {
                Shared::deliver(&shared, events, FlushTrigger::Size).await;
            });
        }
    }

    async fn fire_timer(shared: &Arc<Self>, generation: u64) {
        let batch = {
            let mut queue = shared.queue.lock();
            // A newer add or a cancel superseded this timer
            if queue.generation != generation || queue.retired {
                return;
            }
            queue.timer = None;
            queue.take_batch()
        };

        if let Some(events) = batch {
            shared.timer_flushes.fetch_add(1, Ordering::Relaxed);
            Shared::deliver(shared, events, FlushTrigger::Timer).await;
        }
    }

    /// Deliver one batch, one submission per event, concurrently
    async fn deliver(
        shared: &Arc<Self>,
        events: Vec<TrackingEvent>,
        trigger: FlushTrigger,
    ) -> FlushReport {
        let batch_id = Uuid::new_v4();
        shared.metrics.flushes.inc();
        debug!(batch_id = %batch_id, size = events.len(), ?trigger, "Flushing batch");

        let outcomes = join_all(events.into_iter().map(|event| async move {
            let outcome = shared.emitter.submit(vec![event.clone()]).await;
            (event, outcome)
        }))
        .await;

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (event, outcome) in outcomes {
            match outcome {
                Ok(response) if response.success => delivered += 1,
                Ok(_) => {
                    warn!(event_id = %event.event_id(), "Emitter reported unsuccessful delivery");
                    failed.push(event);
                }
                Err(e) => {
                    warn!(event_id = %event.event_id(), error = %e, "Event delivery failed");
                    failed.push(event);
                }
            }
        }

        shared.metrics.events_delivered.inc_by(delivered as u64);
        shared.metrics.delivery_failures.inc_by(failed.len() as u64);
        let failed_ids: Vec<String> = failed.iter().map(|e| e.event_id().to_string()).collect();

        {
            let mut queue = shared.queue.lock();
            queue.in_flight = queue.in_flight.saturating_sub(1);

            if !failed.is_empty() && shared.config.failure_policy == FailurePolicy::Requeue {
                if queue.retired {
                    error!(count = failed.len(), "Scheduler retired, failed events cannot be requeued");
                } else {
                    debug!(count = failed.len(), "Requeueing failed events");
                    let newer = std::mem::replace(&mut queue.events, failed);
                    queue.events.extend(newer);
                    if let Ok(runtime) = Handle::try_current() {
                        if queue.events.len() >= shared.config.max_size {
                            Shared::spawn_size_flush(shared, &mut queue, &runtime);
                        } else {
                            Shared::arm_timer(shared, &mut queue, &runtime);
                        }
                    }
                }
            }
        }

        if !failed_ids.is_empty() {
            if let Some(callback) = &shared.on_failure {
                callback(&failed_ids);
            }
        }

        debug!(batch_id = %batch_id, delivered, failed = failed_ids.len(), "Batch delivered");
        FlushReport {
            batch_id,
            trigger,
            delivered,
            failed: failed_ids,
        }
    }
}

/// Builder for BatchScheduler
pub struct BatchSchedulerBuilder<E> {
    emitter: E,
    config: BatchConfig,
    metrics: Option<Arc<MeterMetrics>>,
    on_failure: Option<FailureCallback>,
}

impl<E: EventEmitter + 'static> BatchSchedulerBuilder<E> {
    pub fn new(emitter: E) -> Self {
        Self {
            emitter,
            config: BatchConfig::default(),
            metrics: None,
            on_failure: None,
        }
    }

    pub fn config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn metrics(mut self, metrics: Arc<MeterMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Surface ids of events whose delivery failed
    pub fn on_delivery_failure<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[String]) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> BatchScheduler<E> {
        BatchScheduler {
            shared: Arc::new(Shared {
                config: self.config.normalized(),
                emitter: self.emitter,
                queue: Mutex::new(Queue {
                    events: Vec::new(),
                    timer: None,
                    generation: 0,
                    in_flight: 0,
                    retired: false,
                }),
                metrics: self.metrics.unwrap_or_default(),
                on_failure: self.on_failure,
                size_flushes: AtomicU64::new(0),
                timer_flushes: AtomicU64::new(0),
                manual_flushes: AtomicU64::new(0),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use tollgate_common::{EventIdGenerator, IngestResponse, Metadata};

    #[derive(Default)]
    struct RecordingEmitter {
        delivered: Mutex<Vec<String>>,
        fail_once: Mutex<HashSet<String>>,
        gate: Option<Arc<Semaphore>>,
    }

    impl RecordingEmitter {
        fn delivered(&self) -> Vec<String> {
            self.delivered.lock().clone()
        }
    }

    #[async_trait]
    impl EventEmitter for RecordingEmitter {
        async fn submit(&self, events: Vec<TrackingEvent>) -> Result<IngestResponse> {
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.expect("gate closed");
            }
            let mut delivered = self.delivered.lock();
            for event in &events {
                if self.fail_once.lock().remove(event.event_id()) {
                    return Err(MeterError::api(503, "unavailable"));
                }
                delivered.push(event.event_id().to_string());
            }
            Ok(IngestResponse::accepted(events.len()))
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn events(n: usize) -> Vec<TrackingEvent> {
        let ids = EventIdGenerator::new("api_request");
        (0..n)
            .map(|_| TrackingEvent::new(&ids, "cus_1", "api_request", Metadata::new()))
            .collect()
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_size_threshold_flushes_and_cleanup_delivers_rest() {
        let emitter = Arc::new(RecordingEmitter::default());
        let scheduler = BatchScheduler::new(emitter.clone(), BatchConfig::new(10, 5000));

        let all = events(25);
        for event in all.clone() {
            scheduler.add(event).unwrap();
        }

        let stats = scheduler.stats();
        assert_eq!(stats.size_flushes, 2);
        assert_eq!(stats.pending, 5);

        settle().await;
        assert_eq!(emitter.delivered().len(), 20);

        let report = scheduler.cleanup().await;
        assert_eq!(report.trigger, FlushTrigger::Cleanup);
        assert_eq!(report.delivered, 5);

        let delivered = emitter.delivered();
        let unique: HashSet<&String> = delivered.iter().collect();
        assert_eq!(delivered.len(), 25);
        assert_eq!(unique.len(), 25);
        assert!(all.iter().all(|e| unique.contains(&e.event_id().to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_is_idempotent() {
        let emitter = Arc::new(RecordingEmitter::default());
        let scheduler = BatchScheduler::new(emitter.clone(), BatchConfig::default());

        for event in events(3) {
            scheduler.add(event).unwrap();
        }

        let first = scheduler.cleanup().await;
        let second = scheduler.cleanup().await;
        assert_eq!(first.delivered, 3);
        assert!(second.is_empty());
        assert_eq!(scheduler.state(), SchedulerState::Retired);

        // No timer survives retirement
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(emitter.delivered().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_is_debounced_per_add() {
        let emitter = Arc::new(RecordingEmitter::default());
        let scheduler = BatchScheduler::new(emitter.clone(), BatchConfig::new(100, 5000));
        let mut batch = events(2).into_iter();

        scheduler.add(batch.next().unwrap()).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Armed);

        tokio::time::advance(Duration::from_millis(3000)).await;
        scheduler.add(batch.next().unwrap()).unwrap();

        // 6s after the first add but only 3s after the second
        tokio::time::advance(Duration::from_millis(3000)).await;
        settle().await;
        assert!(emitter.delivered().is_empty());
        assert_eq!(scheduler.pending(), 2);

        tokio::time::advance(Duration::from_millis(2001)).await;
        settle().await;
        assert_eq!(emitter.delivered().len(), 2);
        assert_eq!(scheduler.stats().timer_flushes, 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_during_in_flight_flush_goes_to_next_batch() {
        let gate = Arc::new(Semaphore::new(0));
        let emitter = Arc::new(RecordingEmitter {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let scheduler = BatchScheduler::new(emitter.clone(), BatchConfig::new(2, 5000));
        let mut batch = events(3).into_iter();
        let third = {
            scheduler.add(batch.next().unwrap()).unwrap();
            scheduler.add(batch.next().unwrap()).unwrap();
            batch.next().unwrap()
        };

        settle().await;
        assert_eq!(scheduler.state(), SchedulerState::Flushing);

        scheduler.add(third.clone()).unwrap();
        assert_eq!(scheduler.pending(), 1);

        gate.add_permits(10);
        settle().await;
        assert_eq!(emitter.delivered().len(), 2);
        assert!(!emitter.delivered().contains(&third.event_id().to_string()));

        let report = scheduler.cleanup().await;
        assert_eq!(report.delivered, 1);
        assert_eq!(emitter.delivered().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_flush_cancels_timer() {
        let emitter = Arc::new(RecordingEmitter::default());
        let scheduler = BatchScheduler::new(emitter.clone(), BatchConfig::new(100, 1000));

        for event in events(4) {
            scheduler.add(event).unwrap();
        }
        let report = scheduler.flush().await;
        assert_eq!(report.delivered, 4);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(emitter.delivered().len(), 4);
        assert_eq!(scheduler.stats().timer_flushes, 0);

        assert!(scheduler.flush().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_policy_reports_failures() {
        let emitter = Arc::new(RecordingEmitter::default());
        let batch = events(3);
        emitter
            .fail_once
            .lock()
            .insert(batch[1].event_id().to_string());

        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = reported.clone();
        let scheduler = BatchScheduler::builder(emitter.clone())
            .config(BatchConfig::new(100, 1000))
            .on_delivery_failure(move |ids| sink.lock().extend_from_slice(ids))
            .build();

        for event in batch.clone() {
            scheduler.add(event).unwrap();
        }
        let report = scheduler.flush().await;

        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, vec![batch[1].event_id().to_string()]);
        assert_eq!(*reported.lock(), report.failed);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requeue_policy_retries_failed_events() {
        let emitter = Arc::new(RecordingEmitter::default());
        let batch = events(2);
        emitter
            .fail_once
            .lock()
            .insert(batch[0].event_id().to_string());

        let config = BatchConfig::new(100, 1000).with_failure_policy(FailurePolicy::Requeue);
        let scheduler = BatchScheduler::new(emitter.clone(), config);
        for event in batch.clone() {
            scheduler.add(event).unwrap();
        }

        let report = scheduler.flush().await;
        assert_eq!(report.failed.len(), 1);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.state(), SchedulerState::Armed);

        // The requeued event rides the re-armed timer
        tokio::time::advance(Duration::from_millis(1001)).await;
        settle().await;
        let mut delivered = emitter.delivered();
        delivered.sort();
        let mut expected: Vec<String> = batch.iter().map(|e| e.event_id().to_string()).collect();
        expected.sort();
        assert_eq!(delivered, expected);
    }

    #[tokio::test]
    async fn test_add_after_cleanup_rejected() {
        let scheduler = BatchScheduler::new(
            Arc::new(RecordingEmitter::default()),
            BatchConfig::default(),
        );
        scheduler.cleanup().await;

        let err = scheduler.add(events(1).remove(0)).unwrap_err();
        assert!(matches!(err, MeterError::SchedulerRetired));
    }

    #[test]
    fn test_add_outside_runtime_fails() {
        let scheduler = BatchScheduler::new(
            Arc::new(RecordingEmitter::default()),
            BatchConfig::default(),
        );
        let err = scheduler.add(events(1).remove(0)).unwrap_err();
        assert!(matches!(err, MeterError::Internal(_)));
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_flush_measured_from_add() {
        let emitter = Arc::new(RecordingEmitter::default());
        let scheduler = BatchScheduler::new(emitter.clone(), BatchConfig::new(100, 1000));

        scheduler.add(events(1).remove(0)).unwrap();

        tokio::time::advance(Duration::from_millis(999)).await;
        settle().await;
        assert!(emitter.delivered().is_empty());

        tokio::time::advance(Duration::from_millis(2)).await;
        settle().await;
        assert_eq!(emitter.delivered().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_timer_outlives_dropped_handle() {
        let emitter = Arc::new(RecordingEmitter::default());
        let scheduler = BatchScheduler::new(emitter.clone(), BatchConfig::new(100, 1000));

        for event in events(3) {
            scheduler.add(event).unwrap();
        }
        drop(scheduler);

        tokio::time::advance(Duration::from_millis(1001)).await;
        settle().await;
        assert_eq!(emitter.delivered().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requeue_reaching_max_size_flushes_immediately() {
        let gate = Arc::new(Semaphore::new(0));
        let emitter = Arc::new(RecordingEmitter {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let all = events(4);
        {
            let mut fail_once = emitter.fail_once.lock();
            fail_once.insert(all[0].event_id().to_string());
            fail_once.insert(all[1].event_id().to_string());
        }

        let config = BatchConfig::new(3, 60_000).with_failure_policy(FailurePolicy::Requeue);
        let scheduler = BatchScheduler::new(emitter.clone(), config);
        scheduler.add(all[0].clone()).unwrap();
        scheduler.add(all[1].clone()).unwrap();

        let flusher = scheduler.clone();
        let in_flight = tokio::spawn(async move { flusher.flush().await });
        settle().await;
        assert_eq!(scheduler.state(), SchedulerState::Flushing);

        // Two newer events queue behind the in-flight batch
        scheduler.add(all[2].clone()).unwrap();
        scheduler.add(all[3].clone()).unwrap();

        gate.add_permits(100);
        let report = in_flight.await.unwrap();
        assert_eq!(report.failed.len(), 2);

        settle().await;
        assert_eq!(scheduler.stats().size_flushes, 1);
        assert_eq!(scheduler.pending(), 0);

        let mut delivered = emitter.delivered();
        delivered.sort();
        let mut expected: Vec<String> = all.iter().map(|e| e.event_id().to_string()).collect();
        expected.sort();
        assert_eq!(delivered, expected);
    }
}
