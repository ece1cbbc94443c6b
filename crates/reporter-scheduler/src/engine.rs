use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use reporter_client::{CreateOutcome, FetchOutcome, ReportClient};
use reporter_core::{config::ScheduleConfig, ReportId, ResultRecord};
use reporter_sink::ResultSink;

use crate::{
    error::{Result, SchedulerError},
    schedule::{ticker_for, CreateCadence, Ticker},
    types::{Admission, PendingQueue, ReportEvent, TickReport},
};

/// Drives the report lifecycle: create on a cadence, poll every tick,
/// requeue what is not ready, persist what is.
///
/// Owns the pending queue and tick counter outright; nothing else touches
/// them while the loop runs.
pub struct SchedulerEngine<C, S> {
    client: C,
    sink: S,
    queue: PendingQueue,
    cadence: CreateCadence,
    ticker: Box<dyn Ticker>,
    ticks: u64,
    /// If set, every event is mirrored here for observers.
    events_tx: Option<mpsc::Sender<ReportEvent>>,
}

impl<C: ReportClient, S: ResultSink> SchedulerEngine<C, S> {
    /// Pass `Some(tx)` to receive a copy of every [`ReportEvent`].
    /// The sender is non-blocking (`try_send`) so the tick loop is never stalled.
    pub fn new(
        config: &ScheduleConfig,
        client: C,
        sink: S,
        events_tx: Option<mpsc::Sender<ReportEvent>>,
    ) -> Self {
        Self {
            client,
            sink,
            queue: PendingQueue::with_limit(config.max_pending, config.overflow),
            cadence: CreateCadence::new(config.create_every_ticks, config.create_phase),
            ticker: ticker_for(config),
            ticks: 0,
            events_tx,
        }
    }

    /// Replace the configured ticker.
    pub fn with_ticker(mut self, ticker: Box<dyn Ticker>) -> Self {
        self.ticker = ticker;
        self
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.queue
    }

    /// Number of ticks completed or in progress.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick: create if due, then poll, then wait for the next tick.
    ///
    /// A fatal create error returns before the poll. Between a client call
    /// returning and the closing wait there is no await point, so dropping
    /// this future never half-applies an outcome.
    pub async fn tick(&mut self) -> Result<TickReport> {
        self.ticks += 1;
        let mut report = TickReport {
            tick: self.ticks,
            ..TickReport::default()
        };

        if self.cadence.advance() {
            report.create_fired = true;
            self.create(&mut report).await?;
        }

        self.poll(&mut report).await?;

        self.ticker.wait().await;
        Ok(report)
    }

    /// Tick until a fatal error or until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        info!(
            create_every = self.cadence.every(),
            "scheduler engine started"
        );

        loop {
            let stop = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                res = self.tick() => {
                    res?;
                    false
                }
            };
            if stop {
                break;
            }
        }

        info!(pending = self.queue.len(), "scheduler engine shutting down");
        Ok(())
    }

    // --- private helpers ---------------------------------------------------

    async fn create(&mut self, report: &mut TickReport) -> Result<()> {
        let candidate = ReportId::generate();
        let outcome = self
            .client
            .create_report(&candidate)
            .await
            .map_err(|source| SchedulerError::Create {
                report_id: candidate.clone(),
                source,
            })?;

        match outcome {
            CreateOutcome::Created(id) => {
                if self.enqueue(id.clone(), report) {
                    info!(pending = self.queue.len(), "CREATE {id}");
                    self.emit(report, ReportEvent::Created(id));
                }
            }
            CreateOutcome::AlreadyExists(id) => {
                warn!(report_id = %id, "report already exists, discarding");
                self.emit(report, ReportEvent::AlreadyExists(id));
            }
        }
        Ok(())
    }

    async fn poll(&mut self, report: &mut TickReport) -> Result<()> {
        let Some(id) = self.queue.pop() else {
            return Ok(());
        };
        report.polled = Some(id.clone());

        let outcome = match self.client.fetch_report(&id).await {
            Ok(outcome) => outcome,
            Err(source) => {
                return Err(SchedulerError::Fetch {
                    report_id: id,
                    source,
                })
            }
        };

        match outcome {
            FetchOutcome::Ready(value) => {
                let record = ResultRecord::now(value);
                if let Err(source) = self.sink.append(&record) {
                    return Err(SchedulerError::Sink {
                        report_id: id,
                        source,
                    });
                }
                info!(pending = self.queue.len(), "SAVE {id}");
                self.emit(
                    report,
                    ReportEvent::Saved {
                        report_id: id,
                        record,
                    },
                );
            }
            FetchOutcome::NotReady => {
                self.enqueue(id.clone(), report);
                info!(pending = self.queue.len(), "WAIT {id}");
                self.emit(report, ReportEvent::Requeued(id));
            }
            FetchOutcome::NotFound => {
                warn!(report_id = %id, "report does not exist, dropping");
                self.emit(report, ReportEvent::NotFound(id));
            }
        }
        Ok(())
    }

    /// Push `id` at the tail. Returns `true` when it is now pending.
    fn enqueue(&mut self, id: ReportId, report: &mut TickReport) -> bool {
        match self.queue.push(id.clone()) {
            Admission::Queued => true,
            Admission::Duplicate => {
                warn!(report_id = %id, "report already pending, not queued twice");
                false
            }
            Admission::Evicted(old) => {
                warn!(evicted = %old, report_id = %id, "pending queue full, dropped oldest report");
                self.emit(report, ReportEvent::Evicted(old));
                true
            }
            Admission::Rejected => {
                warn!(report_id = %id, "pending queue full, report rejected");
                self.emit(report, ReportEvent::Rejected(id));
                false
            }
        }
    }

    fn emit(&self, report: &mut TickReport, event: ReportEvent) {
        if let Some(ref tx) = self.events_tx {
            // try_send never blocks the tick loop; log a warning if the channel is full.
            if tx.try_send(event.clone()).is_err() {
                warn!("event channel full or closed, event dropped");
            }
        }
        report.events.push(event);
    }
}
