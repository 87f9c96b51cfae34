//! Live "now" marker refresh for an open day view

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::clock::Clock;
use crate::plan::{Timeline, marker_offset};

/// Periodically recomputes the marker offset for one day's hour range
pub struct NowTicker {
    clock: Arc<dyn Clock>,
    date: NaiveDate,
    start_hour: u32,
    end_hour: u32,
    hour_height: f64,
    period: Duration,
}

impl NowTicker {
    pub fn new(clock: Arc<dyn Clock>, date: NaiveDate, timeline: &Timeline<'_>, period: Duration) -> Self {
        Self {
            clock,
            date,
            start_hour: timeline.start_hour,
            end_hour: timeline.end_hour,
            hour_height: timeline.hour_height,
            period,
        }
    }

    fn current(&self) -> Option<f64> {
        self.clock
            .now_on(self.date)
            .and_then(|t| marker_offset(t, self.start_hour, self.end_hour, self.hour_height))
    }

    /// Start ticking. The first marker is published immediately
    pub fn start(self) -> TickerHandle {
        let (marker_tx, marker_rx) = watch::channel(self.current());
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        let handle = tokio::spawn(async move {
            debug!("Now ticker started for {}", self.date);
            let mut interval = tokio::time::interval(self.period);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        marker_tx.send_replace(self.current());
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            debug!("Now ticker stopped for {}", self.date);
        });

        TickerHandle {
            marker_rx,
            shutdown_tx,
            handle: Some(handle),
        }
    }
}

/// Handle to a running [`NowTicker`]. Dropping it stops the ticker
pub struct TickerHandle {
    marker_rx: watch::Receiver<Option<f64>>,
    shutdown_tx: broadcast::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl TickerHandle {
    /// Receiver that sees every published marker offset
    pub fn subscribe(&self) -> watch::Receiver<Option<f64>> {
        self.marker_rx.clone()
    }

    /// Latest marker offset
    pub fn current(&self) -> Option<f64> {
        *self.marker_rx.borrow()
    }

    /// Stop the ticker and wait for it to finish
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.shutdown_tx.send(());
            handle.abort();
        }
    }
}
