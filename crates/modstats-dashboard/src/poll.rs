//! Cancellable poll timer

use crate::state::Event;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Handle to a running poll task
///
/// The task posts [`Event::PollTick`] every `period` until the handle is
/// cancelled or dropped. Ticks that find the event channel full are
/// discarded rather than queued.
#[derive(Debug)]
pub struct PollTimer {
    token: CancellationToken,
    handle: JoinHandle<()>,
    period: Duration,
}

impl PollTimer {
    /// Spawn a timer whose first tick fires one `period` from now
    #[must_use]
    pub fn start(period: Duration, events: mpsc::Sender<Event>) -> Self {
        let token = CancellationToken::new();
        let child = token.child_token();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    () = child.cancelled() => break,
                    _ = ticker.tick() => {
                        if events.try_send(Event::PollTick).is_err() {
                            debug!("Poll tick dropped, event channel busy or closed");
                            if events.is_closed() {
                                break;
                            }
                        }
                    }
                }
            }

            debug!("Poll timer stopped");
        });

        info!("Polling every {}s", period.as_secs());
        Self {
            token,
            handle,
            period,
        }
    }

    /// Interval between ticks
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Stop ticking
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether [`PollTimer::cancel`] has been called
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the task to exit
    pub async fn shutdown(mut self) {
        self.token.cancel();
        let handle = &mut self.handle;
        if let Err(e) = handle.await {
            debug!("Poll task ended abnormally: {}", e);
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
