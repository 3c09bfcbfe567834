//! Dashboard event loop
//!
//! [`DashboardClient`] owns the view state, the poll timer and the event
//! channel. Fetches run as spawned tasks and report back through the same
//! channel as every other event, so transitions happen one at a time in
//! [`DashboardClient::dispatch`].

use crate::api_client::DashboardSource;
use crate::poll::PollTimer;
use crate::preferences::PreferenceStore;
use crate::state::{ClientViewState, Effect, Event, Phase};
use modstats_core::{ModeratorId, RankingMetric};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events buffered between the timer, fetch tasks and the loop
const EVENT_BUFFER: usize = 32;

/// Client settings
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Poll interval
    pub poll_interval: Duration,
    /// Leaderboard metric requested from the API
    pub metric: RankingMetric,
    /// Moderator to open once data is available
    pub initial_detail: Option<ModeratorId>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            metric: RankingMetric::Total,
            initial_detail: None,
        }
    }
}

/// Drives a [`ClientViewState`] from a data source
pub struct DashboardClient<S, P> {
    state: ClientViewState,
    source: Arc<S>,
    prefs: P,
    options: ClientOptions,
    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
    poll: Option<PollTimer>,
    visible: bool,
    fetches_started: u64,
}

impl<S, P> DashboardClient<S, P>
where
    S: DashboardSource,
    P: PreferenceStore,
{
    /// New client; nothing happens until [`DashboardClient::start`]
    pub fn new(source: Arc<S>, prefs: P, options: ClientOptions) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        Self {
            state: ClientViewState::new(),
            source,
            prefs,
            options,
            events_tx,
            events_rx,
            poll: None,
            visible: true,
            fetches_started: 0,
        }
    }

    /// Page load: queue the deep link, fetch, and start polling
    pub fn start(&mut self) {
        if let Some(id) = self.options.initial_detail {
            self.dispatch(Event::OpenDetail(id));
        }
        self.dispatch(Event::LoadRequested);
        self.start_polling();
    }

    /// Apply one event and run the effect it asks for
    pub fn dispatch(&mut self, event: Event) {
        if let Some(effect) = self.state.handle(event, &self.prefs) {
            self.run(effect);
        }
    }

    /// Wait for the next event and dispatch it
    ///
    /// Returns `false` once the event channel has closed.
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Process events until no fetch is in flight
    pub async fn settle(&mut self) {
        while self.state.phase() == Phase::Loading {
            if !self.process_next().await {
                break;
            }
        }
    }

    /// Host visibility changed
    ///
    /// Hiding cancels the poll timer. Showing restarts it and refreshes.
    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;

        if visible {
            info!("Dashboard visible, resuming polling");
            self.start_polling();
            self.dispatch(Event::LoadRequested);
        } else {
            info!("Dashboard hidden, pausing polling");
            self.stop_polling();
        }
    }

    /// Cancel polling and wait for the timer task to exit
    pub async fn shutdown(mut self) {
        if let Some(timer) = self.poll.take() {
            timer.shutdown().await;
        }
        info!("Dashboard client stopped");
    }

    /// Current view state
    #[must_use]
    pub const fn state(&self) -> &ClientViewState {
        &self.state
    }

    /// Preference store in use
    #[must_use]
    pub const fn preferences(&self) -> &P {
        &self.prefs
    }

    /// Number of fetches issued so far
    #[must_use]
    pub const fn fetches_started(&self) -> u64 {
        self.fetches_started
    }

    /// Whether a live poll timer is held
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(|timer| !timer.is_cancelled())
    }

    fn start_polling(&mut self) {
        if self.is_polling() {
            return;
        }
        self.poll = Some(PollTimer::start(
            self.options.poll_interval,
            self.events_tx.clone(),
        ));
    }

    fn stop_polling(&mut self) {
        if let Some(timer) = self.poll.take() {
            timer.cancel();
        }
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::StartFetch => {
                self.fetches_started += 1;
                let source = Arc::clone(&self.source);
                let metric = self.options.metric.clone();
                let events = self.events_tx.clone();
                let fetch = self.fetches_started;

                tokio::spawn(async move {
                    debug!("Fetch #{} started", fetch);
                    let event = match source.fetch_dashboard(&metric).await {
                        Ok(data) => Event::FetchSucceeded(Box::new(data)),
                        Err(e) => Event::FetchFailed(e.to_string()),
                    };
                    if events.send(event).await.is_err() {
                        warn!("Fetch #{} finished after the client stopped", fetch);
                    }
                });
            }
        }
    }
}

impl<S, P> Drop for DashboardClient<S, P> {
    fn drop(&mut self) {
        if let Some(timer) = self.poll.take() {
            timer.cancel();
        }
    }
}
