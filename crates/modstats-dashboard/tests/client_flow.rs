//! Dashboard client behaviour against a scripted data source

mod common;

use common::{ScriptedSource, data, record, roster};
use modstats_core::{Error, ModeratorId};
use modstats_dashboard::{
    ClientOptions, DashboardClient, Event, MemoryPreferences, Phase, PreferenceStore, Theme,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn options(initial_detail: Option<i64>) -> ClientOptions {
    ClientOptions {
        poll_interval: Duration::from_secs(3600),
        initial_detail: initial_detail.map(|id| ModeratorId::new(id).unwrap()),
        ..ClientOptions::default()
    }
}

fn client(
    source: &Arc<ScriptedSource>,
    initial_detail: Option<i64>,
) -> DashboardClient<ScriptedSource, MemoryPreferences> {
    DashboardClient::new(
        Arc::clone(source),
        MemoryPreferences::default(),
        options(initial_detail),
    )
}

#[tokio::test]
async fn test_start_loads_and_polls() {
    let source = Arc::new(ScriptedSource::new([Ok(data(1, roster()))]));
    let mut client = client(&source, None);

    client.start();
    assert_eq!(client.state().phase(), Phase::Loading);
    client.settle().await;

    let state = client.state();
    assert_eq!(state.phase(), Phase::Loaded);
    assert_eq!(state.snapshot_version(), Some(1));
    assert_eq!(state.moderators().len(), 3);
    assert!(state.charts().is_some());
    assert!(client.is_polling());
    assert_eq!(client.fetches_started(), 1);

    client.shutdown().await;
}

#[tokio::test]
async fn test_triggers_while_loading_start_one_fetch() {
    let source = Arc::new(ScriptedSource::gated([Ok(data(1, roster()))]));
    let mut client = client(&source, None);

    client.start();
    client.dispatch(Event::LoadRequested);
    client.dispatch(Event::PollTick);
    client.dispatch(Event::Retry);
    assert_eq!(client.fetches_started(), 1);

    source.release();
    client.settle().await;

    assert_eq!(client.state().phase(), Phase::Loaded);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_deep_link_opens_once_data_arrives() {
    let source = Arc::new(ScriptedSource::gated([Ok(data(1, roster()))]));
    let mut client = client(&source, Some(2));

    client.start();
    assert_eq!(client.state().phase(), Phase::Loading);
    assert_eq!(client.state().pending_detail(), ModeratorId::new(2).ok());
    assert!(client.state().detail_record().is_none());

    source.release();
    client.settle().await;

    let state = client.state();
    assert_eq!(state.phase(), Phase::DetailView(ModeratorId::new(2).unwrap()));
    assert_eq!(state.detail_record().map(|r| r.name.as_str()), Some("Bob"));
    assert!(state.charts().and_then(|c| c.detail.as_ref()).is_some());
}

#[tokio::test]
async fn test_unknown_deep_link_waits_for_later_data() {
    let source = Arc::new(ScriptedSource::new([Ok(data(1, roster()))]));
    let mut client = client(&source, Some(4));

    client.start();
    client.settle().await;
    assert_eq!(client.state().phase(), Phase::Loaded);
    assert_eq!(client.state().pending_detail(), ModeratorId::new(4).ok());

    let mut grown = roster();
    grown.push(record(4, "Dave", None, &[("mutes", 2)]));
    source.push(Ok(data(2, grown)));
    client.dispatch(Event::LoadRequested);
    client.settle().await;

    assert_eq!(
        client.state().phase(),
        Phase::DetailView(ModeratorId::new(4).unwrap())
    );
}

#[tokio::test]
async fn test_failed_refresh_keeps_stale_data() {
    let source = Arc::new(ScriptedSource::new([
        Ok(data(1, roster())),
        Err(Error::network("connection refused")),
    ]));
    let mut client = client(&source, None);

    client.start();
    client.settle().await;
    client.dispatch(Event::LoadRequested);
    client.settle().await;

    let state = client.state();
    assert_eq!(state.phase(), Phase::Error);
    assert!(state.is_stale());
    assert!(state.can_retry());
    assert!(state.charts().is_none());
    assert_eq!(state.snapshot_version(), Some(1));
    assert_eq!(state.moderators().len(), 3);
    assert!(state.last_error().unwrap().contains("connection refused"));

    source.push(Ok(data(2, roster())));
    client.dispatch(Event::Retry);
    client.settle().await;

    assert_eq!(client.state().phase(), Phase::Loaded);
    assert_eq!(client.state().snapshot_version(), Some(2));
    assert!(client.state().last_error().is_none());
}

#[tokio::test]
async fn test_first_load_failure_has_no_stale_data() {
    let source = Arc::new(ScriptedSource::new([Err(Error::network("timed out"))]));
    let mut client = client(&source, None);

    client.start();
    client.settle().await;

    assert_eq!(client.state().phase(), Phase::Error);
    assert!(!client.state().is_stale());
    assert!(client.state().can_retry());
}

#[tokio::test]
async fn test_theme_restored_on_every_load() {
    let source = Arc::new(ScriptedSource::new([Ok(data(1, roster())), Ok(data(2, roster()))]));
    let mut client = DashboardClient::new(
        Arc::clone(&source),
        MemoryPreferences::with_theme(Theme::Dark),
        options(None),
    );

    client.start();
    client.settle().await;
    assert_eq!(client.state().theme(), Theme::Dark);

    client.dispatch(Event::ToggleTheme);
    assert_eq!(client.state().theme(), Theme::Light);
    assert_eq!(client.preferences().theme(), Theme::Light);

    // Changed elsewhere, picked up on the next load.
    client.preferences().set_theme(Theme::Dark).unwrap();
    client.dispatch(Event::LoadRequested);
    client.settle().await;
    assert_eq!(client.state().theme(), Theme::Dark);
}

#[tokio::test]
async fn test_hiding_cancels_polling() {
    let source = Arc::new(ScriptedSource::new([Ok(data(1, roster())), Ok(data(2, roster()))]));
    let mut client = client(&source, None);

    client.start();
    client.settle().await;

    client.set_visible(false);
    assert!(!client.is_polling());
    assert_eq!(client.fetches_started(), 1);

    client.set_visible(true);
    assert!(client.is_polling());
    assert_eq!(client.fetches_started(), 2);
    client.settle().await;
    assert_eq!(client.state().snapshot_version(), Some(2));

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_poll_tick_refreshes() {
    let source = Arc::new(ScriptedSource::new([Ok(data(1, roster())), Ok(data(2, roster()))]));
    let mut client = DashboardClient::new(
        Arc::clone(&source),
        MemoryPreferences::default(),
        ClientOptions {
            poll_interval: Duration::from_secs(30),
            ..ClientOptions::default()
        },
    );

    client.start();
    client.settle().await;
    assert_eq!(client.state().snapshot_version(), Some(1));

    // Next event is the timer firing.
    assert!(client.process_next().await);
    assert_eq!(client.state().phase(), Phase::Loading);
    client.settle().await;

    assert_eq!(client.state().snapshot_version(), Some(2));
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_filters_survive_refresh() {
    let source = Arc::new(ScriptedSource::new([Ok(data(1, roster())), Ok(data(2, roster()))]));
    let mut client = client(&source, None);

    client.dispatch(Event::SearchChanged("mod".to_string()));
    client.start();
    client.settle().await;

    let names: Vec<&str> = client
        .state()
        .filtered_moderators()
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["Alice"]);

    client.dispatch(Event::LoadRequested);
    client.settle().await;
    assert_eq!(client.state().filtered_moderators().len(), 1);
}
