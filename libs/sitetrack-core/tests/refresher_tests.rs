#![cfg(feature = "test-utils")]

use std::sync::Arc;
use std::time::Duration;

use sitetrack_core::test_utils::{create_mock_snapshot, create_mock_task, MockSource};
use sitetrack_core::{
    Dashboard, PollingRefresher, RefreshEvent, RefreshEventKind, RefreshPhase, Role, TaskStatus,
    Viewer,
};
use tokio::sync::broadcast;
use tokio::time::timeout;

fn supervisor() -> Viewer {
    Viewer::new(Role::SiteSupervisor).with_user_id("u-sup")
}

async fn next_completed_cycle(events: &mut broadcast::Receiver<RefreshEvent>) -> u64 {
    loop {
        let event = events.recv().await.unwrap();
        if let RefreshEventKind::Completed { cycle, .. } = event.kind {
            return cycle;
        }
    }
}

#[tokio::test]
async fn test_failed_cycle_keeps_previous_dashboard() {
    let source = Arc::new(MockSource::new(create_mock_snapshot()));
    let refresher =
        PollingRefresher::new(Arc::clone(&source), supervisor(), Duration::from_secs(60)).unwrap();

    let first = refresher.refresh_once().await.unwrap();

    source.set_failing(true);
    assert!(refresher.refresh_once().await.is_err());

    let status = refresher.status().await;
    assert_eq!(status.phase, RefreshPhase::Idle);
    assert_eq!(status.cycles, 2);
    assert_eq!(status.failures, 1);
    assert!(status
        .last_error
        .as_deref()
        .is_some_and(|e| e.contains("503")));
    let kept = status.dashboard.expect("previous dashboard kept");
    assert!(Arc::ptr_eq(&kept, &first));
}

#[tokio::test]
async fn test_success_clears_last_error() {
    let source = Arc::new(MockSource::new(create_mock_snapshot()));
    source.set_failing(true);
    let refresher =
        PollingRefresher::new(Arc::clone(&source), supervisor(), Duration::from_secs(60)).unwrap();

    assert!(refresher.refresh_once().await.is_err());
    assert!(refresher.dashboard().await.is_none());

    source.set_failing(false);
    refresher.refresh_once().await.unwrap();
    let status = refresher.status().await;
    assert!(status.last_error.is_none());
    assert!(status.dashboard.is_some());
}

#[tokio::test]
async fn test_refresh_picks_up_new_data() {
    let source = Arc::new(MockSource::new(create_mock_snapshot()));
    let refresher =
        PollingRefresher::new(Arc::clone(&source), supervisor(), Duration::from_secs(60)).unwrap();

    refresher.refresh_once().await.unwrap();

    let mut snapshot = create_mock_snapshot();
    snapshot.tasks.push(create_mock_task(
        "t-new",
        TaskStatus::Pending,
        Some("p-tower"),
        Some("u-sup"),
    ));
    source.replace_snapshot(snapshot).await;

    let dashboard = refresher.refresh_once().await.unwrap();
    match dashboard.as_ref() {
        Dashboard::SiteSupervisor(d) => {
            assert_eq!(d.assigned_tasks.len(), 4);
            assert_eq!(d.breakdown.pending, 2);
        }
        other => panic!("Expected supervisor dashboard, got {other:?}"),
    }
}

#[tokio::test]
async fn test_spawned_loop_runs_immediately_and_stops() {
    let source = Arc::new(MockSource::new(create_mock_snapshot()));
    let refresher = Arc::new(
        PollingRefresher::new(source, Viewer::new(Role::Admin), Duration::from_secs(3600)).unwrap(),
    );
    let mut events = refresher.subscribe();

    let handle = refresher.spawn();

    let completed = timeout(Duration::from_secs(5), next_completed_cycle(&mut events))
        .await
        .expect("first cycle completes without waiting for the interval");
    assert_eq!(completed, 1);

    handle.stop().await;
    let status = refresher.status().await;
    assert_eq!(status.phase, RefreshPhase::Idle);
    assert!(status.dashboard.is_some());
}

#[tokio::test]
async fn test_request_refresh_runs_extra_cycle() {
    let source = Arc::new(MockSource::new(create_mock_snapshot()));
    let refresher = Arc::new(
        PollingRefresher::new(source, Viewer::new(Role::Admin), Duration::from_secs(3600)).unwrap(),
    );
    let mut events = refresher.subscribe();
    let handle = refresher.spawn();

    let first = timeout(Duration::from_secs(5), next_completed_cycle(&mut events))
        .await
        .unwrap();
    refresher.request_refresh();
    let second = timeout(Duration::from_secs(5), next_completed_cycle(&mut events))
        .await
        .expect("manual refresh does not wait for the hour-long interval");

    assert_eq!(first, 1);
    assert_eq!(second, 2);
    handle.stop().await;
}

#[tokio::test]
async fn test_stop_discards_in_flight_fetch() {
    let source = Arc::new(
        MockSource::new(create_mock_snapshot()).with_delay(Duration::from_secs(30)),
    );
    let refresher = Arc::new(
        PollingRefresher::new(
            Arc::clone(&source),
            Viewer::new(Role::Admin),
            Duration::from_secs(3600),
        )
        .unwrap(),
    );
    let handle = refresher.spawn();

    // Wait until the first cycle is fetching.
    timeout(Duration::from_secs(5), async {
        while refresher.status().await.phase != RefreshPhase::Fetching {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    timeout(Duration::from_secs(5), handle.stop())
        .await
        .expect("stop does not wait for the slow fetch");

    let status = refresher.status().await;
    assert_eq!(status.phase, RefreshPhase::Idle);
    assert!(status.dashboard.is_none());
    assert!(status.last_success.is_none());
    assert!(status.last_error.is_none());
}
