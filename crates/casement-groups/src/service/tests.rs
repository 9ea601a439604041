use std::collections::HashSet;
use std::sync::Arc;

use casement_common::{Event, GroupError, Rect, WindowIdentity, WindowState};
use tokio::sync::broadcast;

use super::*;
use crate::host::memory::MemoryHost;
use crate::host::HostEvent;
use crate::workspace::{LogicalWindow, SnapMember};

fn setup() -> (Arc<MemoryHost>, Arc<GroupService>) {
    let host = Arc::new(MemoryHost::default());
    let service = Arc::new(GroupService::new(host.clone(), ServiceSettings::default()));
    (host, service)
}

fn manifest(app: &str) -> LaunchSpec {
    LaunchSpec::Manifest {
        app_id: app.into(),
        manifest_url: format!("http://localhost/{app}.json"),
    }
}

async fn open(service: &GroupService, name: &str) -> WindowIdentity {
    service.launch_window(&manifest("app"), name).await.unwrap()
}

async fn open_many(service: &GroupService, names: &[&str]) -> Vec<WindowIdentity> {
    let mut windows = Vec::new();
    for name in names {
        windows.push(open(service, name).await);
    }
    windows
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn state(host: &MemoryHost, window: &WindowIdentity) -> WindowState {
    host.state_of(window).await.unwrap()
}

#[tokio::test]
async fn register_requires_a_host_window() {
    let (_host, service) = setup();
    let err = service
        .register_window(&WindowIdentity::new("ghost", "w"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "RuntimeUnavailableError");
    assert_eq!(service.registry().await.window_count(), 0);
}

#[tokio::test]
async fn launching_a_tabstrip_directly_is_rejected() {
    let (host, service) = setup();
    let spec = LaunchSpec::Tabstrip {
        url: "http://strip".into(),
    };
    assert!(matches!(
        service.launch_window(&spec, "s").await,
        Err(GroupError::InvalidLaunch(_))
    ));
    assert_eq!(host.window_count().await, 0);
}

#[tokio::test]
async fn launching_an_incomplete_spec_is_an_invalid_launch() {
    let (host, service) = setup();
    let err = service
        .launch_window(&manifest(""), "a")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidLaunchError");
    assert_eq!(host.window_count().await, 0);
}

#[tokio::test]
async fn minimize_cascades_to_snap_group_and_tabs() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b", "c"]).await;
    let view = service.create_tab_group(&w[1..], 0).await.unwrap();
    service.join_snap_group(&w[0], &view.tabstrip).await.unwrap();

    service.minimize(&w[0]).await.unwrap();
    for window in w.iter().chain([&view.tabstrip]) {
        assert_eq!(state(&host, window).await, WindowState::Minimized);
    }

    service.restore(&w[2]).await.unwrap();
    for window in w.iter().chain([&view.tabstrip]) {
        assert_eq!(state(&host, window).await, WindowState::Normal);
    }
}

#[tokio::test]
async fn restore_of_normal_group_makes_no_host_calls() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b"]).await;
    service.join_snap_group(&w[0], &w[1]).await.unwrap();
    service.restore(&w[0]).await.unwrap();
    assert_eq!(host.set_state_calls(), 0);
}

#[tokio::test]
async fn tab_group_minimize_and_restore() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b", "c"]).await;
    let view = service.create_tab_group(&w, 1).await.unwrap();
    let mut rx = service.events().subscribe();

    service.minimize_tab_group(&view.tabstrip).await.unwrap();
    assert_eq!(state(&host, &view.tabstrip).await, WindowState::Minimized);
    for tab in &w {
        assert_eq!(state(&host, tab).await, WindowState::Minimized);
    }
    assert!(drain(&mut rx).contains(&Event::TabGroupMinimized(view.tabstrip.clone())));

    service.restore_tab_group(&view.tabstrip).await.unwrap();
    for tab in &w {
        assert_eq!(state(&host, tab).await, WindowState::Normal);
    }
    assert!(drain(&mut rx).contains(&Event::TabGroupRestored(view.tabstrip.clone())));

    service.maximize_tab_group(&view.tabstrip).await.unwrap();
    assert_eq!(state(&host, &w[0]).await, WindowState::Maximized);
    assert!(drain(&mut rx).contains(&Event::TabGroupMaximized(view.tabstrip.clone())));
}

#[tokio::test]
async fn tab_group_ops_reject_non_tabstrips() {
    let (_host, service) = setup();
    let w = open(&service, "a").await;
    assert!(matches!(
        service.minimize_tab_group(&w).await,
        Err(GroupError::NotFound(_))
    ));
}

#[tokio::test]
async fn minimizing_one_tab_group_leaves_snapped_partner_alone() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b", "c", "d"]).await;
    let t1 = service.create_tab_group(&w[0..2], 0).await.unwrap();
    let t2 = service.create_tab_group(&w[2..4], 0).await.unwrap();
    service
        .join_snap_group(&t1.tabstrip, &t2.tabstrip)
        .await
        .unwrap();

    service.minimize_tab_group(&t1.tabstrip).await.unwrap();
    assert_eq!(state(&host, &w[0]).await, WindowState::Minimized);
    assert_eq!(state(&host, &w[1]).await, WindowState::Minimized);
    assert_eq!(state(&host, &t2.tabstrip).await, WindowState::Normal);
    assert_eq!(state(&host, &w[2]).await, WindowState::Normal);
    assert_eq!(state(&host, &w[3]).await, WindowState::Normal);

    // A window-level change does cross to the partner.
    service.maximize(&w[0]).await.unwrap();
    for window in w.iter().chain([&t1.tabstrip, &t2.tabstrip]) {
        assert_eq!(state(&host, window).await, WindowState::Maximized);
    }
}

#[tokio::test]
async fn user_transition_cascades_and_echoes_do_not() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b", "c"]).await;
    service.join_snap_group(&w[0], &w[1]).await.unwrap();
    service.join_snap_group(&w[1], &w[2]).await.unwrap();

    let mut host_rx = host.subscribe();
    host.simulate_state_change(&w[0], WindowState::Minimized)
        .await
        .unwrap();
    let user = host_rx.recv().await.unwrap();
    service.handle_host_event(user).await.unwrap();
    assert_eq!(state(&host, &w[1]).await, WindowState::Minimized);
    assert_eq!(state(&host, &w[2]).await, WindowState::Minimized);
    let calls = host.set_state_calls();
    assert_eq!(calls, 2);

    // Replaying the echoes of our own calls changes nothing.
    while let Ok(echo) = host_rx.try_recv() {
        service.handle_host_event(echo).await.unwrap();
    }
    assert_eq!(host.set_state_calls(), calls);
}

#[tokio::test]
async fn hidden_report_is_echo_of_minimize() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b"]).await;
    service.join_snap_group(&w[0], &w[1]).await.unwrap();
    service.minimize(&w[0]).await.unwrap();
    let calls = host.set_state_calls();

    service
        .handle_host_event(HostEvent::StateChanged {
            window: w[1].clone(),
            state: WindowState::Hidden,
        })
        .await
        .unwrap();
    assert_eq!(host.set_state_calls(), calls);
    assert_eq!(state(&host, &w[0]).await, WindowState::Minimized);
}

#[tokio::test]
async fn overtaken_report_is_dropped() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b"]).await;
    service.join_snap_group(&w[0], &w[1]).await.unwrap();
    service.minimize(&w[0]).await.unwrap();
    service.restore(&w[0]).await.unwrap();
    let calls = host.set_state_calls();
    let mut rx = service.events().subscribe();

    service
        .handle_host_event(HostEvent::StateChanged {
            window: w[1].clone(),
            state: WindowState::Minimized,
        })
        .await
        .unwrap();
    assert_eq!(host.set_state_calls(), calls);
    assert_eq!(state(&host, &w[0]).await, WindowState::Normal);
    assert_eq!(service.mirrored_state(&w[1]).await, Some(WindowState::Normal));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn host_listener_applies_user_changes() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b"]).await;
    service.join_snap_group(&w[0], &w[1]).await.unwrap();
    let listener = service.spawn_host_listener();

    host.simulate_state_change(&w[1], WindowState::Maximized)
        .await
        .unwrap();
    let converged = tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while host.state_of(&w[0]).await != Some(WindowState::Maximized) {
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(converged.is_ok());
    listener.abort();
}

/// Wait until the host stops receiving `set_state` calls.
async fn settled(host: &MemoryHost) -> bool {
    for _ in 0..40 {
        let before = host.set_state_calls();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        if host.set_state_calls() == before {
            return true;
        }
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn restore_wins_over_late_minimize_echoes() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b", "c"]).await;
    service.join_snap_group(&w[0], &w[1]).await.unwrap();
    service.join_snap_group(&w[0], &w[2]).await.unwrap();
    let listener = service.spawn_host_listener();

    service.minimize(&w[0]).await.unwrap();
    service.restore(&w[0]).await.unwrap();

    assert!(settled(&host).await, "group kept flipping");
    let calls = host.set_state_calls();
    for window in &w {
        assert_eq!(state(&host, window).await, WindowState::Normal);
        assert_eq!(service.mirrored_state(window).await, Some(WindowState::Normal));
    }
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(host.set_state_calls(), calls);
    listener.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_of_many_requests_wins() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b", "c", "d"]).await;
    for other in &w[1..] {
        service.join_snap_group(&w[0], other).await.unwrap();
    }
    let listener = service.spawn_host_listener();

    for round in 0..20 {
        let window = &w[round % w.len()];
        service.minimize(window).await.unwrap();
        service.maximize(window).await.unwrap();
        service.restore(window).await.unwrap();
    }
    service.minimize(&w[3]).await.unwrap();

    assert!(settled(&host).await, "group kept flipping");
    for window in &w {
        assert_eq!(state(&host, window).await, WindowState::Minimized);
    }
    listener.abort();
}

#[tokio::test]
async fn failed_member_leaves_group_unchanged() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b", "c"]).await;
    service.join_snap_group(&w[0], &w[1]).await.unwrap();
    service.join_snap_group(&w[0], &w[2]).await.unwrap();
    let mut rx = service.events().subscribe();

    host.fail_window(&w[1], true).await;
    let err = service.minimize(&w[0]).await.unwrap_err();
    assert_eq!(err.kind(), "RuntimeUnavailableError");
    for window in &w {
        assert_eq!(state(&host, window).await, WindowState::Normal);
        assert_eq!(service.mirrored_state(window).await, Some(WindowState::Normal));
    }
    assert!(!drain(&mut rx)
        .iter()
        .any(|e| matches!(e, Event::StateChanged { .. })));

    host.fail_window(&w[1], false).await;
    service.minimize(&w[0]).await.unwrap();
    for window in &w {
        assert_eq!(state(&host, window).await, WindowState::Minimized);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_joins_and_leaves_keep_a_valid_partition() {
    let (_host, service) = setup();
    let names: Vec<String> = (0..12).map(|i| format!("w{i}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let w = open_many(&service, &names).await;
    for pair in w.chunks(2) {
        service.join_snap_group(&pair[0], &pair[1]).await.unwrap();
    }

    let mut tasks = Vec::new();
    for round in 0..4 {
        for i in 0..w.len() {
            let service = Arc::clone(&service);
            let window = w[i].clone();
            let target = w[(i + 1 + round) % w.len()].clone();
            tasks.push(tokio::spawn(async move {
                if (i + round) % 3 == 0 {
                    service.leave_snap_group(&window).await.map(|_| ())
                } else {
                    service.join_snap_group(&window, &target).await.map(|_| ())
                }
            }));
        }
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let registry = service.registry().await;
    let mut seen = HashSet::new();
    for group in registry.snap_groups() {
        assert!(!group.is_empty());
        for member in group.members() {
            assert!(seen.insert(member.clone()), "{member} in two groups");
            assert_eq!(registry.snap_group_id_of(member).unwrap(), group.id());
        }
    }
    assert_eq!(seen.len(), w.len());
}

#[tokio::test]
async fn closing_a_tab_dissolves_group_and_closes_tabstrip() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b", "c"]).await;
    let view = service.create_tab_group(&w[0..2], 0).await.unwrap();
    service.join_snap_group(&w[2], &view.tabstrip).await.unwrap();

    host.close(&w[0]).await.unwrap();
    service
        .handle_host_event(HostEvent::Closed(w[0].clone()))
        .await
        .unwrap();

    assert!(!host.is_open(&view.tabstrip).await);
    let membership = service.group_of(&w[1]).await.unwrap();
    assert!(membership.tab_group.is_none());
    assert_eq!(membership.snap_group.members, vec![w[2].clone(), w[1].clone()]);
    assert!(!service.registry().await.contains(&w[0]));

    // The host's close notice for the tabstrip is a no-op.
    service
        .handle_host_event(HostEvent::Closed(view.tabstrip.clone()))
        .await
        .unwrap();
}

#[tokio::test]
async fn remove_tab_closes_dissolved_tabstrip() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b"]).await;
    let view = service.create_tab_group(&w, 0).await.unwrap();
    service.remove_tab(view.id, &w[0]).await.unwrap();
    assert!(!host.is_open(&view.tabstrip).await);
    assert!(service.registry().await.tab_groups().next().is_none());
}

#[tokio::test]
async fn invalid_tab_group_launches_nothing() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b"]).await;
    let before = host.window_count().await;
    assert!(matches!(
        service.create_tab_group(&[w[0].clone(), w[0].clone()], 0).await,
        Err(GroupError::InvalidOrder(_))
    ));
    assert!(matches!(
        service.create_tab_group(&w, 5).await,
        Err(GroupError::InvalidOrder(_))
    ));
    service.create_tab_group(&w, 0).await.unwrap();
    let third = open(&service, "c").await;
    assert_eq!(
        service
            .create_tab_group(&[w[0].clone(), third], 0)
            .await
            .unwrap_err(),
        GroupError::AlreadyTabbed(w[0].clone())
    );
    // Only the one successful tabstrip and "c" were added.
    assert_eq!(host.window_count().await, before + 2);
}

#[tokio::test]
async fn tabstrip_is_placed_above_active_tab() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b"]).await;
    host.set_bounds(&w[1], Rect::new(100.0, 200.0, 640.0, 480.0))
        .await
        .unwrap();
    let view = service.create_tab_group(&w, 1).await.unwrap();
    assert_eq!(
        host.bounds_of(&view.tabstrip).await,
        Some(Rect::new(100.0, 168.0, 640.0, 32.0))
    );
}

#[tokio::test]
async fn reorder_publishes_notice_only() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b", "c"]).await;
    let view = service.create_tab_group(&w, 0).await.unwrap();
    let mut rx = service.events().subscribe();
    let order = vec![w[2].clone(), w[0].clone(), w[1].clone()];

    service.reorder_tabs(&order).await.unwrap();
    assert_eq!(
        drain(&mut rx),
        vec![Event::TabsReordered {
            tabstrip: view.tabstrip.clone(),
            order: order.clone(),
        }]
    );
    assert_eq!(host.set_state_calls(), 0);

    let bad = vec![w[2].clone(), w[0].clone()];
    assert!(matches!(
        service.reorder_tabs(&bad).await,
        Err(GroupError::InvalidOrder(_))
    ));
    let membership = service.group_of(&w[0]).await.unwrap();
    assert_eq!(membership.tab_group.unwrap().tabs, order);
}

#[tokio::test]
async fn drag_resets_when_dragging_window_closes() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b"]).await;
    service.start_drag(&w[0]).await.unwrap();
    assert_eq!(
        service.start_drag(&w[1]).await.unwrap_err(),
        GroupError::DragInProgress(w[0].clone())
    );

    host.close(&w[0]).await.unwrap();
    service
        .handle_host_event(HostEvent::Closed(w[0].clone()))
        .await
        .unwrap();
    service.start_drag(&w[1]).await.unwrap();
    assert_eq!(service.drag_state().await, DragState::Dragging(w[1].clone()));
    assert_eq!(service.end_drag().await, Some(w[1].clone()));
    assert_eq!(service.end_drag().await, None);
}

#[tokio::test]
async fn drag_of_unknown_window_is_not_found() {
    let (_host, service) = setup();
    assert!(matches!(
        service.start_drag(&WindowIdentity::new("x", "y")).await,
        Err(GroupError::NotFound(_))
    ));
}

#[tokio::test]
async fn host_failure_is_runtime_unavailable() {
    let (host, service) = setup();
    let w = open_many(&service, &["a", "b"]).await;
    service.join_snap_group(&w[0], &w[1]).await.unwrap();
    host.set_online(false);
    let err = service.minimize(&w[0]).await.unwrap_err();
    assert_eq!(err.kind(), "RuntimeUnavailableError");

    // The queue was released: the next operation proceeds.
    host.set_online(true);
    service.minimize(&w[0]).await.unwrap();
    assert_eq!(state(&host, &w[1]).await, WindowState::Minimized);
}

#[tokio::test]
async fn concurrent_joins_and_leaves_lose_nothing() {
    let (_host, service) = setup();
    let names: Vec<String> = (0..16).map(|i| format!("w{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let w = open_many(&service, &refs).await;

    let mut tasks = Vec::new();
    for i in 1..w.len() {
        let service = service.clone();
        let (a, b) = (w[i - 1].clone(), w[i].clone());
        tasks.push(tokio::spawn(async move {
            service.join_snap_group(&a, &b).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    {
        let registry = service.registry().await;
        assert_eq!(registry.snap_groups().count(), 1);
        let members: HashSet<_> = registry.snap_groups().flat_map(|g| g.members()).collect();
        assert_eq!(members.len(), w.len());
    }

    let mut tasks = Vec::new();
    for window in w.iter().skip(1).step_by(2).cloned() {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            service.leave_snap_group(&window).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    let registry = service.registry().await;
    assert_eq!(registry.snap_groups().count(), 1 + w.len() / 2);
    let mut seen = HashSet::new();
    for group in registry.snap_groups() {
        for member in group.members() {
            assert!(seen.insert(member.clone()), "{member} in two groups");
        }
    }
    assert_eq!(seen.len(), w.len());
}

/// c snapped with tab group [b, a] (active a); d alone and maximized.
async fn arrange(host: &MemoryHost, service: &GroupService) {
    let a = open(service, "a").await;
    let b = open(service, "b").await;
    let c = open(service, "c").await;
    let d = service.launch_window(&manifest("other"), "d").await.unwrap();
    host.set_bounds(&c, Rect::new(10.0, 10.0, 300.0, 200.0))
        .await
        .unwrap();
    let view = service.create_tab_group(&[b, a], 1).await.unwrap();
    service.join_snap_group(&c, &view.tabstrip).await.unwrap();
    service.maximize(&d).await.unwrap();
}

fn key(app: &str, name: &str) -> LogicalWindow {
    LogicalWindow {
        app_id: app.into(),
        window_name: name.into(),
    }
}

#[tokio::test]
async fn capture_then_restore_is_equivalent() {
    let (host, service) = setup();
    arrange(&host, &service).await;
    let captured = service.capture_workspace().await.unwrap();
    assert_eq!(
        captured.snap_groups,
        vec![
            vec![
                SnapMember::Window {
                    window: key("app", "c")
                },
                SnapMember::TabGroup { index: 0 },
            ],
            vec![SnapMember::Window {
                window: key("other", "d")
            }],
        ]
    );

    let (fresh_host, fresh) = setup();
    let report = fresh.restore_workspace(&captured).await.unwrap();
    assert_eq!(report.windows.len(), 4);
    assert_eq!(report.tabstrips.len(), 1);
    let d = report.window(&key("other", "d")).unwrap();
    assert_eq!(state(&fresh_host, d).await, WindowState::Maximized);
    let a = report.window(&key("app", "a")).unwrap();
    let membership = fresh.group_of(a).await.unwrap();
    assert_eq!(membership.tab_group.unwrap().active, a.clone());

    let recaptured = fresh.capture_workspace().await.unwrap();
    assert_eq!(recaptured, captured);
}

#[tokio::test]
async fn restoring_twice_changes_nothing() {
    let (host, service) = setup();
    arrange(&host, &service).await;
    let captured = service.capture_workspace().await.unwrap();

    let (fresh_host, fresh) = setup();
    let first = fresh.restore_workspace(&captured).await.unwrap();
    let calls = fresh_host.set_state_calls();
    let windows = fresh_host.window_count().await;

    let second = fresh.restore_workspace(&captured).await.unwrap();
    assert_eq!(second.state_changes, 0);
    assert_eq!(fresh_host.set_state_calls(), calls);
    assert_eq!(fresh_host.window_count().await, windows);
    assert_eq!(second.windows, first.windows);
    assert_eq!(second.tabstrips, first.tabstrips);
    assert_eq!(fresh.capture_workspace().await.unwrap(), captured);
}

#[tokio::test]
async fn invalid_workspace_launches_nothing() {
    let (host, service) = setup();
    arrange(&host, &service).await;
    let mut captured = service.capture_workspace().await.unwrap();
    captured.tab_groups[0].active_index = 9;

    let (fresh_host, fresh) = setup();
    assert!(matches!(
        fresh.restore_workspace(&captured).await,
        Err(GroupError::WorkspaceParse(_))
    ));
    assert_eq!(fresh_host.window_count().await, 0);
}
