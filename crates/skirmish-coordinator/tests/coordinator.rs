//! Scenario tests for the synchronous coordinator core.

use serde_json::json;
use skirmish_coordinator::{
    Coordinator, MatchConfig, MatchError, MatchKind, MatchPhase, MemoryStore, ReadyOutcome,
};
use skirmish_protocol::{MatchId, MatchmakingReply, Payload, PlayerId, Presence, ServerEvent};
use skirmish_transport::ConnectionId;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

type Inbox = mpsc::UnboundedReceiver<ServerEvent>;

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

fn cid(id: u64) -> ConnectionId {
    ConnectionId::new(id * 100)
}

fn mid(a: u64, b: u64) -> MatchId {
    MatchId::for_pair(pid(a), pid(b))
}

fn coordinator() -> (Coordinator<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    (Coordinator::new(store.clone(), MatchConfig::default()), store)
}

fn connect(core: &mut Coordinator<MemoryStore>, id: u64) -> Inbox {
    let (tx, rx) = mpsc::unbounded_channel();
    core.connect(pid(id), cid(id), tx).unwrap();
    rx
}

fn drain(inbox: &mut Inbox) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = inbox.try_recv() {
        events.push(event);
    }
    events
}

fn payload(value: serde_json::Value) -> Payload {
    serde_json::from_value(value).unwrap()
}

/// Two connected players in an active competitive match `1-2`.
fn active_match() -> (Coordinator<MemoryStore>, MemoryStore, Inbox, Inbox, u64) {
    let (mut core, store) = coordinator();
    let mut a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);
    core.player_ready(pid(1), &mid(1, 2)).unwrap();
    let outcome = core.player_ready(pid(2), &mid(1, 2)).unwrap();
    let ReadyOutcome::Started { countdown: Some(epoch) } = outcome else {
        panic!("expected a started competitive match, got {outcome:?}");
    };
    drain(&mut a);
    drain(&mut b);
    (core, store, a, b, epoch)
}

// =========================================================================
// Registry
// =========================================================================

#[test]
fn test_connect_duplicate_identity_is_rejected() {
    let (mut core, _) = coordinator();
    let _a = connect(&mut core, 1);
    let (tx, _rx) = mpsc::unbounded_channel();

    assert!(core.connect(pid(1), ConnectionId::new(999), tx).is_err());
    assert_eq!(core.sessions().resolve(cid(1)), Some(pid(1)));
}

#[test]
fn test_disconnect_is_idempotent() {
    let (mut core, _) = coordinator();
    let _a = connect(&mut core, 1);

    assert_eq!(core.disconnect(cid(1)), Some(pid(1)));
    assert_eq!(core.disconnect(cid(1)), None);
    assert!(core.sessions().is_empty());
}

// =========================================================================
// player_ready
// =========================================================================

#[test]
fn test_player_ready_first_waits_second_starts() {
    let (mut core, _) = coordinator();
    let mut a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);

    let first = core.player_ready(pid(1), &mid(1, 2)).unwrap();
    assert_eq!(first, ReadyOutcome::Waiting);
    assert_eq!(
        core.matches().get(&mid(1, 2)).unwrap().phase,
        MatchPhase::AwaitingReady
    );
    assert!(drain(&mut a).is_empty());

    let second = core.player_ready(pid(2), &mid(1, 2)).unwrap();
    assert!(matches!(second, ReadyOutcome::Started { countdown: Some(_) }));
    assert_eq!(drain(&mut a), vec![ServerEvent::MatchStart {}]);
    assert_eq!(drain(&mut b), vec![ServerEvent::MatchStart {}]);

    let record = core.matches().get(&mid(1, 2)).unwrap();
    assert_eq!(record.phase, MatchPhase::Active);
    assert_eq!(record.kind, MatchKind::Competitive { time_remaining: 600 });
    assert_eq!(core.matches().playing_count(), 2);
}

#[test]
fn test_player_ready_twice_is_already_playing() {
    let (mut core, _) = coordinator();
    let _a = connect(&mut core, 1);
    core.player_ready(pid(1), &mid(1, 2)).unwrap();

    let result = core.player_ready(pid(1), &mid(1, 2));

    assert!(matches!(result, Err(MatchError::AlreadyPlaying(p)) if p == pid(1)));
    assert_eq!(core.matches().get(&mid(1, 2)).unwrap().participants().len(), 1);
}

#[test]
fn test_player_ready_foreign_match_id_is_rejected() {
    let (mut core, _) = coordinator();
    let _c = connect(&mut core, 3);

    let result = core.player_ready(pid(3), &mid(1, 2));

    assert!(matches!(result, Err(MatchError::NotParticipant(p, _)) if p == pid(3)));
    assert!(core.matches().is_empty());
}

#[test]
fn test_player_ready_without_session_is_rejected() {
    let (mut core, _) = coordinator();

    let result = core.player_ready(pid(1), &mid(1, 2));

    assert!(matches!(result, Err(MatchError::PlayerNotFound(_))));
    assert!(!core.matches().is_playing(pid(1)));
}

// =========================================================================
// Countdown
// =========================================================================

#[test]
fn test_countdown_tick_emits_timer_to_both() {
    let (mut core, _, mut a, mut b, epoch) = active_match();

    assert!(core.countdown_tick(&mid(1, 2), epoch, 1));

    assert_eq!(drain(&mut a), vec![ServerEvent::MatchTimer { time_left: 599 }]);
    assert_eq!(drain(&mut b), vec![ServerEvent::MatchTimer { time_left: 599 }]);
}

#[test]
fn test_countdown_tick_counts_every_elapsed_period() {
    let (mut core, _, mut a, _b, epoch) = active_match();

    assert!(core.countdown_tick(&mid(1, 2), epoch, 3));

    assert_eq!(drain(&mut a), vec![ServerEvent::MatchTimer { time_left: 597 }]);
}

#[test]
fn test_countdown_tick_stale_epoch_stops() {
    let (mut core, _, mut a, _b, epoch) = active_match();

    assert!(!core.countdown_tick(&mid(1, 2), epoch + 1, 1));
    assert!(drain(&mut a).is_empty());
}

#[test]
fn test_countdown_tick_reaching_zero_ends_as_draw() {
    let store = MemoryStore::new();
    let config = MatchConfig {
        match_duration: std::time::Duration::from_secs(2),
        ..MatchConfig::default()
    };
    let mut core = Coordinator::new(store.clone(), config);
    let mut a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);
    store.add_gem(pid(1), true);
    store.add_gem(pid(2), true);
    core.player_ready(pid(1), &mid(1, 2)).unwrap();
    let Ok(ReadyOutcome::Started { countdown: Some(epoch) }) = core.player_ready(pid(2), &mid(1, 2))
    else {
        panic!("match should start");
    };
    drain(&mut a);
    drain(&mut b);

    assert!(core.countdown_tick(&mid(1, 2), epoch, 1));
    assert!(!core.countdown_tick(&mid(1, 2), epoch, 1));

    assert_eq!(
        drain(&mut a),
        vec![
            ServerEvent::MatchTimer { time_left: 1 },
            ServerEvent::MatchTimer { time_left: 0 },
            ServerEvent::MatchEnd { winner_id: None },
        ]
    );
    assert_eq!(drain(&mut b).last(), Some(&ServerEvent::MatchEnd { winner_id: None }));
    assert!(core.matches().is_empty());
    assert!(store.gems_of(pid(1)).iter().all(|g| !g.staked));
    assert_eq!(store.gems_of(pid(2)).len(), 1);
}

#[test]
fn test_countdown_does_not_drive_recreated_match() {
    let (mut core, _, mut a, _b, epoch) = active_match();
    core.end_match(&mid(1, 2), None).unwrap();
    core.player_ready(pid(1), &mid(1, 2)).unwrap();
    core.player_ready(pid(2), &mid(1, 2)).unwrap();
    drain(&mut a);

    assert!(!core.countdown_tick(&mid(1, 2), epoch, 1));
    assert!(drain(&mut a).is_empty());
    assert_eq!(
        core.matches().get(&mid(1, 2)).unwrap().time_remaining(),
        Some(600)
    );
}

// =========================================================================
// Ending matches
// =========================================================================

#[test]
fn test_altar_destroyed_moves_stakes_and_ends_match() {
    let (mut core, store, mut a, mut b, _) = active_match();
    store.add_gem(pid(1), true);
    store.add_gem(pid(2), true);
    store.add_gem(pid(2), false);

    core.win_condition_reached(&mid(1, 2), pid(1)).unwrap();

    assert_eq!(drain(&mut a), vec![ServerEvent::MatchEnd { winner_id: Some(pid(1)) }]);
    assert_eq!(drain(&mut b), vec![ServerEvent::MatchEnd { winner_id: Some(pid(1)) }]);
    assert_eq!(store.gems_of(pid(1)).len(), 2);
    assert!(store.gems_of(pid(1)).iter().all(|g| !g.staked));
    assert_eq!(store.gems_of(pid(2)).len(), 1);
    assert!(core.matches().is_empty());
    assert_eq!(core.matches().playing_count(), 0);
}

#[test]
fn test_win_condition_rejections() {
    let (mut core, _, _a, _b, _) = active_match();
    let _c = connect(&mut core, 3);

    assert!(matches!(
        core.win_condition_reached(&mid(7, 8), pid(1)),
        Err(MatchError::NotFound(_))
    ));
    assert!(matches!(
        core.win_condition_reached(&mid(1, 2), pid(3)),
        Err(MatchError::NotParticipant(..))
    ));
    assert!(core.matches().get(&mid(1, 2)).is_some());
}

#[test]
fn test_win_condition_while_awaiting_ready_is_ignored() {
    let (mut core, _) = coordinator();
    let _a = connect(&mut core, 1);
    core.player_ready(pid(1), &mid(1, 2)).unwrap();

    assert!(matches!(
        core.win_condition_reached(&mid(1, 2), pid(1)),
        Err(MatchError::InvalidState(_))
    ));
    assert!(core.matches().is_playing(pid(1)));
}

#[test]
fn test_end_match_twice_is_noop() {
    let (mut core, store, mut a, _b, _) = active_match();

    core.end_match(&mid(1, 2), Some(pid(2))).unwrap();
    core.end_match(&mid(1, 2), Some(pid(2))).unwrap();

    assert_eq!(drain(&mut a).len(), 1);
    assert_eq!(store.settlements().len(), 1);
}

#[test]
fn test_settlement_failure_keeps_match() {
    let (mut core, store, mut a, _b, _) = active_match();
    store.set_fail_settlement(true);

    assert!(matches!(
        core.end_match(&mid(1, 2), Some(pid(1))),
        Err(MatchError::Store(_))
    ));
    assert!(drain(&mut a).is_empty());
    assert!(core.matches().is_playing(pid(1)));

    store.set_fail_settlement(false);
    core.end_match(&mid(1, 2), Some(pid(1))).unwrap();
    assert_eq!(drain(&mut a), vec![ServerEvent::MatchEnd { winner_id: Some(pid(1)) }]);
}

#[test]
fn test_disconnect_forfeits_to_opponent_and_clears_queue() {
    let (mut core, store, _a, mut b, _) = active_match();
    let mut queue = store.clone();
    skirmish_coordinator::QueueStore::enqueue(&mut queue, pid(1)).unwrap();

    assert_eq!(core.disconnect(cid(1)), Some(pid(1)));

    assert_eq!(drain(&mut b), vec![ServerEvent::MatchEnd { winner_id: Some(pid(2)) }]);
    assert!(store.queued().is_empty());
    assert!(core.matches().is_empty());
    assert!(!core.sessions().is_connected(pid(1)));
    assert_eq!(store.settlements()[0].winner, Some(pid(2)));
}

#[test]
fn test_disconnect_while_waiting_alone_is_draw() {
    let (mut core, store) = coordinator();
    let _a = connect(&mut core, 1);
    store.add_gem(pid(1), true);
    core.player_ready(pid(1), &mid(1, 2)).unwrap();

    core.disconnect(cid(1));

    assert!(core.matches().is_empty());
    assert_eq!(store.settlements()[0].winner, None);
    assert!(!store.gems_of(pid(1))[0].staked);
}

#[test]
fn test_player_leaving_forfeits_but_keeps_session() {
    let (mut core, _, mut a, mut b, _) = active_match();

    core.player_leaving(pid(1)).unwrap();

    assert_eq!(drain(&mut a), vec![ServerEvent::MatchEnd { winner_id: Some(pid(2)) }]);
    assert_eq!(drain(&mut b), vec![ServerEvent::MatchEnd { winner_id: Some(pid(2)) }]);
    assert!(core.sessions().is_connected(pid(1)));
    assert!(matches!(
        core.player_leaving(pid(1)),
        Err(MatchError::InvalidState(_))
    ));
}

// =========================================================================
// Friend visits
// =========================================================================

fn visit(target: u64, request: &str) -> Payload {
    payload(json!({"target": target, "request": request}))
}

#[test]
fn test_island_visit_accept_starts_visit() {
    let (mut core, _) = coordinator();
    let _a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);

    core.island_visit(pid(1), visit(2, "accept")).unwrap();

    let record = core.matches().get(&mid(1, 2)).unwrap();
    assert_eq!(record.kind, MatchKind::FriendVisit);
    assert!(record.phase.is_active());
    assert_eq!(
        drain(&mut b),
        vec![ServerEvent::IslandVisit(payload(
            json!({"target": 2, "request": "accept", "sender": 1})
        ))]
    );
}

#[test]
fn test_island_visit_leave_notifies_only_other_party() {
    let (mut core, store) = coordinator();
    let mut a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);
    core.island_visit(pid(1), visit(2, "accept")).unwrap();
    drain(&mut b);

    core.island_visit(pid(2), visit(1, "leave")).unwrap();

    assert_eq!(
        drain(&mut a),
        vec![ServerEvent::IslandVisit(payload(json!({"request": "leave"})))]
    );
    assert!(drain(&mut b).is_empty());
    assert!(core.matches().is_empty());
    assert_eq!(core.matches().playing_count(), 0);
    assert!(store.settlements().is_empty());
}

#[test]
fn test_island_visit_kick_uses_kick_literal() {
    let (mut core, _) = coordinator();
    let _a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);
    core.island_visit(pid(2), visit(1, "accept")).unwrap();

    core.island_visit(pid(1), visit(2, "kick")).unwrap();

    assert_eq!(
        drain(&mut b),
        vec![ServerEvent::IslandVisit(payload(json!({"request": "kick"})))]
    );
}

#[test]
fn test_island_visit_accept_while_playing_is_rejected() {
    let (mut core, _, _a, _b, _) = active_match();
    let _c = connect(&mut core, 3);

    let result = core.island_visit(pid(3), visit(1, "accept"));

    assert!(matches!(result, Err(MatchError::AlreadyPlaying(p)) if p == pid(1)));
    assert!(!core.matches().is_playing(pid(3)));
}

#[test]
fn test_island_visit_leave_cannot_end_competitive_match() {
    let (mut core, _, _a, _b, _) = active_match();

    let result = core.island_visit(pid(1), visit(2, "leave"));

    assert!(matches!(result, Err(MatchError::InvalidState(_))));
    assert!(core.matches().get(&mid(1, 2)).is_some());
}

#[test]
fn test_island_visit_other_request_is_relayed() {
    let (mut core, _) = coordinator();
    let _a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);

    core.island_visit(pid(1), visit(2, "invite")).unwrap();

    assert_eq!(
        drain(&mut b),
        vec![ServerEvent::IslandVisit(payload(
            json!({"target": 2, "request": "invite", "sender": 1})
        ))]
    );
    assert!(core.matches().is_empty());
}

#[test]
fn test_island_visit_to_offline_target_is_dropped() {
    let (mut core, _) = coordinator();
    let _a = connect(&mut core, 1);

    let result = core.island_visit(pid(1), visit(2, "invite"));

    assert!(matches!(result, Err(MatchError::PlayerNotFound(p)) if p == pid(2)));
}

#[test]
fn test_disconnect_during_visit_tells_other_to_leave() {
    let (mut core, store) = coordinator();
    let mut a = connect(&mut core, 1);
    let _b = connect(&mut core, 2);
    core.island_visit(pid(1), visit(2, "accept")).unwrap();

    core.disconnect(cid(2));

    assert_eq!(
        drain(&mut a),
        vec![ServerEvent::IslandVisit(payload(json!({"request": "leave"})))]
    );
    assert!(core.matches().is_empty());
    assert!(store.settlements().is_empty());
}

// =========================================================================
// Forwarding and presence
// =========================================================================

#[test]
fn test_forward_attaches_sender() {
    let (core, _, _a, mut b, _) = active_match();

    core.forward(pid(1), pid(2), payload(json!({"target": 2, "move": "e4"})))
        .unwrap();

    assert_eq!(
        drain(&mut b),
        vec![ServerEvent::Forwarded(payload(
            json!({"target": 2, "move": "e4", "sender": 1})
        ))]
    );
}

#[test]
fn test_forward_to_idle_target_is_dropped() {
    let (mut core, _) = coordinator();
    let _a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);

    let result = core.forward(pid(1), pid(2), payload(json!({"target": 2})));

    assert!(matches!(result, Err(MatchError::InvalidState(_))));
    assert!(drain(&mut b).is_empty());
}

#[test]
fn test_presence_offline_online_in_match() {
    let (mut core, _) = coordinator();
    let mut asker = connect(&mut core, 9);

    assert_eq!(core.check_presence(pid(9), pid(1)), Presence::Offline);
    let _a = connect(&mut core, 1);
    let _b = connect(&mut core, 2);
    assert_eq!(core.check_presence(pid(9), pid(1)), Presence::Online);
    core.island_visit(pid(1), visit(2, "accept")).unwrap();
    assert_eq!(core.check_presence(pid(9), pid(1)), Presence::InMatch);

    let statuses: Vec<_> = drain(&mut asker)
        .into_iter()
        .map(|e| match e {
            ServerEvent::OnlineStatus { target, status } => (target, status),
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            (pid(1), Presence::Offline),
            (pid(1), Presence::Online),
            (pid(1), Presence::InMatch),
        ]
    );
}

// =========================================================================
// Matchmaking
// =========================================================================

#[test]
fn test_notify_match_found_reaches_both_and_clears_queue() {
    let (mut core, store) = coordinator();
    let mut a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);
    let mut queue = store.clone();
    skirmish_coordinator::QueueStore::enqueue(&mut queue, pid(2)).unwrap();

    let match_id = core.notify_match_found(pid(1), pid(2)).unwrap();

    let expected = ServerEvent::MatchFound {
        match_id: match_id.clone(),
        player1: pid(1),
        player2: pid(2),
    };
    assert_eq!(match_id.as_str(), "1-2");
    assert_eq!(drain(&mut a), vec![expected.clone()]);
    assert_eq!(drain(&mut b), vec![expected]);
    assert!(store.queued().is_empty());
    assert!(core.matches().is_empty());
}

#[test]
fn test_notify_match_found_skips_offline_side() {
    let (mut core, _) = coordinator();
    let mut a = connect(&mut core, 1);

    core.notify_match_found(pid(1), pid(2)).unwrap();

    assert_eq!(drain(&mut a).len(), 1);
}

#[test]
fn test_notify_match_found_with_busy_player_sends_nothing() {
    let (mut core, _, mut a, _b, _) = active_match();
    let mut c = connect(&mut core, 3);

    let result = core.notify_match_found(pid(3), pid(1));

    assert!(matches!(result, Err(MatchError::AlreadyPlaying(p)) if p == pid(1)));
    assert!(drain(&mut a).is_empty());
    assert!(drain(&mut c).is_empty());
}

#[test]
fn test_request_matchmaking_queue_then_pair() {
    let (mut core, store) = coordinator();
    store.add_player(pid(1), 5);
    store.add_player(pid(2), 6);
    let mut a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);

    assert_eq!(core.request_matchmaking(pid(1), true).unwrap(), MatchmakingReply::Queued);
    assert_eq!(store.queued(), vec![pid(1)]);

    assert_eq!(
        core.request_matchmaking(pid(2), true).unwrap(),
        MatchmakingReply::Paired { opponent: pid(1) }
    );
    assert!(store.queued().is_empty());

    let expected = ServerEvent::MatchFound {
        match_id: mid(2, 1),
        player1: pid(2),
        player2: pid(1),
    };
    assert_eq!(drain(&mut a), vec![expected.clone()]);
    assert_eq!(drain(&mut b), vec![expected]);
}

#[test]
fn test_request_matchmaking_out_of_range_queues_both() {
    let (mut core, store) = coordinator();
    store.add_player(pid(1), 1);
    store.add_player(pid(2), 10);

    core.request_matchmaking(pid(1), true).unwrap();
    assert_eq!(core.request_matchmaking(pid(2), true).unwrap(), MatchmakingReply::Queued);
    assert_eq!(store.queued(), vec![pid(1), pid(2)]);
}

#[test]
fn test_request_matchmaking_passes_over_player_on_visit() {
    let (mut core, store) = coordinator();
    for id in 1..=3 {
        store.add_player(pid(id), 5);
    }
    let mut a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);
    let _c = connect(&mut core, 3);
    core.request_matchmaking(pid(2), true).unwrap();
    core.accept_friend_visit(pid(3), pid(2), Payload::new()).unwrap();
    drain(&mut b);

    assert_eq!(core.request_matchmaking(pid(1), true).unwrap(), MatchmakingReply::Queued);

    assert_eq!(store.queued(), vec![pid(2), pid(1)]);
    assert!(drain(&mut a).is_empty());
    assert!(drain(&mut b).is_empty());
}

#[test]
fn test_request_matchmaking_pairs_with_next_free_player() {
    let (mut core, store) = coordinator();
    for id in 1..=4 {
        store.add_player(pid(id), 5);
    }
    let _a = connect(&mut core, 1);
    let _b = connect(&mut core, 2);
    let _c = connect(&mut core, 3);
    let mut d = connect(&mut core, 4);
    core.request_matchmaking(pid(2), true).unwrap();
    core.request_matchmaking(pid(4), true).unwrap();
    core.accept_friend_visit(pid(3), pid(2), Payload::new()).unwrap();
    drain(&mut d);

    assert_eq!(
        core.request_matchmaking(pid(1), true).unwrap(),
        MatchmakingReply::Paired { opponent: pid(4) }
    );

    assert_eq!(store.queued(), vec![pid(2)]);
    assert!(matches!(drain(&mut d).as_slice(), [ServerEvent::MatchFound { .. }]));
}

#[test]
fn test_request_matchmaking_while_playing_is_rejected() {
    let (mut core, store) = coordinator();
    store.add_player(pid(1), 5);
    store.add_player(pid(2), 5);
    let _a = connect(&mut core, 1);
    let _b = connect(&mut core, 2);
    let _c = connect(&mut core, 3);
    core.request_matchmaking(pid(2), true).unwrap();
    core.accept_friend_visit(pid(3), pid(1), Payload::new()).unwrap();

    assert!(matches!(
        core.request_matchmaking(pid(1), true),
        Err(MatchError::AlreadyPlaying(p)) if p == pid(1)
    ));
    assert_eq!(store.queued(), vec![pid(2)]);
}

#[test]
fn test_request_matchmaking_errors() {
    let (mut core, store) = coordinator();
    store.add_player(pid(1), 3);

    assert!(matches!(
        core.request_matchmaking(pid(9), true),
        Err(MatchError::PlayerNotFound(_))
    ));
    assert!(matches!(
        core.request_matchmaking(pid(1), false),
        Err(MatchError::NotQueued(_))
    ));
    core.request_matchmaking(pid(1), true).unwrap();
    assert!(matches!(
        core.request_matchmaking(pid(1), true),
        Err(MatchError::AlreadyQueued(_))
    ));
    assert_eq!(core.request_matchmaking(pid(1), false).unwrap(), MatchmakingReply::Left);
    assert!(store.queued().is_empty());
}

// =========================================================================
// Chat
// =========================================================================

#[test]
fn test_chat_is_stored_and_broadcast() {
    let (mut core, store) = coordinator();
    let mut a = connect(&mut core, 1);
    let mut b = connect(&mut core, 2);

    core.chat(pid(1), "ada".into(), "hello".into());

    assert_eq!(store.chat_history()[0].message, "hello");
    assert_eq!(store.chat_history()[0].user_id, pid(1));
    for inbox in [&mut a, &mut b] {
        match drain(inbox).as_slice() {
            [ServerEvent::Chat { username, message, time_stamp }] => {
                assert_eq!(username, "ada");
                assert_eq!(message, "hello");
                assert!(time_stamp.ends_with('M'));
            }
            other => panic!("unexpected events {other:?}"),
        }
    }
}

#[test]
fn test_chat_store_failure_still_broadcasts() {
    let (mut core, store) = coordinator();
    let mut a = connect(&mut core, 1);
    store.set_fail_chat(true);

    core.chat(pid(1), "ada".into(), "still here".into());

    assert!(store.chat_history().is_empty());
    assert_eq!(drain(&mut a).len(), 1);
}
