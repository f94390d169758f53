//! Integration tests for the match actor: command flow, event routing,
//! and serialized access from concurrent callers.

use molehunt::prelude::*;
use tokio::sync::mpsc::error::TryRecvError;

// =========================================================================
// Helpers
// =========================================================================

const WARMUP: u64 = 20_000;
const COOLDOWN: u64 = 25_000;

fn pid(id: &str) -> PlayerId {
    PlayerId::from(id)
}

fn rid(id: &str) -> RoomId {
    RoomId::from(id)
}

/// ada and bo are loyalists, mallory is the mole. Everyone starts in the
/// council room.
fn spawn_station() -> MatchHandle {
    MatchBuilder::new(builtin::station().unwrap())
        .player(PlayerSeed::loyalist("ada"))
        .player(PlayerSeed::loyalist("bo"))
        .player(PlayerSeed::mole("mallory"))
        .spawn()
        .unwrap()
}

fn kind_of(err: &MolehuntError) -> Option<ViolationKind> {
    err.violation().map(|v| v.kind)
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test]
async fn test_start_and_snapshot() {
    let handle = spawn_station();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.phase, Phase::Lobby);
    assert_eq!(snap.map_id, "station");

    handle.start(0).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.phase, Phase::Round);
    assert_eq!(snap.round, 1);
    assert_eq!(snap.alive_loyalists, 2);
    assert_eq!(snap.alive_moles, 1);
    assert_eq!(snap.required_tasks, 8);
    assert_eq!(snap.completed_tasks, 0);

    let err = handle.start(10).await.unwrap_err();
    assert_eq!(kind_of(&err), Some(ViolationKind::WrongPhase));
}

#[tokio::test]
async fn test_shutdown_makes_handle_unavailable() {
    let handle = spawn_station();
    handle.shutdown().await.unwrap();
    let err = handle.snapshot().await.unwrap_err();
    assert!(matches!(err, MolehuntError::Unavailable));
    assert!(handle.start(0).await.is_err());
}

#[tokio::test]
async fn test_reset_returns_to_lobby() {
    let handle = spawn_station();
    handle.start(0).await.unwrap();
    handle
        .kill(pid("mallory"), pid("ada"), COOLDOWN)
        .await
        .unwrap();
    assert_eq!(handle.snapshot().await.unwrap().phase, Phase::GameOver);

    handle.reset().await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.phase, Phase::Lobby);
    assert_eq!(snap.alive_loyalists, 2);
    assert_eq!(snap.winner, None);
}

// =========================================================================
// Rules through the actor
// =========================================================================

#[tokio::test]
async fn test_rule_violations_come_back_as_errors() {
    let handle = spawn_station();
    handle.start(0).await.unwrap();

    let err = handle
        .move_player(pid("ada"), rid("security"), 10)
        .await
        .unwrap_err();
    assert_eq!(kind_of(&err), Some(ViolationKind::IllegalMove));

    let err = handle
        .trigger_sabotage(pid("ada"), SabotageKind::Lights, 10)
        .await
        .unwrap_err();
    assert_eq!(kind_of(&err), Some(ViolationKind::WrongRole));

    let outcome = ActionOutcome::from(
        handle
            .attempt_task(pid("mallory"), TaskId::from("task-fuel-engines"), true, 10)
            .await,
    );
    assert!(!outcome.success);
    assert_eq!(
        outcome.reason.as_deref(),
        Some("Only loyalists can complete tasks")
    );
}

#[tokio::test]
async fn test_emergency_eligibility_is_a_validation() {
    let handle = spawn_station();
    handle.start(0).await.unwrap();

    let early = handle.can_call_emergency(pid("ada"), WARMUP - 1).await.unwrap();
    assert!(!early.valid);
    assert!(early.reason.unwrap().contains("warm-up"));

    let ready = handle.can_call_emergency(pid("ada"), WARMUP).await.unwrap();
    assert_eq!(ready, Validation::valid());

    let ghost = handle.can_call_emergency(pid("ghost"), WARMUP).await.unwrap();
    assert!(ghost.reason.unwrap().contains("not found"));

    handle.call_emergency(pid("ada"), WARMUP).await.unwrap();
    assert_eq!(handle.snapshot().await.unwrap().phase, Phase::Voting);

    let during_vote = handle.can_call_emergency(pid("bo"), WARMUP).await.unwrap();
    assert!(!during_vote.valid);
    assert!(during_vote.reason.unwrap().contains("Voting"));
}

#[tokio::test]
async fn test_concurrent_attempts_complete_once() {
    let handle = spawn_station();
    handle.start(0).await.unwrap();
    handle
        .move_player(pid("ada"), rid("storage"), 10)
        .await
        .unwrap();

    let mut joins = Vec::new();
    for i in 0..10 {
        let h = handle.clone();
        joins.push(tokio::spawn(async move {
            h.attempt_task(pid("ada"), TaskId::from("task-fuel-engines"), true, 100 + i)
                .await
        }));
    }

    let mut succeeded = 0;
    for join in joins {
        match join.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(err) => assert_eq!(kind_of(&err), Some(ViolationKind::AlreadyCompleted)),
        }
    }
    assert_eq!(succeeded, 1);
    assert_eq!(handle.completed_task_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_vote_out_the_mole() {
    let handle = spawn_station();
    handle.start(0).await.unwrap();
    handle.call_emergency(pid("bo"), WARMUP).await.unwrap();

    handle
        .vote(pid("ada"), Ballot::Player(pid("mallory")), WARMUP + 1)
        .await
        .unwrap();
    handle
        .vote(pid("mallory"), Ballot::Skip, WARMUP + 2)
        .await
        .unwrap();
    let outcome = handle
        .vote(pid("bo"), Ballot::Player(pid("mallory")), WARMUP + 3)
        .await
        .unwrap();
    assert_eq!(outcome, Some(VoteOutcome::Ejected(pid("mallory"))));

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.phase, Phase::GameOver);
    assert_eq!(snap.winner, Some(Faction::Loyalists));
    assert_eq!(snap.end_reason.as_deref(), Some("all moles removed"));
}

#[tokio::test]
async fn test_tick_expires_sabotage() {
    let handle = spawn_station();
    handle.start(0).await.unwrap();
    handle
        .trigger_sabotage(pid("mallory"), SabotageKind::Oxygen, 1_000)
        .await
        .unwrap();
    assert_eq!(
        handle.snapshot().await.unwrap().active_sabotage,
        Some(SabotageKind::Oxygen)
    );

    handle.tick(46_000).await.unwrap();
    assert_eq!(handle.snapshot().await.unwrap().active_sabotage, None);
}

// =========================================================================
// Event routing
// =========================================================================

#[tokio::test]
async fn test_vent_moves_reach_only_moles() {
    let handle = spawn_station();
    let mut ada = handle.subscribe(pid("ada")).await.unwrap();
    let mut mallory = handle.subscribe(pid("mallory")).await.unwrap();

    handle.start(0).await.unwrap();
    for rx in [&mut ada, &mut mallory] {
        assert_eq!(
            rx.recv().await.unwrap(),
            MatchEvent::PhaseChanged {
                from: Phase::Lobby,
                to: Phase::Round,
            }
        );
        assert!(matches!(
            rx.recv().await.unwrap(),
            MatchEvent::RoundStarted { round: 1, .. }
        ));
    }

    handle
        .move_player(pid("mallory"), rid("storage"), 100)
        .await
        .unwrap();
    handle
        .move_player(pid("mallory"), rid("security"), 200)
        .await
        .unwrap();

    let walked = ada.recv().await.unwrap();
    assert!(matches!(walked, MatchEvent::PlayerMoved { via_vent: false, .. }));
    assert!(matches!(
        mallory.recv().await.unwrap(),
        MatchEvent::PlayerMoved { via_vent: false, .. }
    ));
    assert!(matches!(
        mallory.recv().await.unwrap(),
        MatchEvent::PlayerMoved { via_vent: true, .. }
    ));

    // A round trip guarantees everything queued so far has been routed.
    handle.snapshot().await.unwrap();
    assert!(matches!(ada.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_task_completion_is_private() {
    let handle = spawn_station();
    let mut ada = handle.subscribe(pid("ada")).await.unwrap();
    let mut bo = handle.subscribe(pid("bo")).await.unwrap();
    handle.start(0).await.unwrap();
    handle
        .move_player(pid("ada"), rid("storage"), 10)
        .await
        .unwrap();
    handle
        .attempt_task(pid("ada"), TaskId::from("task-fuel-engines"), true, 20)
        .await
        .unwrap();
    handle.snapshot().await.unwrap();

    let mut ada_events = Vec::new();
    while let Ok(event) = ada.try_recv() {
        ada_events.push(event);
    }
    let mut bo_events = Vec::new();
    while let Ok(event) = bo.try_recv() {
        bo_events.push(event);
    }

    let completed = |e: &MatchEvent| matches!(e, MatchEvent::TaskCompleted { .. });
    assert!(ada_events.iter().any(completed));
    assert!(!bo_events.iter().any(completed));
    assert!(bo_events.contains(&MatchEvent::TaskProgress {
        completed: 1,
        required: 8,
    }));
}

#[tokio::test]
async fn test_subscribe_unknown_player_fails() {
    let handle = spawn_station();
    let err = handle.subscribe(pid("ghost")).await.unwrap_err();
    assert_eq!(kind_of(&err), Some(ViolationKind::PlayerNotFound));
}

#[tokio::test]
async fn test_observer_sees_every_audience() {
    let handle = spawn_station();
    let mut observer = handle.observe().await.unwrap();
    handle.start(0).await.unwrap();
    handle
        .move_player(pid("mallory"), rid("storage"), 10)
        .await
        .unwrap();
    handle
        .move_player(pid("mallory"), rid("security"), 20)
        .await
        .unwrap();

    let mut recipients = Vec::new();
    for _ in 0..4 {
        let (recipient, _) = observer.recv().await.unwrap();
        recipients.push(recipient);
    }
    assert_eq!(
        recipients,
        vec![Recipient::All, Recipient::All, Recipient::All, Recipient::Moles]
    );
}

#[tokio::test]
async fn test_events_encode_as_json() {
    let handle = spawn_station();
    let mut observer = handle.observe().await.unwrap();
    handle.start(1_234).await.unwrap();

    let (_, first) = observer.recv().await.unwrap();
    let json = serde_json::to_string(&first).unwrap();
    assert_eq!(json, r#"{"type":"PhaseChanged","from":"lobby","to":"round"}"#);
}
