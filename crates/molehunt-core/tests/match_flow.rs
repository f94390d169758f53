//! End-to-end tests for the match controller.

mod common;

use common::{pid, rid, roster, test_map, tid};
use molehunt_core::{Ballot, Match, MatchConfig, ViolationKind, VoteOutcome};
use molehunt_map::Interactable;
use molehunt_protocol::{Faction, MatchEvent, Phase, PlayerStatus, Recipient, SabotageKind};

const COOLDOWN: u64 = 25_000;
const WARMUP: u64 = 20_000;

// =========================================================================
// Helpers
// =========================================================================

fn started(loyalists: usize) -> Match {
    let mut m = Match::new(test_map(), MatchConfig::default(), roster(loyalists)).unwrap();
    m.start(0).unwrap();
    m.drain_events();
    m
}

fn walk(m: &mut Match, player: &str, path: &[&str], now_ms: u64) {
    for room in path {
        m.move_player(&pid(player), &rid(room), now_ms).unwrap();
    }
}

fn events(m: &mut Match) -> Vec<MatchEvent> {
    m.drain_events().into_iter().map(|(_, e)| e).collect()
}

// =========================================================================
// Lifecycle
// =========================================================================

#[test]
fn test_start_enters_round_one() {
    let mut m = Match::new(test_map(), MatchConfig::default(), roster(2)).unwrap();
    assert_eq!(m.phase(), Phase::Lobby);

    m.start(500).unwrap();
    assert_eq!(m.phase(), Phase::Round);
    assert_eq!(m.state().round(), 1);
    assert_eq!(
        events(&mut m),
        vec![
            MatchEvent::PhaseChanged {
                from: Phase::Lobby,
                to: Phase::Round,
            },
            MatchEvent::RoundStarted {
                round: 1,
                started_at_ms: 500,
            },
        ]
    );

    let err = m.start(600).unwrap_err();
    assert_eq!(err.kind, ViolationKind::WrongPhase);
}

#[test]
fn test_actions_refused_in_lobby() {
    let mut m = Match::new(test_map(), MatchConfig::default(), roster(2)).unwrap();
    let err = m
        .move_player(&pid("loyalist-1"), &rid("hallway"), 0)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::WrongPhase);
    let err = m
        .attempt_task(&pid("loyalist-1"), &tid("task-1"), true, 0)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::WrongPhase);
}

#[test]
fn test_bad_map_is_fatal() {
    let map = test_map().with_vent("workshop", "nowhere");
    assert!(Match::new(map, MatchConfig::default(), roster(2)).is_err());
}

// =========================================================================
// Movement and logs
// =========================================================================

#[test]
fn test_walking_follows_exits() {
    let mut m = started(2);
    m.move_player(&pid("loyalist-1"), &rid("hallway"), 100).unwrap();

    let err = m
        .move_player(&pid("loyalist-1"), &rid("hallway"), 200)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::IllegalMove);

    let err = m
        .move_player(&pid("loyalist-2"), &rid("security"), 200)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::IllegalMove);

    let player = m.state().player(&pid("loyalist-1")).unwrap();
    assert_eq!(player.location.room, rid("hallway"));
    assert_eq!(m.state().movement_log().len(), 1);
}

#[test]
fn test_only_moles_use_vents() {
    let mut m = started(2);

    let err = m
        .move_player(&pid("loyalist-1"), &rid("workshop"), 0)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::IllegalMove);

    m.move_player(&pid("mole"), &rid("workshop"), 0).unwrap();
    let drained = m.drain_events();
    assert_eq!(drained.len(), 1);
    let (recipient, event) = &drained[0];
    assert_eq!(recipient, &Recipient::Moles);
    assert!(matches!(event, MatchEvent::PlayerMoved { via_vent: true, .. }));

    // Vent travel leaves no trace in the security log.
    assert!(m.state().movement_log().is_empty());
}

#[test]
fn test_logs_readable_only_in_logs_room() {
    let mut m = started(2);
    walk(&mut m, "loyalist-1", &["hallway", "security"], 1_000);
    walk(&mut m, "loyalist-2", &["hallway"], 2_000);

    let err = m.view_logs(&pid("loyalist-2")).unwrap_err();
    assert_eq!(err.kind, ViolationKind::WrongRoom);

    let log = m.view_logs(&pid("loyalist-1")).unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0].to, rid("hallway"));
    assert_eq!(log[2].player_id, pid("loyalist-2"));
}

#[test]
fn test_logs_window_keeps_latest_entries() {
    let config = MatchConfig {
        log_window: 2,
        ..MatchConfig::default()
    };
    let mut m = Match::new(test_map(), config, roster(1)).unwrap();
    m.start(0).unwrap();
    walk(&mut m, "loyalist-1", &["hallway", "workshop", "hallway", "security"], 10);

    let log = m.view_logs(&pid("loyalist-1")).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].to, rid("security"));
}

// =========================================================================
// Tasks
// =========================================================================

#[test]
fn test_tasks_need_the_right_room() {
    let mut m = started(1);
    let player = pid("loyalist-1");

    let err = m.attempt_task(&player, &tid("task-2"), true, 0).unwrap_err();
    assert_eq!(err.kind, ViolationKind::WrongRoom);

    let err = m.attempt_task(&player, &tid("no-such-task"), true, 0).unwrap_err();
    assert_eq!(err.kind, ViolationKind::InvalidTarget);

    let err = m.attempt_task(&player, &tid("emergency-button"), true, 0).unwrap_err();
    assert_eq!(err.kind, ViolationKind::InvalidTarget);

    let receipt = m.attempt_task(&player, &tid("task-1"), true, 0).unwrap();
    assert_eq!(receipt.player_progress, 1);
    assert!(!receipt.victory);
}

#[test]
fn test_mole_task_reason_wins_over_location() {
    let mut m = started(1);
    let err = m
        .attempt_task(&pid("mole"), &tid("task-2"), true, 0)
        .unwrap_err();
    assert_eq!(err.to_string(), "Only loyalists can complete tasks");
}

#[test]
fn test_task_events_and_win() {
    let mut m = started(1);
    let player = pid("loyalist-1");

    m.attempt_task(&player, &tid("task-1"), true, 10).unwrap();
    let drained = m.drain_events();
    assert_eq!(drained[0].0, Recipient::Player(player.clone()));
    assert_eq!(
        drained[1].1,
        MatchEvent::TaskProgress {
            completed: 1,
            required: 3,
        }
    );

    walk(&mut m, "loyalist-1", &["hallway", "security"], 20);
    m.attempt_task(&player, &tid("task-2"), true, 30).unwrap();
    walk(&mut m, "loyalist-1", &["hallway", "workshop"], 40);
    m.drain_events();
    let receipt = m.attempt_task(&player, &tid("task-3"), true, 50).unwrap();

    assert!(receipt.victory);
    assert_eq!(m.phase(), Phase::GameOver);
    assert_eq!(m.state().winner(), Some(Faction::Loyalists));
    let tail = events(&mut m);
    assert!(tail.contains(&MatchEvent::GameOver {
        winner: Faction::Loyalists,
        reason: "all tasks completed".into(),
    }));
}

// =========================================================================
// Kills, bodies, and voting
// =========================================================================

#[test]
fn test_kill_respects_cooldown() {
    let mut m = started(3);
    let err = m
        .kill(&pid("mole"), &pid("loyalist-1"), COOLDOWN - 1)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::KillOnCooldown);

    m.kill(&pid("mole"), &pid("loyalist-1"), COOLDOWN).unwrap();
    assert_eq!(
        m.state().player(&pid("loyalist-1")).unwrap().status,
        PlayerStatus::Dead
    );
    assert_eq!(m.state().bodies().len(), 1);

    let err = m
        .kill(&pid("mole"), &pid("loyalist-2"), COOLDOWN + 1)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::KillOnCooldown);
}

#[test]
fn test_kill_target_rules() {
    let mut m = started(3);

    let err = m
        .kill(&pid("loyalist-1"), &pid("loyalist-2"), COOLDOWN)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::WrongRole);

    m.move_player(&pid("loyalist-2"), &rid("hallway"), 0).unwrap();
    let err = m
        .kill(&pid("mole"), &pid("loyalist-2"), COOLDOWN)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::WrongRoom);

    let err = m.kill(&pid("mole"), &pid("mole"), COOLDOWN).unwrap_err();
    assert_eq!(err.kind, ViolationKind::InvalidTarget);
}

#[test]
fn test_report_then_vote_out_the_mole() {
    let mut m = started(3);
    m.kill(&pid("mole"), &pid("loyalist-1"), COOLDOWN).unwrap();

    // Somebody elsewhere can't report it.
    m.move_player(&pid("loyalist-3"), &rid("hallway"), COOLDOWN).unwrap();
    let err = m
        .report_body(&pid("loyalist-3"), &pid("loyalist-1"), COOLDOWN)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::WrongRoom);

    m.report_body(&pid("loyalist-2"), &pid("loyalist-1"), COOLDOWN + 100)
        .unwrap();
    assert_eq!(m.phase(), Phase::Voting);
    assert!(m.state().bodies()[0].reported);

    let err = m
        .cast_vote(&pid("loyalist-1"), Ballot::Skip, COOLDOWN + 200)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::PlayerNotAlive);

    assert_eq!(
        m.cast_vote(&pid("loyalist-2"), Ballot::Player(pid("mole")), COOLDOWN + 200)
            .unwrap(),
        None
    );
    let err = m
        .cast_vote(&pid("loyalist-2"), Ballot::Skip, COOLDOWN + 200)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::AlreadyVoted);

    m.cast_vote(&pid("mole"), Ballot::Player(pid("loyalist-2")), COOLDOWN + 300)
        .unwrap();
    let outcome = m
        .cast_vote(&pid("loyalist-3"), Ballot::Player(pid("mole")), COOLDOWN + 400)
        .unwrap();
    assert_eq!(outcome, Some(VoteOutcome::Ejected(pid("mole"))));

    assert_eq!(m.phase(), Phase::GameOver);
    assert_eq!(m.state().winner(), Some(Faction::Loyalists));
    assert_eq!(m.state().end_reason(), Some("all moles removed"));
}

#[test]
fn test_emergency_meeting_without_ejection_starts_next_round() {
    let mut m = started(2);
    m.trigger_sabotage(&pid("mole"), SabotageKind::Oxygen, 1_000)
        .unwrap();
    let err = m.call_emergency(&pid("loyalist-1"), WARMUP).unwrap_err();
    assert_eq!(err.kind, ViolationKind::SabotageActive);
    m.resolve_sabotage(&pid("loyalist-2")).unwrap();

    assert!(m.can_call_emergency(&pid("loyalist-1"), WARMUP).is_ok());
    m.call_emergency(&pid("loyalist-1"), WARMUP).unwrap();
    assert_eq!(m.phase(), Phase::Voting);
    assert_eq!(m.emergency().last_call().unwrap().caller, pid("loyalist-1"));
    m.drain_events();

    for voter in ["loyalist-1", "loyalist-2"] {
        m.cast_vote(&pid(voter), Ballot::Skip, WARMUP + 10).unwrap();
    }
    let outcome = m
        .cast_vote(&pid("mole"), Ballot::Player(pid("loyalist-1")), WARMUP + 20)
        .unwrap();
    assert_eq!(outcome, Some(VoteOutcome::NoEjection));
    assert_eq!(m.phase(), Phase::Round);
    assert_eq!(m.state().round(), 2);
    assert!(events(&mut m).contains(&MatchEvent::RoundStarted {
        round: 2,
        started_at_ms: WARMUP + 20,
    }));

    // The warm-up restarts with the round and the meeting stays spent.
    let err = m.call_emergency(&pid("loyalist-1"), WARMUP + 30).unwrap_err();
    assert_eq!(err.kind, ViolationKind::WarmUpActive);
    let err = m
        .can_call_emergency(&pid("loyalist-1"), 2 * WARMUP + 20)
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::AlreadyUsed);
}

#[test]
fn test_emergency_check_matches_call_outside_round() {
    let mut m = Match::new(test_map(), MatchConfig::default(), roster(2)).unwrap();
    let err = m.can_call_emergency(&pid("loyalist-1"), WARMUP).unwrap_err();
    assert_eq!(err.kind, ViolationKind::WrongPhase);

    m.start(0).unwrap();
    m.call_emergency(&pid("loyalist-1"), WARMUP).unwrap();
    let check = m.can_call_emergency(&pid("loyalist-2"), WARMUP).unwrap_err();
    let call = m.call_emergency(&pid("loyalist-2"), WARMUP).unwrap_err();
    assert_eq!(check.kind, ViolationKind::WrongPhase);
    assert_eq!(check, call);
}

#[test]
fn test_emergency_from_wrong_room() {
    let mut m = started(2);
    m.move_player(&pid("loyalist-1"), &rid("hallway"), 0).unwrap();
    let err = m.call_emergency(&pid("loyalist-1"), WARMUP).unwrap_err();
    assert!(err.to_string().contains("council room"));
    assert_eq!(m.phase(), Phase::Round);
}

#[test]
fn test_unknown_caller_is_not_found() {
    let m = started(2);
    let err = m.can_call_emergency(&pid("ghost"), WARMUP).unwrap_err();
    assert_eq!(err.kind, ViolationKind::PlayerNotFound);
}

#[test]
fn test_meeting_clears_sabotage() {
    let mut m = started(3);
    m.kill(&pid("mole"), &pid("loyalist-1"), COOLDOWN).unwrap();
    m.trigger_sabotage(&pid("mole"), SabotageKind::Lights, COOLDOWN)
        .unwrap();
    m.report_body(&pid("loyalist-2"), &pid("loyalist-1"), COOLDOWN + 1)
        .unwrap();
    assert!(!m.sabotage().is_active());
}

#[test]
fn test_elimination_hands_moles_the_win() {
    let mut m = started(2);
    m.kill(&pid("mole"), &pid("loyalist-1"), COOLDOWN).unwrap();
    assert_eq!(m.phase(), Phase::GameOver);
    assert_eq!(m.state().winner(), Some(Faction::Moles));
    assert_eq!(m.state().end_reason(), Some("moles outnumber loyalists"));
}

#[test]
fn test_external_retirement_recomputes_win() {
    let mut m = started(2);
    m.retire_player(&pid("mole"), PlayerStatus::Ejected).unwrap();
    assert_eq!(m.state().winner(), Some(Faction::Loyalists));
    assert!(m.retire_player(&pid("mole"), PlayerStatus::Dead).is_err());
}

// =========================================================================
// Sabotage and time
// =========================================================================

#[test]
fn test_sabotage_fixed_at_its_location() {
    let mut m = started(2);
    m.trigger_sabotage(&pid("mole"), SabotageKind::Lights, 0)
        .unwrap();

    let err = m.resolve_sabotage(&pid("loyalist-1")).unwrap_err();
    assert_eq!(err.kind, ViolationKind::WrongRoom);

    walk(&mut m, "loyalist-1", &["hallway", "security"], 100);
    m.drain_events();
    m.resolve_sabotage(&pid("loyalist-1")).unwrap();
    assert_eq!(
        events(&mut m),
        vec![MatchEvent::SabotageResolved {
            kind: SabotageKind::Lights,
            resolved_by: Some(pid("loyalist-1")),
        }]
    );
}

#[test]
fn test_tick_expires_sabotage() {
    let mut m = started(2);
    m.trigger_sabotage(&pid("mole"), SabotageKind::Reactor, 1_000)
        .unwrap();
    m.drain_events();

    m.tick(45_999);
    assert!(m.sabotage().is_active());
    m.tick(46_000);
    assert!(!m.sabotage().is_active());
    assert_eq!(
        events(&mut m),
        vec![MatchEvent::SabotageResolved {
            kind: SabotageKind::Reactor,
            resolved_by: None,
        }]
    );
}

#[test]
fn test_tick_closes_voting_at_deadline() {
    let mut m = started(2);
    m.call_emergency(&pid("loyalist-1"), WARMUP).unwrap();
    m.cast_vote(&pid("loyalist-1"), Ballot::Player(pid("mole")), WARMUP)
        .unwrap();

    m.tick(WARMUP + 59_999);
    assert_eq!(m.phase(), Phase::Voting);
    m.tick(WARMUP + 60_000);
    assert_eq!(m.phase(), Phase::GameOver);
    assert_eq!(m.state().winner(), Some(Faction::Loyalists));
}

#[test]
fn test_candidate_leaving_mid_meeting_does_not_stall_voting() {
    let mut m = started(3);
    m.call_emergency(&pid("loyalist-1"), WARMUP).unwrap();
    for voter in ["loyalist-1", "loyalist-2"] {
        m.cast_vote(&pid(voter), Ballot::Player(pid("loyalist-3")), WARMUP + 10)
            .unwrap();
    }

    m.retire_player(&pid("loyalist-3"), PlayerStatus::Dead).unwrap();
    assert_eq!(m.phase(), Phase::Voting);
    assert!(m.votes().ballots().is_empty());
    assert_eq!(m.votes().opened_at_ms(), Some(WARMUP));

    let outcome = m.cast_vote(&pid("mole"), Ballot::Skip, WARMUP + 20).unwrap();
    assert_eq!(outcome, None);

    // Dropped ballots can be cast again.
    m.cast_vote(&pid("loyalist-1"), Ballot::Skip, WARMUP + 30).unwrap();

    m.tick(WARMUP + 60_000);
    assert_eq!(m.phase(), Phase::Round);
    assert_eq!(m.state().round(), 2);
    assert_eq!(
        m.state().player(&pid("loyalist-3")).unwrap().status,
        PlayerStatus::Dead
    );
    assert!(events(&mut m).contains(&MatchEvent::NoEjection));
}

#[test]
fn test_close_voting_outside_meeting() {
    let mut m = started(2);
    let err = m.close_voting(0).unwrap_err();
    assert_eq!(err.kind, ViolationKind::WrongPhase);
}

// =========================================================================
// Reset and serialization
// =========================================================================

#[test]
fn test_reset_rebuilds_everything() {
    let mut m = started(2);
    m.attempt_task(&pid("loyalist-1"), &tid("task-1"), true, 10)
        .unwrap();
    m.kill(&pid("mole"), &pid("loyalist-2"), COOLDOWN).unwrap();
    m.rooms_mut()
        .add_interactable(&rid("hallway"), Interactable::task("task-4", "Sweep"))
        .unwrap();
    assert_eq!(m.tasks().catalog().len(), 3);

    m.reset().unwrap();
    assert_eq!(m.phase(), Phase::Lobby);
    assert_eq!(m.state().round(), 0);
    assert_eq!(m.state().alive_loyalists(), 2);
    assert_eq!(m.completed_task_count(), 0);
    assert!(m.state().bodies().is_empty());
    assert!(m.drain_events().is_empty());
    assert_eq!(m.tasks().catalog().len(), 4);

    m.start(0).unwrap();
    assert_eq!(m.state().round(), 1);
}

#[test]
fn test_events_serialize_with_type_tag() {
    let mut m = started(2);
    m.move_player(&pid("loyalist-1"), &rid("hallway"), 0).unwrap();
    let (_, event) = m.drain_events().remove(0);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "PlayerMoved");
    assert_eq!(json["player_id"], "loyalist-1");
    assert_eq!(json["to"], "hallway");
    assert_eq!(json["via_vent"], false);
}
