use molehunt::prelude::*;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// One scripted action by one player.
enum Step {
    Walk(&'static str, &'static str),
    Task(&'static str, &'static str),
    Sabotage(&'static str, SabotageKind),
    Emergency(&'static str),
    Kill(&'static str, &'static str),
    Report(&'static str, &'static str),
    Vote(&'static str, Option<&'static str>),
}

/// Three loyalists go about their tasks; the mole cuts the lights, waits
/// out the kill cooldown, and is caught at the meeting that follows.
const SCRIPT: &[(u64, Step)] = &[
    (1_000, Step::Walk("ada", "storage")),
    (1_200, Step::Walk("mallory", "hallway")),
    (1_500, Step::Walk("bo", "hallway")),
    (2_000, Step::Task("ada", "task-fuel-engines")),
    (2_500, Step::Walk("bo", "electrical")),
    (2_600, Step::Walk("mallory", "electrical")),
    (3_000, Step::Task("bo", "task-fix-wiring")),
    (4_000, Step::Sabotage("mallory", SabotageKind::Lights)),
    (5_000, Step::Emergency("cy")),
    (25_000, Step::Kill("mallory", "bo")),
    (25_500, Step::Walk("cy", "hallway")),
    (26_000, Step::Walk("cy", "electrical")),
    (26_500, Step::Report("cy", "bo")),
    (27_000, Step::Vote("ada", Some("mallory"))),
    (27_100, Step::Vote("mallory", Some("cy"))),
    (27_200, Step::Vote("cy", Some("mallory"))),
];

#[derive(Serialize)]
struct StepLog {
    at_ms: u64,
    player: &'static str,
    action: &'static str,
    #[serde(flatten)]
    outcome: ActionOutcome,
}

async fn run_step(handle: &MatchHandle, at_ms: u64, step: &Step) -> StepLog {
    let id = |s: &str| PlayerId::from(s);
    let (player, action, outcome): (&'static str, &'static str, ActionOutcome) = match step {
        Step::Walk(p, room) => (
            *p,
            "walk",
            handle.move_player(id(*p), RoomId::from(*room), at_ms).await.into(),
        ),
        Step::Task(p, task) => (
            *p,
            "task",
            handle
                .attempt_task(id(*p), TaskId::from(*task), true, at_ms)
                .await
                .into(),
        ),
        Step::Sabotage(p, kind) => (
            *p,
            "sabotage",
            handle.trigger_sabotage(id(*p), *kind, at_ms).await.into(),
        ),
        Step::Emergency(p) => (
            *p,
            "emergency",
            handle.call_emergency(id(*p), at_ms).await.into(),
        ),
        Step::Kill(p, target) => (*p, "kill", handle.kill(id(*p), id(*target), at_ms).await.into()),
        Step::Report(p, body) => (
            *p,
            "report",
            handle.report_body(id(*p), id(*body), at_ms).await.into(),
        ),
        Step::Vote(p, target) => {
            let ballot = target.map_or(Ballot::Skip, |t| Ballot::Player(id(t)));
            (*p, "vote", handle.vote(id(*p), ballot, at_ms).await.into())
        }
    };
    StepLog {
        at_ms,
        player,
        action,
        outcome,
    }
}

/// Plays the whole script against a fresh station match.
async fn play() -> Result<(MatchSnapshot, Vec<StepLog>), MolehuntError> {
    let handle = MatchBuilder::new(builtin::station()?)
        .player(PlayerSeed::loyalist("ada"))
        .player(PlayerSeed::loyalist("bo"))
        .player(PlayerSeed::loyalist("cy"))
        .player(PlayerSeed::mole("mallory"))
        .spawn()?;

    let mut observer = handle.observe().await?;
    let printer = tokio::spawn(async move {
        while let Some((recipient, event)) = observer.recv().await {
            match (serde_json::to_string(&recipient), serde_json::to_string(&event)) {
                (Ok(to), Ok(event)) => println!("  event {to} {event}"),
                _ => tracing::warn!("event could not be encoded"),
            }
        }
    });

    handle.start(0).await?;
    let mut logs = Vec::with_capacity(SCRIPT.len());
    for (at_ms, step) in SCRIPT {
        handle.tick(*at_ms).await?;
        let log = run_step(&handle, *at_ms, step).await;
        if let Ok(line) = serde_json::to_string(&log) {
            println!("{line}");
        }
        logs.push(log);
    }

    let snapshot = handle.snapshot().await?;
    handle.shutdown().await?;
    let _ = printer.await;
    Ok((snapshot, logs))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    molehunt::telemetry::init("info");
    tracing::info!(steps = SCRIPT.len(), "running scripted match");

    let (snapshot, _) = play().await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
