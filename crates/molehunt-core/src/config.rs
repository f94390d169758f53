//! Match configuration.

use std::time::Duration;

use molehunt_protocol::SabotageKind;
use serde::{Deserialize, Serialize};

/// Tunable rules for one match.
///
/// Every field has a default, so a config document only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Time after a round starts before anyone may call a meeting.
    /// The boundary is inclusive: exactly this much elapsed is allowed.
    pub emergency_warmup: Duration,

    /// Meetings each player may call over the whole match.
    pub emergency_meetings_per_player: u32,

    /// Minimum time between two kills by the same mole. Also applied at
    /// the start of every round.
    pub kill_cooldown: Duration,

    /// How long a sabotage lasts before it clears on its own.
    /// `None` means it lasts until fixed.
    pub sabotage_duration: Option<Duration>,

    /// Per-kind overrides of `sabotage_duration`.
    pub sabotage_durations: Vec<(SabotageKind, Duration)>,

    /// How long voting stays open before it closes with the votes cast.
    pub voting_duration: Duration,

    /// Number of entries [`view_logs`](crate::Match::view_logs) returns.
    pub log_window: usize,
}

impl MatchConfig {
    /// The expiry window for a sabotage of `kind`, if any.
    pub fn sabotage_duration_for(&self, kind: SabotageKind) -> Option<Duration> {
        self.sabotage_durations
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, d)| *d)
            .or(self.sabotage_duration)
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            emergency_warmup: Duration::from_millis(20_000),
            emergency_meetings_per_player: 1,
            kill_cooldown: Duration::from_secs(25),
            sabotage_duration: Some(Duration::from_secs(45)),
            sabotage_durations: Vec::new(),
            voting_duration: Duration::from_secs(60),
            log_window: 20,
        }
    }
}

/// Converts a duration into the millisecond timestamps the engine uses.
pub(crate) fn as_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
