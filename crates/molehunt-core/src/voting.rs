//! Meeting ballots and the ejection tally.

use std::collections::BTreeMap;

use molehunt_protocol::{Phase, PlayerId};
use serde::{Deserialize, Serialize};

use crate::{MatchState, RuleViolation, ViolationKind};

/// A single vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ballot {
    Player(PlayerId),
    Skip,
}

/// What a closed meeting decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Ejected(PlayerId),
    /// Skip won, or the top candidates tied.
    NoEjection,
}

/// Ballots for the meeting in progress.
#[derive(Debug, Default)]
pub struct VoteBox {
    ballots: BTreeMap<PlayerId, Ballot>,
    opened_at_ms: Option<u64>,
}

impl VoteBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh meeting, discarding any old ballots.
    pub(crate) fn open(&mut self, now_ms: u64) {
        self.ballots.clear();
        self.opened_at_ms = Some(now_ms);
    }

    pub fn opened_at_ms(&self) -> Option<u64> {
        self.opened_at_ms
    }

    pub fn ballots(&self) -> &BTreeMap<PlayerId, Ballot> {
        &self.ballots
    }

    /// Records one living player's vote. Each player votes once.
    pub fn cast(
        &mut self,
        state: &MatchState,
        voter: &PlayerId,
        ballot: Ballot,
    ) -> Result<(), RuleViolation> {
        if state.phase() != Phase::Voting {
            return Err(RuleViolation::wrong_phase("vote", state.phase()));
        }
        let player = state
            .player(voter)
            .ok_or_else(|| RuleViolation::player_not_found(voter))?;
        if !player.is_alive() {
            return Err(RuleViolation::player_not_alive());
        }
        if self.ballots.contains_key(voter) {
            return Err(RuleViolation::new(
                ViolationKind::AlreadyVoted,
                "Player has already voted in this meeting",
            ));
        }
        if let Ballot::Player(target) = &ballot {
            let alive = state.player(target).is_some_and(|p| p.is_alive());
            if !alive {
                return Err(RuleViolation::new(
                    ViolationKind::InvalidTarget,
                    format!("Cannot vote for {target}: not a living player"),
                ));
            }
        }

        tracing::debug!(%voter, ?ballot, "vote cast");
        self.ballots.insert(voter.clone(), ballot);
        Ok(())
    }

    /// Returns `true` once every living player has voted.
    pub fn all_voted(&self, state: &MatchState) -> bool {
        state.alive_players().all(|p| self.ballots.contains_key(&p.id))
    }

    /// Counts the ballots. A player is ejected only with strictly more
    /// votes than skip and than every other candidate.
    pub fn tally(&self) -> VoteOutcome {
        let mut counts: BTreeMap<&PlayerId, usize> = BTreeMap::new();
        let mut skips = 0;
        for ballot in self.ballots.values() {
            match ballot {
                Ballot::Player(target) => *counts.entry(target).or_default() += 1,
                Ballot::Skip => skips += 1,
            }
        }

        let Some(top) = counts.values().copied().max() else {
            return VoteOutcome::NoEjection;
        };
        let mut leaders = counts.iter().filter(|(_, c)| **c == top);
        match (leaders.next(), leaders.next()) {
            (Some((id, _)), None) if top > skips => VoteOutcome::Ejected((*id).clone()),
            _ => VoteOutcome::NoEjection,
        }
    }

    /// Drops every ballot aimed at `target`. Their voters may vote again.
    pub(crate) fn discard_votes_for(&mut self, target: &PlayerId) {
        self.ballots.retain(|_, ballot| !matches!(ballot, Ballot::Player(t) if t == target));
    }

    /// Tallies and clears the box. A leader who is no longer alive ejects
    /// nobody.
    pub(crate) fn close(&mut self, state: &MatchState) -> VoteOutcome {
        let outcome = match self.tally() {
            VoteOutcome::Ejected(id) if !state.player(&id).is_some_and(|p| p.is_alive()) => {
                VoteOutcome::NoEjection
            }
            outcome => outcome,
        };
        self.ballots.clear();
        self.opened_at_ms = None;
        outcome
    }
}
