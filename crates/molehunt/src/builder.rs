//! `MatchBuilder`: from a map, a config, and a roster to a running actor.

use molehunt_core::{Match, MatchConfig, PlayerSeed};
use molehunt_map::MapDefinition;

use crate::{MolehuntError, MatchHandle, spawn_match};

/// Builder for configuring and spawning a match.
///
/// # Example
///
/// ```rust,ignore
/// use molehunt::prelude::*;
///
/// let handle = MatchBuilder::new(builtin::station()?)
///     .player(PlayerSeed::loyalist("ada"))
///     .player(PlayerSeed::mole("mallory"))
///     .spawn()?;
/// handle.start(0).await?;
/// ```
pub struct MatchBuilder {
    map: MapDefinition,
    config: MatchConfig,
    roster: Vec<PlayerSeed>,
    channel_size: usize,
}

impl MatchBuilder {
    /// Default capacity of the command queue.
    pub const DEFAULT_CHANNEL_SIZE: usize = 64;

    pub fn new(map: MapDefinition) -> Self {
        Self {
            map,
            config: MatchConfig::default(),
            roster: Vec::new(),
            channel_size: Self::DEFAULT_CHANNEL_SIZE,
        }
    }

    /// Parses and validates a JSON map document.
    pub fn from_json(map_json: &str) -> Result<Self, MolehuntError> {
        Ok(Self::new(MapDefinition::from_json(map_json)?))
    }

    pub fn config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Seats one player.
    pub fn player(mut self, seed: PlayerSeed) -> Self {
        self.roster.push(seed);
        self
    }

    /// Seats several players.
    pub fn roster(mut self, seeds: impl IntoIterator<Item = PlayerSeed>) -> Self {
        self.roster.extend(seeds);
        self
    }

    pub fn channel_size(mut self, size: usize) -> Self {
        self.channel_size = size;
        self
    }

    /// Builds the match without spawning it.
    pub fn build(self) -> Result<Match, MolehuntError> {
        Ok(Match::new(self.map, self.config, self.roster)?)
    }

    /// Builds the match and spawns its actor. Must be called inside a
    /// Tokio runtime.
    pub fn spawn(self) -> Result<MatchHandle, MolehuntError> {
        let channel_size = self.channel_size;
        let game = self.build()?;
        Ok(spawn_match(game, channel_size))
    }
}
