//! Match state and engine phases
//!
//! `GameState` is created once per match and mutated only by the rule
//! engine (and explicit shot-count resets on turn change).

use serde::{Deserialize, Serialize};

use super::entity::BallType;

/// Engine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnginePhase {
    /// Waiting for the current player to place/aim/shoot
    #[default]
    Turn,
    /// Balls in motion
    Simulate,
    /// All balls settled; the driver runs the rules
    Outcome,
    /// Reserved for a multiplayer sync handshake; no transition reaches it
    Send,
    /// Reserved for a multiplayer sync handshake; no transition reaches it
    Waiting,
}

/// One of the two players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub fn other(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    #[inline]
    fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Assigned group (`Neutral` until determined)
    pub ball_type: BallType,
    pub first_to_move: bool,
    /// Visits left before the table passes to the opponent
    pub shots_remaining: u32,
}

impl Player {
    fn new(first_to_move: bool) -> Self {
        Self {
            ball_type: BallType::Neutral,
            first_to_move,
            shots_remaining: if first_to_move { 1 } else { 0 },
        }
    }
}

/// Final result once the eight ball goes down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner: PlayerId,
    pub loser: PlayerId,
}

/// Why a shot was ruled a foul
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Foul {
    /// The cue ball touched no ball
    NoBallHit,
    /// The cue ball was pocketed
    Scratch,
}

/// What the rule engine decided about the last shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotSummary {
    pub shooter: PlayerId,
    pub first_hit: Option<BallType>,
    pub pocketed: Vec<BallType>,
    pub fouls: Vec<Foul>,
    /// True if the table passed to the other player
    pub turn_passed: bool,
}

/// Two-player match bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    players: [Player; 2],
    /// Player at the table
    pub current: PlayerId,
    /// Set once a group has been assigned
    pub ball_types_determined: bool,
    /// Set when the eight ball decides the match
    pub match_result: Option<MatchResult>,
    pub last_shot: Option<ShotSummary>,
    /// Completed shots this match
    pub shot_count: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// New match with player one breaking
    pub fn new() -> Self {
        Self {
            players: [Player::new(true), Player::new(false)],
            current: PlayerId::One,
            ball_types_determined: false,
            match_result: None,
            last_shot: None,
            shot_count: 0,
        }
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.index()]
    }

    pub fn current_player(&self) -> &Player {
        self.player(self.current)
    }

    /// Hand the table to `id` with the given number of visits
    pub fn give_turn(&mut self, id: PlayerId, shots: u32) {
        self.player_mut(id).shots_remaining = shots;
        self.player_mut(id.other()).shots_remaining = 0;
        self.current = id;
    }

    pub fn is_over(&self) -> bool {
        self.match_result.is_some()
    }
}
