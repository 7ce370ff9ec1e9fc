//! Tennis scoring for a best-of-three match.
//!
//! Games go to four points with a two-point lead, sets to six games with a
//! two-game lead. There is no tie-break: a set runs until someone leads by two.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of sets needed to win the match.
pub const SETS_TO_WIN: usize = 2;

/// Maximum number of sets in a match.
pub const MAX_SETS: usize = 3;

const GAME_DISPLAY: [&str; 4] = ["0", "15", "30", "40"];

/// One of the two players on court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    First,
    Second,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::First, Player::Second];

    pub fn index(self) -> usize {
        match self {
            Player::First => 0,
            Player::Second => 1,
        }
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::First => write!(f, "first"),
            Player::Second => write!(f, "second"),
        }
    }
}

/// What a single point decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreEvent {
    /// The point was won but the game goes on.
    Point,
    /// The point closed a game.
    Game { winner: Player },
    /// The point closed a set. `set` is zero-based.
    Set { winner: Player, set: usize },
    /// The point closed the match.
    Match { winner: Player },
}

/// Games won by each player in one set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub games: [u32; 2],
}

impl SetScore {
    /// Winner of the set, if either player reached six games with a two-game lead.
    pub fn winner(&self) -> Option<Player> {
        Player::ALL.into_iter().find(|p| {
            let own = self.games[p.index()];
            let other = self.games[p.opponent().index()];
            own >= 6 && own >= other + 2
        })
    }
}

/// Running score of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    points: [u32; 2],
    sets: Vec<SetScore>,
    server: Player,
    games_played: u32,
    winner: Option<Player>,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Scoreboard {
    /// A fresh match with `Player::First` serving.
    pub fn new() -> Self {
        Self {
            points: [0, 0],
            sets: vec![SetScore::default()],
            server: Player::First,
            games_played: 0,
            winner: None,
        }
    }

    /// Award a point to `player`. Returns `None` once the match is over.
    pub fn award_point(&mut self, player: Player) -> Option<ScoreEvent> {
        if self.winner.is_some() {
            tracing::debug!(player = %player, "Point ignored after match end");
            return None;
        }

        self.points[player.index()] += 1;
        let own = self.points[player.index()];
        let other = self.points[player.opponent().index()];
        if own < 4 || own < other + 2 {
            return Some(ScoreEvent::Point);
        }

        // Game.
        self.points = [0, 0];
        self.games_played += 1;
        self.server = self.server.opponent();

        let set_index = self.sets.len() - 1;
        let set = &mut self.sets[set_index];
        set.games[player.index()] += 1;
        if set.winner() != Some(player) {
            return Some(ScoreEvent::Game { winner: player });
        }

        // Set.
        if self.sets_won(player) >= SETS_TO_WIN {
            self.winner = Some(player);
            tracing::info!(winner = %player, "Match finished");
            return Some(ScoreEvent::Match { winner: player });
        }
        if self.sets.len() < MAX_SETS {
            self.sets.push(SetScore::default());
        }
        Some(ScoreEvent::Set {
            winner: player,
            set: set_index,
        })
    }

    /// Current game score for `player` as shown on a scoreboard.
    pub fn game_display(&self, player: Player) -> &'static str {
        let points = self.points[player.index()] as usize;
        GAME_DISPLAY[points.min(GAME_DISPLAY.len() - 1)]
    }

    /// Raw points in the current game.
    pub fn points(&self) -> [u32; 2] {
        self.points
    }

    pub fn sets(&self) -> &[SetScore] {
        &self.sets
    }

    /// Zero-based index of the set in progress (or the last one played).
    pub fn current_set(&self) -> usize {
        self.sets.len() - 1
    }

    pub fn sets_won(&self, player: Player) -> usize {
        self.sets
            .iter()
            .filter(|s| s.winner() == Some(player))
            .count()
    }

    pub fn server(&self) -> Player {
        self.server
    }

    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
