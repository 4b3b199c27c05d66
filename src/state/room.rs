use std::fmt;

use axum::extract::ws::Message;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::state::round_machine::RoundMachine;

/// Identifier of a player, allocated per WebSocket connection.
pub type PlayerId = Uuid;

/// One of the two teams a player can join in team mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    /// Team A.
    A,
    /// Team B.
    B,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::A => write!(f, "A"),
            Team::B => write!(f, "B"),
        }
    }
}

/// Pooled scores for team mode, reset at game start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamScores {
    /// Team A's pooled score.
    pub a: u32,
    /// Team B's pooled score.
    pub b: u32,
}

impl TeamScores {
    /// Add `points` to `team`'s pooled score.
    pub fn award(&mut self, team: Team, points: u32) {
        match team {
            Team::A => self.a += points,
            Team::B => self.b += points,
        }
    }
}

/// A player inside a room, created on join and removed on leave/disconnect.
#[derive(Debug)]
pub struct Player {
    /// Display nickname, unique within the room at join time.
    pub nickname: String,
    /// Cumulative score in individual mode.
    pub score: u32,
    /// Whether the player flagged themselves ready in the lobby.
    pub is_ready: bool,
    /// Team assignment; meaningful only in team mode.
    pub team: Option<Team>,
    /// Avatar id assigned from the catalog on join.
    pub avatar: String,
    /// Handle used to push messages to the player's WebSocket.
    pub tx: mpsc::UnboundedSender<Message>,
}

impl Player {
    /// Build a fresh player with zeroed game state.
    pub fn new(nickname: String, avatar: String, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            nickname,
            score: 0,
            is_ready: false,
            team: None,
            avatar,
            tx,
        }
    }
}

/// Room settings, changed by the host from the lobby.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Number of rounds a game runs for.
    pub max_rounds: u32,
    /// Player cap; never reducible below current occupancy.
    pub max_players: u32,
    /// Whether scoring is pooled per team instead of per player.
    pub is_team_mode: bool,
    /// Song collections quizzes are drawn from.
    pub song_collections: Vec<String>,
}

impl Settings {
    /// Per-team cap derived from the player cap, ⌈maxPlayers/2⌉.
    pub fn team_cap(&self) -> u32 {
        self.max_players.div_ceil(2)
    }
}

/// Live quiz state, mutated exclusively by the round engine and grading path.
#[derive(Debug, Default)]
pub struct GameState {
    /// Round lifecycle machine guarding engine re-entry.
    pub machine: RoundMachine,
    /// 0 when idle, 1..=maxRounds while a game runs.
    pub current_round: u32,
    /// Title to match; `None` doubles as the "already graded" sentinel.
    pub current_answer: Option<String>,
    /// Original-language lyrics of the active quiz.
    pub current_original_lyrics: Option<String>,
    /// Translated lyrics of the active quiz.
    pub current_translated_lyrics: Option<String>,
    /// Initial-consonant hint of the active quiz.
    pub current_hint: Option<String>,
    /// Artist of the active quiz, revealed as the second hint.
    pub current_artist: Option<String>,
    /// Start of the grading window.
    pub round_start: Option<Instant>,
    /// Wall-clock deadline of the round, for remaining-time display.
    pub round_ends_at_ms: Option<u64>,
}

impl GameState {
    /// Drop every per-round field, keeping the round counter.
    pub fn clear_round(&mut self) {
        self.current_answer = None;
        self.current_original_lyrics = None;
        self.current_translated_lyrics = None;
        self.current_hint = None;
        self.current_artist = None;
        self.round_start = None;
        self.round_ends_at_ms = None;
    }
}

/// Named bag of the pending timers owned by a room.
///
/// Timer tasks are keyed by room code and re-resolve the room at fire time;
/// the bag only stores abort handles so superseded timers can be cancelled.
#[derive(Debug, Default)]
pub struct RoundTimers {
    /// First hint reveal (initial consonants).
    pub first_hint: Option<AbortHandle>,
    /// Second hint reveal (artist).
    pub second_hint: Option<AbortHandle>,
    /// End-of-round reveal.
    pub round_end: Option<AbortHandle>,
    /// Delayed start of the next round (also the game-start delay).
    pub next_round: Option<AbortHandle>,
}

impl RoundTimers {
    /// Cancel every pending timer and empty the bag. No-op when already empty.
    pub fn clear_all(&mut self) {
        for handle in [
            self.first_hint.take(),
            self.second_hint.take(),
            self.round_end.take(),
            self.next_round.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

/// A single game session identified by a short code.
#[derive(Debug)]
pub struct Room {
    /// Short unique code players join with.
    pub code: String,
    /// Connection currently privileged to change settings and start the game.
    pub host_id: PlayerId,
    /// Players keyed by connection id, in join order.
    pub players: IndexMap<PlayerId, Player>,
    /// Current lobby settings.
    pub settings: Settings,
    /// Pooled team scores; meaningful only in team mode.
    pub team_scores: TeamScores,
    /// Live quiz state.
    pub game: GameState,
    /// Pending timers for this room.
    pub timers: RoundTimers,
}

impl Room {
    /// Build a room with `host` as its sole player.
    pub fn new(code: String, host_id: PlayerId, host: Player, settings: Settings) -> Self {
        let mut players = IndexMap::new();
        players.insert(host_id, host);
        Self {
            code,
            host_id,
            players,
            settings,
            team_scores: TeamScores::default(),
            game: GameState::default(),
            timers: RoundTimers::default(),
        }
    }

    /// Whether `nickname` is already used by a player in this room.
    pub fn nickname_taken(&self, nickname: &str) -> bool {
        self.players
            .values()
            .any(|player| player.nickname == nickname)
    }

    /// Whether the room is at its player cap.
    pub fn is_full(&self) -> bool {
        self.players.len() as u32 >= self.settings.max_players
    }

    /// Number of players currently assigned to `team`.
    pub fn team_count(&self, team: Team) -> u32 {
        self.players
            .values()
            .filter(|player| player.team == Some(team))
            .count() as u32
    }

    /// Avatar ids currently in use, for catalog assignment.
    pub fn used_avatars(&self) -> Vec<&str> {
        self.players
            .values()
            .map(|player| player.avatar.as_str())
            .collect()
    }

    /// Add a joining player. Nickname uniqueness and fullness are checked by
    /// the controller before calling this.
    pub fn add_player(&mut self, id: PlayerId, player: Player) {
        self.players.insert(id, player);
    }

    /// Remove a departing player, returning it if present.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.players.shift_remove(&id)
    }

    /// Assign `id` to `team`, rejecting when the team is at its cap.
    ///
    /// Switching teams drops the player's ready flag: their readiness was
    /// declared under the previous assignment.
    pub fn set_team(&mut self, id: PlayerId, team: Team) -> Result<(), ServiceError> {
        let cap = self.settings.team_cap();
        if self.team_count(team) >= cap {
            return Err(ServiceError::TeamFull { team, cap });
        }

        let player = self.players.get_mut(&id).ok_or(ServiceError::NotInRoom)?;
        player.team = Some(team);
        player.is_ready = false;
        Ok(())
    }

    /// Flip `id`'s ready flag, rejecting in team mode while no team is picked.
    pub fn toggle_ready(&mut self, id: PlayerId) -> Result<bool, ServiceError> {
        let is_team_mode = self.settings.is_team_mode;
        let player = self.players.get_mut(&id).ok_or(ServiceError::NotInRoom)?;

        if is_team_mode && player.team.is_none() {
            return Err(ServiceError::NoTeamSelected);
        }

        player.is_ready = !player.is_ready;
        Ok(player.is_ready)
    }

    /// Reset every player's team and ready flag; team validity no longer holds
    /// after the team-mode setting flips.
    pub fn reset_teams(&mut self) {
        for player in self.players.values_mut() {
            player.team = None;
            player.is_ready = false;
        }
    }

    /// Drop every ready flag, e.g. after a forced game end.
    pub fn clear_ready_flags(&mut self) {
        for player in self.players.values_mut() {
            player.is_ready = false;
        }
    }

    /// Zero all scores and reset the whole game state ahead of a fresh game.
    ///
    /// Also lands the round machine back in the idle phase, so starting a new
    /// game over a round still in flight is a clean restart.
    pub fn reset_for_new_game(&mut self) {
        for player in self.players.values_mut() {
            player.score = 0;
        }
        self.team_scores = TeamScores::default();
        self.game = GameState::default();
    }

    /// Promote the first remaining player to host, returning the new host id.
    ///
    /// Must only be called while the room still has players.
    pub fn promote_next_host(&mut self) -> Option<PlayerId> {
        let next = *self.players.keys().next()?;
        self.host_id = next;
        Some(next)
    }

    /// Whether a game is currently in progress.
    pub fn game_in_progress(&self) -> bool {
        self.game.current_round > 0
    }

    /// Whether every non-host player has flagged ready.
    pub fn all_guests_ready(&self) -> bool {
        self.players
            .iter()
            .all(|(id, player)| *id == self.host_id || player.is_ready)
    }
}
