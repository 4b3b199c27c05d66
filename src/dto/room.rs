use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::quiz::CollectionInfo;
use crate::state::room::{Player, PlayerId, Room, Team, TeamScores};

/// A selectable song collection as offered to the lobby.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSnapshot {
    /// Stable identifier used in room settings.
    pub id: String,
    /// Human readable name.
    pub display_name: String,
}

impl From<CollectionInfo> for CollectionSnapshot {
    fn from(info: CollectionInfo) -> Self {
        Self {
            id: info.id,
            display_name: info.display_name,
        }
    }
}

/// Snapshot of a player as broadcast to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    /// Display nickname.
    pub nickname: String,
    /// Cumulative score in individual mode.
    pub score: u32,
    /// Lobby readiness flag.
    pub is_ready: bool,
    /// Team assignment, when team mode is active.
    pub team: Option<Team>,
    /// Assigned avatar id.
    pub avatar: String,
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            nickname: player.nickname.clone(),
            score: player.score,
            is_ready: player.is_ready,
            team: player.team,
            avatar: player.avatar.clone(),
        }
    }
}

/// Snapshot of the room settings.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsSnapshot {
    /// Number of rounds a game runs for.
    pub max_rounds: u32,
    /// Player cap.
    pub max_players: u32,
    /// Whether team scoring is active.
    pub is_team_mode: bool,
    /// Selected song collection ids.
    pub song_collections: Vec<String>,
}

/// Full room snapshot broadcast on every lobby change.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    /// Room code.
    pub code: String,
    /// Current host's player id.
    pub host_id: PlayerId,
    /// Players keyed by id, in join order.
    pub players: IndexMap<PlayerId, PlayerSnapshot>,
    /// Current settings.
    pub settings: SettingsSnapshot,
    /// Pooled team scores.
    pub team_scores: TeamScores,
    /// Current round index, 0 while idle.
    pub current_round: u32,
}

impl From<&Room> for RoomSnapshot {
    fn from(room: &Room) -> Self {
        Self {
            code: room.code.clone(),
            host_id: room.host_id,
            players: room
                .players
                .iter()
                .map(|(id, player)| (*id, PlayerSnapshot::from(player)))
                .collect(),
            settings: SettingsSnapshot {
                max_rounds: room.settings.max_rounds,
                max_players: room.settings.max_players,
                is_team_mode: room.settings.is_team_mode,
                song_collections: room.settings.song_collections.clone(),
            },
            team_scores: room.team_scores,
            current_round: room.game.current_round,
        }
    }
}

/// Partial settings update sent by the host; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SettingsPatch {
    /// New round count.
    #[validate(range(min = 1, message = "max rounds must be at least 1"))]
    pub max_rounds: Option<u32>,
    /// New player cap.
    #[validate(range(min = 1, message = "max players must be at least 1"))]
    pub max_players: Option<u32>,
    /// New team-mode flag; providing it resets every team and ready flag.
    pub is_team_mode: Option<bool>,
    /// New set of selected song collections.
    #[validate(length(min = 1, message = "select at least one song collection"))]
    pub song_collections: Option<Vec<String>>,
}

/// Final scores carried by the game-over event, shaped by the scoring mode.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FinalScores {
    /// Pooled per-team scores in team mode.
    Teams(TeamScores),
    /// Per-player standings in individual mode.
    Players(Vec<PlayerStanding>),
}

/// One row of the individual-mode final scoreboard.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStanding {
    /// Display nickname.
    pub nickname: String,
    /// Assigned avatar id.
    pub avatar: String,
    /// Final score.
    pub score: u32,
}

impl FinalScores {
    /// Build the final scores for `room` according to its scoring mode.
    pub fn for_room(room: &Room) -> Self {
        if room.settings.is_team_mode {
            FinalScores::Teams(room.team_scores)
        } else {
            FinalScores::Players(
                room.players
                    .values()
                    .map(|player| PlayerStanding {
                        nickname: player.nickname.clone(),
                        avatar: player.avatar.clone(),
                        score: player.score,
                    })
                    .collect(),
            )
        }
    }
}
