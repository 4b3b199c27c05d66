//! Service-level error taxonomy for room and game operations.

use thiserror::Error;
use validator::ValidationError;

use crate::quiz::QuizError;
use crate::state::room::Team;

/// Errors that can occur while handling a client action.
///
/// Validation errors are reported back to the requesting connection only and
/// leave the room state untouched.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No room is registered under the given code.
    #[error("room `{0}` does not exist")]
    RoomNotFound(String),
    /// The nickname is already taken inside the target room.
    #[error("nickname `{0}` is already in use")]
    DuplicateNickname(String),
    /// The room has reached its configured player limit.
    #[error("room is full ({0} players max)")]
    RoomFull(u32),
    /// The requester is not the host of the room.
    #[error("only the host can do that")]
    NotHost,
    /// The target team already holds its per-team cap of players.
    #[error("team {team} is full ({cap} players max)")]
    TeamFull {
        /// Team that rejected the assignment.
        team: Team,
        /// Per-team player cap, ⌈maxPlayers/2⌉.
        cap: u32,
    },
    /// Readiness was toggled in team mode before picking a team.
    #[error("select a team first")]
    NoTeamSelected,
    /// The game cannot start while a non-host player is not ready.
    #[error("some players are not ready yet")]
    PlayersNotReady,
    /// The game cannot start without at least one selected song collection.
    #[error("select at least one song collection")]
    NoCollectionsSelected,
    /// Team mode requires at least one player on each team.
    #[error("team mode needs at least one player on each team")]
    UnbalancedTeams,
    /// A settings change would shrink maxPlayers below current occupancy.
    #[error("max players cannot drop below the current {occupancy} players")]
    MaxPlayersBelowOccupancy {
        /// Number of players currently in the room.
        occupancy: u32,
    },
    /// The requester is not a member of the room it targets.
    #[error("you are not in this room")]
    NotInRoom,
    /// A payload field failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The quiz source could not supply a quiz.
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        let message = err
            .message
            .as_deref()
            .map(str::to_owned)
            .unwrap_or_else(|| err.code.to_string());
        ServiceError::InvalidInput(message)
    }
}
