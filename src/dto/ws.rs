use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dto::room::{FinalScores, PlayerSnapshot, RoomSnapshot, SettingsPatch};
use crate::dto::validation::{validate_nickname, validate_room_code};
use crate::state::room::{PlayerId, Team};

/// Errors produced while parsing or validating an inbound message.
#[derive(Debug, Error)]
pub enum InboundError {
    /// The payload is not a valid message.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// A field failed validation.
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
/// Actions accepted from game clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Create a room and become its host.
    CreateRoom {
        /// Nickname of the creating player.
        nickname: String,
    },
    /// Join an existing room by code.
    JoinRoom {
        /// Code of the room to join.
        room_code: String,
        /// Nickname of the joining player.
        nickname: String,
    },
    /// Pick a team while team mode is active.
    SelectTeam {
        /// Chosen team.
        team: Team,
    },
    /// Patch the room settings (host only).
    UpdateSettings {
        /// Fields to change.
        settings: SettingsPatch,
    },
    /// Toggle the lobby ready flag.
    PlayerReady,
    /// Start the game (host only).
    StartGame,
    /// Submit an answer for the live round.
    SubmitAnswer {
        /// Raw answer text; graded after a single trim.
        answer: String,
    },
    /// Leave the current room.
    LeaveRoom,
}

impl ClientMessage {
    /// Parse a JSON text frame and validate its fields.
    pub fn from_json_str(text: &str) -> Result<Self, InboundError> {
        let message: Self = serde_json::from_str(text)?;
        message.validate()?;
        Ok(message)
    }

    fn validate(&self) -> Result<(), InboundError> {
        match self {
            ClientMessage::CreateRoom { nickname } => {
                validate_nickname(nickname).map_err(invalid)?;
            }
            ClientMessage::JoinRoom {
                room_code,
                nickname,
            } => {
                validate_room_code(room_code).map_err(invalid)?;
                validate_nickname(nickname).map_err(invalid)?;
            }
            ClientMessage::UpdateSettings { settings } => {
                validator::Validate::validate(settings)
                    .map_err(|err| InboundError::Invalid(format!("invalid settings: {err}")))?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn invalid(err: validator::ValidationError) -> InboundError {
    let message = err
        .message
        .as_deref()
        .map(str::to_owned)
        .unwrap_or_else(|| err.code.to_string());
    InboundError::Invalid(message)
}

/// Which hint a hint-revealed event carries.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    /// Initial-consonant hint, revealed first.
    Initials,
    /// Artist name, revealed second.
    Artist,
}

#[derive(Debug, Serialize)]
/// Events broadcast to game clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The lobby changed: membership, settings, teams, or readiness.
    LobbyUpdated {
        /// Settled room snapshot.
        room: RoomSnapshot,
    },
    /// The game started.
    GameStarted {
        /// Room snapshot with zeroed scores.
        room: RoomSnapshot,
        /// Title list for answer autocompletion.
        autocomplete_titles: Vec<String>,
    },
    /// A new round began.
    NewQuiz {
        /// Translated lyrics of the quiz.
        lyrics: String,
        /// Round index, 1-based.
        current_round: u32,
        /// Total rounds of the game.
        max_rounds: u32,
        /// Display name of the quiz's collection.
        collection_name: String,
        /// Wall-clock deadline of the round, unix milliseconds.
        round_ends_at_ms: u64,
    },
    /// A scheduled hint was revealed.
    HintRevealed {
        /// Which hint.
        kind: HintKind,
        /// Hint text.
        hint: String,
    },
    /// A player answered correctly.
    CorrectAnswer {
        /// Nickname of the answering player.
        nickname: String,
        /// Their team, when team mode is active.
        team: Option<Team>,
        /// Points awarded by the time-decay schedule.
        score_gained: u32,
        /// The matched title.
        answer: String,
        /// Artist of the song.
        artist: String,
        /// Original-language lyrics.
        original_lyrics: String,
        /// Translated lyrics.
        translated_lyrics: String,
    },
    /// The round timed out; the answer is revealed.
    RoundEnded {
        /// The unmatched title.
        answer: String,
        /// Artist of the song.
        artist: String,
        /// Original-language lyrics.
        original_lyrics: String,
        /// Translated lyrics.
        translated_lyrics: String,
    },
    /// Individual-mode scoreboard update.
    PlayersUpdated {
        /// Players keyed by id.
        players: IndexMap<PlayerId, PlayerSnapshot>,
    },
    /// Team-mode scoreboard update.
    TeamScoresUpdated {
        /// Team A's pooled score.
        a: u32,
        /// Team B's pooled score.
        b: u32,
    },
    /// The game ended, naturally or by forced termination.
    GameOver {
        /// Final scores shaped by the scoring mode.
        scores: FinalScores,
        /// Whether team scoring was active.
        is_team_mode: bool,
    },
    /// Chat line, including wrong answers and lifecycle notices.
    ChatMessage {
        /// Rendered chat text.
        text: String,
    },
    /// Non-fatal game error reported to the whole room.
    GameError {
        /// Human readable description.
        message: String,
    },
    /// Validation error reported to the requesting connection only.
    Error {
        /// Human readable description.
        message: String,
    },
}
