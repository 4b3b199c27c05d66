use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tracing::warn;

use crate::dto::room::{FinalScores, PlayerSnapshot, RoomSnapshot};
use crate::dto::ws::{HintKind, ServerMessage};
use crate::error::ServiceError;
use crate::state::room::{Room, Team};

/// Serialize a message and push it onto a single connection's writer channel.
///
/// Serialization failures are logged and dropped; a closed writer means the
/// peer is already disconnecting and its exit path will clean up.
pub fn send_to(tx: &mpsc::UnboundedSender<Message>, message: &ServerMessage) {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize outbound message `{message:?}`");
            return;
        }
    };
    let _ = tx.send(Message::Text(payload.into()));
}

/// Reply a validation error to the requesting connection only.
pub fn send_error(tx: &mpsc::UnboundedSender<Message>, err: &ServiceError) {
    send_to(
        tx,
        &ServerMessage::Error {
            message: err.to_string(),
        },
    );
}

/// Push a message to every player in the room.
pub fn broadcast(room: &Room, message: &ServerMessage) {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize broadcast message `{message:?}`");
            return;
        }
    };
    for player in room.players.values() {
        let _ = player.tx.send(Message::Text(payload.clone().into()));
    }
}

/// Broadcast the settled room snapshot after a lobby change.
pub fn broadcast_lobby(room: &Room) {
    broadcast(
        room,
        &ServerMessage::LobbyUpdated {
            room: RoomSnapshot::from(room),
        },
    );
}

/// Broadcast game start with the autocomplete title list.
pub fn broadcast_game_started(room: &Room, autocomplete_titles: Vec<String>) {
    broadcast(
        room,
        &ServerMessage::GameStarted {
            room: RoomSnapshot::from(room),
            autocomplete_titles,
        },
    );
}

/// Broadcast the start of a round from the populated game state.
pub fn broadcast_new_quiz(room: &Room, collection_name: String) {
    let Some(lyrics) = room.game.current_translated_lyrics.clone() else {
        warn!(code = %room.code, "new quiz broadcast without populated lyrics");
        return;
    };
    broadcast(
        room,
        &ServerMessage::NewQuiz {
            lyrics,
            current_round: room.game.current_round,
            max_rounds: room.settings.max_rounds,
            collection_name,
            round_ends_at_ms: room.game.round_ends_at_ms.unwrap_or_default(),
        },
    );
}

/// Broadcast a scheduled hint reveal.
pub fn broadcast_hint(room: &Room, kind: HintKind, hint: String) {
    broadcast(room, &ServerMessage::HintRevealed { kind, hint });
}

/// Broadcast the timeout reveal for the current round.
pub fn broadcast_round_ended(room: &Room, answer: String) {
    broadcast(
        room,
        &ServerMessage::RoundEnded {
            answer,
            artist: room.game.current_artist.clone().unwrap_or_default(),
            original_lyrics: room.game.current_original_lyrics.clone().unwrap_or_default(),
            translated_lyrics: room
                .game
                .current_translated_lyrics
                .clone()
                .unwrap_or_default(),
        },
    );
}

/// Broadcast a graded correct answer.
pub fn broadcast_correct_answer(
    room: &Room,
    nickname: String,
    team: Option<Team>,
    score_gained: u32,
    answer: String,
) {
    broadcast(
        room,
        &ServerMessage::CorrectAnswer {
            nickname,
            team,
            score_gained,
            answer,
            artist: room.game.current_artist.clone().unwrap_or_default(),
            original_lyrics: room.game.current_original_lyrics.clone().unwrap_or_default(),
            translated_lyrics: room
                .game
                .current_translated_lyrics
                .clone()
                .unwrap_or_default(),
        },
    );
}

/// Broadcast the scoreboard matching the room's scoring mode.
pub fn broadcast_scoreboard(room: &Room) {
    if room.settings.is_team_mode {
        broadcast(
            room,
            &ServerMessage::TeamScoresUpdated {
                a: room.team_scores.a,
                b: room.team_scores.b,
            },
        );
    } else {
        broadcast(
            room,
            &ServerMessage::PlayersUpdated {
                players: room
                    .players
                    .iter()
                    .map(|(id, player)| (*id, PlayerSnapshot::from(player)))
                    .collect(),
            },
        );
    }
}

/// Broadcast the final scores when the game ends.
pub fn broadcast_game_over(room: &Room) {
    broadcast(
        room,
        &ServerMessage::GameOver {
            scores: FinalScores::for_room(room),
            is_team_mode: room.settings.is_team_mode,
        },
    );
}

/// Broadcast a chat line to the room.
pub fn broadcast_chat(room: &Room, text: String) {
    broadcast(room, &ServerMessage::ChatMessage { text });
}

/// Broadcast a non-fatal game error to the whole room.
pub fn broadcast_game_error(room: &Room, message: String) {
    broadcast(room, &ServerMessage::GameError { message });
}
