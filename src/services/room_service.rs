use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tracing::info;

use crate::dto::room::SettingsPatch;
use crate::error::ServiceError;
use crate::services::{round_service, ws_events};
use crate::state::SharedState;
use crate::state::room::{Player, PlayerId, Room, Settings, Team};

/// Create a room with the requester as sole player and host, returning the
/// allocated room code.
pub async fn create_room(
    state: &SharedState,
    player_id: PlayerId,
    nickname: String,
    tx: mpsc::UnboundedSender<Message>,
) -> Result<String, ServiceError> {
    let config = state.config();
    let code = state.rooms().allocate_code();
    let avatar = config.random_unused_avatar(&[]);
    let settings = Settings {
        max_rounds: config.default_max_rounds(),
        max_players: config.default_max_players(),
        is_team_mode: false,
        song_collections: config.default_collections().to_vec(),
    };

    let room = Room::new(
        code.clone(),
        player_id,
        Player::new(nickname.clone(), avatar, tx),
        settings,
    );

    info!(code = %code, %nickname, "room created");

    // Snapshot before insertion so the creator sees the settled room.
    ws_events::broadcast_lobby(&room);
    state.rooms().insert(room);

    Ok(code)
}

/// Join an existing room, rejecting unknown codes, duplicate nicknames, and
/// full rooms.
pub async fn join_room(
    state: &SharedState,
    player_id: PlayerId,
    code: &str,
    nickname: String,
    tx: mpsc::UnboundedSender<Message>,
) -> Result<(), ServiceError> {
    let Some(room) = state.rooms().get(code) else {
        return Err(ServiceError::RoomNotFound(code.to_string()));
    };
    let mut room = room.lock().await;

    if room.nickname_taken(&nickname) {
        return Err(ServiceError::DuplicateNickname(nickname));
    }
    if room.is_full() {
        return Err(ServiceError::RoomFull(room.settings.max_players));
    }

    let avatar = state.config().random_unused_avatar(&room.used_avatars());
    room.add_player(player_id, Player::new(nickname.clone(), avatar, tx));

    info!(code = %room.code, %nickname, players = room.players.len(), "player joined");
    ws_events::broadcast_lobby(&room);
    Ok(())
}

/// Assign the requester to a team, rejecting a full team.
pub async fn select_team(
    state: &SharedState,
    code: &str,
    player_id: PlayerId,
    team: Team,
) -> Result<(), ServiceError> {
    let Some(room) = state.rooms().get(code) else {
        return Err(ServiceError::RoomNotFound(code.to_string()));
    };
    let mut room = room.lock().await;

    room.set_team(player_id, team)?;
    ws_events::broadcast_lobby(&room);
    Ok(())
}

/// Apply a host-issued settings patch.
pub async fn update_settings(
    state: &SharedState,
    code: &str,
    player_id: PlayerId,
    patch: SettingsPatch,
) -> Result<(), ServiceError> {
    let Some(room) = state.rooms().get(code) else {
        return Err(ServiceError::RoomNotFound(code.to_string()));
    };
    let mut room = room.lock().await;

    if room.host_id != player_id {
        return Err(ServiceError::NotHost);
    }

    if let Some(max_players) = patch.max_players {
        let occupancy = room.players.len() as u32;
        if max_players < occupancy {
            return Err(ServiceError::MaxPlayersBelowOccupancy { occupancy });
        }
        room.settings.max_players = max_players;
    }

    if let Some(max_rounds) = patch.max_rounds {
        room.settings.max_rounds = max_rounds;
    }

    if let Some(is_team_mode) = patch.is_team_mode {
        // Team assignments made under the previous mode no longer hold.
        room.settings.is_team_mode = is_team_mode;
        room.reset_teams();
    }

    if let Some(song_collections) = patch.song_collections {
        room.settings.song_collections = song_collections;
    }

    ws_events::broadcast_lobby(&room);
    Ok(())
}

/// Flip the requester's ready flag.
pub async fn toggle_ready(
    state: &SharedState,
    code: &str,
    player_id: PlayerId,
) -> Result<(), ServiceError> {
    let Some(room) = state.rooms().get(code) else {
        return Err(ServiceError::RoomNotFound(code.to_string()));
    };
    let mut room = room.lock().await;

    room.toggle_ready(player_id)?;
    ws_events::broadcast_lobby(&room);
    Ok(())
}

/// Start the game: validate readiness and team balance, zero the scores,
/// broadcast game start with the autocomplete titles, and arm the first round.
pub async fn start_game(
    state: &SharedState,
    code: &str,
    player_id: PlayerId,
) -> Result<(), ServiceError> {
    let Some(room) = state.rooms().get(code) else {
        return Err(ServiceError::RoomNotFound(code.to_string()));
    };
    let mut room = room.lock().await;

    if room.host_id != player_id {
        return Err(ServiceError::NotHost);
    }
    if !room.all_guests_ready() {
        return Err(ServiceError::PlayersNotReady);
    }
    if room.settings.song_collections.is_empty() {
        return Err(ServiceError::NoCollectionsSelected);
    }
    if room.settings.is_team_mode
        && (room.team_count(Team::A) == 0 || room.team_count(Team::B) == 0)
    {
        return Err(ServiceError::UnbalancedTeams);
    }

    room.reset_for_new_game();

    let autocomplete_titles = state.quiz().fetch_all_titles().await;

    info!(code = %room.code, players = room.players.len(), "game starting");
    ws_events::broadcast_game_started(&room, autocomplete_titles);

    room.timers.clear_all();
    room.timers.next_round = Some(round_service::schedule_next_round(
        state,
        code,
        state.timing().game_start_delay,
    ));

    Ok(())
}

/// Unified exit path for leave requests and socket disconnects.
///
/// Removes the player, deletes the room when it empties, hands off the host
/// role, evaluates mid-game attrition, and broadcasts the settled room state
/// exactly once.
pub async fn leave_room(state: &SharedState, code: &str, player_id: PlayerId) {
    let Some(room) = state.rooms().get(code) else {
        return;
    };
    let mut room = room.lock().await;

    let Some(departed) = room.remove_player(player_id) else {
        return;
    };

    info!(code = %room.code, nickname = %departed.nickname, "player left");

    if room.players.is_empty() {
        room.timers.clear_all();
        drop(room);
        state.rooms().remove(code);
        info!(code, "room deleted, no players remain");
        return;
    }

    ws_events::broadcast_chat(&room, format!("{} left the room", departed.nickname));

    if player_id == room.host_id {
        if let Some(new_host_id) = room.promote_next_host() {
            let new_host = &room.players[&new_host_id];
            info!(code = %room.code, nickname = %new_host.nickname, "host handed off");
            ws_events::broadcast_chat(
                &room,
                format!("{} is now the host", new_host.nickname),
            );
        }
    }

    if room.game_in_progress() && attrition_ends_game(&room) {
        info!(code = %room.code, "forced game over after player attrition");
        round_service::finish_game(&mut room);
        room.clear_ready_flags();
    }

    ws_events::broadcast_lobby(&room);
}

/// Whether the game can no longer continue after a departure: fewer than two
/// players remain, or one team emptied out in team mode.
fn attrition_ends_game(room: &Room) -> bool {
    if room.players.len() < 2 {
        return true;
    }
    room.settings.is_team_mode
        && (room.team_count(Team::A) == 0 || room.team_count(Team::B) == 0)
}
