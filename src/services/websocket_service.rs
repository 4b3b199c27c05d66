use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::ws::ClientMessage;
use crate::error::ServiceError;
use crate::services::{room_service, round_service, ws_events};
use crate::state::SharedState;
use crate::state::room::PlayerId;

/// Per-connection session: the room the connection currently belongs to.
#[derive(Default)]
struct Session {
    room_code: Option<String>,
}

/// Handle the full lifecycle for an individual player WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let player_id: PlayerId = Uuid::new_v4();
    let mut session = Session::default();

    info!(%player_id, "player connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let inbound = match ClientMessage::from_json_str(&text) {
                    Ok(inbound) => inbound,
                    Err(err) => {
                        warn!(%player_id, error = %err, "failed to parse or validate client message");
                        ws_events::send_to(
                            &outbound_tx,
                            &crate::dto::ws::ServerMessage::Error {
                                message: err.to_string(),
                            },
                        );
                        continue;
                    }
                };

                if let Err(err) =
                    dispatch(&state, player_id, &mut session, &outbound_tx, inbound).await
                {
                    ws_events::send_error(&outbound_tx, &err);
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(%player_id, "player closed connection");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%player_id, error = %err, "websocket error");
                break;
            }
        }
    }

    // Disconnect runs the same exit path as an explicit leave.
    if let Some(code) = session.room_code.take() {
        room_service::leave_room(&state, &code, player_id).await;
    }

    info!(%player_id, "player disconnected");
    finalize(writer_task, outbound_tx).await;
}

/// Route one inbound action to the controller, tracking room membership on
/// this connection.
async fn dispatch(
    state: &SharedState,
    player_id: PlayerId,
    session: &mut Session,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    message: ClientMessage,
) -> Result<(), ServiceError> {
    match message {
        ClientMessage::CreateRoom { nickname } => {
            if session.room_code.is_some() {
                return Err(ServiceError::InvalidInput("already in a room".into()));
            }
            let code =
                room_service::create_room(state, player_id, nickname, outbound_tx.clone()).await?;
            session.room_code = Some(code);
            Ok(())
        }
        ClientMessage::JoinRoom {
            room_code,
            nickname,
        } => {
            if session.room_code.is_some() {
                return Err(ServiceError::InvalidInput("already in a room".into()));
            }
            // Codes are case-insensitive on the wire; the registry stores uppercase.
            let room_code = room_code.to_ascii_uppercase();
            room_service::join_room(state, player_id, &room_code, nickname, outbound_tx.clone())
                .await?;
            session.room_code = Some(room_code);
            Ok(())
        }
        ClientMessage::SelectTeam { team } => {
            let code = require_room(session)?;
            room_service::select_team(state, &code, player_id, team).await
        }
        ClientMessage::UpdateSettings { settings } => {
            let code = require_room(session)?;
            room_service::update_settings(state, &code, player_id, settings).await
        }
        ClientMessage::PlayerReady => {
            let code = require_room(session)?;
            room_service::toggle_ready(state, &code, player_id).await
        }
        ClientMessage::StartGame => {
            let code = require_room(session)?;
            room_service::start_game(state, &code, player_id).await
        }
        ClientMessage::SubmitAnswer { answer } => {
            let code = require_room(session)?;
            round_service::submit_answer(state, &code, player_id, &answer).await
        }
        ClientMessage::LeaveRoom => {
            let code = session
                .room_code
                .take()
                .ok_or(ServiceError::NotInRoom)?;
            room_service::leave_room(state, &code, player_id).await;
            Ok(())
        }
    }
}

fn require_room(session: &Session) -> Result<String, ServiceError> {
    session.room_code.clone().ok_or(ServiceError::NotInRoom)
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
