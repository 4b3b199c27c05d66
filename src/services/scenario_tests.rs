//! End-to-end scenarios driving the controller and round engine against a
//! paused clock, asserting the events clients would observe.

use std::time::Duration;

use crate::dto::room::SettingsPatch;
use crate::error::ServiceError;
use crate::services::test_util::{
    advance, create_lobby, drain, events_of, settle, test_state, test_state_with_suspending_source,
};
use crate::services::{room_service, round_service};
use crate::state::room::Team;

#[tokio::test(start_paused = true)]
async fn individual_game_awards_full_points_and_ends_after_last_round() {
    let state = test_state(&["밤편지"]);
    let (code, mut players) = create_lobby(&state, &["player1", "player2"]).await;

    room_service::update_settings(
        &state,
        &code,
        players[0].id,
        SettingsPatch {
            max_rounds: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    room_service::toggle_ready(&state, &code, players[1].id)
        .await
        .unwrap();
    room_service::start_game(&state, &code, players[0].id)
        .await
        .unwrap();

    advance(Duration::from_millis(1_000)).await;

    let events = drain(&mut players[0]);
    assert_eq!(events_of(&events, "game_started").len(), 1);
    let quiz = events_of(&events, "new_quiz")[0];
    assert_eq!(quiz["current_round"], 1);
    assert_eq!(quiz["max_rounds"], 1);
    assert_eq!(quiz["lyrics"], "밤편지 translated lyrics");

    advance(Duration::from_millis(10_000)).await;
    round_service::submit_answer(&state, &code, players[1].id, " 밤편지 ")
        .await
        .unwrap();

    let events = drain(&mut players[1]);
    let correct = events_of(&events, "correct_answer")[0];
    assert_eq!(correct["nickname"], "player2");
    assert_eq!(correct["score_gained"], 30);
    assert_eq!(correct["answer"], "밤편지");
    assert_eq!(events_of(&events, "players_updated").len(), 1);

    advance(Duration::from_millis(5_000)).await;
    let events = drain(&mut players[0]);
    let game_over = events_of(&events, "game_over")[0];
    assert_eq!(game_over["is_team_mode"], false);
    let standings = game_over["scores"].as_array().unwrap();
    let score_of = |nickname: &str| {
        standings
            .iter()
            .find(|row| row["nickname"] == nickname)
            .unwrap()["score"]
            .clone()
    };
    assert_eq!(score_of("player1"), 0);
    assert_eq!(score_of("player2"), 30);

    let room = state.rooms().get(&code).unwrap();
    assert_eq!(room.lock().await.game.current_round, 0);
}

#[tokio::test(start_paused = true)]
async fn scoring_decays_at_the_hint_boundaries() {
    for (elapsed_ms, expected) in [(29_999, 30), (30_000, 20), (44_999, 20), (45_000, 10)] {
        let state = test_state(&["Gee"]);
        let (code, mut players) = create_lobby(&state, &["host", "guest"]).await;
        room_service::toggle_ready(&state, &code, players[1].id)
            .await
            .unwrap();
        room_service::start_game(&state, &code, players[0].id)
            .await
            .unwrap();

        advance(Duration::from_millis(1_000)).await;
        advance(Duration::from_millis(elapsed_ms)).await;

        round_service::submit_answer(&state, &code, players[1].id, "Gee")
            .await
            .unwrap();

        let events = drain(&mut players[1]);
        let correct = events_of(&events, "correct_answer")[0];
        assert_eq!(
            correct["score_gained"], expected,
            "elapsed {elapsed_ms}ms should award {expected}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn timeout_reveal_fires_exactly_once() {
    let state = test_state(&["Gee", "밤편지"]);
    let (code, mut players) = create_lobby(&state, &["host", "guest"]).await;
    room_service::toggle_ready(&state, &code, players[1].id)
        .await
        .unwrap();
    room_service::start_game(&state, &code, players[0].id)
        .await
        .unwrap();

    advance(Duration::from_millis(1_000)).await;
    drain(&mut players[0]);

    advance(Duration::from_millis(60_000)).await;
    // Fire the timeout path a second time to simulate the race with the timer.
    round_service::end_round_timeout(&state, &code).await;

    let events = drain(&mut players[0]);
    assert_eq!(events_of(&events, "round_ended").len(), 1);

    // A late submission is dropped outright: neither graded nor chatted.
    round_service::submit_answer(&state, &code, players[1].id, "Gee")
        .await
        .unwrap();
    let events = drain(&mut players[0]);
    assert!(events_of(&events, "correct_answer").is_empty());
    assert!(events_of(&events, "chat_message").is_empty());

    advance(Duration::from_millis(5_000)).await;
    let events = drain(&mut players[0]);
    assert_eq!(events_of(&events, "new_quiz")[0]["current_round"], 2);
}

#[tokio::test(start_paused = true)]
async fn correct_answer_cancels_the_timeout_reveal() {
    let state = test_state(&["Gee", "밤편지"]);
    let (code, mut players) = create_lobby(&state, &["host", "guest"]).await;
    room_service::toggle_ready(&state, &code, players[1].id)
        .await
        .unwrap();
    room_service::start_game(&state, &code, players[0].id)
        .await
        .unwrap();

    advance(Duration::from_millis(1_000)).await;
    advance(Duration::from_millis(10_000)).await;
    round_service::submit_answer(&state, &code, players[0].id, "Gee")
        .await
        .unwrap();
    drain(&mut players[0]);

    // Run well past the original round deadline: the cancelled timer must not
    // produce a reveal for the graded round.
    advance(Duration::from_millis(60_000)).await;
    let events = drain(&mut players[0]);
    assert!(events_of(&events, "round_ended").is_empty());
    assert_eq!(events_of(&events, "new_quiz")[0]["current_round"], 2);
}

#[tokio::test(start_paused = true)]
async fn team_attrition_forces_game_over() {
    let state = test_state(&["Gee", "밤편지"]);
    let (code, mut players) = create_lobby(&state, &["alpha", "bravo"]).await;

    room_service::update_settings(
        &state,
        &code,
        players[0].id,
        SettingsPatch {
            is_team_mode: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    room_service::select_team(&state, &code, players[0].id, Team::A)
        .await
        .unwrap();
    room_service::select_team(&state, &code, players[1].id, Team::B)
        .await
        .unwrap();
    room_service::toggle_ready(&state, &code, players[1].id)
        .await
        .unwrap();
    room_service::start_game(&state, &code, players[0].id)
        .await
        .unwrap();

    advance(Duration::from_millis(1_000)).await;
    round_service::submit_answer(&state, &code, players[0].id, "Gee")
        .await
        .unwrap();
    advance(Duration::from_millis(5_000)).await;
    {
        let room = state.rooms().get(&code).unwrap();
        assert_eq!(room.lock().await.game.current_round, 2);
    }
    drain(&mut players[0]);

    room_service::leave_room(&state, &code, players[1].id).await;

    let events = drain(&mut players[0]);
    let game_over = events_of(&events, "game_over")[0];
    assert_eq!(game_over["is_team_mode"], true);
    assert_eq!(game_over["scores"]["a"], 30);
    assert_eq!(game_over["scores"]["b"], 0);
    assert_eq!(events_of(&events, "lobby_updated").len(), 1);

    let room = state.rooms().get(&code).unwrap();
    let room = room.lock().await;
    assert_eq!(room.game.current_round, 0);
    assert!(room.players.values().all(|player| !player.is_ready));
}

#[tokio::test(start_paused = true)]
async fn start_game_requires_selected_collections() {
    let state = test_state(&["Gee"]);
    let (code, mut players) = create_lobby(&state, &["host", "guest"]).await;
    room_service::toggle_ready(&state, &code, players[1].id)
        .await
        .unwrap();
    {
        let room = state.rooms().get(&code).unwrap();
        room.lock().await.settings.song_collections.clear();
    }
    drain(&mut players[0]);
    drain(&mut players[1]);

    let err = room_service::start_game(&state, &code, players[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoCollectionsSelected));

    settle().await;
    let events = drain(&mut players[0]);
    assert!(events_of(&events, "game_started").is_empty());
    let room = state.rooms().get(&code).unwrap();
    assert_eq!(room.lock().await.game.current_round, 0);
}

#[tokio::test(start_paused = true)]
async fn max_players_cannot_drop_below_occupancy() {
    let state = test_state(&["Gee"]);
    let (code, mut players) = create_lobby(&state, &["one", "two", "three"]).await;
    for player in &mut players {
        drain(player);
    }

    let err = room_service::update_settings(
        &state,
        &code,
        players[0].id,
        SettingsPatch {
            max_players: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::MaxPlayersBelowOccupancy { occupancy: 3 }
    ));

    let room = state.rooms().get(&code).unwrap();
    assert_eq!(room.lock().await.settings.max_players, 8);
    // The rejected patch must not broadcast any state.
    assert!(drain(&mut players[1]).is_empty());
}

#[tokio::test(start_paused = true)]
async fn host_departure_promotes_the_next_player_and_empty_rooms_vanish() {
    let state = test_state(&["Gee"]);
    let (code, mut players) = create_lobby(&state, &["host", "second", "third"]).await;
    drain(&mut players[1]);

    room_service::leave_room(&state, &code, players[0].id).await;

    let events = drain(&mut players[1]);
    assert_eq!(events_of(&events, "lobby_updated").len(), 1);
    let chats = events_of(&events, "chat_message");
    assert!(chats.iter().any(|chat| chat["text"] == "host left the room"));
    assert!(chats.iter().any(|chat| chat["text"] == "second is now the host"));
    {
        let room = state.rooms().get(&code).unwrap();
        assert_eq!(room.lock().await.host_id, players[1].id);
    }

    room_service::leave_room(&state, &code, players[1].id).await;
    room_service::leave_room(&state, &code, players[2].id).await;
    assert!(state.rooms().get(&code).is_none());
}

#[tokio::test(start_paused = true)]
async fn join_rejects_duplicate_nicknames_and_full_rooms() {
    let state = test_state(&["Gee"]);
    let (code, players) = create_lobby(&state, &["same"]).await;

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let err = room_service::join_room(&state, uuid::Uuid::new_v4(), &code, "same".into(), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateNickname(_)));

    room_service::update_settings(
        &state,
        &code,
        players[0].id,
        SettingsPatch {
            max_players: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    room_service::join_room(&state, uuid::Uuid::new_v4(), &code, "other".into(), tx)
        .await
        .unwrap();
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let err = room_service::join_room(&state, uuid::Uuid::new_v4(), &code, "third".into(), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::RoomFull(2)));
}

#[tokio::test(start_paused = true)]
async fn host_can_restart_the_game_mid_round() {
    let state = test_state(&["Gee", "밤편지", "벚꽃 엔딩"]);
    let (code, mut players) = create_lobby(&state, &["host", "guest"]).await;
    room_service::toggle_ready(&state, &code, players[1].id)
        .await
        .unwrap();
    room_service::start_game(&state, &code, players[0].id)
        .await
        .unwrap();

    advance(Duration::from_millis(1_000)).await;
    drain(&mut players[1]);

    // Round 1 is live when the host starts over.
    room_service::start_game(&state, &code, players[0].id)
        .await
        .unwrap();
    advance(Duration::from_millis(1_000)).await;

    let events = drain(&mut players[1]);
    assert_eq!(events_of(&events, "game_started").len(), 1);
    let quiz = events_of(&events, "new_quiz")[0];
    assert_eq!(quiz["current_round"], 1);
    assert_eq!(quiz["lyrics"], "밤편지 translated lyrics");

    // The restarted game is fully playable and keeps progressing.
    round_service::submit_answer(&state, &code, players[1].id, "밤편지")
        .await
        .unwrap();
    advance(Duration::from_millis(5_000)).await;

    let events = drain(&mut players[1]);
    assert_eq!(events_of(&events, "correct_answer").len(), 1);
    assert_eq!(events_of(&events, "new_quiz")[0]["current_round"], 2);
    // The abandoned round's timers never resurface.
    assert!(events_of(&events, "round_ended").is_empty());
}

#[tokio::test(start_paused = true)]
async fn rounds_start_with_a_quiz_source_that_suspends() {
    let state = test_state_with_suspending_source(&["Gee", "밤편지"]);
    let (code, mut players) = create_lobby(&state, &["host", "guest"]).await;
    room_service::toggle_ready(&state, &code, players[1].id)
        .await
        .unwrap();
    room_service::start_game(&state, &code, players[0].id)
        .await
        .unwrap();

    advance(Duration::from_millis(1_000)).await;
    let events = drain(&mut players[0]);
    assert_eq!(events_of(&events, "new_quiz")[0]["current_round"], 1);

    // Ride through a timeout into round 2, again through the suspending fetch.
    advance(Duration::from_millis(60_000)).await;
    advance(Duration::from_millis(5_000)).await;
    let events = drain(&mut players[0]);
    assert_eq!(events_of(&events, "round_ended").len(), 1);
    assert_eq!(events_of(&events, "new_quiz")[0]["current_round"], 2);
}

#[tokio::test(start_paused = true)]
async fn submissions_without_a_live_round_are_dropped() {
    let state = test_state(&["Gee"]);
    let (code, mut players) = create_lobby(&state, &["host", "guest"]).await;
    drain(&mut players[0]);

    // Lobby-time submission: no game, nothing to grade, nothing broadcast.
    round_service::submit_answer(&state, &code, players[1].id, "Gee")
        .await
        .unwrap();
    settle().await;
    let events = drain(&mut players[0]);
    assert!(events_of(&events, "correct_answer").is_empty());
    assert!(events_of(&events, "chat_message").is_empty());

    room_service::toggle_ready(&state, &code, players[1].id)
        .await
        .unwrap();
    room_service::start_game(&state, &code, players[0].id)
        .await
        .unwrap();
    advance(Duration::from_millis(1_000)).await;
    drain(&mut players[0]);

    // Wrong answers during a live round still land in chat.
    round_service::submit_answer(&state, &code, players[1].id, "Oops")
        .await
        .unwrap();
    let events = drain(&mut players[0]);
    assert_eq!(events_of(&events, "chat_message").len(), 1);
    assert_eq!(events_of(&events, "chat_message")[0]["text"], "[guest]: Oops");
}

#[tokio::test(start_paused = true)]
async fn quiz_exhaustion_reports_error_and_ends_the_game() {
    let state = test_state(&[]);
    let (code, mut players) = create_lobby(&state, &["host", "guest"]).await;
    room_service::toggle_ready(&state, &code, players[1].id)
        .await
        .unwrap();
    room_service::start_game(&state, &code, players[0].id)
        .await
        .unwrap();

    advance(Duration::from_millis(1_000)).await;

    let events = drain(&mut players[0]);
    assert_eq!(events_of(&events, "game_error").len(), 1);
    assert_eq!(events_of(&events, "game_over").len(), 1);
    assert!(events_of(&events, "new_quiz").is_empty());

    let room = state.rooms().get(&code).unwrap();
    assert_eq!(room.lock().await.game.current_round, 0);
}
