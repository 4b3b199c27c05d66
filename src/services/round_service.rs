use std::collections::HashSet;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::task::AbortHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::dto::ws::HintKind;
use crate::error::ServiceError;
use crate::services::ws_events;
use crate::state::SharedState;
use crate::state::room::{PlayerId, Room};
use crate::state::round_machine::RoundEvent;

/// Timer callbacks the engine can arm for a room.
#[derive(Debug, Clone, Copy)]
enum TimerKind {
    FirstHint,
    SecondHint,
    RoundEnd,
    NextRound,
}

/// Spawn a timer task that re-resolves the room by code at fire time.
///
/// The returned handle goes into the room's timer bag so a superseding
/// transition can cancel the callback before it runs.
fn schedule(state: &SharedState, code: &str, delay: Duration, kind: TimerKind) -> AbortHandle {
    let state = state.clone();
    let code = code.to_string();
    tokio::spawn(async move {
        sleep(delay).await;
        match kind {
            TimerKind::FirstHint => reveal_hint(&state, &code, HintKind::Initials).await,
            TimerKind::SecondHint => reveal_hint(&state, &code, HintKind::Artist).await,
            TimerKind::RoundEnd => end_round_timeout(&state, &code).await,
            TimerKind::NextRound => start_new_round(&state, &code).await,
        }
    })
    .abort_handle()
}

/// Arm the delayed start of the next (or first) round.
pub(crate) fn schedule_next_round(state: &SharedState, code: &str, delay: Duration) -> AbortHandle {
    schedule(state, code, delay, TimerKind::NextRound)
}

/// Current wall clock in unix milliseconds, for client-side deadline display.
fn unix_now_ms() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}

/// Drive the Idle/Graded → RoundActive transition: pick a quiz, broadcast it,
/// and arm the hint and round-end timers. Ends the game when every round has
/// been played or the quiz source has no eligible songs.
pub async fn start_new_round(state: &SharedState, code: &str) {
    // The room may have been deleted between scheduling and firing.
    let Some(room) = state.rooms().get(code) else {
        return;
    };
    let mut room = room.lock().await;

    // This runs on the next-round timer's own task: drop that handle rather
    // than abort it, or the task dies at the quiz fetch await below.
    room.timers.next_round.take();
    room.timers.clear_all();

    if room.game.current_round >= room.settings.max_rounds {
        info!(code = %room.code, rounds = room.game.current_round, "game over, all rounds played");
        finish_game(&mut room);
        return;
    }

    room.game.current_round += 1;

    let selected: HashSet<String> = room.settings.song_collections.iter().cloned().collect();
    let quiz = match state.quiz().fetch_random_quiz(&selected).await {
        Ok(quiz) => quiz,
        Err(err) => {
            // The source ran dry mid-game: report it and end the game cleanly
            // with the scores accumulated so far.
            warn!(code = %room.code, error = %err, "quiz source has no eligible songs, ending game");
            ws_events::broadcast_game_error(&room, err.to_string());
            finish_game(&mut room);
            return;
        }
    };

    if let Err(err) = room.game.machine.apply(RoundEvent::BeginRound) {
        warn!(code = %room.code, error = %err, "round start rejected by lifecycle machine");
        return;
    }

    info!(
        code = %room.code,
        round = room.game.current_round,
        max_rounds = room.settings.max_rounds,
        "starting round"
    );

    let timing = state.timing();
    room.game.current_answer = Some(quiz.title);
    room.game.current_original_lyrics = Some(quiz.original_lyrics);
    room.game.current_translated_lyrics = Some(quiz.translated_lyrics);
    room.game.current_hint = Some(quiz.hint);
    room.game.current_artist = Some(quiz.artist);
    room.game.round_start = Some(Instant::now());
    room.game.round_ends_at_ms = Some(unix_now_ms() + timing.round.as_millis() as u64);

    ws_events::broadcast_new_quiz(&room, quiz.collection_display_name);

    room.timers.first_hint = Some(schedule(state, code, timing.first_hint, TimerKind::FirstHint));
    room.timers.second_hint =
        Some(schedule(state, code, timing.second_hint, TimerKind::SecondHint));
    room.timers.round_end = Some(schedule(state, code, timing.round, TimerKind::RoundEnd));
}

/// Reveal a scheduled hint, no-op when the room or round is gone.
async fn reveal_hint(state: &SharedState, code: &str, kind: HintKind) {
    let Some(room) = state.rooms().get(code) else {
        return;
    };
    let room = room.lock().await;

    if room.game.current_answer.is_none() {
        return;
    }

    let hint = match kind {
        HintKind::Initials => room.game.current_hint.clone(),
        HintKind::Artist => room.game.current_artist.clone(),
    };
    let Some(hint) = hint else {
        return;
    };

    debug!(code = %room.code, kind = ?kind, "revealing hint");
    ws_events::broadcast_hint(&room, kind, hint);
}

/// Round-end timer path: reveal the answer once and schedule the next round.
pub(crate) async fn end_round_timeout(state: &SharedState, code: &str) {
    let Some(room) = state.rooms().get(code) else {
        return;
    };
    let mut room = room.lock().await;

    // A correct answer may have graded the round between scheduling and
    // firing; the lifecycle machine rejects the second grading event.
    if room.game.current_answer.is_none()
        || room.game.machine.apply(RoundEvent::GradeByTimeout).is_err()
    {
        return;
    }

    let Some(answer) = room.game.current_answer.take() else {
        return;
    };
    room.game.round_ends_at_ms = None;

    info!(code = %room.code, round = room.game.current_round, "round timed out");
    ws_events::broadcast_round_ended(&room, answer);

    // Fired from the round-end timer's own task: drop that handle, abort the rest.
    room.timers.round_end.take();
    room.timers.clear_all();
    room.timers.next_round = Some(schedule_next_round(
        state,
        code,
        state.timing().next_round_delay,
    ));
}

/// Grade a submitted answer: award points on an exact post-trim match, or
/// broadcast the submission as chat.
pub async fn submit_answer(
    state: &SharedState,
    code: &str,
    player_id: PlayerId,
    answer: &str,
) -> Result<(), ServiceError> {
    let Some(room) = state.rooms().get(code) else {
        return Err(ServiceError::RoomNotFound(code.to_string()));
    };
    let mut room = room.lock().await;

    let player = room.players.get(&player_id).ok_or(ServiceError::NotInRoom)?;
    let nickname = player.nickname.clone();
    let team = player.team;

    // No live answer means no grading window: submissions sent from the lobby,
    // the inter-round gap, or after the round was graded are dropped.
    let matched = match room.game.current_answer.as_deref() {
        Some(correct) => answer.trim() == correct,
        None => return Ok(()),
    };

    if !matched {
        let text = if room.settings.is_team_mode {
            let label = team.map(|team| format!("Team {team}")).unwrap_or_default();
            format!("[{label}] {nickname}: {answer}")
        } else {
            format!("[{nickname}]: {answer}")
        };
        ws_events::broadcast_chat(&room, text);
        return Ok(());
    }

    if let Err(err) = room.game.machine.apply(RoundEvent::GradeByAnswer) {
        warn!(code = %room.code, error = %err, "correct answer lost the grading race");
        return Ok(());
    }

    room.timers.clear_all();

    let elapsed = room
        .game
        .round_start
        .map(|start| start.elapsed())
        .unwrap_or_default();
    let score_gained = state.timing().points_for(elapsed);

    if room.settings.is_team_mode {
        if let Some(team) = team {
            room.team_scores.award(team, score_gained);
        }
    } else if let Some(player) = room.players.get_mut(&player_id) {
        player.score += score_gained;
    }

    let answer_title = room
        .game
        .current_answer
        .take()
        .unwrap_or_else(|| answer.trim().to_string());
    room.game.round_ends_at_ms = None;

    info!(
        code = %room.code,
        %nickname,
        score_gained,
        elapsed_ms = elapsed.as_millis() as u64,
        "correct answer"
    );

    ws_events::broadcast_correct_answer(&room, nickname, team, score_gained, answer_title);
    ws_events::broadcast_scoreboard(&room);

    let code = room.code.clone();
    room.timers.next_round = Some(schedule_next_round(
        state,
        &code,
        state.timing().next_round_delay,
    ));

    Ok(())
}

/// End the game: emit final scores and reset the room to the idle phase.
pub(crate) fn finish_game(room: &mut Room) {
    room.timers.clear_all();
    ws_events::broadcast_game_over(room);
    let _ = room.game.machine.apply(RoundEvent::FinishGame);
    room.game.current_round = 0;
    room.game.clear_round();
}
