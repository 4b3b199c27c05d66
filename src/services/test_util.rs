//! Shared fixtures for service-level tests: a scripted quiz source, lobby
//! setup helpers, and outbound event draining.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::Message;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashSet;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::quiz::{CollectionInfo, Quiz, QuizError, QuizSource};
use crate::services::room_service;
use crate::state::room::PlayerId;
use crate::state::{AppState, SharedState};

/// Quiz source that hands out a scripted sequence of quizzes, then runs dry.
pub struct ScriptedQuizzes {
    quizzes: Mutex<VecDeque<Quiz>>,
    titles: Vec<String>,
}

impl ScriptedQuizzes {
    /// Script one quiz per title, in order.
    pub fn new(titles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            quizzes: Mutex::new(titles.iter().map(|title| quiz(title)).collect()),
            titles: titles.iter().map(|title| title.to_string()).collect(),
        })
    }
}

/// Build a quiz with recognizable reveal fields for `title`.
pub fn quiz(title: &str) -> Quiz {
    Quiz {
        title: title.to_string(),
        artist: format!("{title} singer"),
        original_lyrics: format!("{title} original lyrics"),
        translated_lyrics: format!("{title} translated lyrics"),
        hint: format!("{title} hint"),
        collection_display_name: "K-Pop Classics".into(),
    }
}

impl QuizSource for ScriptedQuizzes {
    fn fetch_random_quiz(
        &self,
        _collections: &HashSet<String>,
    ) -> BoxFuture<'static, Result<Quiz, QuizError>> {
        let next = self
            .quizzes
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(QuizError::NoEligibleSongs);
        Box::pin(async move { next })
    }

    fn fetch_all_titles(&self) -> BoxFuture<'static, Vec<String>> {
        let titles = self.titles.clone();
        Box::pin(async move { titles })
    }

    fn list_collections(&self) -> BoxFuture<'static, Vec<CollectionInfo>> {
        Box::pin(async move {
            vec![CollectionInfo {
                id: "kpop-classics".into(),
                display_name: "K-Pop Classics".into(),
            }]
        })
    }
}

/// Fresh application state over a scripted quiz source.
pub fn test_state(titles: &[&str]) -> SharedState {
    AppState::new(AppConfig::default(), ScriptedQuizzes::new(titles))
}

/// Scripted quiz source that yields to the scheduler before resolving, the
/// way a store backed by real I/O suspends at its first await.
pub struct YieldingQuizzes(Arc<ScriptedQuizzes>);

impl YieldingQuizzes {
    /// Script one quiz per title, each resolved after a suspension point.
    pub fn new(titles: &[&str]) -> Arc<Self> {
        Arc::new(Self(ScriptedQuizzes::new(titles)))
    }
}

impl QuizSource for YieldingQuizzes {
    fn fetch_random_quiz(
        &self,
        collections: &HashSet<String>,
    ) -> BoxFuture<'static, Result<Quiz, QuizError>> {
        let inner = self.0.fetch_random_quiz(collections);
        Box::pin(async move {
            tokio::task::yield_now().await;
            inner.await
        })
    }

    fn fetch_all_titles(&self) -> BoxFuture<'static, Vec<String>> {
        let inner = self.0.fetch_all_titles();
        Box::pin(async move {
            tokio::task::yield_now().await;
            inner.await
        })
    }

    fn list_collections(&self) -> BoxFuture<'static, Vec<CollectionInfo>> {
        self.0.list_collections()
    }
}

/// Fresh application state over a quiz source that suspends before resolving.
pub fn test_state_with_suspending_source(titles: &[&str]) -> SharedState {
    AppState::new(AppConfig::default(), YieldingQuizzes::new(titles))
}

/// A connected player from the tests' point of view.
pub struct TestPlayer {
    /// Connection id used in service calls.
    pub id: PlayerId,
    /// Receiving end of the player's writer channel.
    pub rx: mpsc::UnboundedReceiver<Message>,
}

/// Create a room with the first nickname as host and join the rest.
pub async fn create_lobby(state: &SharedState, nicknames: &[&str]) -> (String, Vec<TestPlayer>) {
    let mut players = Vec::new();

    let (tx, rx) = mpsc::unbounded_channel();
    let host_id = Uuid::new_v4();
    let code = room_service::create_room(state, host_id, nicknames[0].into(), tx)
        .await
        .unwrap();
    players.push(TestPlayer { id: host_id, rx });

    for nickname in &nicknames[1..] {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        room_service::join_room(state, id, &code, (*nickname).into(), tx)
            .await
            .unwrap();
        players.push(TestPlayer { id, rx });
    }

    (code, players)
}

/// Pull every queued outbound frame and parse the text ones as JSON.
pub fn drain(player: &mut TestPlayer) -> Vec<Value> {
    let mut events = Vec::new();
    while let Ok(message) = player.rx.try_recv() {
        if let Message::Text(text) = message {
            events.push(serde_json::from_str(text.as_str()).unwrap());
        }
    }
    events
}

/// Events of a given wire type from a drained batch.
pub fn events_of<'a>(events: &'a [Value], kind: &str) -> Vec<&'a Value> {
    events
        .iter()
        .filter(|event| event["type"] == kind)
        .collect()
}

/// Let spawned timer tasks register their sleeps or run their callbacks.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

/// Settle, move the paused clock forward, then settle again so timers that
/// came due actually run.
pub async fn advance(duration: Duration) {
    settle().await;
    tokio::time::advance(duration).await;
    settle().await;
}
