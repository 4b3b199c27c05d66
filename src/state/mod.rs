//! Shared application state: room registry, quiz source handle, timing.

/// Room registry keyed by room code.
pub mod registry;
/// Room, player, and settings data model.
pub mod room;
/// Round lifecycle state machine.
pub mod round_machine;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::quiz::QuizSource;

pub use self::registry::RoomRegistry;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Fixed schedule of a round and its surrounding delays.
#[derive(Debug, Clone, Copy)]
pub struct RoundTiming {
    /// Offset of the initial-consonant hint reveal; also the 30-point cutoff.
    pub first_hint: Duration,
    /// Offset of the artist hint reveal; also the 20-point cutoff.
    pub second_hint: Duration,
    /// Full round duration before the timeout reveal.
    pub round: Duration,
    /// Pause between a graded round and the next one.
    pub next_round_delay: Duration,
    /// Pause between game start and the first round, to let clients render.
    pub game_start_delay: Duration,
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self {
            first_hint: Duration::from_millis(30_000),
            second_hint: Duration::from_millis(45_000),
            round: Duration::from_millis(60_000),
            next_round_delay: Duration::from_millis(5_000),
            game_start_delay: Duration::from_millis(1_000),
        }
    }
}

impl RoundTiming {
    /// Points awarded for a correct answer after `elapsed` time.
    pub fn points_for(&self, elapsed: Duration) -> u32 {
        if elapsed < self.first_hint {
            30
        } else if elapsed < self.second_hint {
            20
        } else {
            10
        }
    }
}

/// Central application state shared by every connection and timer task.
pub struct AppState {
    config: AppConfig,
    quiz: Arc<dyn QuizSource>,
    rooms: RoomRegistry,
    timing: RoundTiming,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, quiz: Arc<dyn QuizSource>) -> SharedState {
        Arc::new(Self {
            config,
            quiz,
            rooms: RoomRegistry::default(),
            timing: RoundTiming::default(),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the quiz source collaborator.
    pub fn quiz(&self) -> &Arc<dyn QuizSource> {
        &self.quiz
    }

    /// Registry of live rooms.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Round schedule and scoring cutoffs.
    pub fn timing(&self) -> &RoundTiming {
        &self.timing
    }
}
