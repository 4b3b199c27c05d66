use thiserror::Error;

/// Phases of a room's round lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundPhase {
    /// No game is running; the lobby is open for settings and readiness.
    #[default]
    Idle,
    /// A quiz is live: timers are armed and answers are graded.
    Active,
    /// The round was graded (answered or timed out) and the room waits for the
    /// next round to be scheduled.
    Graded,
}

/// Events that can be applied to the round machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// A new round starts: quiz chosen, timers armed.
    BeginRound,
    /// A player answered correctly while the round was live.
    GradeByAnswer,
    /// The round-end timer fired before anyone answered.
    GradeByTimeout,
    /// The game ends, naturally or by forced termination.
    FinishGame,
}

/// Error returned when attempting to apply an invalid transition.
///
/// The engine treats this as the losing side of a race (e.g. a timeout firing
/// after a correct answer already graded the round) and becomes a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the machine was in when the invalid event was received.
    pub from: RoundPhase,
    /// Event that cannot be applied from this phase.
    pub event: RoundEvent,
}

/// Round lifecycle state machine: Idle → Active → Graded → Active … → Idle.
#[derive(Debug, Clone, Default)]
pub struct RoundMachine {
    phase: RoundPhase,
}

impl RoundMachine {
    /// Inspect the current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Apply an event, returning the new phase or an [`InvalidTransition`].
    pub fn apply(&mut self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (RoundPhase::Idle, RoundEvent::BeginRound) => RoundPhase::Active,
            (RoundPhase::Graded, RoundEvent::BeginRound) => RoundPhase::Active,
            (RoundPhase::Active, RoundEvent::GradeByAnswer) => RoundPhase::Graded,
            (RoundPhase::Active, RoundEvent::GradeByTimeout) => RoundPhase::Graded,
            // FinishGame resets to idle from any phase so forced termination
            // always lands the room in a continuable state.
            (_, RoundEvent::FinishGame) => RoundPhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        self.phase = next;
        Ok(next)
    }
}
