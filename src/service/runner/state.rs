//! Batch run lifecycle
//!
//! The run is a small persistent state machine; modelling it explicitly keeps
//! the crash-safety properties checkable.

use thiserror::Error;

/// Lifecycle states of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Loading,
    Processing,
    /// Transient: results and checkpoint being persisted mid-run.
    Checkpointing,
    /// Interrupted cooperatively; progress saved, resumable.
    Paused,
    Completed,
}

/// Transition triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    Load,
    Start,
    Checkpoint,
    Resume,
    Interrupt,
    Finish,
}

/// An event fired in a state that does not accept it; always a bug in the
/// runner, never a data condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid run transition: {state:?} on {event:?}")]
pub struct InvalidTransition {
    pub state: RunState,
    pub event: RunEvent,
}

impl RunState {
    /// The single transition function.
    pub fn transition(self, event: RunEvent) -> Result<RunState, InvalidTransition> {
        use RunEvent::*;
        use RunState::*;

        match (self, event) {
            (Idle, Load) => Ok(Loading),
            (Loading, Start) => Ok(Processing),
            (Processing, Checkpoint) => Ok(Checkpointing),
            (Checkpointing, Resume) => Ok(Processing),
            (Processing, Interrupt) => Ok(Paused),
            (Processing, Finish) => Ok(Completed),
            (state, event) => Err(InvalidTransition { state, event }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_run_walks_the_happy_path() {
        let mut state = RunState::Idle;
        for event in [
            RunEvent::Load,
            RunEvent::Start,
            RunEvent::Checkpoint,
            RunEvent::Resume,
            RunEvent::Finish,
        ] {
            state = state.transition(event).unwrap();
        }
        assert_eq!(state, RunState::Completed);
    }

    #[test]
    fn interrupt_only_from_processing() {
        assert_eq!(
            RunState::Processing.transition(RunEvent::Interrupt),
            Ok(RunState::Paused)
        );
        assert!(RunState::Idle.transition(RunEvent::Interrupt).is_err());
        assert!(RunState::Loading.transition(RunEvent::Interrupt).is_err());
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for event in [
            RunEvent::Load,
            RunEvent::Start,
            RunEvent::Checkpoint,
            RunEvent::Resume,
            RunEvent::Interrupt,
            RunEvent::Finish,
        ] {
            assert!(RunState::Paused.transition(event).is_err());
            assert!(RunState::Completed.transition(event).is_err());
        }
    }

    #[test]
    fn checkpointing_is_transient() {
        assert!(RunState::Idle.transition(RunEvent::Checkpoint).is_err());
        assert_eq!(
            RunState::Checkpointing.transition(RunEvent::Resume),
            Ok(RunState::Processing)
        );
        assert!(RunState::Checkpointing.transition(RunEvent::Finish).is_err());
    }
}
