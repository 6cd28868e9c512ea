use spectrum_types::{Guess, Stream, ValidationError};

use crate::{RoundId, SelectedPoint};

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GuessSubmitted {
        round: RoundId,
        word: String,
    },
    GuessRejected {
        error: ValidationError,
    },
    GuessAccepted {
        round: RoundId,
        guess: Guess,
    },
    GuessFailed {
        round: RoundId,
        message: String,
    },
    Won {
        round: RoundId,
        guess: Guess,
        postable: bool,
    },
    WinPosted {
        round: RoundId,
        username: String,
    },
    WinPostFailed {
        round: RoundId,
        message: String,
    },
    RoundAdvanced {
        round: RoundId,
        next_round_at: i64,
    },
    TargetUpdated {
        round: RoundId,
    },
    SpectrumUpdated {
        round: RoundId,
    },
    LeaderboardMerged {
        round: RoundId,
        added: usize,
        total: usize,
    },
    SelectionChanged {
        selected: Option<SelectedPoint>,
    },
    StaleDiscarded {
        stream: Stream,
        issued_in: RoundId,
        current: RoundId,
    },
    FetchFailed {
        stream: Stream,
        message: String,
    },
}

impl GameEvent {
    pub fn round(&self) -> Option<RoundId> {
        match self {
            GameEvent::GuessSubmitted { round, .. }
            | GameEvent::GuessAccepted { round, .. }
            | GameEvent::GuessFailed { round, .. }
            | GameEvent::Won { round, .. }
            | GameEvent::WinPosted { round, .. }
            | GameEvent::WinPostFailed { round, .. }
            | GameEvent::RoundAdvanced { round, .. }
            | GameEvent::TargetUpdated { round }
            | GameEvent::SpectrumUpdated { round }
            | GameEvent::LeaderboardMerged { round, .. } => Some(*round),
            GameEvent::StaleDiscarded { current, .. } => Some(*current),
            GameEvent::GuessRejected { .. }
            | GameEvent::SelectionChanged { .. }
            | GameEvent::FetchFailed { .. } => None,
        }
    }
}

/// Event handler trait for reacting to game events
pub trait GameEventHandler {
    fn handle_event(&mut self, event: GameEvent);
}

/// Simple event bus for distributing game events
pub struct GameEventBus {
    handlers: Vec<Box<dyn GameEventHandler>>,
}

impl GameEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn publish(&mut self, event: GameEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }
}

impl Default for GameEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEventBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct TestHandler {
        events: Arc<Mutex<Vec<GameEvent>>>,
    }

    impl GameEventHandler for TestHandler {
        fn handle_event(&mut self, event: GameEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_event_bus_fans_out() {
        let mut bus = GameEventBus::new();
        let first = TestHandler::default();
        let second = TestHandler::default();
        bus.add_handler(Box::new(first.clone()));
        bus.add_handler(Box::new(second.clone()));

        let event = GameEvent::RoundAdvanced {
            round: RoundId::first().next(),
            next_round_at: 1_000,
        };
        bus.publish(event.clone());

        assert_eq!(bus.handler_count(), 2);
        assert_eq!(first.events.lock().unwrap().as_slice(), &[event.clone()]);
        assert_eq!(second.events.lock().unwrap().as_slice(), &[event]);
    }

    #[test]
    fn test_event_round() {
        let stale = GameEvent::StaleDiscarded {
            stream: Stream::Target,
            issued_in: RoundId::first(),
            current: RoundId::first().next(),
        };
        assert_eq!(stale.round(), Some(RoundId::first().next()));
        assert_eq!(
            GameEvent::GuessRejected {
                error: ValidationError::EmptyWord
            }
            .round(),
            None
        );
    }
}
