use spectrum_core::{Game, GameEvent, GameEventHandler, GameSurface, HitPolicyKind, Viewport};
use spectrum_types::{
    Guess, LeaderboardDelta, LeaderboardEntry, NormalizedPoint, RoundTiming, Target,
};
use std::sync::{Arc, Mutex};

/// A 625x625 viewport at ratio 1 gives a 500px surface with a 50px margin.
pub fn create_test_surface() -> GameSurface {
    GameSurface::new(Viewport::new(625.0, 625.0, 1.0))
}

pub fn create_test_game() -> Game {
    Game::new(create_test_surface(), HitPolicyKind::Authoritative)
}

/// Creates a game that records every published event
pub fn create_observed_game(policy: HitPolicyKind) -> (Game, EventCollector) {
    let mut game = Game::new(create_test_surface(), policy);
    let collector = EventCollector::new();
    game.event_bus.add_handler(Box::new(collector.clone()));
    (game, collector)
}

pub fn timing(next_round_at: i64, round_duration_ms: i64) -> RoundTiming {
    RoundTiming {
        next_round_at,
        round_duration_ms,
    }
}

pub fn centered_target(size: f64) -> Target {
    Target {
        point: NormalizedPoint::new(0.5, 0.5),
        size,
    }
}

pub fn miss(id: &str, word: &str, x: f64, y: f64) -> Guess {
    Guess {
        id: id.to_string(),
        word: word.to_string(),
        point: NormalizedPoint::new(x, y),
        hit_target: false,
        win_token: None,
    }
}

pub fn hit(id: &str, word: &str, x: f64, y: f64, token: &str) -> Guess {
    Guess {
        id: id.to_string(),
        word: word.to_string(),
        point: NormalizedPoint::new(x, y),
        hit_target: true,
        win_token: Some(token.to_string()),
    }
}

pub fn leaderboard_delta(entries: &[(&str, &str, f64, f64)], timestamp: i64) -> LeaderboardDelta {
    LeaderboardDelta {
        entries: entries
            .iter()
            .map(|(id, word, x, y)| LeaderboardEntry {
                id: id.to_string(),
                word: word.to_string(),
                point: NormalizedPoint::new(*x, *y),
            })
            .collect(),
        timestamp,
    }
}

/// Submit a word and feed back the oracle's answer in one step
pub fn guess_word(game: &mut Game, word: &str, answer: Guess) {
    let pending = game.submit(word).expect("submission should be accepted");
    game.complete_submission(pending, Ok(answer));
}

/// Event collector for testing event emissions
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<GameEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn count(&self, check_fn: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| check_fn(e)).count()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&GameEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl GameEventHandler for EventCollector {
    fn handle_event(&mut self, event: GameEvent) {
        self.events.lock().unwrap().push(event);
    }
}
