use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use spectrum_client::config::Config;
use spectrum_client::oracle::{Oracle, OracleError};
use spectrum_client::runtime::{GameLoop, Notice};
use spectrum_core::{GameEvent, ManualClock};
use spectrum_types::{
    AxisLabels, Guess, LeaderboardDelta, LeaderboardEntry, NormalizedPoint, RoundTiming,
    SpectrumLabels, Target, WinTally,
};

/// Scripted in-memory oracle. Unscripted calls fail like a dropped connection.
#[derive(Default)]
pub struct FakeOracle {
    pub timing: Mutex<Option<RoundTiming>>,
    pub target: Mutex<Option<Target>>,
    pub spectrum: Mutex<Option<SpectrumLabels>>,
    pub leaderboard: Mutex<VecDeque<LeaderboardDelta>>,
    pub guesses: Mutex<HashMap<String, Result<Guess, String>>>,
    pub post_results: Mutex<VecDeque<Result<(), String>>>,
    pub wins: Mutex<Vec<WinTally>>,
    calls: Mutex<Vec<String>>,
}

fn unscripted() -> OracleError {
    OracleError::Transport("connection refused".to_string())
}

fn rejected(message: String) -> OracleError {
    OracleError::Server {
        status: 400,
        message: Some(message),
    }
}

impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// An oracle with timing, target and labels ready for a round
    pub fn with_round(next_round_at: i64, round_duration_ms: i64) -> Self {
        let oracle = Self::new();
        *oracle.timing.lock().unwrap() = Some(RoundTiming {
            next_round_at,
            round_duration_ms,
        });
        *oracle.target.lock().unwrap() = Some(Target {
            point: NormalizedPoint::new(0.5, 0.5),
            size: 0.1,
        });
        *oracle.spectrum.lock().unwrap() = Some(test_labels());
        oracle
    }

    pub fn script_guess(&self, word: &str, result: Result<Guess, String>) {
        self.guesses.lock().unwrap().insert(word.to_string(), result);
    }

    pub fn script_leaderboard(&self, delta: LeaderboardDelta) {
        self.leaderboard.lock().unwrap().push_back(delta);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, function: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.split(':').next() == Some(function))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Oracle for FakeOracle {
    async fn guess_word(&self, word: &str) -> Result<Guess, OracleError> {
        self.record(format!("guessWord:{}", word));
        match self.guesses.lock().unwrap().get(word).cloned() {
            Some(Ok(guess)) => Ok(guess),
            Some(Err(message)) => Err(rejected(message)),
            None => Err(unscripted()),
        }
    }

    async fn get_spectrum(&self) -> Result<SpectrumLabels, OracleError> {
        self.record("getSpectrum".to_string());
        self.spectrum.lock().unwrap().clone().ok_or_else(unscripted)
    }

    async fn get_target(&self) -> Result<Target, OracleError> {
        self.record("getTarget".to_string());
        self.target.lock().unwrap().ok_or_else(unscripted)
    }

    async fn get_time_until_next_graph(&self) -> Result<RoundTiming, OracleError> {
        self.record("getTimeUntilNextGraph".to_string());
        self.timing.lock().unwrap().ok_or_else(unscripted)
    }

    async fn get_leaderboard(&self, after_timestamp: i64) -> Result<LeaderboardDelta, OracleError> {
        self.record(format!("getLeaderboard:{}", after_timestamp));
        self.leaderboard
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(unscripted)
    }

    async fn post_win(&self, token: &str, username: &str) -> Result<(), OracleError> {
        self.record(format!("postWin:{}:{}", token, username));
        match self.post_results.lock().unwrap().pop_front() {
            Some(Ok(())) | None => Ok(()),
            Some(Err(message)) => Err(rejected(message)),
        }
    }

    async fn list_wins(&self) -> Result<Vec<WinTally>, OracleError> {
        self.record("listWins".to_string());
        Ok(self.wins.lock().unwrap().clone())
    }
}

pub fn test_labels() -> SpectrumLabels {
    SpectrumLabels {
        x_axis: AxisLabels {
            low: "cold".to_string(),
            high: "hot".to_string(),
        },
        y_axis: AxisLabels {
            low: "sad".to_string(),
            high: "happy".to_string(),
        },
    }
}

/// 625x625 CSS pixels at ratio 1: a 500px surface with a 50px margin
pub fn test_config() -> Config {
    Config {
        viewport_width: 625.0,
        viewport_height: 625.0,
        ..Config::default()
    }
}

pub fn guess(id: &str, word: &str, x: f64, y: f64, token: Option<&str>) -> Guess {
    Guess {
        id: id.to_string(),
        word: word.to_string(),
        point: NormalizedPoint::new(x, y),
        hit_target: token.is_some(),
        win_token: token.map(str::to_string),
    }
}

pub fn delta(entries: &[(&str, &str)], timestamp: i64) -> LeaderboardDelta {
    LeaderboardDelta {
        entries: entries
            .iter()
            .map(|(id, word)| LeaderboardEntry {
                id: id.to_string(),
                word: word.to_string(),
                point: NormalizedPoint::new(0.3, 0.3),
            })
            .collect(),
        timestamp,
    }
}

pub struct TestLoop {
    pub game_loop: GameLoop,
    pub oracle: Arc<FakeOracle>,
    pub clock: Arc<ManualClock>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

impl TestLoop {
    pub fn new(oracle: FakeOracle, now_ms: i64) -> Self {
        let oracle = Arc::new(oracle);
        let clock = Arc::new(ManualClock::new(now_ms));
        let (notices_tx, notices) = mpsc::unbounded_channel();
        let game_loop = GameLoop::new(&test_config(), oracle.clone(), clock.clone(), notices_tx);
        Self {
            game_loop,
            oracle,
            clock,
            notices,
        }
    }

    /// Start the loop and apply the initial timing, target and labels
    pub async fn started(oracle: FakeOracle, now_ms: i64) -> Self {
        let mut test = Self::new(oracle, now_ms);
        test.game_loop.start();
        test.settle().await;
        test
    }

    /// Apply results until nothing is in flight
    pub async fn settle(&mut self) {
        while self.game_loop.in_flight() > 0 {
            if !self.game_loop.process_next_result().await {
                break;
            }
        }
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            notices.push(notice);
        }
        notices
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.drain_notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Event(event) => Some(event),
                _ => None,
            })
            .collect()
    }
}
