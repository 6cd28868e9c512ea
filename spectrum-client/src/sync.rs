use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;

use spectrum_core::{PendingGuess, PendingPost, RoundId};
use spectrum_types::{Guess, LeaderboardDelta, RoundTiming, SpectrumLabels, Target, WinTally};

use crate::oracle::{Oracle, OracleError};

/// A finished oracle call, tagged with whatever the game loop needs to
/// decide whether it still applies.
#[derive(Debug)]
pub enum FetchResult {
    Timing(RoundId, Result<RoundTiming, OracleError>),
    Target(RoundId, Result<Target, OracleError>),
    Spectrum(RoundId, Result<SpectrumLabels, OracleError>),
    Leaderboard(RoundId, Result<LeaderboardDelta, OracleError>),
    Guess(PendingGuess, Result<Guess, OracleError>),
    PostWin(PendingPost, Result<(), OracleError>),
    Wins(Result<Vec<WinTally>, OracleError>),
}

impl FetchResult {
    pub fn round(&self) -> Option<RoundId> {
        match self {
            FetchResult::Timing(round, _)
            | FetchResult::Target(round, _)
            | FetchResult::Spectrum(round, _)
            | FetchResult::Leaderboard(round, _) => Some(*round),
            FetchResult::Guess(pending, _) => Some(pending.round),
            FetchResult::PostWin(pending, _) => Some(pending.round),
            FetchResult::Wins(_) => None,
        }
    }
}

/// Issues oracle calls as background tasks and reports each result on a
/// channel. Dropping the synchronizer aborts whatever is still running.
pub struct Synchronizer {
    oracle: Arc<dyn Oracle>,
    tasks: JoinSet<()>,
    results: mpsc::UnboundedSender<FetchResult>,
    outstanding: usize,
}

impl Synchronizer {
    pub fn new(oracle: Arc<dyn Oracle>) -> (Self, mpsc::UnboundedReceiver<FetchResult>) {
        let (results, receiver) = mpsc::unbounded_channel();
        let sync = Self {
            oracle,
            tasks: JoinSet::new(),
            results,
            outstanding: 0,
        };
        (sync, receiver)
    }

    /// Calls whose result has not been handed back through [`complete`](Self::complete).
    pub fn in_flight(&self) -> usize {
        self.outstanding
    }

    /// Note that one result was taken off the channel.
    pub fn complete(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }

    fn spawn<F>(&mut self, name: &'static str, call: F)
    where
        F: std::future::Future<Output = FetchResult> + Send + 'static,
    {
        let results = self.results.clone();
        self.outstanding += 1;
        self.tasks.spawn(async move {
            let result = call.await;
            if results.send(result).is_err() {
                debug!(name, "Game loop gone, dropping result");
            }
        });
    }

    /// Drop finished tasks from the set.
    pub fn reap(&mut self) {
        while self.tasks.try_join_next().is_some() {}
    }

    pub fn fetch_timing(&mut self, round: RoundId) {
        let oracle = self.oracle.clone();
        self.spawn("timing", async move {
            FetchResult::Timing(round, oracle.get_time_until_next_graph().await)
        });
    }

    pub fn fetch_target(&mut self, round: RoundId) {
        let oracle = self.oracle.clone();
        self.spawn("target", async move {
            FetchResult::Target(round, oracle.get_target().await)
        });
    }

    pub fn fetch_spectrum(&mut self, round: RoundId) {
        let oracle = self.oracle.clone();
        self.spawn("spectrum", async move {
            FetchResult::Spectrum(round, oracle.get_spectrum().await)
        });
    }

    pub fn fetch_leaderboard(&mut self, round: RoundId, after_timestamp: i64) {
        let oracle = self.oracle.clone();
        self.spawn("leaderboard", async move {
            FetchResult::Leaderboard(round, oracle.get_leaderboard(after_timestamp).await)
        });
    }

    pub fn submit_guess(&mut self, pending: PendingGuess) {
        let oracle = self.oracle.clone();
        self.spawn("guess", async move {
            let result = oracle.guess_word(&pending.word).await;
            FetchResult::Guess(pending, result)
        });
    }

    pub fn post_win(&mut self, pending: PendingPost) {
        let oracle = self.oracle.clone();
        self.spawn("post_win", async move {
            let result = oracle.post_win(&pending.token, &pending.username).await;
            FetchResult::PostWin(pending, result)
        });
    }

    pub fn list_wins(&mut self) {
        let oracle = self.oracle.clone();
        self.spawn("list_wins", async move {
            FetchResult::Wins(oracle.list_wins().await)
        });
    }
}
