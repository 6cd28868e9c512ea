use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use spectrum_core::{
    Clock, Frame, Game, GameEvent, GameEventHandler, GameSurface, PixelPoint, PostState, RoundId,
    SelectedPoint, Viewport, WinState, rank_wins,
};
use spectrum_types::{SpectrumLabels, Stream, ValidationError, WinTally};

use crate::config::Config;
use crate::oracle::{Oracle, OracleError};
use crate::sync::{FetchResult, Synchronizer};

/// Player input, already parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Guess(String),
    Click { x: f64, y: f64 },
    PostWin(String),
    Resize { width: f64, height: f64 },
    SetDevicePixelRatio(f64),
    ListWins,
    Show,
    Dump,
    Quit,
}

/// Everything the front-end needs besides the frame itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusLine {
    pub round: RoundId,
    pub countdown: Option<String>,
    pub labels: Option<SpectrumLabels>,
    pub guesses: usize,
    pub leaderboard: usize,
    pub submitting: bool,
    pub won_with: Option<String>,
    pub can_post: bool,
    pub selection: Option<SelectedPoint>,
    pub inline_error: Option<String>,
}

/// What the game loop has to say to whoever is displaying it.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Event(GameEvent),
    Frame { frame: Frame, status: StatusLine },
    FrameJson(String),
    Wins(Vec<(usize, WinTally)>),
    Rejected(ValidationError),
    Info(String),
}

/// Forwards game events to the display channel.
pub struct NoticeForwarder {
    notices: mpsc::UnboundedSender<Notice>,
}

impl NoticeForwarder {
    pub fn new(notices: mpsc::UnboundedSender<Notice>) -> Self {
        Self { notices }
    }
}

impl GameEventHandler for NoticeForwarder {
    fn handle_event(&mut self, event: GameEvent) {
        let _ = self.notices.send(Notice::Event(event));
    }
}

enum LoopEvent {
    Shutdown,
    Command(Option<Command>),
    Result(FetchResult),
    CountdownTick,
    LeaderboardTick,
}

/// Single owner of the game state. All network results come back here and
/// are applied in arrival order; nothing else mutates the game.
pub struct GameLoop {
    game: Game,
    sync: Synchronizer,
    results: mpsc::UnboundedReceiver<FetchResult>,
    clock: Arc<dyn Clock>,
    notices: mpsc::UnboundedSender<Notice>,
    countdown_tick: Duration,
    leaderboard_poll: Duration,
    // Round each poll was issued in; a request from an older round never
    // blocks the current one
    leaderboard_in_flight: Option<RoundId>,
    target_in_flight: Option<RoundId>,
    labels_in_flight: Option<RoundId>,
    timing_in_flight: bool,
}

impl GameLoop {
    pub fn new(
        config: &Config,
        oracle: Arc<dyn Oracle>,
        clock: Arc<dyn Clock>,
        notices: mpsc::UnboundedSender<Notice>,
    ) -> Self {
        let surface = GameSurface::with_layout(
            Viewport::new(
                config.viewport_width,
                config.viewport_height,
                config.device_pixel_ratio,
            ),
            config.surface_fill_fraction,
            config.surface_margin_px,
        );
        let mut game = Game::new(surface, config.hit_policy)
            .with_selection_tolerance(config.selection_tolerance_px);
        game.event_bus
            .add_handler(Box::new(NoticeForwarder::new(notices.clone())));

        let (sync, results) = Synchronizer::new(oracle);
        Self {
            game,
            sync,
            results,
            clock,
            notices,
            countdown_tick: config.countdown_tick(),
            leaderboard_poll: config.leaderboard_poll_interval(),
            leaderboard_in_flight: None,
            target_in_flight: None,
            labels_in_flight: None,
            timing_in_flight: false,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn in_flight(&self) -> usize {
        self.sync.in_flight()
    }

    fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }

    /// Initial fetches: round timing, target and labels.
    pub fn start(&mut self) {
        let round = self.game.round();
        info!(%round, "Starting game loop");
        self.timing_in_flight = true;
        self.sync.fetch_timing(round);
        self.fetch_missing_round_data();
    }

    /// Request target and labels for the current round unless already known
    /// or asked for.
    fn fetch_missing_round_data(&mut self) {
        let round = self.game.round();
        if self.game.target().is_none() && self.target_in_flight != Some(round) {
            self.target_in_flight = Some(round);
            self.sync.fetch_target(round);
        }
        if self.game.labels().is_none() && self.labels_in_flight != Some(round) {
            self.labels_in_flight = Some(round);
            self.sync.fetch_spectrum(round);
        }
    }

    /// Returns false when the loop should stop.
    pub fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Guess(word) => {
                if let Ok(pending) = self.game.submit(&word) {
                    self.sync.submit_guess(pending);
                }
            }
            Command::Click { x, y } => {
                self.game.click(PixelPoint::new(x, y));
            }
            Command::PostWin(username) => match self.game.begin_post_win(&username) {
                Ok(Some(pending)) => self.sync.post_win(pending),
                Ok(None) => self.notify(Notice::Info("Win already posted.".to_string())),
                Err(error) => self.notify(Notice::Rejected(error)),
            },
            Command::Resize { width, height } => {
                self.game.resize(width, height);
                self.show();
            }
            Command::SetDevicePixelRatio(ratio) => {
                self.game.set_device_pixel_ratio(ratio);
                self.show();
            }
            Command::ListWins => self.sync.list_wins(),
            Command::Show => self.show(),
            Command::Dump => match serde_json::to_string_pretty(&self.game.render()) {
                Ok(json) => self.notify(Notice::FrameJson(json)),
                Err(e) => self.notify(Notice::Info(format!("Could not encode frame: {}", e))),
            },
            Command::Quit => return false,
        }
        true
    }

    pub fn status(&self) -> StatusLine {
        let session = self.game.session();
        let (won_with, can_post) = match session.win_state() {
            WinState::Won { guess, token, post } => (
                Some(guess.word.clone()),
                token.is_some() && *post == PostState::Available,
            ),
            WinState::NotWon => (None, false),
        };
        StatusLine {
            round: self.game.round(),
            countdown: self.game.countdown_text(self.clock.now_ms()),
            labels: self.game.labels().cloned(),
            guesses: session.guesses().len(),
            leaderboard: self.game.leaderboard().len(),
            submitting: session.is_submitting(),
            won_with,
            can_post,
            selection: session.selection().cloned(),
            inline_error: session.inline_error().map(str::to_string),
        }
    }

    fn show(&self) {
        self.notify(Notice::Frame {
            frame: self.game.render(),
            status: self.status(),
        });
    }

    fn record_failure(&mut self, stream: Stream, issued_in: Option<RoundId>, error: OracleError) {
        if issued_in.is_some_and(|round| round != self.game.round()) {
            debug!(?stream, "Ignoring failure from an earlier round: {}", error);
            return;
        }
        self.game.record_fetch_failure(stream, error.to_string());
    }

    pub fn handle_result(&mut self, result: FetchResult) {
        self.sync.complete();
        debug!(issued_in = ?result.round(), "Applying oracle result");
        match result {
            FetchResult::Timing(round, outcome) => {
                self.timing_in_flight = false;
                match outcome {
                    Ok(timing) => {
                        let _ = self.game.apply_timing(round, timing);
                    }
                    Err(e) => self.record_failure(Stream::Timing, Some(round), e),
                }
            }
            FetchResult::Target(round, outcome) => {
                release(&mut self.target_in_flight, round);
                match outcome {
                    Ok(target) => {
                        let _ = self.game.apply_target(round, target);
                    }
                    Err(e) => self.record_failure(Stream::Target, Some(round), e),
                }
            }
            FetchResult::Spectrum(round, outcome) => {
                release(&mut self.labels_in_flight, round);
                match outcome {
                    Ok(labels) => {
                        let _ = self.game.apply_labels(round, labels);
                    }
                    Err(e) => self.record_failure(Stream::Spectrum, Some(round), e),
                }
            }
            FetchResult::Leaderboard(round, outcome) => {
                release(&mut self.leaderboard_in_flight, round);
                match outcome {
                    Ok(delta) => {
                        let _ = self.game.apply_leaderboard(round, delta);
                    }
                    Err(e) => self.record_failure(Stream::Leaderboard, Some(round), e),
                }
            }
            FetchResult::Guess(pending, outcome) => {
                if let Err(e) = &outcome {
                    debug!(word = %pending.word, "Guess failed: {}", e);
                }
                self.game
                    .complete_submission(pending, outcome.map_err(|e| e.server_message()));
            }
            FetchResult::PostWin(pending, outcome) => {
                if let Err(e) = &outcome {
                    debug!(username = %pending.username, "Posting win failed: {}", e);
                }
                self.game
                    .complete_post_win(pending, outcome.map_err(|e| e.server_message()));
            }
            FetchResult::Wins(outcome) => match outcome {
                Ok(wins) => self.notify(Notice::Wins(rank_wins(wins))),
                Err(e) => self.record_failure(Stream::ListWins, None, e),
            },
        }
    }

    pub fn on_countdown_tick(&mut self) {
        if self.game.tick(self.clock.now_ms()).is_some() {
            self.on_leaderboard_tick();
        }
    }

    pub fn on_leaderboard_tick(&mut self) {
        // Timing, target and labels are fetched once per round, so failures are retried here
        if self.game.clock().is_none() && !self.timing_in_flight {
            self.timing_in_flight = true;
            self.sync.fetch_timing(self.game.round());
        }
        self.fetch_missing_round_data();

        let round = self.game.round();
        if self.leaderboard_in_flight == Some(round) {
            return;
        }
        self.leaderboard_in_flight = Some(round);
        self.sync.fetch_leaderboard(round, self.game.leaderboard().cursor());
    }

    /// Wait for one oracle result and apply it.
    pub async fn process_next_result(&mut self) -> bool {
        match self.results.recv().await {
            Some(result) => {
                self.handle_result(result);
                self.sync.reap();
                true
            }
            None => false,
        }
    }

    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        shutdown: impl Future<Output = ()>,
    ) -> anyhow::Result<()> {
        self.start();

        let mut countdown = tokio::time::interval(self.countdown_tick);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick fires immediately and fetches the full leaderboard
        let mut leaderboard = tokio::time::interval(self.leaderboard_poll);
        leaderboard.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            let event = tokio::select! {
                _ = &mut shutdown => LoopEvent::Shutdown,
                command = commands.recv() => LoopEvent::Command(command),
                Some(result) = self.results.recv() => LoopEvent::Result(result),
                _ = countdown.tick() => LoopEvent::CountdownTick,
                _ = leaderboard.tick() => LoopEvent::LeaderboardTick,
            };

            match event {
                LoopEvent::Shutdown => {
                    info!("Shutdown requested, stopping game loop");
                    break;
                }
                LoopEvent::Command(None) => {
                    info!("Input closed, stopping game loop");
                    break;
                }
                LoopEvent::Command(Some(command)) => {
                    if !self.handle_command(command) {
                        info!("Quit requested, stopping game loop");
                        break;
                    }
                }
                LoopEvent::Result(result) => self.handle_result(result),
                LoopEvent::CountdownTick => self.on_countdown_tick(),
                LoopEvent::LeaderboardTick => self.on_leaderboard_tick(),
            }
            self.sync.reap();
        }

        info!(abandoned = self.sync.in_flight(), "Game loop stopped");
        Ok(())
    }
}

fn release(in_flight: &mut Option<RoundId>, round: RoundId) {
    if *in_flight == Some(round) {
        *in_flight = None;
    }
}
