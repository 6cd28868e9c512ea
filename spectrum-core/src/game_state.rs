use spectrum_types::{
    Guess, LeaderboardDelta, RoundTiming, SpectrumLabels, Stream, Target, ValidationError,
};
use tracing::{debug, info, warn};

use crate::{
    GameEvent, GameEventBus, GameSession, GameSurface, HitPolicyKind, LeaderboardView,
    MergeOutcome, PendingGuess, PendingPost, PixelPoint, Renderer, RenderInput, RoundClock,
    RoundId, SelectedPoint, SubmissionOutcome, WinEvaluator, consistency_check, format_remaining,
};

pub const DEFAULT_SELECTION_TOLERANCE_CSS: f64 = 10.0;

/// A response issued in an earlier round than the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("stale {stream:?} response from {issued_in} discarded in {current}")]
pub struct StaleData {
    pub stream: Stream,
    pub issued_in: RoundId,
    pub current: RoundId,
}

/// The reconciled client state: one place where the polled streams, the
/// player's session and the draw surface meet.
///
/// Every mutation from the network is tagged with the round that issued it
/// and dropped when that round is over.
#[derive(Debug)]
pub struct Game {
    round: RoundId,
    clock: Option<RoundClock>,
    target: Option<Target>,
    labels: Option<SpectrumLabels>,
    leaderboard: LeaderboardView,
    session: GameSession,
    surface: GameSurface,
    hit_policy: HitPolicyKind,
    selection_tolerance_css: f64,
    renderer: Renderer,
    pub event_bus: GameEventBus,
}

impl Game {
    pub fn new(surface: GameSurface, hit_policy: HitPolicyKind) -> Self {
        Self {
            round: RoundId::first(),
            clock: None,
            target: None,
            labels: None,
            leaderboard: LeaderboardView::new(),
            session: GameSession::new(),
            surface,
            hit_policy,
            selection_tolerance_css: DEFAULT_SELECTION_TOLERANCE_CSS,
            renderer: Renderer::new(),
            event_bus: GameEventBus::new(),
        }
    }

    pub fn with_selection_tolerance(mut self, tolerance_css: f64) -> Self {
        self.selection_tolerance_css = tolerance_css;
        self
    }

    pub fn round(&self) -> RoundId {
        self.round
    }

    pub fn clock(&self) -> Option<&RoundClock> {
        self.clock.as_ref()
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn labels(&self) -> Option<&SpectrumLabels> {
        self.labels.as_ref()
    }

    pub fn leaderboard(&self) -> &LeaderboardView {
        &self.leaderboard
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn surface(&self) -> &GameSurface {
        &self.surface
    }

    pub fn hit_policy(&self) -> HitPolicyKind {
        self.hit_policy
    }

    fn ensure_current(&mut self, stream: Stream, issued_in: RoundId) -> Result<(), StaleData> {
        if issued_in == self.round {
            return Ok(());
        }
        let stale = StaleData {
            stream,
            issued_in,
            current: self.round,
        };
        debug!("{}", stale);
        self.event_bus.publish(GameEvent::StaleDiscarded {
            stream,
            issued_in,
            current: self.round,
        });
        Err(stale)
    }

    pub fn apply_timing(&mut self, issued_in: RoundId, timing: RoundTiming) -> Result<(), StaleData> {
        self.ensure_current(Stream::Timing, issued_in)?;
        info!(
            next_round_at = timing.next_round_at,
            round_duration_ms = timing.round_duration_ms,
            "Round timing received"
        );
        self.clock = Some(RoundClock::new(timing));
        Ok(())
    }

    pub fn apply_target(&mut self, issued_in: RoundId, target: Target) -> Result<(), StaleData> {
        self.ensure_current(Stream::Target, issued_in)?;
        self.target = Some(target);
        self.event_bus
            .publish(GameEvent::TargetUpdated { round: self.round });
        self.evaluate_win();
        Ok(())
    }

    pub fn apply_labels(
        &mut self,
        issued_in: RoundId,
        labels: SpectrumLabels,
    ) -> Result<(), StaleData> {
        self.ensure_current(Stream::Spectrum, issued_in)?;
        self.labels = Some(labels);
        self.event_bus
            .publish(GameEvent::SpectrumUpdated { round: self.round });
        Ok(())
    }

    pub fn apply_leaderboard(
        &mut self,
        issued_in: RoundId,
        delta: LeaderboardDelta,
    ) -> Result<MergeOutcome, StaleData> {
        self.ensure_current(Stream::Leaderboard, issued_in)?;
        let outcome = self.leaderboard.apply(delta);
        if outcome.added > 0 || outcome.replaced {
            self.event_bus.publish(GameEvent::LeaderboardMerged {
                round: self.round,
                added: outcome.added,
                total: outcome.total,
            });
        }
        Ok(outcome)
    }

    /// A failed fetch keeps whatever was last known.
    pub fn record_fetch_failure(&mut self, stream: Stream, message: String) {
        warn!(?stream, "Fetch failed, keeping last known value: {}", message);
        self.event_bus
            .publish(GameEvent::FetchFailed { stream, message });
    }

    /// Local countdown step. Returns the new round when a boundary was crossed.
    pub fn tick(&mut self, now: i64) -> Option<RoundId> {
        let clock = self.clock.as_mut()?;
        if !clock.advance_if_due(now) {
            return None;
        }
        let next_round_at = clock.next_round_at();

        self.round = self.round.next();
        self.target = None;
        self.labels = None;
        self.leaderboard.reset();
        self.session.reset_round();
        info!(round = %self.round, next_round_at, "Round advanced");
        self.event_bus.publish(GameEvent::RoundAdvanced {
            round: self.round,
            next_round_at,
        });
        Some(self.round)
    }

    pub fn remaining_ms(&self, now: i64) -> Option<i64> {
        self.clock.map(|clock| clock.remaining_ms(now))
    }

    pub fn countdown_text(&self, now: i64) -> Option<String> {
        self.remaining_ms(now).map(format_remaining)
    }

    pub fn submit(&mut self, word: &str) -> Result<PendingGuess, ValidationError> {
        match self.session.begin_submission(self.round, word) {
            Ok(pending) => {
                self.event_bus.publish(GameEvent::GuessSubmitted {
                    round: pending.round,
                    word: pending.word.clone(),
                });
                Ok(pending)
            }
            Err(error) => {
                self.event_bus
                    .publish(GameEvent::GuessRejected { error: error.clone() });
                Err(error)
            }
        }
    }

    /// Finish a guess. `Err(Some(msg))` carries the oracle's message.
    pub fn complete_submission(
        &mut self,
        pending: PendingGuess,
        result: Result<Guess, Option<String>>,
    ) -> SubmissionOutcome {
        if self.ensure_current(Stream::Guess, pending.round).is_err() {
            return self.session.discard_submission();
        }

        let outcome = self.session.complete_submission(result);
        match &outcome {
            SubmissionOutcome::Accepted(guess) => {
                info!(word = %guess.word, x = guess.point.x, y = guess.point.y, hit = guess.hit_target, "Guess placed");
                self.check_consistency(guess);
                self.event_bus.publish(GameEvent::GuessAccepted {
                    round: self.round,
                    guess: guess.clone(),
                });
                self.event_bus.publish(GameEvent::SelectionChanged {
                    selected: self.session.selection().cloned(),
                });
                self.evaluate_win();
            }
            SubmissionOutcome::Failed(message) => {
                self.event_bus.publish(GameEvent::GuessFailed {
                    round: self.round,
                    message: message.clone(),
                });
            }
            SubmissionOutcome::Stale => {}
        }
        outcome
    }

    fn check_consistency(&self, guess: &Guess) {
        let (Some(target), Some(transform)) = (self.target.as_ref(), self.surface.transform())
        else {
            return;
        };
        if !consistency_check(guess, target, transform) {
            warn!(
                word = %guess.word,
                "Oracle reported a hit outside the local target square"
            );
        }
    }

    fn evaluate_win(&mut self) {
        let policy = self.hit_policy.build(self.surface.transform());
        let transition = WinEvaluator::evaluate(
            self.session.guesses(),
            self.target.as_ref(),
            policy.as_ref(),
            self.session.is_won(),
        );
        let Some(transition) = transition else {
            return;
        };
        let guess = transition.guess.clone();
        let postable = transition.token.is_some();
        if self.session.mark_won(transition) {
            info!(word = %guess.word, policy = policy.name(), "Target hit");
            self.event_bus.publish(GameEvent::Won {
                round: self.round,
                guess,
                postable,
            });
        }
    }

    /// Select the point under a pointer position given in device pixels.
    pub fn click(&mut self, pointer: PixelPoint) -> Option<SelectedPoint> {
        let transform = self.surface.transform()?;
        let tolerance = self.surface.css_to_device(self.selection_tolerance_css);
        let selected = self
            .session
            .select_at(pointer, &transform, &self.leaderboard, tolerance)
            .cloned();
        self.event_bus.publish(GameEvent::SelectionChanged {
            selected: selected.clone(),
        });
        selected
    }

    pub fn begin_post_win(&mut self, username: &str) -> Result<Option<PendingPost>, ValidationError> {
        self.session.begin_post_win(self.round, username)
    }

    pub fn complete_post_win(
        &mut self,
        pending: PendingPost,
        result: Result<(), Option<String>>,
    ) -> bool {
        if self.ensure_current(Stream::PostWin, pending.round).is_err() {
            return false;
        }
        let posted = self.session.complete_post_win(result);
        if posted {
            info!(username = %pending.username, "Win posted");
            self.event_bus.publish(GameEvent::WinPosted {
                round: self.round,
                username: pending.username,
            });
        } else {
            let message = self.session.inline_error().unwrap_or_default().to_string();
            self.event_bus.publish(GameEvent::WinPostFailed {
                round: self.round,
                message,
            });
        }
        posted
    }

    pub fn resize(&mut self, css_width: f64, css_height: f64) {
        self.surface.resize(css_width, css_height);
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.surface.set_device_pixel_ratio(ratio);
    }

    pub fn render(&self) -> crate::Frame {
        self.renderer.render(&RenderInput {
            surface: &self.surface,
            labels: self.labels.as_ref(),
            target: self.target.as_ref(),
            guesses: self.session.guesses(),
            leaderboard: &self.leaderboard,
            selection: self.session.selection(),
        })
    }
}
