use serde::Serialize;
use spectrum_types::{Guess, NormalizedPoint, ValidationError};

use crate::{LeaderboardView, PixelPoint, RoundId, SurfaceTransform, WinTransition};

pub const GENERIC_SUBMIT_FAILURE: &str = "Failed to fetch data from the API. Please try again.";
pub const GENERIC_POST_FAILURE: &str = "Failed to post your win. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionSource {
    Own,
    Leaderboard,
}

/// The single annotated point on the surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedPoint {
    pub point: NormalizedPoint,
    pub word: String,
    pub source: SelectionSource,
}

/// Ticket for an in-flight guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingGuess {
    pub round: RoundId,
    pub word: String,
}

/// Ticket for an in-flight win post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPost {
    pub round: RoundId,
    pub token: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting(PendingGuess),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostState {
    Available,
    Posting,
    Posted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WinState {
    NotWon,
    Won {
        guess: Guess,
        token: Option<String>,
        post: PostState,
    },
}

/// What finishing a submission did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Accepted(Guess),
    Failed(String),
    Stale,
}

/// One player's state for the current round: own guesses, submission and win
/// state machines, selection, and the inline message shown next to the input.
#[derive(Debug, Clone)]
pub struct GameSession {
    guesses: Vec<Guess>,
    submit_state: SubmitState,
    win_state: WinState,
    selection: Option<SelectedPoint>,
    inline_error: Option<String>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            guesses: Vec::new(),
            submit_state: SubmitState::Idle,
            win_state: WinState::NotWon,
            selection: None,
            inline_error: None,
        }
    }

    pub fn guesses(&self) -> &[Guess] {
        &self.guesses
    }

    pub fn submit_state(&self) -> &SubmitState {
        &self.submit_state
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.submit_state, SubmitState::Submitting(_))
    }

    pub fn win_state(&self) -> &WinState {
        &self.win_state
    }

    pub fn is_won(&self) -> bool {
        matches!(self.win_state, WinState::Won { .. })
    }

    pub fn selection(&self) -> Option<&SelectedPoint> {
        self.selection.as_ref()
    }

    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    /// Validate and enter `Submitting`. No state changes on a validation error
    /// besides the inline message.
    pub fn begin_submission(
        &mut self,
        round: RoundId,
        word: &str,
    ) -> Result<PendingGuess, ValidationError> {
        let word = word.trim();
        if word.is_empty() {
            self.inline_error = Some(ValidationError::EmptyWord.to_string());
            return Err(ValidationError::EmptyWord);
        }
        if self.is_submitting() {
            return Err(ValidationError::SubmissionInFlight);
        }
        let pending = PendingGuess {
            round,
            word: word.to_string(),
        };
        self.inline_error = None;
        self.submit_state = SubmitState::Submitting(pending.clone());
        Ok(pending)
    }

    /// Leave `Submitting`. A success appends and selects the guess; a failure
    /// sets the server's message or a generic one.
    pub fn complete_submission(&mut self, result: Result<Guess, Option<String>>) -> SubmissionOutcome {
        self.submit_state = SubmitState::Idle;
        match result {
            Ok(guess) => {
                self.selection = Some(SelectedPoint {
                    point: guess.point,
                    word: guess.word.clone(),
                    source: SelectionSource::Own,
                });
                self.guesses.push(guess.clone());
                SubmissionOutcome::Accepted(guess)
            }
            Err(message) => {
                let message = message.unwrap_or_else(|| GENERIC_SUBMIT_FAILURE.to_string());
                self.inline_error = Some(message.clone());
                SubmissionOutcome::Failed(message)
            }
        }
    }

    /// Drop the answer to a guess issued in an earlier round.
    pub fn discard_submission(&mut self) -> SubmissionOutcome {
        self.submit_state = SubmitState::Idle;
        SubmissionOutcome::Stale
    }

    pub fn mark_won(&mut self, transition: WinTransition) -> bool {
        if self.is_won() {
            return false;
        }
        self.win_state = WinState::Won {
            guess: transition.guess,
            token: transition.token,
            post: PostState::Available,
        };
        true
    }

    /// Start posting the win. `Ok(None)` means there is nothing to do because
    /// the win was already posted or a post is in flight.
    pub fn begin_post_win(
        &mut self,
        round: RoundId,
        username: &str,
    ) -> Result<Option<PendingPost>, ValidationError> {
        let WinState::Won { token, post, .. } = &mut self.win_state else {
            return Err(ValidationError::NotWon);
        };
        match post {
            PostState::Posted | PostState::Posting => return Ok(None),
            PostState::Available => {}
        }
        let Some(token) = token.clone() else {
            return Err(ValidationError::MissingToken);
        };
        let username = username.trim();
        if username.is_empty() {
            self.inline_error = Some(ValidationError::EmptyUsername.to_string());
            return Err(ValidationError::EmptyUsername);
        }
        *post = PostState::Posting;
        self.inline_error = None;
        Ok(Some(PendingPost {
            round,
            token,
            username: username.to_string(),
        }))
    }

    /// Returns true when the token is now consumed.
    pub fn complete_post_win(&mut self, result: Result<(), Option<String>>) -> bool {
        let WinState::Won { post, .. } = &mut self.win_state else {
            return false;
        };
        match result {
            Ok(()) => {
                *post = PostState::Posted;
                true
            }
            Err(message) => {
                *post = PostState::Available;
                self.inline_error =
                    Some(message.unwrap_or_else(|| GENERIC_POST_FAILURE.to_string()));
                false
            }
        }
    }

    /// Pick the nearest own or leaderboard point within `tolerance_px` of the
    /// pointer. A miss clears the selection.
    pub fn select_at(
        &mut self,
        pointer: PixelPoint,
        transform: &SurfaceTransform,
        leaderboard: &LeaderboardView,
        tolerance_px: f64,
    ) -> Option<&SelectedPoint> {
        let own = self.guesses.iter().map(|g| (g.point, &g.word, SelectionSource::Own));
        let shared = leaderboard
            .entries()
            .map(|e| (e.point, &e.word, SelectionSource::Leaderboard));

        let mut best: Option<(f64, SelectedPoint)> = None;
        for (point, word, source) in own.chain(shared) {
            let distance = transform.to_pixel(point.clamped()).distance_to(pointer);
            if distance > tolerance_px {
                continue;
            }
            // Own guesses come first, so they win ties.
            if best.as_ref().is_none_or(|(d, _)| distance < *d) {
                best = Some((
                    distance,
                    SelectedPoint {
                        point,
                        word: word.clone(),
                        source,
                    },
                ));
            }
        }
        self.selection = best.map(|(_, selected)| selected);
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// New round: drop guesses, selection, win and messages. An in-flight
    /// submission stays tracked so its late answer still returns us to Idle.
    pub fn reset_round(&mut self) {
        self.guesses.clear();
        self.selection = None;
        self.win_state = WinState::NotWon;
        self.inline_error = None;
    }
}
