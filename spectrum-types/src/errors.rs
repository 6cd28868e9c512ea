use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Problems caught locally before any call to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
pub enum ValidationError {
    #[error("Please enter a word to guess.")]
    EmptyWord,
    #[error("A guess is already being submitted.")]
    SubmissionInFlight,
    #[error("Please enter a username.")]
    EmptyUsername,
    #[error("There is no win to post.")]
    NotWon,
    #[error("This win has no token and cannot be posted.")]
    MissingToken,
}

/// Which polled or requested stream a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Stream {
    Timing,
    Target,
    Spectrum,
    Leaderboard,
    Guess,
    PostWin,
    ListWins,
}
