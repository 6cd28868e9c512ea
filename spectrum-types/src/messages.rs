use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    AxisLabels, Guess, LeaderboardDelta, LeaderboardEntry, NormalizedPoint, RoundTiming,
    SpectrumLabels, Target, WinTally,
};

/// Body of every call to the oracle: `{"functionName": ..., "request": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "functionName", content = "request", rename_all = "camelCase")]
#[ts(export)]
pub enum OracleRequest {
    GuessWord(GuessWordRequest),
    GetSpectrum(EmptyRequest),
    GetTarget(EmptyRequest),
    GetTimeUntilNextGraph(EmptyRequest),
    GetLeaderboard(GetLeaderboardRequest),
    PostWin(PostWinRequest),
    ListWins(EmptyRequest),
}

impl OracleRequest {
    pub fn function_name(&self) -> &'static str {
        match self {
            OracleRequest::GuessWord(_) => "guessWord",
            OracleRequest::GetSpectrum(_) => "getSpectrum",
            OracleRequest::GetTarget(_) => "getTarget",
            OracleRequest::GetTimeUntilNextGraph(_) => "getTimeUntilNextGraph",
            OracleRequest::GetLeaderboard(_) => "getLeaderboard",
            OracleRequest::PostWin(_) => "postWin",
            OracleRequest::ListWins(_) => "listWins",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmptyRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessWordRequest {
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GetLeaderboardRequest {
    #[ts(type = "number")]
    pub after_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PostWinRequest {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GuessWordResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub word: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub hit_target: bool,
    #[serde(default)]
    pub token: Option<String>,
}

impl GuessWordResponse {
    /// Build the session's guess. The submitted word is used when the oracle
    /// does not echo one, and a fresh id is minted when it does not send one.
    pub fn into_guess(self, submitted_word: &str) -> Guess {
        let win_token = if self.hit_target { self.token } else { None };
        Guess {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            word: self
                .word
                .filter(|w| !w.trim().is_empty())
                .unwrap_or_else(|| submitted_word.to_string()),
            point: NormalizedPoint::new(self.x, self.y),
            hit_target: self.hit_target,
            win_token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AxisEnds {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SpectrumResponse {
    pub x: AxisEnds,
    pub y: AxisEnds,
}

impl From<SpectrumResponse> for SpectrumLabels {
    fn from(response: SpectrumResponse) -> Self {
        SpectrumLabels {
            x_axis: AxisLabels {
                low: response.x.left,
                high: response.x.right,
            },
            y_axis: AxisLabels {
                low: response.y.left,
                high: response.y.right,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TargetResponse {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl From<TargetResponse> for Target {
    fn from(response: TargetResponse) -> Self {
        Target {
            point: NormalizedPoint::new(response.x, response.y),
            size: response.size.max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TimeUntilNextGraphResponse {
    #[ts(type = "number")]
    pub time_of_next_graph: i64,
    #[ts(type = "number")]
    pub time_mod: i64,
}

impl From<TimeUntilNextGraphResponse> for RoundTiming {
    fn from(response: TimeUntilNextGraphResponse) -> Self {
        RoundTiming {
            next_round_at: response.time_of_next_graph,
            round_duration_ms: response.time_mod,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardEntryWire {
    pub id: String,
    pub word: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GetLeaderboardResponse {
    #[serde(default)]
    pub leaderboard_entries: Vec<LeaderboardEntryWire>,
    #[ts(type = "number")]
    pub timestamp: i64,
}

impl From<GetLeaderboardResponse> for LeaderboardDelta {
    fn from(response: GetLeaderboardResponse) -> Self {
        LeaderboardDelta {
            entries: response
                .leaderboard_entries
                .into_iter()
                .map(|entry| LeaderboardEntry {
                    id: entry.id,
                    word: entry.word,
                    point: NormalizedPoint::new(entry.x, entry.y),
                })
                .collect(),
            timestamp: response.timestamp,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PostWinResponse {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WinTallyWire {
    pub username: String,
    pub win_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ListWinsResponse {
    #[serde(default)]
    pub wins: Vec<WinTallyWire>,
}

impl From<ListWinsResponse> for Vec<WinTally> {
    fn from(response: ListWinsResponse) -> Self {
        response
            .wins
            .into_iter()
            .map(|w| WinTally {
                username: w.username,
                win_count: w.win_count,
            })
            .collect()
    }
}

/// Error payload the oracle may attach to a non-2xx response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}
