use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub type GuessId = String;
pub type EntryId = String;

/// A position in the normalized semantic space, both axes in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clip both axes into [0, 1]. NaN collapses to 0.
    pub fn clamped(self) -> Self {
        fn clip(v: f64) -> f64 {
            if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
        }
        Self {
            x: clip(self.x),
            y: clip(self.y),
        }
    }
}

/// Axis-aligned square win region. `size` is the normalized half-width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Target {
    pub point: NormalizedPoint,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AxisLabels {
    pub low: String,
    pub high: String,
}

/// Human readable endpoints of both semantic axes for the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SpectrumLabels {
    pub x_axis: AxisLabels,
    pub y_axis: AxisLabels,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Guess {
    pub id: GuessId,
    pub word: String,
    pub point: NormalizedPoint,
    pub hit_target: bool,
    pub win_token: Option<String>, // only set when hit_target
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundTiming {
    #[ts(type = "number")]
    pub next_round_at: i64, // epoch ms
    #[ts(type = "number")]
    pub round_duration_ms: i64,
}
