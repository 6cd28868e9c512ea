use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{EntryId, NormalizedPoint};

/// A previously won guess by any player, visible to everyone in the round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardEntry {
    pub id: EntryId,
    pub word: String,
    pub point: NormalizedPoint,
}

/// Entries newer than the requested cursor plus the server's new cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardDelta {
    pub entries: Vec<LeaderboardEntry>,
    #[ts(type = "number")]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WinTally {
    pub username: String,
    pub win_count: u32,
}
