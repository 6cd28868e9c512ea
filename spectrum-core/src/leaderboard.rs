use spectrum_types::{EntryId, LeaderboardDelta, LeaderboardEntry, WinTally};
use std::collections::BTreeMap;
use tracing::debug;

/// What a delta did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub replaced: bool,
    pub added: usize,
    pub updated: usize,
    pub total: usize,
}

/// This round's leaderboard as seen by the client.
///
/// Entries accumulate within a round. A cursor of zero means the next delta
/// is a full snapshot and replaces whatever is held.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardView {
    entries: BTreeMap<EntryId, LeaderboardEntry>,
    cursor: i64,
}

impl LeaderboardView {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `afterTimestamp` to send with the next fetch.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LeaderboardEntry> {
        self.entries.get(id)
    }

    /// Entries in id order, so repeated renders iterate identically.
    pub fn entries(&self) -> impl Iterator<Item = &LeaderboardEntry> {
        self.entries.values()
    }

    pub fn apply(&mut self, delta: LeaderboardDelta) -> MergeOutcome {
        let replaced = self.cursor == 0;
        if replaced {
            self.entries.clear();
        }
        let (added, updated) = merge_entries(&mut self.entries, delta.entries);
        self.cursor = self.cursor.max(delta.timestamp);
        debug!(
            replaced,
            added,
            updated,
            cursor = self.cursor,
            "Merged leaderboard delta"
        );
        MergeOutcome {
            replaced,
            added,
            updated,
            total: self.entries.len(),
        }
    }

    /// Forget everything, including the cursor. Used at a round boundary.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

/// Upsert by id, never delete. Returns (added, updated).
pub fn merge_entries(
    map: &mut BTreeMap<EntryId, LeaderboardEntry>,
    entries: Vec<LeaderboardEntry>,
) -> (usize, usize) {
    let mut added = 0;
    let mut updated = 0;
    for entry in entries {
        match map.insert(entry.id.clone(), entry) {
            Some(_) => updated += 1,
            None => added += 1,
        }
    }
    (added, updated)
}

/// Rank win tallies: most wins first, ties broken by username.
pub fn rank_wins(mut wins: Vec<WinTally>) -> Vec<(usize, WinTally)> {
    wins.sort_by(|a, b| {
        b.win_count
            .cmp(&a.win_count)
            .then_with(|| a.username.cmp(&b.username))
    });
    wins.into_iter()
        .enumerate()
        .map(|(index, win)| (index + 1, win))
        .collect()
}
