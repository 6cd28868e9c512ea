pub mod errors;
pub mod game;
pub mod leaderboard;
pub mod messages;

// Re-export all types
pub use errors::*;
pub use game::*;
pub use leaderboard::*;
pub use messages::*;
