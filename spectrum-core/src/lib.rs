pub mod clock;
pub mod game_events;
pub mod game_state;
pub mod geometry;
pub mod hit;
pub mod leaderboard;
pub mod render;
pub mod session;

// Re-export main components
pub use clock::*;
pub use game_events::*;
pub use game_state::*;
pub use geometry::*;
pub use hit::*;
pub use leaderboard::*;
pub use render::*;
pub use session::*;
