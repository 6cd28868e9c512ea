pub mod config;
pub mod oracle;
pub mod runtime;
pub mod sync;
pub mod terminal;
