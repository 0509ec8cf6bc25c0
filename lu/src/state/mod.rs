//! State management with actor pattern
//!
//! StateManager owns the keystore Store and processes messages via channels,
//! so every write for every account goes through one task.

mod manager;
mod messages;

pub use manager::StateManager;
pub use messages::{StateCommand, StateResponse};
