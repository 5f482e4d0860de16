pub mod engine;
mod state;

pub use engine::{advance, start, stop};
pub use state::{Block, Session, SessionStatus};
