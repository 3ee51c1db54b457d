mod error;
mod manager;

pub use error::ContextError;
pub use manager::{Address, ContextId, ContextManager, Snapshot, SquashHandler};
