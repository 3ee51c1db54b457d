use std::fmt;

#[derive(Debug, Clone)]
pub enum ContextError {
    UnknownStateRoot(String),
    UnknownContext(u64),
    WriteOutsideOutputs { context: u64, addr: String },
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::UnknownStateRoot(hash) => {
                write!(f, "no state known at root {hash}")
            }
            ContextError::UnknownContext(id) => write!(f, "unknown context {id}"),
            ContextError::WriteOutsideOutputs { context, addr } => write!(
                f,
                "context {context} wrote to {addr}, which is outside its declared outputs"
            ),
        }
    }
}

impl std::error::Error for ContextError {}
