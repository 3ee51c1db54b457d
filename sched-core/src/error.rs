use std::fmt;

/// Protocol-misuse errors: calling the scheduler out of the sequence it
/// expects. Never raised by well-behaved callers; always returned, never
/// panicked.
#[derive(Debug)]
pub enum SchedulerError {
    /// A result was reported for a header_signature that is not the
    /// currently in-flight transaction.
    UnknownTransaction(String),
    /// A result was reported while nothing was in flight.
    ResultBeforeDispatch,
    /// `add_batch` was called after `finalize`.
    AddBatchAfterFinalize,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::UnknownTransaction(sig) => {
                write!(f, "no in-flight transaction matches signature {sig}")
            }
            SchedulerError::ResultBeforeDispatch => {
                write!(f, "result reported before any transaction was dispatched")
            }
            SchedulerError::AddBatchAfterFinalize => {
                write!(f, "add_batch called after finalize")
            }
        }
    }
}

impl std::error::Error for SchedulerError {}
