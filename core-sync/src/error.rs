use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// The local intent store failed (persistence is never absorbed)
    #[error("Intent store error: {0}")]
    Library(#[from] LibraryError),

    #[error("Startup reconciliation already ran for this session")]
    AlreadyReconciled,

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
