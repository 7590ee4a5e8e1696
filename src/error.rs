use thiserror::Error;

/// Failures reported by a [`RecentlyDeletedCategoriesManager`](crate::manager::RecentlyDeletedCategoriesManager).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum ViewModelError {
    /// The index path does not address a row of the current display list.
    #[error("no category at section {section}, row {row} ({len} rows displayed)")]
    IndexOutOfRange {
        section: usize,
        row: usize,
        len: usize,
    },

    #[error(transparent)]
    Manager(#[from] ManagerError),
}

pub type Result<T, E = ViewModelError> = std::result::Result<T, E>;
