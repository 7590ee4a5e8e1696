use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Weak;

use time::OffsetDateTime;

use crate::error::ManagerError;

mod memory;

pub use memory::{InMemoryCategoriesManager, ManagerOperation};

/// Stable identity of a deleted category: the location of its bookmark file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryLocation(PathBuf);

impl CategoryLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CategoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for CategoryLocation {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<PathBuf> for CategoryLocation {
    fn from(value: PathBuf) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentlyDeletedCategory {
    pub title: String,
    pub location: CategoryLocation,
    pub deletion_date: OffsetDateTime,
}

impl RecentlyDeletedCategory {
    pub fn new(
        title: impl Into<String>,
        location: impl Into<CategoryLocation>,
        deletion_date: OffsetDateTime,
    ) -> Self {
        Self {
            title: title.into(),
            location: location.into(),
            deletion_date,
        }
    }
}

/// Listener for changes made to the bookmark store by anyone, including
/// parties other than the view-model.
pub trait BookmarksObserver: Send + Sync {
    fn bookmarks_did_change(&self);
}

/// Source of truth for the recently deleted categories.
///
/// Implementations own the authoritative list; callers must re-read it after
/// every mutating call rather than patch a cached copy.
pub trait RecentlyDeletedCategoriesManager {
    /// Current list in manager-defined order.
    fn recently_deleted_categories(&self) -> Result<Vec<RecentlyDeletedCategory>, ManagerError>;

    /// Permanently removes the given categories. Absent locations are ignored.
    fn delete_files(&self, locations: &[CategoryLocation]) -> Result<(), ManagerError>;

    fn delete_all_recently_deleted_categories(&self) -> Result<(), ManagerError>;

    /// Moves the given categories back into the active bookmarks.
    fn recover_recently_deleted_categories(
        &self,
        locations: &[CategoryLocation],
    ) -> Result<(), ManagerError>;

    fn add_observer(&self, observer: Weak<dyn BookmarksObserver>);

    fn remove_observer(&self, observer: &Weak<dyn BookmarksObserver>);
}
