use std::collections::HashSet;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use strum::IntoStaticStr;
use time::{Duration, OffsetDateTime};

use super::{
    BookmarksObserver, CategoryLocation, RecentlyDeletedCategoriesManager, RecentlyDeletedCategory,
};
use crate::error::ManagerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ManagerOperation {
    Fetch,
    Delete,
    DeleteAll,
    Recover,
}

/// Manager that keeps everything in memory. Recovered categories are moved to
/// a separate list so callers can see what was restored.
#[derive(Default)]
pub struct InMemoryCategoriesManager {
    categories: RwLock<Vec<RecentlyDeletedCategory>>,
    recovered: RwLock<Vec<RecentlyDeletedCategory>>,
    observers: Mutex<Vec<Weak<dyn BookmarksObserver>>>,
    failures: Mutex<HashSet<ManagerOperation>>,
}

impl InMemoryCategoriesManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(categories: Vec<RecentlyDeletedCategory>) -> Self {
        Self {
            categories: RwLock::new(categories),
            ..Self::default()
        }
    }

    pub fn categories(&self) -> Vec<RecentlyDeletedCategory> {
        self.categories.read().clone()
    }

    pub fn recovered(&self) -> Vec<RecentlyDeletedCategory> {
        self.recovered.read().clone()
    }

    pub fn len(&self) -> usize {
        self.categories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.read().is_empty()
    }

    pub fn set_categories(&self, categories: Vec<RecentlyDeletedCategory>) {
        *self.categories.write() = categories;
        self.notify_observers();
    }

    pub fn observer_count(&self) -> usize {
        let mut observers = self.observers.lock();
        observers.retain(|observer| observer.strong_count() > 0);
        observers.len()
    }

    /// Makes the next call of `operation` fail with a backend error.
    pub fn fail_next(&self, operation: ManagerOperation) {
        self.failures.lock().insert(operation);
    }

    /// Drops every category deleted at least `retention_days` before `now`.
    /// A zero retention keeps everything until it is purged by hand.
    pub fn purge_expired(&self, now: OffsetDateTime, retention_days: u32) -> usize {
        if retention_days == 0 {
            return 0;
        }
        let Some(threshold) = now.checked_sub(Duration::days(i64::from(retention_days))) else {
            return 0;
        };
        let removed = {
            let mut categories = self.categories.write();
            let before = categories.len();
            categories.retain(|category| category.deletion_date > threshold);
            before - categories.len()
        };
        if removed > 0 {
            tracing::info!(removed, retention_days, "purged expired categories");
            self.notify_observers();
        }
        removed
    }

    fn check_failure(&self, operation: ManagerOperation) -> Result<(), ManagerError> {
        if self.failures.lock().remove(&operation) {
            return Err(ManagerError::Backend {
                operation: operation.into(),
                message: "injected failure".into(),
            });
        }
        Ok(())
    }

    fn take_matching(&self, locations: &[CategoryLocation]) -> Vec<RecentlyDeletedCategory> {
        let wanted: HashSet<&CategoryLocation> = locations.iter().collect();
        let mut categories = self.categories.write();
        let mut taken = Vec::new();
        categories.retain(|category| {
            if wanted.contains(&category.location) {
                taken.push(category.clone());
                false
            } else {
                true
            }
        });
        taken
    }

    fn notify_observers(&self) {
        let live: Vec<Arc<dyn BookmarksObserver>> = {
            let mut observers = self.observers.lock();
            observers.retain(|observer| observer.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in live {
            observer.bookmarks_did_change();
        }
    }
}

impl RecentlyDeletedCategoriesManager for InMemoryCategoriesManager {
    fn recently_deleted_categories(&self) -> Result<Vec<RecentlyDeletedCategory>, ManagerError> {
        self.check_failure(ManagerOperation::Fetch)?;
        Ok(self.categories())
    }

    fn delete_files(&self, locations: &[CategoryLocation]) -> Result<(), ManagerError> {
        self.check_failure(ManagerOperation::Delete)?;
        if !self.take_matching(locations).is_empty() {
            self.notify_observers();
        }
        Ok(())
    }

    fn delete_all_recently_deleted_categories(&self) -> Result<(), ManagerError> {
        self.check_failure(ManagerOperation::DeleteAll)?;
        let cleared = {
            let mut categories = self.categories.write();
            let cleared = !categories.is_empty();
            categories.clear();
            cleared
        };
        if cleared {
            self.notify_observers();
        }
        Ok(())
    }

    fn recover_recently_deleted_categories(
        &self,
        locations: &[CategoryLocation],
    ) -> Result<(), ManagerError> {
        self.check_failure(ManagerOperation::Recover)?;
        let restored = self.take_matching(locations);
        if restored.is_empty() {
            return Ok(());
        }
        self.recovered.write().extend(restored);
        self.notify_observers();
        Ok(())
    }

    fn add_observer(&self, observer: Weak<dyn BookmarksObserver>) {
        self.observers.lock().push(observer);
    }

    fn remove_observer(&self, observer: &Weak<dyn BookmarksObserver>) {
        self.observers
            .lock()
            .retain(|existing| !Weak::ptr_eq(existing, observer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::macros::datetime;

    #[derive(Default)]
    struct CountingObserver {
        calls: AtomicUsize,
    }

    impl BookmarksObserver for CountingObserver {
        fn bookmarks_did_change(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn seeded() -> InMemoryCategoriesManager {
        let deleted = datetime!(2024-05-01 12:00 UTC);
        InMemoryCategoriesManager::with_categories(vec![
            RecentlyDeletedCategory::new("Trip", "trip.kml", deleted),
            RecentlyDeletedCategory::new("Food", "food.kml", deleted),
            RecentlyDeletedCategory::new("Old", "old.kml", datetime!(2024-01-01 00:00 UTC)),
        ])
    }

    #[test]
    fn recover_moves_categories_to_recovered_list() -> anyhow::Result<()> {
        let manager = seeded();
        manager.recover_recently_deleted_categories(&["food.kml".into()])?;
        assert_eq!(manager.len(), 2);
        let recovered = manager.recovered();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].title, "Food");
        Ok(())
    }

    #[test]
    fn delete_ignores_absent_locations() -> anyhow::Result<()> {
        let manager = seeded();
        manager.delete_files(&["missing.kml".into(), "trip.kml".into()])?;
        manager.delete_files(&["trip.kml".into()])?;
        assert_eq!(manager.len(), 2);
        assert!(manager.recovered().is_empty());
        Ok(())
    }

    #[test]
    fn observers_are_notified_only_on_change() -> anyhow::Result<()> {
        let manager = seeded();
        let observer = Arc::new(CountingObserver::default());
        let handle: Arc<dyn BookmarksObserver> = observer.clone();
        manager.add_observer(Arc::downgrade(&handle));

        manager.delete_files(&["missing.kml".into()])?;
        assert_eq!(observer.calls.load(Ordering::SeqCst), 0);

        manager.delete_all_recently_deleted_categories()?;
        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);

        manager.remove_observer(&Arc::downgrade(&handle));
        manager.set_categories(Vec::new());
        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.observer_count(), 0);
        Ok(())
    }

    #[test]
    fn dropped_observers_are_pruned() {
        let manager = seeded();
        {
            let handle: Arc<dyn BookmarksObserver> = Arc::new(CountingObserver::default());
            manager.add_observer(Arc::downgrade(&handle));
            assert_eq!(manager.observer_count(), 1);
        }
        assert_eq!(manager.observer_count(), 0);
    }

    #[test]
    fn injected_failure_fires_once() {
        let manager = seeded();
        manager.fail_next(ManagerOperation::Delete);
        let err = manager
            .delete_files(&["trip.kml".into()])
            .expect_err("injected failure");
        assert_eq!(
            err,
            ManagerError::Backend {
                operation: "delete",
                message: "injected failure".into(),
            }
        );
        assert_eq!(manager.len(), 3);
        assert!(manager.delete_files(&["trip.kml".into()]).is_ok());
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn purge_expired_respects_retention_window() {
        let manager = seeded();
        let now = datetime!(2024-05-10 12:00 UTC);
        assert_eq!(manager.purge_expired(now, 0), 0);
        assert_eq!(manager.purge_expired(now, 30), 1);
        let titles: Vec<_> = manager.categories().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["Trip", "Food"]);
    }

    #[test]
    fn purge_with_window_past_calendar_range_keeps_everything() {
        let manager = seeded();
        let now = datetime!(2024-05-10 12:00 UTC);
        assert_eq!(manager.purge_expired(now, u32::MAX), 0);
        assert_eq!(manager.len(), 3);
    }
}
