use crate::error::ManagerError;
use crate::manager::{CategoryLocation, RecentlyDeletedCategoriesManager};

pub struct ActionDispatcher<'a> {
    manager: &'a dyn RecentlyDeletedCategoriesManager,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(manager: &'a dyn RecentlyDeletedCategoriesManager) -> Self {
        Self { manager }
    }

    pub fn delete(&self, locations: &[CategoryLocation]) -> Result<(), ManagerError> {
        if locations.is_empty() {
            return Ok(());
        }
        tracing::info!(count = locations.len(), "deleting categories permanently");
        self.manager.delete_files(locations).map_err(|err| {
            tracing::error!(?err, count = locations.len(), "failed to delete categories");
            err
        })
    }

    pub fn delete_all(&self) -> Result<(), ManagerError> {
        tracing::info!("deleting every recently deleted category");
        self.manager
            .delete_all_recently_deleted_categories()
            .map_err(|err| {
                tracing::error!(?err, "failed to delete all categories");
                err
            })
    }

    pub fn recover(&self, locations: &[CategoryLocation]) -> Result<(), ManagerError> {
        if locations.is_empty() {
            return Ok(());
        }
        tracing::info!(count = locations.len(), "recovering categories");
        self.manager
            .recover_recently_deleted_categories(locations)
            .map_err(|err| {
                tracing::error!(?err, count = locations.len(), "failed to recover categories");
                err
            })
    }
}
