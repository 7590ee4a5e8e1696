pub mod config;
pub mod error;
pub mod highlight;
pub mod logging;
pub mod manager;
pub mod search;
pub mod view_model;

pub use config::{AppConfig, ConfigLoader, ConfigPaths, EmptySelectionPolicy};
pub use error::{ManagerError, ViewModelError};
pub use manager::{
    BookmarksObserver, CategoryLocation, InMemoryCategoriesManager, RecentlyDeletedCategoriesManager,
    RecentlyDeletedCategory,
};
pub use view_model::{
    CategoriesEvent, CategoriesState, CategoriesViewModel, IndexPath, ViewModelOptions,
};
