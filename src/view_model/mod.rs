use std::collections::HashSet;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender};
use indexmap::IndexSet;
use regex::Regex;
use time::OffsetDateTime;

use crate::config::{AppConfig, EmptySelectionPolicy};
use crate::error::{ManagerError, Result, ViewModelError};
use crate::highlight::match_ranges;
use crate::manager::{
    BookmarksObserver, CategoryLocation, RecentlyDeletedCategoriesManager, RecentlyDeletedCategory,
};
use crate::search::{filter_by_title, SearchQuery};

mod actions;
pub mod state;

pub use actions::ActionDispatcher;
pub use state::{
    compute_trash_status, CategoriesState, CategoryRow, IndexPath, Section, TrashStatus,
};

use state::build_sections;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoriesEvent {
    StateChanged(CategoriesState),
    DataSourceChanged { rows: usize },
}

#[derive(Debug, Clone)]
pub struct ViewModelOptions {
    pub retention_days: u32,
    pub empty_selection: EmptySelectionPolicy,
    pub trim_whitespace: bool,
    pub highlight_matches: bool,
}

impl Default for ViewModelOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ViewModelOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            retention_days: config.retention_days,
            empty_selection: config.empty_selection,
            trim_whitespace: config.search.trim_whitespace,
            highlight_matches: config.search.highlight_matches,
        }
    }
}

/// Flags that the manager changed behind our back.
#[derive(Debug, Default)]
struct StaleMarker {
    stale: AtomicBool,
}

impl StaleMarker {
    fn mark_fresh(&self) {
        self.stale.store(false, Ordering::Release);
    }

    fn take(&self) -> bool {
        self.stale.swap(false, Ordering::AcqRel)
    }
}

impl BookmarksObserver for StaleMarker {
    fn bookmarks_did_change(&self) {
        self.stale.store(true, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Delete,
    Recover,
}

#[derive(Debug)]
enum Targets {
    Locations(Vec<CategoryLocation>),
    Displayed,
    Nothing,
}

type StateCallback = Box<dyn FnMut(CategoriesState)>;

pub struct CategoriesViewModel {
    manager: Arc<dyn RecentlyDeletedCategoriesManager>,
    options: ViewModelOptions,
    state: CategoriesState,
    categories: Vec<RecentlyDeletedCategory>,
    sections: Vec<Section>,
    selected: IndexSet<CategoryLocation>,
    search: Option<SearchQuery>,
    highlight: Option<Regex>,
    marker: Arc<StaleMarker>,
    observer: Weak<dyn BookmarksObserver>,
    state_did_change: Option<StateCallback>,
    subscribers: Vec<Sender<CategoriesEvent>>,
}

impl CategoriesViewModel {
    pub fn new(
        manager: Arc<dyn RecentlyDeletedCategoriesManager>,
        options: ViewModelOptions,
    ) -> Result<Self> {
        let marker = Arc::new(StaleMarker::default());
        let handle: Arc<dyn BookmarksObserver> = marker.clone();
        let observer = Arc::downgrade(&handle);
        manager.add_observer(observer.clone());

        let mut view_model = Self {
            manager,
            options,
            state: CategoriesState::Normal,
            categories: Vec::new(),
            sections: Vec::new(),
            selected: IndexSet::new(),
            search: None,
            highlight: None,
            marker,
            observer,
            state_did_change: None,
            subscribers: Vec::new(),
        };
        view_model.fetch_recently_deleted_categories()?;
        Ok(view_model)
    }

    pub fn state(&self) -> CategoriesState {
        self.state
    }

    /// The filtered data source, one section per group of visible rows.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn rows(&self) -> impl Iterator<Item = &CategoryRow> {
        self.sections.iter().flat_map(|section| section.rows.iter())
    }

    pub fn row_count(&self) -> usize {
        self.sections.iter().map(|section| section.rows.len()).sum()
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search.as_ref().map(SearchQuery::as_str)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn selected_locations(&self) -> impl Iterator<Item = &CategoryLocation> {
        self.selected.iter()
    }

    /// Positions of the selected rows in the current display list.
    pub fn selected_index_paths(&self) -> Vec<IndexPath> {
        let mut paths = Vec::with_capacity(self.selected.len());
        for (section_index, section) in self.sections.iter().enumerate() {
            for (row_index, row) in section.rows.iter().enumerate() {
                if self.selected.contains(&row.location) {
                    paths.push(IndexPath::new(section_index, row_index));
                }
            }
        }
        paths
    }

    pub fn is_selected(&self, at: IndexPath) -> bool {
        self.row_at(at)
            .map(|row| self.selected.contains(&row.location))
            .unwrap_or(false)
    }

    /// Byte ranges of `title` matching the active search, for emphasis.
    pub fn match_ranges(&self, title: &str) -> Vec<Range<usize>> {
        self.highlight
            .as_ref()
            .map(|regex| match_ranges(regex, title))
            .unwrap_or_default()
    }

    pub fn set_state_did_change<F>(&mut self, callback: F)
    where
        F: FnMut(CategoriesState) + 'static,
    {
        self.state_did_change = Some(Box::new(callback));
    }

    pub fn subscribe(&mut self) -> Receiver<CategoriesEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn fetch_recently_deleted_categories(&mut self) -> Result<()> {
        self.load_categories()?;
        if self.categories.is_empty() {
            self.set_state(CategoriesState::Normal);
        } else if self.state.is_selecting() {
            self.update_selection_state();
        }
        Ok(())
    }

    /// Refetches when the manager reported a change since the last fetch.
    pub fn refresh_if_stale(&mut self) -> Result<bool> {
        if !self.marker.take() {
            return Ok(false);
        }
        self.fetch_recently_deleted_categories()?;
        Ok(true)
    }

    pub fn start_selecting(&mut self) {
        if self.search.is_some() {
            self.clear_search();
            self.rebuild();
        }
        self.selected.clear();
        self.set_state(CategoriesState::NothingSelected);
    }

    pub fn cancel_selecting(&mut self) {
        self.selected.clear();
        if self.search.is_some() {
            self.clear_search();
            self.rebuild();
        }
        self.set_state(CategoriesState::Normal);
    }

    pub fn select_category(&mut self, at: IndexPath) -> Result<()> {
        let location = self.row_at(at)?.location.clone();
        self.selected.insert(location);
        self.update_selection_state();
        Ok(())
    }

    pub fn deselect_category(&mut self, at: IndexPath) -> Result<()> {
        let location = self.row_at(at)?.location.clone();
        self.selected.shift_remove(&location);
        self.update_selection_state();
        Ok(())
    }

    pub fn select_all_categories(&mut self) {
        self.selected = self
            .sections
            .iter()
            .flat_map(|section| section.rows.iter())
            .map(|row| row.location.clone())
            .collect();
        self.update_selection_state();
    }

    pub fn deselect_all_categories(&mut self) {
        self.selected.clear();
        self.update_selection_state();
    }

    pub fn start_searching(&mut self) {
        self.selected.clear();
        self.set_state(CategoriesState::Searching);
    }

    pub fn cancel_searching(&mut self) {
        self.selected.clear();
        self.clear_search();
        self.rebuild();
        self.set_state(CategoriesState::Normal);
    }

    pub fn search(&mut self, text: &str) {
        match SearchQuery::parse(text, self.options.trim_whitespace) {
            None => {
                self.clear_search();
                self.rebuild();
            }
            Some(query) => {
                tracing::debug!(query = query.as_str(), "filtering recently deleted categories");
                self.selected.clear();
                self.highlight = if self.options.highlight_matches {
                    query.highlight_regex()
                } else {
                    None
                };
                self.search = Some(query);
                self.rebuild();
                self.set_state(CategoriesState::Searching);
            }
        }
    }

    pub fn delete_category(&mut self, at: IndexPath) -> Result<()> {
        self.apply_to_row(at, Mutation::Delete)
    }

    pub fn recover_category(&mut self, at: IndexPath) -> Result<()> {
        self.apply_to_row(at, Mutation::Recover)
    }

    /// Deletes the selection. What an empty selection does is decided by
    /// [`EmptySelectionPolicy`].
    pub fn delete_selected_categories(&mut self) -> Result<()> {
        let targets = self.selection_targets();
        self.apply_to_targets(Mutation::Delete, targets)
    }

    pub fn recover_selected_categories(&mut self) -> Result<()> {
        let targets = self.selection_targets();
        self.apply_to_targets(Mutation::Recover, targets)
    }

    /// Deletes every displayed category regardless of the selection.
    pub fn delete_all_categories(&mut self) -> Result<()> {
        self.apply_to_targets(Mutation::Delete, Targets::Displayed)
    }

    pub fn recover_all_categories(&mut self) -> Result<()> {
        self.apply_to_targets(Mutation::Recover, Targets::Displayed)
    }

    fn apply_to_row(&mut self, at: IndexPath, mutation: Mutation) -> Result<()> {
        let location = self.row_at(at)?.location.clone();
        let outcome = self.run_mutation(mutation, &Targets::Locations(vec![location.clone()]));
        self.selected.shift_remove(&location);
        let refreshed = self.fetch_recently_deleted_categories();
        outcome?;
        refreshed
    }

    fn apply_to_targets(&mut self, mutation: Mutation, targets: Targets) -> Result<()> {
        let outcome = self.run_mutation(mutation, &targets);
        self.selected.clear();
        self.clear_search();
        let refreshed = self.load_categories();
        if refreshed.is_err() {
            self.rebuild();
        }
        self.set_state(CategoriesState::Normal);
        outcome?;
        refreshed
    }

    /// Pulls the manager's list and rebuilds the display list without
    /// touching the state.
    fn load_categories(&mut self) -> Result<()> {
        self.marker.mark_fresh();
        let categories = self.manager.recently_deleted_categories().map_err(|err| {
            tracing::error!(?err, "failed to fetch recently deleted categories");
            err
        })?;
        self.categories = categories;
        tracing::debug!(count = self.categories.len(), "fetched recently deleted categories");

        if self.categories.is_empty() {
            self.selected.clear();
            self.clear_search();
        }
        self.rebuild();
        Ok(())
    }

    fn selection_targets(&self) -> Targets {
        if !self.selected.is_empty() {
            return Targets::Locations(self.selected.iter().cloned().collect());
        }
        match self.options.empty_selection {
            EmptySelectionPolicy::ActOnAll => Targets::Displayed,
            EmptySelectionPolicy::Ignore => Targets::Nothing,
        }
    }

    fn run_mutation(
        &self,
        mutation: Mutation,
        targets: &Targets,
    ) -> std::result::Result<(), ManagerError> {
        let dispatcher = ActionDispatcher::new(self.manager.as_ref());
        match targets {
            Targets::Nothing => Ok(()),
            Targets::Locations(locations) => match mutation {
                Mutation::Delete => dispatcher.delete(locations),
                Mutation::Recover => dispatcher.recover(locations),
            },
            Targets::Displayed if self.row_count() == 0 => Ok(()),
            Targets::Displayed => match mutation {
                Mutation::Delete if self.search.is_none() => dispatcher.delete_all(),
                Mutation::Delete => dispatcher.delete(&self.displayed_locations()),
                Mutation::Recover => dispatcher.recover(&self.displayed_locations()),
            },
        }
    }

    fn displayed_locations(&self) -> Vec<CategoryLocation> {
        self.rows().map(|row| row.location.clone()).collect()
    }

    fn row_at(&self, at: IndexPath) -> Result<&CategoryRow> {
        self.sections
            .get(at.section)
            .and_then(|section| section.rows.get(at.row))
            .ok_or_else(|| ViewModelError::IndexOutOfRange {
                section: at.section,
                row: at.row,
                len: self.row_count(),
            })
    }

    fn clear_search(&mut self) {
        self.search = None;
        self.highlight = None;
    }

    /// Recomputes the display list from the last fetch and the active query,
    /// dropping selections whose rows are gone.
    fn rebuild(&mut self) {
        let visible = filter_by_title(&self.categories, self.search.as_ref(), |category| {
            category.title.as_str()
        });
        self.sections = build_sections(
            visible,
            self.options.retention_days,
            OffsetDateTime::now_utc(),
        );

        let displayed: HashSet<&CategoryLocation> = self
            .sections
            .iter()
            .flat_map(|section| section.rows.iter())
            .map(|row| &row.location)
            .collect();
        self.selected.retain(|location| displayed.contains(location));

        let rows = self.row_count();
        self.publish(CategoriesEvent::DataSourceChanged { rows });
    }

    fn update_selection_state(&mut self) {
        let next = if self.selected.is_empty() {
            CategoriesState::NothingSelected
        } else {
            CategoriesState::SomeSelected
        };
        self.set_state(next);
    }

    fn set_state(&mut self, next: CategoriesState) {
        if self.state == next {
            return;
        }
        tracing::debug!(from = %self.state, to = %next, "categories state changed");
        self.state = next;
        if let Some(callback) = self.state_did_change.as_mut() {
            callback(next);
        }
        self.publish(CategoriesEvent::StateChanged(next));
    }

    fn publish(&mut self, event: CategoriesEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Drop for CategoriesViewModel {
    fn drop(&mut self) {
        self.manager.remove_observer(&self.observer);
    }
}
