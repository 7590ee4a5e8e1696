use strum::{Display, EnumString};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::manager::{CategoryLocation, RecentlyDeletedCategory};

/// UI mode of the recently deleted list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum CategoriesState {
    #[default]
    Normal,
    NothingSelected,
    SomeSelected,
    Searching,
}

impl CategoriesState {
    pub fn is_selecting(self) -> bool {
        matches!(
            self,
            CategoriesState::NothingSelected | CategoriesState::SomeSelected
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexPath {
    pub section: usize,
    pub row: usize,
}

impl IndexPath {
    pub fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashStatus {
    pub label: String,
    pub expired: bool,
    pub indefinite: bool,
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub file_name: String,
    pub location: CategoryLocation,
    pub deletion_date: OffsetDateTime,
    pub deleted_label: String,
    pub trash_status: TrashStatus,
}

#[derive(Debug, Clone, Default)]
pub struct Section {
    pub rows: Vec<CategoryRow>,
}

impl Section {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Groups the visible categories into the sectioned data source. Nothing to
/// show yields no sections at all.
pub(crate) fn build_sections<'a, I>(
    categories: I,
    retention_days: u32,
    now: OffsetDateTime,
) -> Vec<Section>
where
    I: IntoIterator<Item = &'a RecentlyDeletedCategory>,
{
    let rows = categories
        .into_iter()
        .map(|category| summarize_category(category, retention_days, now))
        .collect::<Vec<_>>();
    if rows.is_empty() {
        Vec::new()
    } else {
        vec![Section { rows }]
    }
}

fn summarize_category(
    category: &RecentlyDeletedCategory,
    retention_days: u32,
    now: OffsetDateTime,
) -> CategoryRow {
    CategoryRow {
        file_name: category.title.clone(),
        location: category.location.clone(),
        deletion_date: category.deletion_date,
        deleted_label: format_datetime(category.deletion_date),
        trash_status: compute_trash_status(category.deletion_date, retention_days, now),
    }
}

pub fn compute_trash_status(
    deleted_at: OffsetDateTime,
    retention_days: u32,
    now: OffsetDateTime,
) -> TrashStatus {
    if retention_days == 0 {
        return TrashStatus {
            label: "Manual purge only".into(),
            expired: false,
            indefinite: true,
        };
    }

    let window = i64::from(retention_days) * 86_400;
    let elapsed = (now - deleted_at).whole_seconds();
    let remaining = window.saturating_sub(elapsed);
    if remaining <= 0 {
        return TrashStatus {
            label: "Expired, purge soon".into(),
            expired: true,
            indefinite: false,
        };
    }

    let label = if remaining >= 86_400 * 2 {
        let days = remaining / 86_400;
        format!("{days}d left")
    } else if remaining >= 86_400 {
        let days = remaining / 86_400;
        let hours = (remaining % 86_400 + 3_599) / 3_600;
        match hours {
            0 => format!("{days}d left"),
            24 => format!("{}d left", days + 1),
            _ => format!("{days}d {hours}h left"),
        }
    } else if remaining >= 3_600 {
        let hours = (remaining + 3_599) / 3_600;
        if hours == 24 {
            "1d left".to_string()
        } else {
            format!("{hours}h left")
        }
    } else {
        let minutes = (remaining + 59) / 60;
        format!("{minutes}m left")
    };

    TrashStatus {
        label,
        expired: false,
        indefinite: false,
    }
}

fn format_datetime(dt: OffsetDateTime) -> String {
    dt.format(&Rfc3339)
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}
