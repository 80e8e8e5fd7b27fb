use crate::core::errors::{Error, Result};
use crate::models::file_entry::FileEntry;
use crate::services::fs::listing::compare_names;
use serde::Serialize;
use std::cmp::Ordering;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const DEFAULT_SORT_BY: &str = "size";
pub const DEFAULT_SORT_DIRECTION: &str = "asc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Date,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than `desc` sorts ascending.
    pub fn parse(value: &str) -> SortDirection {
        match value {
            "desc" => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

/// The ordering actually applied for a `sortBy`/`sortDirection` pair.
///
/// An unrecognised `sortBy` falls back to name ascending and ignores the
/// requested direction.
pub fn sort_order(sort_by: &str, sort_direction: &str) -> (SortKey, SortDirection) {
    let direction = SortDirection::parse(sort_direction);
    match sort_by {
        "name" => (SortKey::Name, direction),
        "date" => (SortKey::Date, direction),
        "size" => (SortKey::Size, direction),
        _ => (SortKey::Name, SortDirection::Asc),
    }
}

/// Sort and pagination parameters for one view, as received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub sort_by: String,
    pub sort_direction: String,
    pub page: i64,
    pub page_size: i64,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            sort_by: DEFAULT_SORT_BY.to_string(),
            sort_direction: DEFAULT_SORT_DIRECTION.to_string(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewQuery {
    pub fn validate(&self) -> Result<()> {
        if self.page_size <= 0 {
            return Err(Error::InvalidArgument(format!(
                "pageSize must be positive, got {}",
                self.page_size
            )));
        }
        Ok(())
    }
}

/// One sorted page of entries plus totals over the whole entry set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResult {
    pub items: Vec<FileEntry>,
    pub file_count: usize,
    pub folder_count: usize,
    pub total_size: u64,
    pub page: i64,
    pub page_size: i64,
    pub total_items: usize,
    pub current_page: i64,
    pub total_pages: i64,
    pub sort_by: String,
    pub sort_direction: String,
}

pub fn build(mut entries: Vec<FileEntry>, query: &ViewQuery) -> Result<ViewResult> {
    query.validate()?;

    let file_count = entries.iter().filter(|e| e.is_file()).count();
    let folder_count = entries.iter().filter(|e| e.is_folder()).count();
    let total_size: u64 = entries.iter().filter_map(|e| e.size()).sum();
    let total_items = entries.len();

    let (key, direction) = sort_order(&query.sort_by, &query.sort_direction);
    sort_entries(&mut entries, key, direction);

    // Pages before the first clamp to the first page.
    let skip = query
        .page
        .saturating_sub(1)
        .saturating_mul(query.page_size)
        .max(0);
    let skip = usize::try_from(skip).unwrap_or(usize::MAX);
    let take = usize::try_from(query.page_size).unwrap_or(usize::MAX);
    let items: Vec<FileEntry> = entries.into_iter().skip(skip).take(take).collect();

    let total_pages = (total_items as f64 / query.page_size as f64).ceil() as i64;

    Ok(ViewResult {
        items,
        file_count,
        folder_count,
        total_size,
        page: query.page,
        page_size: query.page_size,
        total_items,
        current_page: query.page,
        total_pages,
        sort_by: query.sort_by.clone(),
        sort_direction: query.sort_direction.clone(),
    })
}

/// Stable sort, so entries with equal keys keep their enumeration order in
/// both directions.
pub fn sort_entries(entries: &mut [FileEntry], key: SortKey, direction: SortDirection) {
    entries.sort_by(|a, b| {
        let order = compare(a, b, key);
        match direction {
            SortDirection::Asc => order,
            SortDirection::Desc => order.reverse(),
        }
    });
}

fn compare(a: &FileEntry, b: &FileEntry, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => compare_names(a.name(), b.name()),
        SortKey::Date => a.last_modified().cmp(&b.last_modified()),
        // Folders have no size and rank as zero bytes.
        SortKey::Size => a.size().unwrap_or(0).cmp(&b.size().unwrap_or(0)),
    }
}
