use crate::data_store::models::Event;
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

/// Separator splitting a filter value into alternative search terms.
pub const OR_SEPARATOR: char = '|';

/// Column the event listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    #[default]
    Name,
    Notes,
}

impl SortField {
    /// Parse a client-provided sort column name. Unknown names fall back to the default ordering.
    pub fn parse(value: &str) -> Self {
        match value {
            "id" => Self::Id,
            "name" => Self::Name,
            "notes" => Self::Notes,
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Self {
        match value {
            "desc" => Self::Desc,
            _ => Self::Asc,
        }
    }
}

/// Column filters of the event listing. All text matching is case-insensitive substring search;
/// the `info` filter is an OR-combination over the name and notes columns of each of its
/// [OR_SEPARATOR]-separated terms.
#[derive(Debug, Clone, Default)]
pub struct EventFilters {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub info: Option<String>,
}

impl EventFilters {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none() && self.notes.is_none() && self.info.is_none()
    }

    /// The individual search terms of the `info` filter.
    pub fn info_terms(&self) -> Vec<&str> {
        self.info
            .as_deref()
            .map(|v| v.split(OR_SEPARATOR).filter(|t| !t.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Check an event against the filters. Used by the mock store; the Postgres store translates
    /// the filters to SQL predicates with the same semantics.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(id) = self.id {
            if event.id != id {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !contains_ci(&event.name, name) {
                return false;
            }
        }
        if let Some(notes) = &self.notes {
            if !contains_ci(&event.notes, notes) {
                return false;
            }
        }
        if self.info.is_some() {
            let terms = self.info_terms();
            if !terms
                .iter()
                .any(|t| contains_ci(&event.name, t) || contains_ci(&event.notes, t))
            {
                return false;
            }
        }
        true
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Complete set of listing parameters: filters, ordering and pagination.
#[derive(Debug, Clone, Default)]
pub struct EventListParams {
    pub filters: EventFilters,
    pub sort: SortField,
    pub direction: SortDirection,
    /// Zero-based page index.
    pub page: i64,
    /// Requested page size. Zero falls back to [DEFAULT_PAGE_SIZE].
    pub size: i64,
}

impl EventListParams {
    /// Effective page size, applying default and upper bound.
    pub fn limit(&self) -> i64 {
        if self.size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.size.min(MAX_PAGE_SIZE)
        }
    }

    pub fn offset(&self) -> i64 {
        self.page.max(0) * self.limit()
    }

    /// Ordering of two events under these parameters, with the id as unconditional tie-break to
    /// keep pagination stable.
    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        let primary = match self.sort {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Name => a.name.cmp(&b.name),
            SortField::Notes => a.notes.cmp(&b.notes),
        };
        let primary = match self.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then(a.id.cmp(&b.id))
    }
}
