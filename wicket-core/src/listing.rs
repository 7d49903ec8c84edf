//! Paginated, sorted and filtered listings
//!
//! Query strings arrive as loosely-typed text (`sort=name:desc`,
//! `search=email:^ayu`). They are parsed once into [`SortField`],
//! [`SortOrder`] and [`SearchField`] so nothing downstream matches on raw
//! strings.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{User, error::ValidationError};

pub const DEFAULT_PAGE_NUMBER: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Email,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Email,
    Name,
}

impl SortField {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(Self::Email),
            "name" => Some(Self::Name),
            _ => None,
        }
    }
}

impl SortOrder {
    /// Anything other than `desc` sorts ascending
    fn parse(s: &str) -> Self {
        match s {
            "desc" => Self::Desc,
            _ => Self::Asc,
        }
    }
}

impl SearchField {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(Self::Email),
            "name" => Some(Self::Name),
            _ => None,
        }
    }
}

/// Parsed `field:order` sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    /// An unknown field falls back to `email:asc` regardless of the order given.
    pub fn parse(raw: &str) -> Self {
        let (field, order) = raw.split_once(':').unwrap_or((raw, ""));
        match SortField::parse(field) {
            Some(field) => Sort {
                field,
                order: SortOrder::parse(order),
            },
            None => Sort::default(),
        }
    }
}

/// Parsed `field:pattern` search filter; the pattern is a case-insensitive regex
#[derive(Debug, Clone)]
pub struct Search {
    pub field: SearchField,
    pub pattern: Regex,
}

impl Search {
    /// `Ok(None)` when the field is unknown or the key has no `:`.
    pub fn parse(raw: &str) -> Result<Option<Self>, ValidationError> {
        let Some((field, pattern)) = raw.split_once(':') else {
            return Ok(None);
        };
        let Some(field) = SearchField::parse(field) else {
            return Ok(None);
        };

        Ok(Some(Search {
            field,
            pattern: case_insensitive(pattern)?,
        }))
    }

    pub fn matches(&self, user: &User) -> bool {
        match self.field {
            SearchField::Email => self.pattern.is_match(&user.email),
            SearchField::Name => self.pattern.is_match(&user.name),
        }
    }
}

/// Compile a user-supplied pattern, case-insensitively
pub fn case_insensitive(pattern: &str) -> Result<Regex, ValidationError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ValidationError::InvalidField(format!("Invalid search pattern: {e}")))
}

/// Listing request as it arrives from a query string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page_number")]
    pub page_number: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

fn default_page_number() -> usize {
    DEFAULT_PAGE_NUMBER
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
            search: None,
        }
    }
}

impl ListQuery {
    pub fn with_page(mut self, page_number: usize, page_size: usize) -> Self {
        self.page_number = page_number;
        self.page_size = page_size;
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.page_number < 1 {
            return Err(ValidationError::InvalidField(
                "page_number must be at least 1".to_string(),
            ));
        }
        if self.page_size < 1 {
            return Err(ValidationError::InvalidField(
                "page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Filter, sort and slice `users` into the requested page.
    pub fn apply(&self, users: Vec<User>) -> Result<Page<User>, ValidationError> {
        self.validate()?;

        let sort = self.sort.as_deref().map(Sort::parse).unwrap_or_default();
        let search = match self.search.as_deref() {
            Some(raw) => Search::parse(raw)?,
            None => None,
        };

        let mut users: Vec<User> = match &search {
            Some(search) => users.into_iter().filter(|u| search.matches(u)).collect(),
            None => users,
        };

        users.sort_by(|a, b| {
            let ordering = match sort.field {
                SortField::Email => a.email.cmp(&b.email),
                SortField::Name => a.name.cmp(&b.name),
            };
            match sort.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        Ok(Page::slice(users, self.page_number, self.page_size))
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page_number: usize,
    pub page_size: usize,
    /// Items on this page
    pub count: usize,
    pub total_pages: usize,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    fn slice(items: Vec<T>, page_number: usize, page_size: usize) -> Self {
        let total_pages = items.len().div_ceil(page_size);
        let data: Vec<T> = items
            .into_iter()
            .skip((page_number - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();
        let count = data.len();

        Self {
            page_number,
            page_size,
            count,
            total_pages,
            has_previous_page: page_number > 1,
            has_next_page: page_number < total_pages,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::user::NewUser;

    fn users(rows: &[(&str, &str)]) -> Vec<User> {
        let now = Utc::now();
        rows.iter()
            .map(|(name, email)| {
                NewUser::builder()
                    .name(*name)
                    .email(*email)
                    .build()
                    .unwrap()
                    .into_user(now)
            })
            .collect()
    }

    fn emails(page: &Page<User>) -> Vec<&str> {
        page.data.iter().map(|u| u.email.as_str()).collect()
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!(
            Sort::parse("name:desc"),
            Sort {
                field: SortField::Name,
                order: SortOrder::Desc
            }
        );
        assert_eq!(Sort::parse("name:sideways").order, SortOrder::Asc);
        assert_eq!(Sort::parse("name").order, SortOrder::Asc);
        assert_eq!(Sort::parse("age:desc"), Sort::default());
    }

    #[test]
    fn test_search_parsing() {
        assert!(Search::parse("age:3").unwrap().is_none());
        assert!(Search::parse("email").unwrap().is_none());
        assert!(Search::parse("name:(").is_err());

        let search = Search::parse("name:^ayu").unwrap().unwrap();
        assert_eq!(search.field, SearchField::Name);
        assert!(search.pattern.is_match("AYU Lestari"));
    }

    #[test]
    fn test_default_query_sorts_by_email() {
        let page = ListQuery::default()
            .apply(users(&[("C", "c@x.com"), ("A", "a@x.com"), ("B", "b@x.com")]))
            .unwrap();
        assert_eq!(emails(&page), ["a@x.com", "b@x.com", "c@x.com"]);
        assert_eq!(page.count, 3);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_previous_page);
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_sort_by_name_descending() {
        let page = ListQuery::default()
            .with_sort("name:desc")
            .apply(users(&[("Ayu", "1@x.com"), ("Citra", "2@x.com"), ("Budi", "3@x.com")]))
            .unwrap();
        let names: Vec<_> = page.data.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Citra", "Budi", "Ayu"]);
    }

    #[test]
    fn test_search_filters_before_counting() {
        let page = ListQuery::default()
            .with_search("email:example\\.org$")
            .apply(users(&[
                ("A", "a@example.org"),
                ("B", "b@example.com"),
                ("C", "c@EXAMPLE.ORG"),
            ]))
            .unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(emails(&page), ["a@example.org", "c@EXAMPLE.ORG"]);
    }

    #[test]
    fn test_pagination_window() {
        let rows: Vec<(String, String)> = (0..25)
            .map(|i| (format!("User {i:02}"), format!("u{i:02}@x.com")))
            .collect();
        let rows: Vec<(&str, &str)> = rows.iter().map(|(n, e)| (n.as_str(), e.as_str())).collect();

        let page = ListQuery::default().with_page(3, 10).apply(users(&rows)).unwrap();
        assert_eq!(page.count, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.data[0].email, "u20@x.com");
        assert!(page.has_previous_page);
        assert!(!page.has_next_page);

        let page = ListQuery::default().with_page(2, 10).apply(users(&rows)).unwrap();
        assert!(page.has_previous_page);
        assert!(page.has_next_page);
        assert_eq!(page.count, 10);

        let beyond = ListQuery::default().with_page(9, 10).apply(users(&rows)).unwrap();
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.count, 0);
        assert_eq!(beyond.total_pages, 3);
    }

    #[test]
    fn test_page_bounds_are_validated() {
        assert!(ListQuery::default().with_page(0, 10).apply(vec![]).is_err());
        assert!(ListQuery::default().with_page(1, 0).apply(vec![]).is_err());

        let empty = ListQuery::default().apply(vec![]).unwrap();
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn test_query_deserializes_with_defaults() {
        let query: ListQuery = serde_json::from_str(r#"{"sort":"name:asc"}"#).unwrap();
        assert_eq!(query.page_number, DEFAULT_PAGE_NUMBER);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(query.sort.as_deref(), Some("name:asc"));
        assert!(query.search.is_none());
    }
}
