//! Book list query: filtering, search, ordering and page-number pagination.

use utoipa::IntoParams;

use super::book::{parse_integer_str, BookStatus};
use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
};

pub const INVALID_PAGE: &str = "Invalid page.";

/// Query string pairs in request order. Repeated keys resolve to the last value.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`get`](Self::get), treating an empty value as absent
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }
}

/// Columns a client may sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Id,
    Title,
    Author,
    Year,
    Status,
}

impl OrderField {
    /// Fields accepted by the `ordering` parameter of the list endpoint
    pub const API_FIELDS: [OrderField; 3] = [OrderField::Title, OrderField::Author, OrderField::Year];

    pub fn name(&self) -> &'static str {
        match self {
            OrderField::Id => "id",
            OrderField::Title => "title",
            OrderField::Author => "author",
            OrderField::Year => "year",
            OrderField::Status => "status",
        }
    }

    pub fn column(&self) -> &'static str {
        self.name()
    }

    pub fn parse(name: &str, allowed: &[OrderField]) -> Option<Self> {
        allowed.iter().copied().find(|f| f.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: OrderField,
    pub descending: bool,
}

impl OrderTerm {
    pub const fn asc(field: OrderField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub const fn desc(field: OrderField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    /// `title` or `-title`
    pub fn parse(term: &str, allowed: &[OrderField]) -> Option<Self> {
        let term = term.trim();
        match term.strip_prefix('-') {
            Some(name) => OrderField::parse(name, allowed).map(Self::desc),
            None => OrderField::parse(term, allowed).map(Self::asc),
        }
    }

    pub fn as_param(&self) -> String {
        if self.descending {
            format!("-{}", self.field.name())
        } else {
            self.field.name().to_string()
        }
    }
}

/// Parse a comma-separated ordering. Terms outside `allowed` are dropped;
/// when nothing valid remains `default` applies.
pub fn parse_ordering(raw: Option<&str>, allowed: &[OrderField], default: &[OrderTerm]) -> Vec<OrderTerm> {
    let terms: Vec<OrderTerm> = raw
        .unwrap_or_default()
        .split(',')
        .filter_map(|t| OrderTerm::parse(t, allowed))
        .collect();
    if terms.is_empty() {
        default.to_vec()
    } else {
        terms
    }
}

/// Split a search string into terms on whitespace and commas
pub fn search_terms(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| t.replace('\0', ""))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Row selection shared by counting and listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookCriteria {
    pub status: Option<BookStatus>,
    pub year: Option<i32>,
    /// Each term must occur in the title or the author
    pub search: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    Number(i64),
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: PageNumber,
    pub page_size: i64,
}

impl PageRequest {
    pub fn first(page_size: i64) -> Self {
        Self {
            number: PageNumber::Number(1),
            page_size,
        }
    }

    /// A non-integer `page` is rejected; a bad `page_size` falls back to the
    /// configured default and an oversized one is clamped.
    pub fn from_params(page: Option<&str>, page_size: Option<&str>, config: &PaginationConfig) -> AppResult<Self> {
        let number = match page.map(str::trim).filter(|p| !p.is_empty()) {
            None => PageNumber::Number(1),
            Some("last") => PageNumber::Last,
            Some(raw) => PageNumber::Number(
                raw.parse()
                    .map_err(|_| AppError::NotFound(INVALID_PAGE.to_string()))?,
            ),
        };

        let page_size = page_size
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|size| *size > 0)
            .map(|size| size.min(config.max_page_size))
            .unwrap_or(config.page_size)
            .max(1);

        Ok(Self { number, page_size })
    }

    /// Locate the page within `count` rows. An empty result still has a first page.
    pub fn resolve(&self, count: i64) -> AppResult<PageWindow> {
        let page_size = self.page_size.max(1);
        let num_pages = ((count + page_size - 1) / page_size).max(1);
        let number = match self.number {
            PageNumber::Last => num_pages,
            PageNumber::Number(n) => n,
        };
        if number < 1 || number > num_pages {
            return Err(AppError::NotFound(INVALID_PAGE.to_string()));
        }
        Ok(PageWindow {
            number,
            num_pages,
            limit: page_size,
            offset: (number - 1) * page_size,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub limit: i64,
    pub offset: i64,
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub count: i64,
    pub number: i64,
    pub num_pages: i64,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn next_number(&self) -> Option<i64> {
        (self.number < self.num_pages).then_some(self.number + 1)
    }

    pub fn previous_number(&self) -> Option<i64> {
        (self.number > 1).then_some(self.number - 1)
    }
}

/// Query parameters of the book list endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListQuery {
    pub criteria: BookCriteria,
    pub ordering: Vec<OrderTerm>,
    pub page: PageRequest,
}

/// Documentation of the query string accepted by `GET /`
#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookListParams {
    /// Exact status: `В наличии` or `Выдана`
    pub status: Option<String>,
    /// Exact publication year
    pub year: Option<i32>,
    /// Case-insensitive substring of title or author
    pub search: Option<String>,
    /// Comma-separated `title`, `author`, `year`; prefix `-` for descending
    pub ordering: Option<String>,
    /// Page number, or `last` (default: 1)
    pub page: Option<String>,
    /// Items per page (default: 10, max: 100)
    pub page_size: Option<i64>,
}

impl BookListQuery {
    pub fn default_ordering() -> Vec<OrderTerm> {
        vec![OrderTerm::asc(OrderField::Title)]
    }

    pub fn from_params(params: &QueryParams, config: &PaginationConfig) -> AppResult<Self> {
        let mut criteria = BookCriteria::default();

        if let Some(raw) = params.get_non_empty("status") {
            criteria.status = Some(BookStatus::try_from(raw.to_string()).map_err(|_| {
                AppError::field(
                    "status",
                    format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        raw
                    ),
                )
            })?);
        }

        if let Some(raw) = params.get_non_empty("year") {
            let year = parse_integer_str(raw)
                .and_then(|y| i32::try_from(y).ok())
                .ok_or_else(|| AppError::field("year", "Enter a number."))?;
            criteria.year = Some(year);
        }

        if let Some(raw) = params.get("search") {
            criteria.search = search_terms(raw);
        }

        let ordering = parse_ordering(
            params.get("ordering"),
            &OrderField::API_FIELDS,
            &Self::default_ordering(),
        );
        let page = PageRequest::from_params(params.get("page"), params.get("page_size"), config)?;

        Ok(Self {
            criteria,
            ordering,
            page,
        })
    }
}

/// Replace `key` in a raw query string, or drop it when `value` is `None`.
/// Remaining pairs keep their encoding and are sorted by key.
pub fn replace_query_param(query: Option<&str>, key: &str, value: Option<&str>) -> String {
    let mut pairs: Vec<(String, String)> = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .filter(|(k, _)| k != key)
        .collect();
    if let Some(value) = value {
        pairs.push((key.to_string(), value.to_string()));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}
