//! Administrative console over the books table.
//!
//! Server-rendered HTML pages for operators: a change list with search,
//! filters, sortable columns and pagination, plus add, change and delete
//! forms. The console talks to the catalog service directly and applies no
//! business rules of its own; in particular it may create books with any
//! status.

pub mod html;
pub mod views;

use axum::{routing::get, Router};

use crate::{
    config::AdminConfig,
    models::{
        book::{parse_integer_str, BookStatus},
        query::{
            parse_ordering, search_terms, BookCriteria, BookListQuery, OrderField, OrderTerm,
            PageNumber, PageRequest, QueryParams,
        },
    },
    AppState,
};

pub const CHANGE_LIST_PATH: &str = "/admin/books/";

const ADMIN_ORDERING: &[OrderTerm] = &[OrderTerm::asc(OrderField::Title)];

/// Filters offered in the change list sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    Status,
    Year,
}

impl ListFilter {
    pub fn param(&self) -> &'static str {
        match self {
            ListFilter::Status => "status",
            ListFilter::Year => "year",
        }
    }
}

/// Options of the book change list
#[derive(Debug, Clone)]
pub struct BookAdmin {
    /// Columns shown, in order. Every column is sortable.
    pub list_display: &'static [OrderField],
    pub list_filter: &'static [ListFilter],
    /// Ordering when the request does not pick one
    pub ordering: &'static [OrderTerm],
    pub list_per_page: i64,
}

impl BookAdmin {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            list_display: &[
                OrderField::Id,
                OrderField::Title,
                OrderField::Author,
                OrderField::Year,
                OrderField::Status,
            ],
            list_filter: &[ListFilter::Status, ListFilter::Year],
            ordering: ADMIN_ORDERING,
            list_per_page: config.list_per_page.max(1),
        }
    }

    pub fn has_filter(&self, filter: ListFilter) -> bool {
        self.list_filter.contains(&filter)
    }
}

/// Change list parameters: `q` search, `status`/`year` filters, `o` ordering
/// and `p` page. Values that do not parse are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeListParams {
    pub search: String,
    pub status: Option<BookStatus>,
    pub year: Option<i32>,
    pub ordering: Vec<OrderTerm>,
    pub page: i64,
}

impl ChangeListParams {
    pub fn from_params(params: &QueryParams, admin: &BookAdmin) -> Self {
        let status = params
            .get_non_empty(ListFilter::Status.param())
            .filter(|_| admin.has_filter(ListFilter::Status))
            .and_then(BookStatus::parse);
        let year = params
            .get_non_empty(ListFilter::Year.param())
            .filter(|_| admin.has_filter(ListFilter::Year))
            .and_then(parse_integer_str)
            .and_then(|y| i32::try_from(y).ok());
        let page = params
            .get("p")
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        Self {
            search: params.get("q").unwrap_or_default().trim().to_string(),
            status,
            year,
            ordering: parse_ordering(params.get("o"), admin.list_display, admin.ordering),
            page,
        }
    }

    pub fn to_query(&self, admin: &BookAdmin) -> BookListQuery {
        BookListQuery {
            criteria: BookCriteria {
                status: self.status,
                year: self.year,
                search: search_terms(&self.search),
            },
            ordering: self.ordering.clone(),
            page: PageRequest {
                number: PageNumber::Number(self.page),
                page_size: admin.list_per_page,
            },
        }
    }
}

/// Admin routes, mounted at the server root
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(views::index))
        .route("/admin/", get(views::index))
        .route(CHANGE_LIST_PATH, get(views::change_list))
        .route("/admin/books/add/", get(views::add_form).post(views::add_submit))
        .route(
            "/admin/books/:id/change/",
            get(views::change_form).post(views::change_submit),
        )
        .route(
            "/admin/books/:id/delete/",
            get(views::delete_confirm).post(views::delete_submit),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn admin() -> BookAdmin {
        BookAdmin::new(&AdminConfig::default())
    }

    #[test]
    fn test_defaults() {
        let cl = ChangeListParams::from_params(&params(&[]), &admin());
        assert_eq!(cl.ordering, vec![OrderTerm::asc(OrderField::Title)]);
        assert_eq!(cl.page, 1);
        assert_eq!(cl.to_query(&admin()).page.page_size, 100);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let cl = ChangeListParams::from_params(
            &params(&[("status", "lost"), ("year", "MCMLXV"), ("p", "-2"), ("o", "isbn")]),
            &admin(),
        );
        assert_eq!(cl.status, None);
        assert_eq!(cl.year, None);
        assert_eq!(cl.page, 1);
        assert_eq!(cl.ordering, vec![OrderTerm::asc(OrderField::Title)]);
    }

    #[test]
    fn test_any_display_column_sorts() {
        let cl = ChangeListParams::from_params(
            &params(&[("o", "-status,id"), ("q", " tolst war "), ("status", "Выдана")]),
            &admin(),
        );
        assert_eq!(
            cl.ordering,
            vec![OrderTerm::desc(OrderField::Status), OrderTerm::asc(OrderField::Id)]
        );
        let query = cl.to_query(&admin());
        assert_eq!(query.criteria.search, vec!["tolst", "war"]);
        assert_eq!(query.criteria.status, Some(BookStatus::CheckedOut));
    }
}
