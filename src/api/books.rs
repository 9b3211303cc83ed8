//! Book endpoints: the collection (list, create) and a single book (retrieve, update, delete)

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookChanges, CreateBook},
        query::{replace_query_param, BookListParams, BookListQuery, Paginated, QueryParams},
    },
    AppState,
};

/// One page of books with links to its neighbours
#[derive(Debug, Serialize, ToSchema)]
pub struct BookPage {
    /// Number of books matching the filters, across all pages
    pub count: i64,
    /// URL of the next page, if any
    pub next: Option<String>,
    /// URL of the previous page, if any
    pub previous: Option<String>,
    pub results: Vec<Book>,
}

impl BookPage {
    fn new(page: Paginated<Book>, headers: &HeaderMap, uri: &Uri) -> Self {
        let link = |number: i64| {
            // The first page is addressed without a page parameter
            let value = (number > 1).then(|| number.to_string());
            page_url(headers, uri, value.as_deref())
        };
        Self {
            count: page.count,
            next: page.next_number().map(link),
            previous: page.previous_number().map(link),
            results: page.results,
        }
    }
}

/// Absolute URL of the current request with its `page` parameter replaced
fn page_url(headers: &HeaderMap, uri: &Uri, page: Option<&str>) -> String {
    let query = replace_query_param(uri.query(), "page", page);
    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");

    let mut url = match host {
        Some(host) => format!("{}://{}{}", scheme, host, uri.path()),
        None => uri.path().to_string(),
    };
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }
    url
}

/// List books with filtering, search, ordering and pagination
#[utoipa::path(
    get,
    path = "/",
    tag = "books",
    params(BookListParams),
    responses(
        (status = 200, description = "One page of books", body = BookPage),
        (status = 400, description = "Invalid filter value", body = ErrorResponse),
        (status = 404, description = "Invalid page", body = ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    WithRejection(Query(pairs), _): WithRejection<Query<Vec<(String, String)>>, AppError>,
) -> AppResult<Json<BookPage>> {
    let catalog = &state.services.catalog;
    let query = BookListQuery::from_params(&QueryParams::new(pairs), catalog.pagination())?;
    let page = catalog.list_books(&query).await?;
    Ok(Json(BookPage::new(page, &headers, &uri)))
}

/// Create a new book. Its status is always `В наличии`.
#[utoipa::path(
    post,
    path = "/",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<Value>, AppError>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let data = CreateBook::from_json(&body)?;
    let created = state.services.catalog.create_book(data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/{id}/",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Replace a book. Title, author and year are required; status is optional.
#[utoipa::path(
    put,
    path = "/{id}/",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookChanges,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(body), _): WithRejection<Json<Value>, AppError>,
) -> AppResult<Json<Book>> {
    let changes = BookChanges::from_json(&body, false)?;
    let updated = state.services.catalog.update_book(id, &changes).await?;
    Ok(Json(updated))
}

/// Update any subset of a book's fields
#[utoipa::path(
    patch,
    path = "/{id}/",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookChanges,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn partial_update_book(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(body), _): WithRejection<Json<Value>, AppError>,
) -> AppResult<Json<Book>> {
    let changes = BookChanges::from_json(&body, true)?;
    let updated = state.services.catalog.update_book(id, &changes).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/{id}/",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "library.test".parse().unwrap());
        let uri: Uri = "/?search=tolst&page=2".parse().unwrap();

        assert_eq!(
            page_url(&headers, &uri, Some("3")),
            "http://library.test/?page=3&search=tolst"
        );
        assert_eq!(page_url(&headers, &uri, None), "http://library.test/?search=tolst");
    }

    #[test]
    fn test_page_url_without_host_is_relative() {
        let uri: Uri = "/books/?page=2".parse().unwrap();
        assert_eq!(page_url(&HeaderMap::new(), &uri, None), "/books/");
    }
}
