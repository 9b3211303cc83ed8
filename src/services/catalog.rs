//! Catalog management service

use std::sync::Arc;

use crate::{
    config::PaginationConfig,
    error::AppResult,
    models::{
        book::{Book, BookChanges, BookStatus, CreateBook, NewBook},
        query::{BookListQuery, Paginated},
    },
    repository::BookStore,
};

#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn BookStore>,
    pagination: PaginationConfig,
}

impl CatalogService {
    pub fn new(books: Arc<dyn BookStore>, pagination: PaginationConfig) -> Self {
        Self { books, pagination }
    }

    pub fn pagination(&self) -> &PaginationConfig {
        &self.pagination
    }

    /// Filter, search, order, then cut out the requested page
    pub async fn list_books(&self, query: &BookListQuery) -> AppResult<Paginated<Book>> {
        let count = self.books.count(&query.criteria).await?;
        let window = query.page.resolve(count)?;

        let results = if count == 0 {
            Vec::new()
        } else {
            self.books
                .list(&query.criteria, &query.ordering, window.limit, window.offset)
                .await?
        };

        tracing::debug!(
            "Book list: {} matching, page {}/{} ({} rows)",
            count,
            window.number,
            window.num_pages,
            results.len()
        );

        Ok(Paginated {
            count,
            number: window.number,
            num_pages: window.num_pages,
            results,
        })
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.books.get_by_id(id).await
    }

    /// Create a book through the public API. Whatever the client asked for,
    /// a new book starts out available.
    pub async fn create_book(&self, data: CreateBook) -> AppResult<Book> {
        let book = self
            .books
            .create(&data.into_new_book(BookStatus::Available))
            .await?;
        tracing::info!("Catalog create: book id={} \"{}\"", book.id, book.title);
        Ok(book)
    }

    /// Insert a record exactly as given, status included
    pub async fn create_record(&self, data: &NewBook) -> AppResult<Book> {
        let book = self.books.create(data).await?;
        tracing::info!("Catalog create (admin): book id={} status={}", book.id, book.status);
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, changes: &BookChanges) -> AppResult<Book> {
        let book = self.books.update(id, changes).await?;
        tracing::info!("Catalog update: book id={} status={}", book.id, book.status);
        Ok(book)
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.books.delete(id).await?;
        tracing::info!("Catalog delete: book id={}", id);
        Ok(())
    }

    pub async fn years(&self) -> AppResult<Vec<i32>> {
        self.books.years().await
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.books.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::query::{BookCriteria, OrderField, OrderTerm, PageNumber, PageRequest},
        repository::books::MockBookStore,
    };

    fn book(id: i32, title: &str, status: BookStatus) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: "Herbert".to_string(),
            year: 1965,
            status,
        }
    }

    fn service(store: MockBookStore) -> CatalogService {
        CatalogService::new(Arc::new(store), PaginationConfig::default())
    }

    fn query(page: PageNumber, page_size: i64) -> BookListQuery {
        BookListQuery {
            criteria: BookCriteria::default(),
            ordering: vec![OrderTerm::asc(OrderField::Title)],
            page: PageRequest {
                number: page,
                page_size,
            },
        }
    }

    #[tokio::test]
    async fn test_create_forces_available_status() {
        let mut store = MockBookStore::new();
        store
            .expect_create()
            .withf(|b| b.status == BookStatus::Available && b.title == "Dune")
            .times(1)
            .returning(|b| {
                Ok(Book {
                    id: 1,
                    title: b.title.clone(),
                    author: b.author.clone(),
                    year: b.year,
                    status: b.status,
                })
            });

        let created = service(store)
            .create_book(CreateBook {
                title: "Dune".into(),
                author: "Herbert".into(),
                year: 1965,
            })
            .await
            .unwrap();
        assert_eq!(created.status, BookStatus::Available);
    }

    #[tokio::test]
    async fn test_admin_create_keeps_status() {
        let mut store = MockBookStore::new();
        store
            .expect_create()
            .withf(|b| b.status == BookStatus::CheckedOut)
            .returning(|b| Ok(book(2, &b.title, b.status)));

        let record = NewBook {
            title: "Dune".into(),
            author: "Herbert".into(),
            year: 1965,
            status: BookStatus::CheckedOut,
        };
        let created = service(store).create_record(&record).await.unwrap();
        assert_eq!(created.status, BookStatus::CheckedOut);
    }

    #[tokio::test]
    async fn test_list_slices_requested_page() {
        let mut store = MockBookStore::new();
        store.expect_count().returning(|_| Ok(25));
        store
            .expect_list()
            .withf(|_, ordering, limit, offset| {
                ordering == [OrderTerm::asc(OrderField::Title)] && *limit == 10 && *offset == 20
            })
            .returning(|_, _, _, _| Ok(vec![book(21, "Z", BookStatus::Available)]));

        let page = service(store)
            .list_books(&query(PageNumber::Last, 10))
            .await
            .unwrap();
        assert_eq!(page.count, 25);
        assert_eq!(page.number, 3);
        assert_eq!(page.next_number(), None);
        assert_eq!(page.previous_number(), Some(2));
        assert_eq!(page.results.len(), 1);
    }

    #[tokio::test]
    async fn test_list_out_of_range_page_is_not_found() {
        let mut store = MockBookStore::new();
        store.expect_count().returning(|_| Ok(5));
        store.expect_list().never();

        let err = service(store)
            .list_books(&query(PageNumber::Number(2), 10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_empty_table_skips_scan() {
        let mut store = MockBookStore::new();
        store.expect_count().returning(|_| Ok(0));
        store.expect_list().never();

        let page = service(store)
            .list_books(&query(PageNumber::Number(1), 10))
            .await
            .unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_book_propagates_not_found() {
        let mut store = MockBookStore::new();
        store
            .expect_delete()
            .returning(|id| Err(AppError::NotFound(format!("Book {} not found", id))));

        let err = service(store).delete_book(404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
