//! Books repository for database operations.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookChanges, NewBook},
        query::{BookCriteria, OrderField, OrderTerm},
    },
};

const BOOK_COLUMNS: &str = "id, title, author, year, status";

/// Storage operations over the `books` table
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Number of rows matching `criteria`
    async fn count(&self, criteria: &BookCriteria) -> AppResult<i64>;

    /// Matching rows in `ordering`, sliced by `limit`/`offset`
    async fn list(
        &self,
        criteria: &BookCriteria,
        ordering: &[OrderTerm],
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Book>>;

    async fn get_by_id(&self, id: i32) -> AppResult<Book>;

    async fn create(&self, book: &NewBook) -> AppResult<Book>;

    async fn update(&self, id: i32, changes: &BookChanges) -> AppResult<Book>;

    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Distinct publication years, newest first
    async fn years(&self) -> AppResult<Vec<i32>>;

    /// Round-trip to the database
    async fn ping(&self) -> AppResult<()>;
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

/// Escape `LIKE` metacharacters so a search term matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_where(builder: &mut QueryBuilder<'_, Postgres>, criteria: &BookCriteria) {
    builder.push(" WHERE 1=1");

    if let Some(status) = criteria.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }

    if let Some(year) = criteria.year {
        builder.push(" AND year = ").push_bind(year);
    }

    for term in &criteria.search {
        let pattern = format!("%{}%", escape_like(term));
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR author ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_order_by(builder: &mut QueryBuilder<'_, Postgres>, ordering: &[OrderTerm]) {
    builder.push(" ORDER BY ");
    for term in ordering {
        builder.push(term.field.column());
        builder.push(if term.descending { " DESC, " } else { " ASC, " });
    }
    // id breaks ties so that page boundaries are stable
    builder.push(OrderField::Id.column());
    builder.push(" ASC");
}

pub fn count_query(criteria: &BookCriteria) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM books");
    push_where(&mut builder, criteria);
    builder
}

pub fn list_query(
    criteria: &BookCriteria,
    ordering: &[OrderTerm],
    limit: i64,
    offset: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM books", BOOK_COLUMNS));
    push_where(&mut builder, criteria);
    push_order_by(&mut builder, ordering);
    builder.push(" LIMIT ").push_bind(limit);
    builder.push(" OFFSET ").push_bind(offset);
    builder
}

/// `None` when there is nothing to change
pub fn update_query(id: i32, changes: &BookChanges) -> Option<QueryBuilder<'static, Postgres>> {
    if changes.is_empty() {
        return None;
    }

    let mut builder = QueryBuilder::new("UPDATE books SET ");
    let mut sets = builder.separated(", ");

    macro_rules! set_field {
        ($field:expr, $name:expr) => {
            if let Some(val) = $field {
                sets.push(concat!($name, " = ")).push_bind_unseparated(val);
            }
        };
    }

    set_field!(changes.title.clone(), "title");
    set_field!(changes.author.clone(), "author");
    set_field!(changes.year, "year");
    set_field!(changes.status.map(|s| s.as_str()), "status");

    builder.push(" WHERE id = ").push_bind(id);
    builder.push(format!(" RETURNING {}", BOOK_COLUMNS));
    Some(builder)
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn count(&self, criteria: &BookCriteria) -> AppResult<i64> {
        let count: i64 = count_query(criteria)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(
        &self,
        criteria: &BookCriteria,
        ordering: &[OrderTerm],
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Book>> {
        let rows = list_query(criteria, ordering, limit, offset)
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let row = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, author, year, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.year)
        .bind(book.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, changes: &BookChanges) -> AppResult<Book> {
        let Some(mut builder) = update_query(id, changes) else {
            return self.get_by_id(id).await;
        };

        builder
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn years(&self) -> AppResult<Vec<i32>> {
        let years: Vec<i32> = sqlx::query_scalar("SELECT DISTINCT year FROM books ORDER BY year DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(years)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::BookStatus;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Толстой"), "Толстой");
    }

    #[test]
    fn test_count_query_without_criteria() {
        let builder = count_query(&BookCriteria::default());
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM books WHERE 1=1");
    }

    #[test]
    fn test_list_query_binds_every_value() {
        let criteria = BookCriteria {
            status: Some(BookStatus::CheckedOut),
            year: Some(1965),
            search: vec!["tolst".into(), "war".into()],
        };
        let builder = list_query(&criteria, &[OrderTerm::desc(OrderField::Year)], 10, 20);
        assert_eq!(
            builder.sql(),
            "SELECT id, title, author, year, status FROM books WHERE 1=1 \
             AND status = $1 AND year = $2 \
             AND (title ILIKE $3 OR author ILIKE $4) \
             AND (title ILIKE $5 OR author ILIKE $6) \
             ORDER BY year DESC, id ASC LIMIT $7 OFFSET $8"
        );
    }

    #[test]
    fn test_default_order_has_tiebreaker() {
        let builder = list_query(
            &BookCriteria::default(),
            &[OrderTerm::asc(OrderField::Title), OrderTerm::desc(OrderField::Author)],
            10,
            0,
        );
        assert!(builder
            .sql()
            .ends_with("ORDER BY title ASC, author DESC, id ASC LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn test_update_query_sets_only_supplied_fields() {
        let changes = BookChanges {
            year: Some(1966),
            status: Some(BookStatus::CheckedOut),
            ..Default::default()
        };
        let builder = update_query(7, &changes).unwrap();
        assert_eq!(
            builder.sql(),
            "UPDATE books SET year = $1, status = $2 WHERE id = $3 RETURNING id, title, author, year, status"
        );
        assert!(update_query(7, &BookChanges::default()).is_none());
    }
}
