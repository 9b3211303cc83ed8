//! Data models for the library catalog

pub mod book;
pub mod query;

// Re-export commonly used types
pub use book::{Book, BookChanges, BookStatus, CreateBook, NewBook};
pub use query::{BookCriteria, BookListQuery, OrderField, OrderTerm, Paginated};
