//! Business logic services

pub mod catalog;

use std::sync::Arc;

use crate::{config::PaginationConfig, repository::BookStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
}

impl Services {
    /// Create all services over the given book store
    pub fn new(books: Arc<dyn BookStore>, pagination: PaginationConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(books, pagination),
        }
    }
}
