//! Business logic services

pub mod auth;
pub mod catalog;
pub mod library;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub library: library::LibraryService,
    pub catalog: Arc<dyn catalog::CatalogApi>,
}

impl Services {
    /// Create all services with the given repository and catalog client
    pub fn new(repository: Repository, config: &AppConfig, catalog: Arc<dyn catalog::CatalogApi>) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            library: library::LibraryService::new(repository),
            catalog,
        }
    }
}
