//! Business logic services

pub mod catalog;
pub mod integrity;
pub mod relations;
pub mod views;

use crate::{config::IntegrityConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub integrity: integrity::IntegrityGuard,
    pub views: views::ViewAggregator,
    pub repository: Repository,
}

impl Services {
    /// Create all services over the given repository
    pub fn new(repository: Repository, integrity_config: &IntegrityConfig) -> Self {
        let relations = relations::RelationshipIndex::new(integrity_config);
        let integrity = integrity::IntegrityGuard::new(repository.clone(), relations);
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            views: views::ViewAggregator::new(repository.clone(), integrity.clone()),
            integrity,
            repository,
        }
    }
}
