use std::sync::Arc;

use crate::{
    config::Config,
    db::KeyValueStore,
    services::{
        providers::MetadataProvider, AdminService, AuditService, CatalogService,
        IdentityService, RecommendationService,
    },
};

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub identity: Arc<IdentityService>,
    pub recommendations: Arc<RecommendationService>,
    pub admin: Arc<AdminService>,
    pub catalog: CatalogService,
}

impl AppState {
    /// Wires the services over one store and one metadata provider
    pub fn new(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        provider: Arc<dyn MetadataProvider>,
    ) -> Self {
        let identity = Arc::new(IdentityService::new(store.clone(), &config));
        let recommendations = Arc::new(RecommendationService::new(store.clone()));
        let audit = Arc::new(AuditService::new(store));
        let admin = Arc::new(AdminService::new(
            recommendations.clone(),
            audit,
            identity.clone(),
        ));
        let catalog = CatalogService::new(provider, config.tmdb_image_url.clone());

        Self {
            config: Arc::new(config),
            identity,
            recommendations,
            admin,
            catalog,
        }
    }
}
