use crate::services::{
    IdentityVerifier, MenuCache, MenuRefresher, ProfileReader, RecommendationComposer,
};
use std::sync::Arc;

/// Process-wide collaborators, built once in `main` and shared with every
/// worker through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub profiles: Arc<dyn ProfileReader>,
    pub composer: Arc<RecommendationComposer>,
    pub menu_cache: MenuCache,
    pub refresher: Arc<MenuRefresher>,
}
