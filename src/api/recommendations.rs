use actix_web::{web, HttpResponse};
use crate::{
    api::metrics,
    models::{RecommendationResult, UserIdentity},
    state::AppState,
    utils::AppError,
};

/// GET /generate-recommendation/
/// Perfil + histórico + cardápio em cache -> recomendações estruturadas
#[utoipa::path(
    get,
    path = "/generate-recommendation/",
    tag = "Recommendations",
    responses(
        (status = 200, description = "Structured meal recommendations", body = RecommendationResult),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 404, description = "No profile for this user"),
        (status = 502, description = "Generation service failed or broke the schema"),
        (status = 503, description = "Menu cache unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_recommendation(
    state: web::Data<AppState>,
    user: web::ReqData<UserIdentity>,
) -> Result<HttpResponse, AppError> {
    metrics::increment_request_count();
    let user = user.into_inner();
    log::info!("🍽️  GET /generate-recommendation - user: {}", user);

    let result = recommend(&state, &user).await.map_err(|e| {
        metrics::increment_error_count();
        log::error!("❌ Recommendation failed for {}: {}", user, e);
        e
    })?;

    Ok(HttpResponse::Ok().json(result))
}

async fn recommend(state: &AppState, user: &UserIdentity) -> Result<RecommendationResult, AppError> {
    let (profile, history) = state.profiles.read(user).await?;
    let menu = state.menu_cache.load().await?;

    state.composer.compose(&profile, &history, &menu).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::AuthMiddleware;
    use crate::models::{HistoryEntry, MenuSnapshot, UserProfile};
    use crate::services::{
        FunctionDefinition, GenerationClient, IdentityVerifier, MenuCache, MenuRefresher,
        ProfileReader, RecommendationComposer,
    };
    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;
    use serde_json::{json, Map};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Accepts "valid-<uid>" tokens and maps them to <uid>
    struct PrefixVerifier;

    #[async_trait]
    impl IdentityVerifier for PrefixVerifier {
        async fn verify(&self, token: &str) -> Result<UserIdentity, AppError> {
            token
                .strip_prefix("valid-")
                .map(|uid| UserIdentity(uid.to_string()))
                .ok_or_else(|| AppError::Unauthenticated("rejected".to_string()))
        }
    }

    #[derive(Default)]
    struct FakeProfiles {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProfileReader for FakeProfiles {
        async fn read(
            &self,
            user: &UserIdentity,
        ) -> Result<(UserProfile, Vec<HistoryEntry>), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if user.as_str() != "alice" {
                return Err(AppError::NotFound("User attributes not found".to_string()));
            }
            let mut profile = Map::new();
            profile.insert("goal".to_string(), json!("high protein"));
            Ok((UserProfile(profile), Vec::new()))
        }
    }

    #[derive(Default)]
    struct FakeGeneration {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerationClient for FakeGeneration {
        async fn call_function(
            &self,
            _prompt: &str,
            _function: &FunctionDefinition,
        ) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({
                "recommendations": [
                    { "meal_name": "Pasta", "description": "Whole wheat", "nutritional_attributes": ["fiber", "energy"] }
                ]
            })
            .to_string())
        }
    }

    struct Harness {
        state: AppState,
        profiles: Arc<FakeProfiles>,
        generation: Arc<FakeGeneration>,
        _dir: tempfile::TempDir,
    }

    async fn harness(with_menu: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let cache = MenuCache::new(dir.path().join("current_meals.json"));
        if with_menu {
            cache
                .replace(&MenuSnapshot(json!({ "meals": [{ "name": "Pasta" }] })))
                .await
                .unwrap();
        }

        let profiles = Arc::new(FakeProfiles::default());
        let generation = Arc::new(FakeGeneration::default());
        let state = AppState {
            verifier: Arc::new(PrefixVerifier),
            profiles: profiles.clone(),
            composer: Arc::new(RecommendationComposer::new(generation.clone())),
            menu_cache: cache.clone(),
            refresher: Arc::new(MenuRefresher::new(
                "http://127.0.0.1:9/unused".to_string(),
                reqwest::Client::new(),
                cache,
            )),
        };

        Harness {
            state,
            profiles,
            generation,
            _dir: dir,
        }
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new().app_data(web::Data::new($state)).service(
                    web::resource("/generate-recommendation/")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(generate_recommendation)),
                ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_valid_token_returns_recommendations() {
        let h = harness(true).await;
        let app = app!(h.state.clone());

        let req = test::TestRequest::get()
            .uri("/generate-recommendation/")
            .insert_header(("Authorization", "Bearer valid-alice"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            json!({
                "recommendations": [
                    { "meal_name": "Pasta", "description": "Whole wheat", "nutritional_attributes": ["fiber", "energy"] }
                ]
            })
        );
        assert_eq!(h.generation.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn test_bearer_scheme_is_case_insensitive() {
        let h = harness(true).await;
        let app = app!(h.state.clone());

        for auth in ["bearer valid-alice", "BEARER valid-alice"] {
            let req = test::TestRequest::get()
                .uri("/generate-recommendation/")
                .insert_header(("Authorization", auth))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        assert_eq!(h.generation.calls.load(Ordering::SeqCst), 2);
    }

    #[actix_web::test]
    async fn test_invalid_token_has_no_side_effects() {
        let h = harness(true).await;
        let app = app!(h.state.clone());

        for auth in ["Bearer expired-token", "Basic dXNlcjpwYXNz", "Bearer "] {
            let req = test::TestRequest::get()
                .uri("/generate-recommendation/")
                .insert_header(("Authorization", auth))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }

        let req = test::TestRequest::get()
            .uri("/generate-recommendation/")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.generation.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_missing_profile_is_404_before_generation() {
        let h = harness(true).await;
        let app = app!(h.state.clone());

        let req = test::TestRequest::get()
            .uri("/generate-recommendation/")
            .insert_header(("Authorization", "Bearer valid-bob"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "User attributes not found");
        assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.generation.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_missing_menu_is_503() {
        let h = harness(false).await;
        let app = app!(h.state.clone());

        let req = test::TestRequest::get()
            .uri("/generate-recommendation/")
            .insert_header(("Authorization", "Bearer valid-alice"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(h.generation.calls.load(Ordering::SeqCst), 0);
    }
}
