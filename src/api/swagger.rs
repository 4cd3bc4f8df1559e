use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Meal Recommendation Service API",
        version = "1.0.0",
        description = "Personalised dining-hall meal recommendations.\n\n**Authentication:** `/generate-recommendation/` requires a Firebase ID token as a Bearer token.\n\n**Features:**\n- Recommendations from profile, history and the cached menu\n- Menu cache refresh from the dining API\n- Health and metrics"
    ),
    paths(
        crate::api::recommendations::generate_recommendation,
        crate::api::meals::update_meals,
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::models::Recommendation,
            crate::models::RecommendationResult,
            crate::models::UpdateMealsResponse,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Recommendations", description = "Structured meal recommendations for the authenticated user."),
        (name = "Meals", description = "Menu cache maintenance."),
        (name = "Health", description = "Health check and metrics endpoints."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Firebase ID token"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_endpoints() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/generate-recommendation/"));
        assert!(paths.contains_key("/update-meals/"));
        assert!(paths.contains_key("/health"));
    }
}
