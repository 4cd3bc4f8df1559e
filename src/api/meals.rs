use actix_web::{web, HttpResponse};
use crate::{api::metrics, models::UpdateMealsResponse, state::AppState};

/// GET /update-meals/
/// Busca o cardápio atual na API do refeitório e substitui o cache.
/// Falhas voltam no corpo com status "error"; o cache anterior é mantido.
#[utoipa::path(
    get,
    path = "/update-meals/",
    tag = "Meals",
    responses(
        (status = 200, description = "Refresh outcome", body = UpdateMealsResponse)
    )
)]
pub async fn update_meals(state: web::Data<AppState>) -> HttpResponse {
    metrics::increment_request_count();
    log::info!("🔄 GET /update-meals");

    match state.refresher.refresh().await {
        Ok(_) => {
            log::info!("✅ Meals updated successfully");
            HttpResponse::Ok().json(UpdateMealsResponse::success())
        }
        Err(e) => {
            metrics::increment_error_count();
            log::error!("❌ Failed to update meals: {}", e);
            HttpResponse::Ok().json(UpdateMealsResponse::error(e.to_string()))
        }
    }
}
