use actix_web::HttpResponse;
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus text exposition")
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(render(
            REQUEST_COUNT.load(Ordering::Relaxed),
            ERROR_COUNT.load(Ordering::Relaxed),
        ))
}

fn render(requests: u64, errors: u64) -> String {
    format!(
        "# HELP meal_service_requests_total Requests to recommendation and refresh endpoints\n\
         # TYPE meal_service_requests_total counter\n\
         meal_service_requests_total {}\n\
         \n\
         # HELP meal_service_errors_total Requests that ended in an error\n\
         # TYPE meal_service_errors_total counter\n\
         meal_service_errors_total {}\n",
        requests, errors
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_exposition() {
        let text = render(7, 2);
        assert!(text.contains("meal_service_requests_total 7\n"));
        assert!(text.contains("meal_service_errors_total 2\n"));
        assert!(text.contains("# TYPE meal_service_errors_total counter"));
    }
}
