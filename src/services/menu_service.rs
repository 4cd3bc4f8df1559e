use crate::{models::MenuSnapshot, services::menu_cache::MenuCache, utils::AppError};

/// Pulls the current menu from the upstream dining API into the cache
pub struct MenuRefresher {
    dining_api_url: String,
    http_client: reqwest::Client,
    cache: MenuCache,
}

impl MenuRefresher {
    pub fn new(dining_api_url: String, http_client: reqwest::Client, cache: MenuCache) -> Self {
        Self {
            dining_api_url,
            http_client,
            cache,
        }
    }

    /// Replaces the cached snapshot only when the upstream call succeeds;
    /// on any failure the previous snapshot stays authoritative.
    pub async fn refresh(&self) -> Result<MenuSnapshot, AppError> {
        log::info!("🍽️  Fetching meals from {}", self.dining_api_url);

        let response = self
            .http_client
            .get(&self.dining_api_url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::UpstreamFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamFetch(format!(
                "Failed to fetch meals: {}",
                status.as_u16()
            )));
        }

        let snapshot: MenuSnapshot = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamFetch(format!("Failed to parse meals: {}", e)))?;

        self.cache.replace(&snapshot).await?;

        log::info!("✅ Menu cache refreshed");

        Ok(snapshot)
    }
}
