use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Full set of currently available meals, exactly as the dining API sent it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuSnapshot(pub Value);

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateMealsResponse {
    /// "success" or "error"
    pub status: String,
    pub message: String,
}

impl UpdateMealsResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: "Meals updated successfully".to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}
