use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Recommendation {
    pub meal_name: String,
    pub description: String,
    pub nutritional_attributes: Vec<String>,
}

/// Shape of the forced function call arguments and of the endpoint body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RecommendationResult {
    pub recommendations: Vec<Recommendation>,
}
