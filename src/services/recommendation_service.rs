use crate::{
    models::{HistoryEntry, MenuSnapshot, RecommendationResult, UserProfile},
    utils::AppError,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const RECOMMENDATION_FUNCTION: &str = "generate_meal_recommendations";

/// A function the model is forced to call; `parameters` is a JSON schema
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Structured-generation backend: send a prompt, force one function call,
/// get back the raw JSON arguments string.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn call_function(
        &self,
        prompt: &str,
        function: &FunctionDefinition,
    ) -> Result<String, AppError>;
}

// ==================== OPENAI CHAT COMPLETIONS ====================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    tools: Vec<ChatTool<'a>>,
    tool_choice: Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'a str,
    function: &'a FunctionDefinition,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: String, api_key: String, model: String, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            http_client,
        }
    }
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    async fn call_function(
        &self,
        prompt: &str,
        function: &FunctionDefinition,
    ) -> Result<String, AppError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            tools: vec![ChatTool {
                tool_type: "function",
                function,
            }],
            // Force structured output through the one function
            tool_choice: json!({
                "type": "function",
                "function": { "name": function.name }
            }),
        };

        log::info!("🤖 Requesting {} from {}", function.name, self.model);

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::UpstreamGeneration(format!("Failed to reach generation API: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::UpstreamGeneration(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            log::error!(
                "❌ Generation API returned {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            );
            return Err(AppError::UpstreamGeneration(format!(
                "Generation API returned {}",
                status.as_u16()
            )));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::UpstreamGeneration(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::UpstreamGeneration("API returned no choices".to_string()))?;

        if let Some(refusal) = choice.message.refusal {
            return Err(AppError::UpstreamGeneration(format!("Model refused: {}", refusal)));
        }

        let call = choice
            .message
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
            .ok_or_else(|| {
                AppError::UpstreamGeneration(format!(
                    "Model did not call {} (finish_reason: {:?})",
                    function.name, choice.finish_reason
                ))
            })?;

        if call.function.name != function.name {
            return Err(AppError::UpstreamGeneration(format!(
                "Model called unexpected function {}",
                call.function.name
            )));
        }

        Ok(call.function.arguments)
    }
}

// ==================== COMPOSER ====================

/// Builds the prompt from profile, history and menu, and turns the forced
/// function call into a `RecommendationResult`.
pub struct RecommendationComposer {
    client: Arc<dyn GenerationClient>,
    function: FunctionDefinition,
}

impl RecommendationComposer {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            function: recommendation_function(),
        }
    }

    pub async fn compose(
        &self,
        profile: &UserProfile,
        history: &[HistoryEntry],
        menu: &MenuSnapshot,
    ) -> Result<RecommendationResult, AppError> {
        let prompt = build_prompt(profile, history, menu)?;
        let arguments = self.client.call_function(&prompt, &self.function).await?;
        let result = parse_recommendations(&arguments)?;

        log::info!("✅ Generated {} recommendations", result.recommendations.len());

        Ok(result)
    }
}

pub fn recommendation_function() -> FunctionDefinition {
    FunctionDefinition {
        name: RECOMMENDATION_FUNCTION.to_string(),
        description: "Generate structured meal recommendations based on user attributes and history."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "recommendations": {
                    "type": "array",
                    "description": "List of recommended meals with details.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "meal_name": {
                                "type": "string",
                                "description": "Name of the recommended meal"
                            },
                            "description": {
                                "type": "string",
                                "description": "Short description of the meal"
                            },
                            "nutritional_attributes": {
                                "type": "array",
                                "description": "List of relevant nutritional attributes based on user goals.",
                                "items": { "type": "string" }
                            }
                        },
                        "required": ["meal_name", "description", "nutritional_attributes"]
                    }
                }
            },
            "required": ["recommendations"]
        }),
    }
}

pub fn build_prompt(
    profile: &UserProfile,
    history: &[HistoryEntry],
    menu: &MenuSnapshot,
) -> Result<String, AppError> {
    let encode = |value: Result<String, serde_json::Error>| {
        value.map_err(|e| AppError::UpstreamGeneration(format!("Failed to encode prompt: {}", e)))
    };

    let history_json = encode(serde_json::to_string(history))?;
    let profile_json = encode(serde_json::to_string(profile))?;
    let menu_json = encode(serde_json::to_string(menu))?;

    Ok(format!(
        "Based on the user's dietary history: {} and attributes: {}, \
         recommend meals from the available options. \
         Format the response strictly according to the function schema.\n\
         Here are the available meals: {}",
        history_json, profile_json, menu_json
    ))
}

/// Strict parse: missing fields or wrong types are a generation error
pub fn parse_recommendations(arguments: &str) -> Result<RecommendationResult, AppError> {
    serde_json::from_str(arguments).map_err(|e| {
        log::error!("❌ Malformed function arguments: {}", e);
        AppError::UpstreamGeneration(format!("Output did not match schema: {}", e))
    })
}
