//! Spoonacular recipe lookup (`/recipes/findByIngredients`).

use async_trait::async_trait;

use pantry_inventory::{Recipe, RecipeError, RecipeSource};

use crate::config::ApiKey;

pub const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoonacularConfig {
    pub base_url: String,
    pub api_key: ApiKey,
}

#[derive(Debug, Clone)]
pub struct SpoonacularClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: ApiKey,
}

impl SpoonacularClient {
    pub fn new(config: SpoonacularConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/recipes/findByIngredients",
                config.base_url.trim_end_matches('/')
            ),
            api_key: config.api_key,
        }
    }
}

#[async_trait]
impl RecipeSource for SpoonacularClient {
    async fn find_by_ingredients(&self, ingredients: &str) -> Result<Vec<Recipe>, RecipeError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("ingredients", ingredients), ("apiKey", self.api_key.expose())])
            .send()
            .await
            .map_err(|e| RecipeError::ExternalService(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "recipe lookup rejected");
            return Err(RecipeError::ExternalService(format!(
                "recipe service returned {status}"
            )));
        }

        resp.json::<Vec<Recipe>>()
            .await
            .map_err(|e| {
                RecipeError::ExternalService(format!("unexpected response: {}", e.without_url()))
            })
    }
}
