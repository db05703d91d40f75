//! Keyword enrichment via the Gemini API
//!
//! After a food is created, a detached task asks the model for search
//! keywords and stores them on the document. Enrichment is best-effort;
//! failures are logged and never surface to the caller.

use async_trait::async_trait;
use core_config::GeminiConfig;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{FoodError, FoodResult};
use crate::models::Food;

/// Generates search keywords for a food
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeywordGenerator: Send + Sync {
    async fn generate_keywords(&self, food: &Food) -> FoodResult<Vec<String>>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// [`KeywordGenerator`] backed by Gemini's generateContent endpoint
pub struct GeminiKeywordGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiKeywordGenerator {
    pub fn new(client: reqwest::Client, config: &GeminiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn build_prompt(food: &Food) -> String {
        let mut prompt = format!(
            "Generate up to 10 short lowercase search keywords for a food product. \
             Respond with a comma-separated list only, or the single word 'unknown' \
             if the product cannot be identified.\nProduct name: {}",
            food.product_name
        );

        if let Some(brands) = &food.brands {
            prompt.push_str(&format!("\nBrands: {}", brands));
        }
        if let Some(generic) = &food.generic_name {
            prompt.push_str(&format!("\nGeneric name: {}", generic));
        }
        if let Some(n) = &food.nutriments {
            if let Some(kcal) = n.energy_kcal {
                prompt.push_str(&format!("\nEnergy per 100g: {} kcal", kcal));
            }
        }

        prompt
    }

    /// Parse the model reply into a deduplicated keyword list.
    fn parse_keywords(reply: &str) -> Vec<String> {
        let reply = reply.trim();
        if reply.is_empty() || reply.eq_ignore_ascii_case("unknown") {
            return Vec::new();
        }

        let mut keywords: Vec<String> = Vec::new();
        for part in reply.split(',') {
            let keyword = part.trim().to_lowercase();
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }
        keywords
    }
}

#[async_trait]
impl KeywordGenerator for GeminiKeywordGenerator {
    #[instrument(skip(self, food), fields(food_id = %food.id))]
    async fn generate_keywords(&self, food: &Food) -> FoodResult<Vec<String>> {
        if food.product_name.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::build_prompt(food),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FoodError::Internal(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FoodError::Internal(format!(
                "Gemini request failed with status {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| FoodError::Internal(format!("Gemini response invalid: {}", e)))?;

        let reply = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or_default();

        Ok(Self::parse_keywords(reply))
    }
}
