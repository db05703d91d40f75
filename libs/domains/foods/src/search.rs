//! Elasticsearch-backed search index

use async_trait::async_trait;
use core_config::ElasticsearchConfig;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::error::{FoodError, FoodResult};
use crate::models::Food;

/// Full-text index over the food catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Execute a query against the index and return matching foods
    /// in relevance order.
    async fn search(&self, query: &Value, from: u64, size: u64) -> FoodResult<Vec<Food>>;
}

#[derive(Debug, Deserialize)]
struct EsResponse {
    hits: EsHits,
}

#[derive(Debug, Deserialize)]
struct EsHits {
    hits: Vec<EsHit>,
}

#[derive(Debug, Deserialize)]
struct EsHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: Value,
}

/// [`SearchIndex`] implementation talking to Elasticsearch over HTTP
pub struct ElasticsearchIndex {
    client: reqwest::Client,
    base_url: String,
    index: String,
}

impl ElasticsearchIndex {
    pub fn new(client: reqwest::Client, config: &ElasticsearchConfig) -> Self {
        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            index: config.index.clone(),
        }
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    #[instrument(skip(self, query))]
    async fn search(&self, query: &Value, from: u64, size: u64) -> FoodResult<Vec<Food>> {
        let url = format!("{}/{}/_search", self.base_url, self.index);
        let body = json!({
            "query": query,
            "from": from,
            "size": size
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FoodError::Search(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FoodError::Search(format!(
                "search request failed with {}: {}",
                status, text
            )));
        }

        let parsed: EsResponse = response
            .json()
            .await
            .map_err(|e| FoodError::Search(e.to_string()))?;

        let mut foods = Vec::with_capacity(parsed.hits.hits.len());
        for hit in parsed.hits.hits {
            let mut source = hit.source;
            // _source may omit the id; the hit metadata is authoritative
            if let Some(obj) = source.as_object_mut() {
                obj.insert("_id".to_string(), Value::String(hit.id));
            }
            let food: Food = serde_json::from_value(source)?;
            foods.push(food);
        }

        Ok(foods)
    }
}
