use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::{debug, error};

use super::dto::{ExerciseRecord, ExerciseSnapshot, RecipeQuery, RecipeRecord};
use crate::{config::CatalogConfig, plans::lenient};

/// Upper bound on exercises pulled into one snapshot.
const EXERCISE_LIMIT: u32 = 1500;
const DEFAULT_RECIPE_COUNT: u32 = 10;

/// Read-only access to the exercise and recipe catalogs.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn exercise_snapshot(&self) -> Result<ExerciseSnapshot>;
    async fn recipes(&self, query: &RecipeQuery) -> Result<Vec<RecipeRecord>>;
}

/// ExerciseDB over RapidAPI for exercises, Spoonacular for recipes.
pub struct HttpCatalog {
    client: Client,
    exercise_url: String,
    exercise_key: String,
    exercise_host: String,
    recipe_url: String,
    recipe_key: String,
}

impl HttpCatalog {
    pub fn new(config: &CatalogConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            exercise_url: config.exercise_api_url.trim_end_matches('/').to_string(),
            exercise_key: config.exercise_api_key.clone(),
            exercise_host: config.exercise_api_host.clone(),
            recipe_url: config.recipe_api_url.trim_end_matches('/').to_string(),
            recipe_key: config.recipe_api_key.clone(),
        })
    }

    async fn exercise_get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.exercise_url, path);
        let response = self
            .client
            .get(&url)
            .header("X-RapidAPI-Key", &self.exercise_key)
            .header("X-RapidAPI-Host", &self.exercise_host)
            .send()
            .await
            .with_context(|| format!("Failed to reach exercise catalog at {path}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, path, body = %error_text, "exercise catalog request failed");
            anyhow::bail!("Exercise catalog returned {}", status);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse exercise catalog response for {path}"))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn exercise_snapshot(&self) -> Result<ExerciseSnapshot> {
        let body_parts = self.exercise_get::<Vec<String>>("/exercises/bodyPartList").await?;
        let equipment = self.exercise_get::<Vec<String>>("/exercises/equipmentList").await?;
        let targets = self.exercise_get::<Vec<String>>("/exercises/targetList").await?;
        let exercises = self
            .exercise_get::<Vec<ExerciseRecord>>(&format!("/exercises?limit={EXERCISE_LIMIT}&offset=0"))
            .await?;
        debug!(exercises = exercises.len(), "exercise catalog fetched");

        Ok(ExerciseSnapshot {
            body_parts,
            equipment,
            targets,
            exercises,
        })
    }

    async fn recipes(&self, query: &RecipeQuery) -> Result<Vec<RecipeRecord>> {
        let url = format!("{}/recipes/findByNutrients", self.recipe_url);
        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.recipe_key.as_str())])
            .query(&recipe_params(query))
            .send()
            .await
            .context("Failed to reach recipe catalog")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, body = %error_text, "recipe catalog request failed");
            anyhow::bail!("Recipe catalog returned {}", status);
        }

        let raw = response
            .json::<Vec<RawRecipe>>()
            .await
            .context("Failed to parse recipe catalog response")?;
        Ok(raw.into_iter().map(RawRecipe::into_record).collect())
    }
}

fn recipe_params(query: &RecipeQuery) -> Vec<(&'static str, u32)> {
    let pairs = [
        ("minCalories", query.min_calories),
        ("maxCalories", query.max_calories),
        ("minProtein", query.min_protein),
        ("maxProtein", query.max_protein),
        ("minCarbs", query.min_carbs),
        ("maxCarbs", query.max_carbs),
        ("minFat", query.min_fat),
        ("maxFat", query.max_fat),
    ];
    let mut params: Vec<_> = pairs
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect();
    params.push(("number", query.number.unwrap_or(DEFAULT_RECIPE_COUNT)));
    params
}

/// Recipe as the catalog sends it; macros arrive as strings like `"25g"`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecipe {
    #[serde(deserialize_with = "lenient::text")]
    id: String,
    title: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    calories: Value,
    #[serde(default)]
    protein: Value,
    #[serde(default)]
    carbs: Value,
    #[serde(default)]
    fat: Value,
    #[serde(default)]
    source_url: String,
}

impl RawRecipe {
    fn into_record(self) -> RecipeRecord {
        RecipeRecord {
            id: self.id,
            title: self.title,
            image: self.image,
            calories: nutrient(&self.calories),
            protein: nutrient(&self.protein),
            carbs: nutrient(&self.carbs),
            fat: nutrient(&self.fat),
            source_url: self.source_url,
        }
    }
}

/// Reads `25`, `"25g"` or `"12.5 g"`; anything else counts as zero.
pub fn nutrient(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nutrient_strings_are_parsed() {
        assert_eq!(nutrient(&json!("25g")), 25.0);
        assert_eq!(nutrient(&json!("12.5 g")), 12.5);
        assert_eq!(nutrient(&json!(410)), 410.0);
        assert_eq!(nutrient(&json!("n/a")), 0.0);
        assert_eq!(nutrient(&Value::Null), 0.0);
    }

    #[test]
    fn raw_recipes_become_records() {
        let raw: Vec<RawRecipe> = serde_json::from_value(json!([{
            "id": 716429,
            "title": "Pasta with Garlic",
            "image": "https://img.test/716429.jpg",
            "imageType": "jpg",
            "calories": 584,
            "protein": "19g",
            "fat": "20g",
            "carbs": "84g"
        }]))
        .unwrap();
        let record = raw.into_iter().next().unwrap().into_record();
        assert_eq!(record.id, "716429");
        assert_eq!(record.calories, 584.0);
        assert_eq!(record.protein, 19.0);
        assert_eq!(record.carbs, 84.0);
        assert_eq!(record.fat, 20.0);
    }

    #[test]
    fn recipe_params_skip_unset_bounds() {
        let q = RecipeQuery {
            min_calories: Some(300),
            max_protein: Some(40),
            ..Default::default()
        };
        assert_eq!(
            recipe_params(&q),
            vec![("minCalories", 300), ("maxProtein", 40), ("number", DEFAULT_RECIPE_COUNT)]
        );
    }
}
