use serde::{Deserialize, Serialize};

use crate::plans::lenient;

/// One exercise as the exercise catalog describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub body_part: String,
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub gif_url: String,
}

/// One recipe with its nutrition already parsed into numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRecord {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub image: String,
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub source_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseFilter {
    pub body_part: Option<String>,
    pub equipment: Option<String>,
    pub target: Option<String>,
}

/// Nutrient window sent to the recipe catalog. Also the recipe cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeQuery {
    pub min_calories: Option<u32>,
    pub max_calories: Option<u32>,
    pub min_protein: Option<u32>,
    pub max_protein: Option<u32>,
    pub min_carbs: Option<u32>,
    pub max_carbs: Option<u32>,
    pub min_fat: Option<u32>,
    pub max_fat: Option<u32>,
    pub number: Option<u32>,
}

/// Everything the exercise catalog offers, fetched in one go.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSnapshot {
    pub body_parts: Vec<String>,
    pub equipment: Vec<String>,
    pub targets: Vec<String>,
    pub exercises: Vec<ExerciseRecord>,
}
