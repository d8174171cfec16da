use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use super::lenient;
use crate::{
    catalog::dto::{ExerciseRecord, RecipeRecord},
    i18n::Locale,
};

pub const DEFAULT_SETS: u32 = 3;
pub const DEFAULT_REPS: u32 = 12;
pub const DEFAULT_WEIGHT: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    Training,
    Diet,
}

impl PlanKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanKind::Training => "training",
            PlanKind::Diet => "diet",
        }
    }

    /// Prefix of exported file names.
    pub fn file_prefix(self) -> &'static str {
        match self {
            PlanKind::Training => "training-plan-",
            PlanKind::Diet => "diet-plan-",
        }
    }

    pub fn day_suffix(self, locale: Locale) -> &'static str {
        match self {
            PlanKind::Training => locale.training_day_suffix(),
            PlanKind::Diet => locale.diet_day_suffix(),
        }
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either a record picked from a catalog or values typed in by the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemInput<R, C> {
    Catalog(R),
    Custom(C),
}

/// Behaviour shared by exercises and meals inside a day.
pub trait PlanItem:
    fmt::Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Record: fmt::Debug + Clone + DeserializeOwned + Send + Sync + 'static;
    type Custom: fmt::Debug + Clone + DeserializeOwned + Send + Sync + 'static;

    const KIND: PlanKind;

    fn order(&self) -> u32;
    fn set_order(&mut self, order: u32);
    fn is_complete(&self) -> bool;
    fn from_catalog(record: Self::Record) -> Self;
    fn from_custom(custom: Self::Custom) -> Self;
    /// Takes identity and classification from a catalog record, keeping user-tuned values.
    fn apply_catalog(&mut self, record: Self::Record);

    fn from_input(input: ItemInput<Self::Record, Self::Custom>) -> Self {
        match input {
            ItemInput::Catalog(record) => Self::from_catalog(record),
            ItemInput::Custom(custom) => Self::from_custom(custom),
        }
    }

    /// Custom edits replace the whole item; only its position survives.
    fn apply_edit(&mut self, input: ItemInput<Self::Record, Self::Custom>) {
        match input {
            ItemInput::Catalog(record) => self.apply_catalog(record),
            ItemInput::Custom(custom) => {
                let order = self.order();
                *self = Self::from_custom(custom);
                self.set_order(order);
            }
        }
    }
}

pub fn custom_source_id() -> String {
    format!("custom-{}", Uuid::new_v4())
}

fn non_negative(v: Option<f64>) -> bool {
    matches!(v, Some(n) if n >= 0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseItem {
    #[serde(default, deserialize_with = "lenient::position")]
    pub order: u32,
    #[serde(default, alias = "exerciseId")]
    pub source_id: String,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub body_part: String,
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub gif_url: String,
}

/// An exercise the catalog does not know about.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomExercise {
    pub name: String,
    #[serde(default)]
    pub body_part: String,
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub target: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub sets: Option<u32>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub reps: Option<u32>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

impl PlanItem for ExerciseItem {
    type Record = ExerciseRecord;
    type Custom = CustomExercise;

    const KIND: PlanKind = PlanKind::Training;

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    fn is_complete(&self) -> bool {
        !self.source_id.trim().is_empty()
            && !self.name.trim().is_empty()
            && matches!(self.sets, Some(n) if n >= 1)
            && matches!(self.reps, Some(n) if n >= 1)
            && non_negative(self.weight)
    }

    fn from_catalog(record: ExerciseRecord) -> Self {
        Self {
            order: 0,
            source_id: record.id,
            name: record.name,
            is_custom: false,
            sets: Some(DEFAULT_SETS),
            reps: Some(DEFAULT_REPS),
            weight: Some(DEFAULT_WEIGHT),
            notes: String::new(),
            body_part: record.body_part,
            equipment: record.equipment,
            target: record.target,
            gif_url: record.gif_url,
        }
    }

    fn from_custom(custom: CustomExercise) -> Self {
        Self {
            order: 0,
            source_id: custom_source_id(),
            name: custom.name.trim().to_string(),
            is_custom: true,
            sets: Some(custom.sets.unwrap_or(DEFAULT_SETS)),
            reps: Some(custom.reps.unwrap_or(DEFAULT_REPS)),
            weight: Some(custom.weight.unwrap_or(DEFAULT_WEIGHT)),
            notes: custom.notes,
            body_part: custom.body_part,
            equipment: custom.equipment,
            target: custom.target,
            gif_url: String::new(),
        }
    }

    fn apply_catalog(&mut self, record: ExerciseRecord) {
        self.source_id = record.id;
        self.name = record.name;
        self.is_custom = false;
        self.body_part = record.body_part;
        self.equipment = record.equipment;
        self.target = record.target;
        self.gif_url = record.gif_url;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealItem {
    #[serde(default, deserialize_with = "lenient::position")]
    pub order: u32,
    #[serde(default, alias = "recipeId")]
    pub source_id: String,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub recipe_url: String,
}

/// A meal typed in by the user with its own nutrition values.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMeal {
    pub title: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub calories: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub protein: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub carbs: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fat: Option<f64>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub recipe_url: String,
}

impl PlanItem for MealItem {
    type Record = RecipeRecord;
    type Custom = CustomMeal;

    const KIND: PlanKind = PlanKind::Diet;

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    fn is_complete(&self) -> bool {
        !self.source_id.trim().is_empty()
            && !self.title.trim().is_empty()
            && matches!(self.calories, Some(n) if n >= 1.0)
            && non_negative(self.protein)
            && non_negative(self.carbs)
            && non_negative(self.fat)
    }

    fn from_catalog(record: RecipeRecord) -> Self {
        Self {
            order: 0,
            source_id: record.id,
            title: record.title,
            is_custom: false,
            calories: Some(record.calories),
            protein: Some(record.protein),
            carbs: Some(record.carbs),
            fat: Some(record.fat),
            image: record.image,
            recipe_url: record.source_url,
        }
    }

    fn from_custom(custom: CustomMeal) -> Self {
        Self {
            order: 0,
            source_id: custom_source_id(),
            title: custom.title.trim().to_string(),
            is_custom: true,
            calories: custom.calories,
            protein: Some(custom.protein.unwrap_or(0.0)),
            carbs: Some(custom.carbs.unwrap_or(0.0)),
            fat: Some(custom.fat.unwrap_or(0.0)),
            image: custom.image,
            recipe_url: custom.recipe_url,
        }
    }

    fn apply_catalog(&mut self, record: RecipeRecord) {
        let order = self.order;
        *self = Self::from_catalog(record);
        self.order = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squat() -> ExerciseRecord {
        ExerciseRecord {
            id: "0043".into(),
            name: "barbell full squat".into(),
            body_part: "upper legs".into(),
            equipment: "barbell".into(),
            target: "glutes".into(),
            gif_url: "https://example.test/0043.gif".into(),
        }
    }

    fn lunge() -> ExerciseRecord {
        ExerciseRecord {
            id: "0054".into(),
            name: "barbell lunge".into(),
            body_part: "upper legs".into(),
            equipment: "barbell".into(),
            target: "glutes".into(),
            gif_url: String::new(),
        }
    }

    #[test]
    fn catalog_exercise_gets_training_defaults() {
        let item = ExerciseItem::from_catalog(squat());
        assert_eq!(item.sets, Some(3));
        assert_eq!(item.reps, Some(12));
        assert_eq!(item.weight, Some(0.0));
        assert_eq!(item.notes, "");
        assert!(!item.is_custom);
        assert!(item.is_complete());
    }

    #[test]
    fn catalog_edit_keeps_tuned_values() {
        let mut item = ExerciseItem::from_catalog(squat());
        item.sets = Some(5);
        item.reps = Some(5);
        item.weight = Some(100.0);
        item.notes = "pause at bottom".into();
        item.order = 2;

        item.apply_edit(ItemInput::Catalog(lunge()));

        assert_eq!(item.source_id, "0054");
        assert_eq!(item.name, "barbell lunge");
        assert_eq!(item.sets, Some(5));
        assert_eq!(item.weight, Some(100.0));
        assert_eq!(item.notes, "pause at bottom");
        assert_eq!(item.order, 2);
    }

    #[test]
    fn custom_edit_replaces_everything_but_position() {
        let mut item = ExerciseItem::from_catalog(squat());
        item.sets = Some(5);
        item.order = 3;

        item.apply_edit(ItemInput::Custom(CustomExercise {
            name: "Sled push".into(),
            body_part: "legs".into(),
            equipment: "sled".into(),
            target: "quads".into(),
            sets: None,
            reps: Some(8),
            weight: Some(40.0),
            notes: String::new(),
        }));

        assert!(item.is_custom);
        assert!(item.source_id.starts_with("custom-"));
        assert_eq!(item.sets, Some(DEFAULT_SETS));
        assert_eq!(item.reps, Some(8));
        assert_eq!(item.gif_url, "");
        assert_eq!(item.order, 3);
    }

    #[test]
    fn meal_completeness_requires_calories() {
        let meal = MealItem::from_custom(CustomMeal {
            title: "Oats".into(),
            calories: None,
            protein: Some(10.0),
            carbs: None,
            fat: None,
            image: String::new(),
            recipe_url: String::new(),
        });
        assert!(!meal.is_complete());

        let meal = MealItem {
            calories: Some(350.0),
            ..meal
        };
        assert!(meal.is_complete());
    }

    #[test]
    fn negative_weight_is_incomplete() {
        let mut item = ExerciseItem::from_catalog(squat());
        item.weight = Some(-1.0);
        assert!(!item.is_complete());
    }
}
