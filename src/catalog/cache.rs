use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{
    client::CatalogSource,
    dto::{ExerciseSnapshot, RecipeQuery, RecipeRecord},
};

/// Distinct recipe queries kept before the recipe map starts over.
const RECIPE_CACHE_LIMIT: usize = 256;

/// Process-wide catalog memo. The exercise catalog is fetched once into an
/// immutable snapshot; recipe results are kept per query, up to
/// `RECIPE_CACHE_LIMIT` of them. Nothing expires, the whole cache is dropped
/// on logout.
#[derive(Default)]
pub struct CatalogCache {
    exercises: RwLock<Option<Arc<ExerciseSnapshot>>>,
    recipes: RwLock<HashMap<RecipeQuery, Arc<Vec<RecipeRecord>>>>,
}

impl CatalogCache {
    pub async fn exercises(&self, source: &dyn CatalogSource) -> anyhow::Result<Arc<ExerciseSnapshot>> {
        if let Some(snapshot) = self.exercises.read().await.as_ref() {
            return Ok(snapshot.clone());
        }
        let snapshot = Arc::new(source.exercise_snapshot().await?);
        *self.exercises.write().await = Some(snapshot.clone());
        debug!("exercise snapshot cached");
        Ok(snapshot)
    }

    pub async fn recipes(
        &self,
        source: &dyn CatalogSource,
        query: &RecipeQuery,
    ) -> anyhow::Result<Arc<Vec<RecipeRecord>>> {
        if let Some(hit) = self.recipes.read().await.get(query) {
            return Ok(hit.clone());
        }
        let found = Arc::new(source.recipes(query).await?);
        let mut recipes = self.recipes.write().await;
        if recipes.len() >= RECIPE_CACHE_LIMIT && !recipes.contains_key(query) {
            debug!(entries = recipes.len(), "recipe cache full, starting over");
            recipes.clear();
        }
        recipes.insert(query.clone(), found.clone());
        Ok(found)
    }

    pub async fn invalidate(&self) {
        *self.exercises.write().await = None;
        self.recipes.write().await.clear();
        info!("catalog cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::catalog::client::fake::FakeCatalog;

    #[tokio::test]
    async fn snapshot_is_fetched_once_until_invalidated() {
        let source = FakeCatalog::default();
        let cache = CatalogCache::default();

        let a = cache.exercises(&source).await.unwrap();
        let b = cache.exercises(&source).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.snapshot_calls.load(Ordering::SeqCst), 1);

        cache.invalidate().await;
        cache.exercises(&source).await.unwrap();
        assert_eq!(source.snapshot_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn recipes_are_cached_per_query() {
        let source = FakeCatalog::default();
        let cache = CatalogCache::default();
        let two = RecipeQuery {
            number: Some(2),
            ..Default::default()
        };
        let three = RecipeQuery {
            number: Some(3),
            ..Default::default()
        };

        assert_eq!(cache.recipes(&source, &two).await.unwrap().len(), 2);
        cache.recipes(&source, &two).await.unwrap();
        assert_eq!(cache.recipes(&source, &three).await.unwrap().len(), 3);
        assert_eq!(source.recipe_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn recipe_map_starts_over_when_full() {
        let source = FakeCatalog::default();
        let cache = CatalogCache::default();
        let query = |min: usize| RecipeQuery {
            min_calories: Some(min as u32),
            ..Default::default()
        };

        for min in 0..RECIPE_CACHE_LIMIT {
            cache.recipes(&source, &query(min)).await.unwrap();
        }
        assert_eq!(cache.recipes.read().await.len(), RECIPE_CACHE_LIMIT);
        cache.recipes(&source, &query(0)).await.unwrap();
        assert_eq!(source.recipe_calls.load(Ordering::SeqCst), RECIPE_CACHE_LIMIT);

        cache.recipes(&source, &query(RECIPE_CACHE_LIMIT)).await.unwrap();
        assert_eq!(cache.recipes.read().await.len(), 1);
        cache.recipes(&source, &query(0)).await.unwrap();
        assert_eq!(source.recipe_calls.load(Ordering::SeqCst), RECIPE_CACHE_LIMIT + 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let source = FakeCatalog::failing();
        let cache = CatalogCache::default();
        assert!(cache.exercises(&source).await.is_err());
        assert!(cache.exercises(&source).await.is_err());
        assert_eq!(source.snapshot_calls.load(Ordering::SeqCst), 2);
    }
}
