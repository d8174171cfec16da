use serde::Deserialize;

use crate::i18n::Locale;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Where the exercise and recipe catalogs live.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub exercise_api_url: String,
    pub exercise_api_key: String,
    pub exercise_api_host: String,
    pub recipe_api_url: String,
    pub recipe_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub catalog: CatalogConfig,
    pub dataset_api_url: String,
    pub http_timeout_secs: u64,
    pub default_locale: Locale,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "fitplan".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "fitplan-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let catalog = CatalogConfig {
            exercise_api_url: std::env::var("EXERCISE_API_URL")
                .unwrap_or_else(|_| "https://exercisedb.p.rapidapi.com".into()),
            exercise_api_key: std::env::var("EXERCISE_API_KEY").unwrap_or_default(),
            exercise_api_host: std::env::var("EXERCISE_API_HOST")
                .unwrap_or_else(|_| "exercisedb.p.rapidapi.com".into()),
            recipe_api_url: std::env::var("RECIPE_API_URL")
                .unwrap_or_else(|_| "https://api.spoonacular.com".into()),
            recipe_api_key: std::env::var("RECIPE_API_KEY").unwrap_or_default(),
        };
        let dataset_api_url = std::env::var("DATASET_API_URL")
            .unwrap_or_else(|_| "https://api.worldbank.org/v2".into());
        let http_timeout_secs = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(15);
        let default_locale = std::env::var("DEFAULT_LOCALE")
            .ok()
            .and_then(|v| v.parse::<Locale>().ok())
            .unwrap_or_default();
        Ok(Self {
            database_url,
            jwt,
            catalog,
            dataset_api_url,
            http_timeout_secs,
            default_locale,
        })
    }
}
