use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::ACCEPT_LANGUAGE, request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt, str::FromStr};

use crate::state::AppState;

/// Languages user-facing text is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Es];

    /// Picks the first supported language from an `Accept-Language` header.
    /// Quality values are ignored; browsers already send them in preference order.
    pub fn from_accept_language(header: &str) -> Option<Locale> {
        header
            .split(',')
            .filter_map(|part| part.split(';').next())
            .map(|tag| tag.trim().to_ascii_lowercase())
            .find_map(|tag| {
                let primary = tag.split('-').next().unwrap_or_default();
                primary.parse().ok()
            })
    }

    pub fn from_headers(headers: &HeaderMap, fallback: Locale) -> Locale {
        headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(Locale::from_accept_language)
            .unwrap_or(fallback)
    }

    /// Prefix prepended to an imported plan whose name is already taken.
    pub fn copy_prefix(self) -> &'static str {
        match self {
            Locale::En => "Copy - ",
            Locale::Es => "Copia - ",
        }
    }

    pub fn training_day_suffix(self) -> &'static str {
        match self {
            Locale::En => "Training",
            Locale::Es => "Entrenamiento",
        }
    }

    pub fn diet_day_suffix(self) -> &'static str {
        match self {
            Locale::En => "Meals",
            Locale::Es => "Comidas",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "es" => Ok(Locale::Es),
            other => Err(format!("unsupported locale '{other}'")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => f.write_str("en"),
            Locale::Es => f.write_str("es"),
        }
    }
}

/// Request locale resolved from `Accept-Language`, falling back to the configured default.
#[derive(Debug, Clone, Copy)]
pub struct Lang(pub Locale);

#[async_trait]
impl FromRequestParts<AppState> for Lang {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Lang(Locale::from_headers(&parts.headers, state.config.default_locale)))
    }
}
