use std::{fmt, sync::Arc};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::{
    i18n::Locale,
    plans::{model::PlanError, transfer::TransferError},
    state::AppState,
};

/// Things a request can fail to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Plan,
    Day,
    Item,
    ProgressEntry,
    Analysis,
}

impl Resource {
    fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Resource::Plan, Locale::En) => "Plan",
            (Resource::Plan, Locale::Es) => "Plan",
            (Resource::Day, Locale::En) => "Day",
            (Resource::Day, Locale::Es) => "Día",
            (Resource::Item, Locale::En) => "Item",
            (Resource::Item, Locale::Es) => "Elemento",
            (Resource::ProgressEntry, Locale::En) => "Progress entry",
            (Resource::ProgressEntry, Locale::Es) => "Registro de progreso",
            (Resource::Analysis, Locale::En) => "Analysis",
            (Resource::Analysis, Locale::Es) => "Análisis",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(Locale::En))
    }
}

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    Required,
    Malformed,
    TooShort { min: usize },
    OutOfRange { min: f64, max: f64 },
}

impl Violation {
    fn describe(&self, locale: Locale) -> String {
        match (self, locale) {
            (Violation::Required, Locale::En) => "is required".into(),
            (Violation::Required, Locale::Es) => "es obligatorio".into(),
            (Violation::Malformed, Locale::En) => "is malformed".into(),
            (Violation::Malformed, Locale::Es) => "tiene un formato no válido".into(),
            (Violation::TooShort { min }, Locale::En) => format!("must be at least {min} characters"),
            (Violation::TooShort { min }, Locale::Es) => format!("debe tener al menos {min} caracteres"),
            (Violation::OutOfRange { min, max }, Locale::En) => format!("must be between {min} and {max}"),
            (Violation::OutOfRange { min, max }, Locale::Es) => format!("debe estar entre {min} y {max}"),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(Locale::En))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{field} {violation}")]
    Validation { field: String, violation: Violation },
    #[error("A plan named '{name}' already exists")]
    DuplicateName { name: String, conflict_id: Option<Uuid> },
    #[error("Plan name is required")]
    IncompletePlan,
    #[error("Day {day} is incomplete")]
    IncompleteDay { day: usize },
    #[error("Item {item} of day {day} is incomplete")]
    IncompleteItem { day: usize, item: usize },
    #[error("Unsupported file format '{extension}'")]
    UnsupportedFormat { extension: String },
    #[error("Could not read the imported file: {0}")]
    ImportParse(String),
    #[error("Not enough data to compute a correlation")]
    InsufficientData,
    #[error("Upstream service unavailable: {0}")]
    Transport(String),
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::IncompletePlan => AppError::IncompletePlan,
            PlanError::IncompleteDay { day } => AppError::IncompleteDay { day },
            PlanError::IncompleteItem { day, item } => AppError::IncompleteItem { day, item },
            PlanError::DayOutOfRange(_) => AppError::NotFound(Resource::Day),
            PlanError::ItemOutOfRange(_) => AppError::NotFound(Resource::Item),
        }
    }
}

impl From<TransferError> for AppError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::UnsupportedFormat(extension) => AppError::UnsupportedFormat { extension },
            TransferError::Parse(detail) => AppError::ImportParse(detail),
            TransferError::Encode(detail) => AppError::Internal(anyhow::anyhow!(detail)),
        }
    }
}

impl AppError {
    pub fn validation(field: impl Into<String>, violation: Violation) -> Self {
        AppError::Validation {
            field: field.into(),
            violation,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::DuplicateName { .. } => StatusCode::CONFLICT,
            AppError::IncompletePlan
            | AppError::IncompleteDay { .. }
            | AppError::IncompleteItem { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::ImportParse(_) => StatusCode::BAD_REQUEST,
            AppError::InsufficientData => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::EmailTaken => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::DuplicateName { .. } => "duplicate_name",
            AppError::IncompletePlan => "incomplete_plan",
            AppError::IncompleteDay { .. } => "incomplete_day",
            AppError::IncompleteItem { .. } => "incomplete_item",
            AppError::UnsupportedFormat { .. } => "unsupported_format",
            AppError::ImportParse(_) => "import_parse_error",
            AppError::InsufficientData => "insufficient_data",
            AppError::Transport(_) => "transport_error",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::EmailTaken => "email_taken",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Human readable text for the caller. Internal details never leak.
    pub fn message(&self, locale: Locale) -> String {
        match locale {
            Locale::En => match self {
                AppError::Internal(_) => "Something went wrong, please try again later".into(),
                AppError::Transport(_) => {
                    "An external service did not respond, please try again later".into()
                }
                other => other.to_string(),
            },
            Locale::Es => match self {
                AppError::Validation { field, violation } => {
                    format!("El campo {field} {}", violation.describe(locale))
                }
                AppError::DuplicateName { name, .. } => {
                    format!("Ya existe un plan llamado '{name}'")
                }
                AppError::IncompletePlan => "El nombre del plan es obligatorio".into(),
                AppError::IncompleteDay { day } => format!("El día {day} está incompleto"),
                AppError::IncompleteItem { day, item } => {
                    format!("El elemento {item} del día {day} está incompleto")
                }
                AppError::UnsupportedFormat { extension } => {
                    format!("Formato de archivo no soportado '{extension}'")
                }
                AppError::ImportParse(detail) => {
                    format!("No se pudo leer el archivo importado: {detail}")
                }
                AppError::InsufficientData => {
                    "No hay datos suficientes para calcular la correlación".into()
                }
                AppError::Transport(_) => {
                    "Un servicio externo no respondió, inténtalo más tarde".into()
                }
                AppError::NotFound(resource) => {
                    format!("{} no encontrado", resource.label(locale))
                }
                AppError::Unauthorized(_) => "No autorizado".into(),
                AppError::EmailTaken => "El correo ya está registrado".into(),
                AppError::Internal(_) => "Algo salió mal, inténtalo más tarde".into(),
            },
        }
    }

    pub fn render(&self, locale: Locale) -> Response {
        let mut body = Map::new();
        body.insert("error".into(), Value::from(self.code()));
        body.insert("message".into(), Value::from(self.message(locale)));
        match self {
            AppError::Validation { field, .. } => {
                body.insert("field".into(), json!(field));
            }
            AppError::DuplicateName {
                conflict_id: Some(id),
                ..
            } => {
                body.insert("conflictId".into(), json!(id));
            }
            _ => {}
        }
        (self.status(), Json(Value::Object(body))).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(e) = &self {
            error!(error = ?e, "internal error");
        }
        let mut res = self.render(Locale::En);
        res.extensions_mut().insert(Arc::new(self));
        res
    }
}

/// Re-renders error bodies in the language the caller asked for.
pub async fn localize_errors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let locale = Locale::from_headers(req.headers(), state.config.default_locale);
    let res = next.run(req).await;
    match res.extensions().get::<Arc<AppError>>().cloned() {
        Some(err) if locale != Locale::En => err.render(locale),
        _ => res,
    }
}
