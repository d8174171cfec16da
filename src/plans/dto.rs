use serde::Deserialize;

use super::{model::Direction, transfer::FileFormat};
use crate::error::{AppError, AppResult};

/// `?format=json|xml|yaml`, JSON when absent.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

impl ExportQuery {
    pub fn file_format(&self) -> AppResult<FileFormat> {
        match self.format.as_deref().map(str::trim) {
            None | Some("") => Ok(FileFormat::default()),
            Some(raw) => raw.parse().map_err(AppError::from),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
}
