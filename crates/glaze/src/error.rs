// Copyright 2026 Marta Vidal
use actix_web::http::StatusCode;
use actix_web::ResponseError;
use thiserror::Error;

/// Errors raised by the template-context and media helpers.
///
/// Both variants propagate unmodified to actix's error layer through the
/// [`ResponseError`] impl; nothing in this crate catches or retries them.
#[derive(Debug, Error)]
pub enum GlazeError {
    /// A required setting is absent at the point of use.
    #[error("required setting {0:?} is not set")]
    MissingSetting(&'static str),

    /// An authenticated user reached a resource reserved for anonymous
    /// visitors.
    #[error("authenticated users cannot access this resource")]
    Forbidden,

    #[error("settings could not be loaded: {0}")]
    Config(#[from] config::ConfigError),

    #[error("session write failed: {0}")]
    Session(#[from] actix_session::SessionInsertError),
}

impl ResponseError for GlazeError {
    fn status_code(&self) -> StatusCode {
        match self {
            GlazeError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, GlazeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_setting_names_the_key() {
        let err = GlazeError::MissingSetting("media_path");
        assert_eq!(err.to_string(), "required setting \"media_path\" is not set");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(GlazeError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            GlazeError::MissingSetting("template_path").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
