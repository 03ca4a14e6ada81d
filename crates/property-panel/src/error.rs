use crate::config::ConfigError;
use crate::panel::PanelError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Http(reqwest::Error),
    Server(axum::Error),
    Panel(PanelError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Http(err) => write!(f, "http client error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Panel(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Http(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Panel(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Panel(PanelError::Upstream {
            provider,
            status,
            details,
        }) = &self
        {
            let body = Json(json!({
                "error": self.to_string(),
                "provider": provider,
                "providerStatus": status,
                "details": details,
            }));
            return (StatusCode::BAD_GATEWAY, body).into_response();
        }

        let status = match self {
            AppError::Panel(PanelError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Panel(PanelError::Upstream { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Panel(PanelError::Internal(_))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Http(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<PanelError> for AppError {
    fn from(value: PanelError) -> Self {
        Self::Panel(value)
    }
}
