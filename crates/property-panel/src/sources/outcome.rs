use serde::Serialize;

use super::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    NoData,
    Skipped,
    Degraded,
}

/// Value-or-warning result of one upstream stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome<T> {
    pub value: Option<T>,
    pub warning: Option<String>,
    pub status: SourceStatus,
}

impl<T> SourceOutcome<T> {
    pub fn found(value: T) -> Self {
        Self {
            value: Some(value),
            warning: None,
            status: SourceStatus::Ok,
        }
    }

    pub fn no_data(warning: impl Into<String>) -> Self {
        Self {
            value: None,
            warning: Some(warning.into()),
            status: SourceStatus::NoData,
        }
    }

    pub fn skipped(warning: impl Into<String>) -> Self {
        Self {
            value: None,
            warning: Some(warning.into()),
            status: SourceStatus::Skipped,
        }
    }

    pub fn degraded(warning: impl Into<String>) -> Self {
        Self {
            value: None,
            warning: Some(warning.into()),
            status: SourceStatus::Degraded,
        }
    }

    /// Converts an adapter result, logging and absorbing any failure.
    pub fn absorb(
        result: Result<Option<T>, ProviderError>,
        missing: impl FnOnce() -> String,
    ) -> Self {
        match result {
            Ok(Some(value)) => Self::found(value),
            Ok(None) => Self::no_data(missing()),
            Err(err) => {
                tracing::warn!(provider = err.provider(), error = %err, "upstream degraded");
                Self::degraded(err.to_string())
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SourceOutcome<U> {
        SourceOutcome {
            value: self.value.map(f),
            warning: self.warning,
            status: self.status,
        }
    }
}
