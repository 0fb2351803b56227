use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Error detail observed from a failed directory API call.
///
/// Microsoft Graph reports failures through an HTTP status, an `OData` error
/// code and a human readable message. Not every endpoint fills all three, so
/// each part is kept separately and consumers decide which ones to trust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphErrorInfo {
    status_code: Option<u16>,
    error_code: Option<String>,
    message: String,
}

impl GraphErrorInfo {
    /// Creates error detail from its parts.
    #[must_use]
    pub fn new(
        status_code: Option<u16>,
        error_code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            error_code: error_code.filter(|code| !code.trim().is_empty()),
            message: message.into(),
        }
    }

    /// Creates error detail for a response that carried only a status.
    #[must_use]
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        Self::new(Some(status_code), None, message)
    }

    /// Extracts error detail from any application error.
    ///
    /// Graph errors keep their full detail. `AppError::NotFound` maps to a 404
    /// so that callers classifying the result see a consistent shape; every
    /// other category only contributes its message.
    #[must_use]
    pub fn from_app_error(error: &AppError) -> Self {
        match error {
            AppError::Graph(info) => info.clone(),
            AppError::NotFound(message) => Self::from_status(404, message.clone()),
            other => Self::new(None, None, other.to_string()),
        }
    }

    /// Returns the HTTP status code, if the call produced a response.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Returns the `OData` error code, if the response body carried one.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl Display for GraphErrorInfo {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.status_code, self.error_code.as_deref()) {
            (Some(status), Some(code)) => {
                write!(formatter, "status {status} ({code}): {}", self.message)
            }
            (Some(status), None) => write!(formatter, "status {status}: {}", self.message),
            (None, Some(code)) => write!(formatter, "{code}: {}", self.message),
            (None, None) => formatter.write_str(self.message.as_str()),
        }
    }
}
