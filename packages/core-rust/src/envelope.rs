//! Uniform error envelope returned for every failed request.
//!
//! ```json
//! {"error": {"code": "VALIDATION_ERROR", "message": "...", "request_id": "..."}}
//! ```

use serde::{Deserialize, Serialize};

/// Code for request bodies or queries that fail schema validation.
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";

/// Code for faults the service did not anticipate.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// The only message clients ever see for an unexpected fault.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Failure taxonomy. Each kind maps to one status and one envelope code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client-supplied data is malformed. Always 422.
    Validation,
    /// Business logic rejected the request with an intended status.
    Application { status: u16 },
    /// Programming or dependency fault. Always 500.
    Unexpected,
}

impl ErrorKind {
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            Self::Validation => 422,
            Self::Application { status } => status,
            Self::Unexpected => 500,
        }
    }

    #[must_use]
    pub fn code(self) -> String {
        match self {
            Self::Validation => VALIDATION_ERROR.to_owned(),
            Self::Application { status } => format!("HTTP_{status}"),
            Self::Unexpected => INTERNAL_ERROR.to_owned(),
        }
    }

    /// `true` when the client caused the failure (logged as a warning).
    #[must_use]
    pub fn is_client_fault(self) -> bool {
        !matches!(self, Self::Unexpected)
    }
}

/// Top-level error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub request_id: String,
}

impl ErrorEnvelope {
    /// Builds the envelope for `kind`.
    ///
    /// For [`ErrorKind::Unexpected`] the message is always
    /// [`INTERNAL_ERROR_MESSAGE`]; whatever the caller passed is discarded so
    /// fault details cannot reach the client.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>, request_id: impl Into<String>) -> Self {
        let message = match kind {
            ErrorKind::Unexpected => INTERNAL_ERROR_MESSAGE.to_owned(),
            _ => message.into(),
        };
        Self {
            error: ErrorBody {
                code: kind.code(),
                message,
                request_id: request_id.into(),
            },
        }
    }
}
