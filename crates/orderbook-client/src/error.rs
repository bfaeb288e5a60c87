use {crate::swap::ValidationError, thiserror::Error};

/// Error returned by the order backend or by the transport in front of it.
///
/// `status` is the HTTP status code of the response, or `0` when the
/// request never produced a usable response (connection failures,
/// timeouts, bodies that do not decode).
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message} (status {status})")]
pub struct ApiError {
    pub message: String,
    pub status: u16,
    /// Structured information the backend attached to the error, e.g. one
    /// entry per field that failed validation.
    pub details: Option<Vec<serde_json::Value>>,
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: 0,
            details: None,
        }
    }

    pub fn rejected(
        status: u16,
        message: impl Into<String>,
        details: Option<Vec<serde_json::Value>>,
    ) -> Self {
        Self {
            message: message.into(),
            status,
            details,
        }
    }

    /// Whether the request failed before the backend could answer it.
    pub fn is_transport(&self) -> bool {
        self.status == 0
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

/// Error of operations that validate their input locally before talking to
/// the backend.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid swap: {}", format_validation(.0))]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Api(#[from] ApiError),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::Validation(vec![err])
    }
}
