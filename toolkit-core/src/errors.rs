//! # Errors
//!
//! Every fallible toolkit operation returns a [`ToolkitError`]. The variants
//! fall into three groups:
//! - caller input (bad slug input, rejected uploads, malformed JSON)
//! - resources (filesystem and body stream failures, passed through as-is)
//! - contract violations (the decoder itself failed, not the caller's data)
//!
//! [`ErrorKind`] carries the HTTP status and class name a transport crate
//! should use when turning the error into a response.

use thiserror::Error;

/// A convenience result type for toolkit APIs.
pub type ToolkitResult<T> = std::result::Result<T, ToolkitError>;

/// Boxed error used for body and stream failures coming from the transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Status classes a [`ToolkitError`] maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,           // 400
    NotFound,             // 404
    PayloadTooLarge,      // 413
    UnsupportedMediaType, // 415
    GeneralError,         // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::UnsupportedMediaType => 415,
            ErrorKind::GeneralError => 500,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::PayloadTooLarge => "PayloadTooLarge",
            ErrorKind::UnsupportedMediaType => "UnsupportedMediaType",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    /// Kebab-cased `className`
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::PayloadTooLarge => "payload-too-large",
            ErrorKind::UnsupportedMediaType => "unsupported-media-type",
            ErrorKind::GeneralError => "general-error",
        }
    }
}

#[derive(Error, Debug)]
pub enum ToolkitError {
    #[error("String is empty")]
    EmptyInput,

    #[error("Slug is empty")]
    EmptySlug,

    #[error("Alphabet must not be empty")]
    EmptyAlphabet,

    #[error("Invalid value {value:?} for configuration key {key}")]
    InvalidConfig { key: String, value: String },

    #[error("File type is not allowed: {content_type}")]
    TypeNotAllowed { content_type: String },

    #[error("File size is too big (limit is {limit} bytes)")]
    UploadTooLarge { limit: u64 },

    #[error("Invalid file name {name:?}")]
    InvalidFileName { name: String },

    #[error("No file was uploaded")]
    NoFiles,

    #[error("Invalid multipart form: {message}")]
    Multipart { message: String },

    #[error("{}", malformed_message(.offset))]
    MalformedJson { offset: Option<usize> },

    #[error("{}", invalid_value_message(.field, .offset))]
    InvalidJsonValue { field: Option<String>, offset: usize },

    #[error("Request body must not be empty")]
    EmptyBody,

    #[error("Request body contains unknown field \"{field}\"")]
    UnknownField { field: String },

    #[error("Request body must not be larger than {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Error unmarshalling the JSON: {detail}")]
    Unmarshal { detail: String },

    #[error("Request body must only contain a single JSON object")]
    MultipleJsonValues,

    #[error("{message}")]
    Decode { message: String },

    #[error(transparent)]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Transport(#[source] BoxError),
}

fn malformed_message(offset: &Option<usize>) -> String {
    match offset {
        Some(offset) => format!("Request body contains badly-formed JSON (at position {offset})"),
        None => "Request body contains badly-formed JSON".to_string(),
    }
}

fn invalid_value_message(field: &Option<String>, offset: &usize) -> String {
    match field {
        Some(field) => format!(
            "Request body contains an invalid value for the \"{field}\" field (at position {offset})"
        ),
        None => format!("Request body contains an invalid value (at position {offset})"),
    }
}

impl ToolkitError {
    /// Wrap a transport-level error (body read, stream failure).
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Transport(error.into())
    }

    pub fn multipart<S: Into<String>>(message: S) -> Self {
        Self::Multipart {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolkitError::UploadTooLarge { .. } | ToolkitError::BodyTooLarge { .. } => {
                ErrorKind::PayloadTooLarge
            }
            ToolkitError::TypeNotAllowed { .. } => ErrorKind::UnsupportedMediaType,
            ToolkitError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::NotFound
            }
            ToolkitError::Unmarshal { .. }
            | ToolkitError::EmptyAlphabet
            | ToolkitError::InvalidConfig { .. }
            | ToolkitError::Encode(_)
            | ToolkitError::Io(_)
            | ToolkitError::Transport(_) => ErrorKind::GeneralError,
            _ => ErrorKind::BadRequest,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// True when the error was caused by the caller's input rather than
    /// by the environment or by how the toolkit was integrated.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
