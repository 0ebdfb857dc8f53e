use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocError {
    #[error("Malformed document path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error(
        "Cannot get value by the document path: \"{path}\". The property \"{attribute}\" is not found in the upper undefined object."
    )]
    PathNotFound { path: String, attribute: String },

    #[error("Unknown operator: \"{0}\".")]
    UnknownOperator(String),

    #[error("Operator \"{0}\" is currently unimplemented.")]
    UnsupportedOperator(String),

    #[error("\"{operator}\" operator must be applied to an array. DocumentPath: \"{path}\".")]
    NotAnArray { operator: String, path: String },

    #[error("$rename operation cannot be applied to element in array: \"{0}\".")]
    InvalidRename(String),

    #[error("\"$append\" operator cannot be applied to an array. DocumentPath: \"{0}\".")]
    InvalidAppend(String),

    #[error("Array index {index} at \"{path}\" is too far past the end of the array.")]
    IndexOutOfRange { path: String, index: usize },

    #[error("Invalid operand for \"{operator}\": {reason}")]
    InvalidOperand { operator: String, reason: String },

    #[error("Updating the path '{path}' would create a conflict at '{conflict}'")]
    PathConflict { path: String, conflict: String },

    #[error("Restore error: {0}")]
    Restore(String),

    #[error("Regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl DocError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPath { path: path.to_string(), reason: reason.into() }
    }

    pub(crate) fn operand(operator: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOperand { operator: operator.to_string(), reason: reason.into() }
    }
}

pub type Result<T, E = DocError> = std::result::Result<T, E>;
