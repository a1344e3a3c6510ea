//! Error types for document decoding and encoding

/// Errors raised while turning text into a [`ConfigDocument`](crate::ConfigDocument)
/// and back
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Text is not valid in the document format
    #[error("syntax error: {message}")]
    Syntax { message: String },

    /// Decoded top-level value is not a mapping
    #[error("document root expected to be a mapping, got {actual}")]
    NotAMapping { actual: &'static str },

    /// Value cannot be written in block mode
    #[error("cannot encode value at `{path}`: {reason}")]
    Encode { path: String, reason: String },

    /// Indentation unit is empty, or is not made of only spaces or only tabs
    #[error("invalid indentation unit: {0:?}")]
    InvalidIndent(String),
}

impl DocumentError {
    /// Create syntax error
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Create encode error for a dotted path
    pub fn encode(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;
