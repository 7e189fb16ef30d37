use thiserror::Error;

/// Errors raised while compiling or running a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The query text does not match the grammar.
    #[error("invalid query '{query}': {message}")]
    Invalid { query: String, message: String },

    /// A runtime type mismatch, e.g. indexing a string with a field name.
    #[error("evaluation error: {message}")]
    Evaluation { message: String },
}

impl QueryError {
    pub fn invalid(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            query: query.into(),
            message: message.into(),
        }
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }
}
