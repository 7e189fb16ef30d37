//! Minimal jq-style query language over JSON value trees.
//!
//! Supports `.`, field and index access, `.[]`, `select(...)`, `==`, `and`
//! and `|`. A compiled [`Query`] is run with [`Query::first`], which pulls a
//! single value from the (lazy) output stream.

mod error;
mod eval;
mod expr;
mod parser;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

pub use error::QueryError;
pub use expr::Expr;

/// A compiled query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    expr: Expr,
}

impl Query {
    /// Compile query text.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        parser::parse_query(text).map(Self::from)
    }

    /// The query `.`, which returns its input unchanged.
    pub fn identity() -> Self {
        Self {
            expr: Expr::Identity,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Run the query and return its first output, or `None` when the query
    /// produces nothing.
    ///
    /// Outputs after the first are never computed, so errors they would
    /// raise are not observed.
    pub fn first(&self, input: &Value) -> Result<Option<Value>, QueryError> {
        self.expr
            .eval(Cow::Borrowed(input))
            .next()
            .transpose()
            .map(|found| found.map(Cow::into_owned))
    }
}

impl From<Expr> for Query {
    fn from(expr: Expr) -> Self {
        Self { expr }
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expr, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_error_is_invalid_query() {
        let result = Query::parse("select(");
        assert!(matches!(result, Err(QueryError::Invalid { .. })));
    }

    #[test]
    fn test_identity_query() {
        let input = json!({"id": "i-123"});
        assert_eq!(Query::identity().to_string(), ".");
        assert_eq!(Query::identity().first(&input).unwrap(), Some(input.clone()));
    }

    #[test]
    fn test_from_str() {
        let query: Query = ".id".parse().unwrap();
        assert_eq!(query.first(&json!({"id": 7})).unwrap(), Some(json!(7)));
    }

    #[test]
    fn test_display_matches_source() {
        let text = r#".[] | select(.mode == "data").instances[0].attributes"#;
        assert_eq!(Query::parse(text).unwrap().to_string(), text);
    }

    #[test]
    fn test_first_of_empty_stream_is_none() {
        let query = Query::parse(r#".[] | select(.name == "x")"#).unwrap();
        assert_eq!(query.first(&json!([{"name": "y"}])).unwrap(), None);
    }
}
