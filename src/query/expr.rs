use std::fmt;

use serde_json::Value;

/// Typed expression tree of the query language.
///
/// Every expression maps an input value to a stream of output values. Trees
/// render back to canonical query text through `Display`, and parsing that
/// text yields an equal tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `.`
    Identity,
    /// `<base>.name`
    Field(Box<Expr>, String),
    /// `<base>[0]`, `<base>["key"]`
    Index(Box<Expr>, Value),
    /// `<base>[]`
    Iterate(Box<Expr>),
    /// `"text"`, `1`, `true`, `null`
    Literal(Value),
    /// `select(<predicate>)`
    Select(Box<Expr>),
    /// `<lhs> == <rhs>`
    Eq(Box<Expr>, Box<Expr>),
    /// `<lhs> and <rhs>`
    And(Box<Expr>, Box<Expr>),
    /// `<lhs> | <rhs>`
    Pipe(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn field(base: Expr, name: impl Into<String>) -> Self {
        Self::Field(Box::new(base), name.into())
    }

    pub fn index(base: Expr, key: impl Into<Value>) -> Self {
        Self::Index(Box::new(base), key.into())
    }

    pub fn iterate(base: Expr) -> Self {
        Self::Iterate(Box::new(base))
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn select(predicate: Expr) -> Self {
        Self::Select(Box::new(predicate))
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::Eq(Box::new(lhs), Box::new(rhs))
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn pipe(lhs: Expr, rhs: Expr) -> Self {
        Self::Pipe(Box::new(lhs), Box::new(rhs))
    }

    /// `.name == <value>`
    pub fn field_eq(name: &str, value: impl Into<Value>) -> Self {
        Self::eq(Self::field(Self::Identity, name), Self::literal(value))
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Pipe(..) => 0,
            Expr::And(..) => 1,
            Expr::Eq(..) => 2,
            _ => 3,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }

    // The identity base is implied by the leading dot of a path.
    fn fmt_base(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identity => Ok(()),
            base => base.fmt_operand(f, 3),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identity => write!(f, "."),
            Expr::Field(base, name) => {
                base.fmt_base(f)?;
                if is_identifier(name) {
                    write!(f, ".{name}")
                } else {
                    write!(f, ".{}", Value::from(name.as_str()))
                }
            }
            Expr::Index(base, key) => {
                if matches!(**base, Expr::Identity) {
                    write!(f, ".")?;
                }
                base.fmt_base(f)?;
                write!(f, "[{key}]")
            }
            Expr::Iterate(base) => {
                if matches!(**base, Expr::Identity) {
                    write!(f, ".")?;
                }
                base.fmt_base(f)?;
                write!(f, "[]")
            }
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Select(predicate) => write!(f, "select({predicate})"),
            Expr::Eq(lhs, rhs) => {
                lhs.fmt_operand(f, 3)?;
                write!(f, " == ")?;
                rhs.fmt_operand(f, 3)
            }
            Expr::And(lhs, rhs) => {
                lhs.fmt_operand(f, 1)?;
                write!(f, " and ")?;
                rhs.fmt_operand(f, 2)
            }
            Expr::Pipe(lhs, rhs) => {
                lhs.fmt_operand(f, 0)?;
                write!(f, " | ")?;
                rhs.fmt_operand(f, 1)
            }
        }
    }
}

/// Whether `name` can be written as a bare `.name` step.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
