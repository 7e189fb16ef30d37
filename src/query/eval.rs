//! Lazy evaluation of expression trees.
//!
//! Values flow through the pipeline as `Cow`s borrowed from the input tree,
//! so navigation never copies or mutates the document. Only values produced
//! by the query itself (comparison results, defaulted nulls) are owned.

use std::borrow::Cow;
use std::iter;

use serde_json::{Number, Value};

use super::{Expr, QueryError};

pub(crate) type Stream<'a> = Box<dyn Iterator<Item = Result<Cow<'a, Value>, QueryError>> + 'a>;

impl Expr {
    pub(crate) fn eval<'a>(&'a self, input: Cow<'a, Value>) -> Stream<'a> {
        match self {
            Expr::Identity => Box::new(iter::once(Ok(input))),
            Expr::Literal(value) => Box::new(iter::once(Ok(Cow::Borrowed(value)))),
            Expr::Field(base, name) => {
                Box::new(base.eval(input).map(move |r| r.and_then(|v| field(v, name))))
            }
            Expr::Index(base, key) => {
                Box::new(base.eval(input).map(move |r| r.and_then(|v| index(v, key))))
            }
            Expr::Iterate(base) => Box::new(base.eval(input).flat_map(|r| match r {
                Ok(v) => iterate(v),
                Err(e) => fail(e),
            })),
            Expr::Select(predicate) => {
                let outcomes = predicate.eval(input.clone());
                Box::new(outcomes.filter_map(move |r| match r {
                    Ok(v) if is_truthy(&v) => Some(Ok(input.clone())),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                }))
            }
            Expr::Eq(lhs, rhs) => {
                let rights = match rhs.eval(input.clone()).collect::<Result<Vec<_>, _>>() {
                    Ok(rights) => rights,
                    Err(e) => return fail(e),
                };
                Box::new(lhs.eval(input).flat_map(move |l| -> Stream<'a> {
                    match l {
                        Ok(l) => Box::new(
                            rights
                                .clone()
                                .into_iter()
                                .map(move |r| Ok(boolean(values_equal(&l, &r)))),
                        ),
                        Err(e) => fail(e),
                    }
                }))
            }
            Expr::And(lhs, rhs) => {
                let lefts = lhs.eval(input.clone());
                Box::new(lefts.flat_map(move |l| -> Stream<'a> {
                    match l {
                        Ok(l) if !is_truthy(&l) => Box::new(iter::once(Ok(boolean(false)))),
                        Ok(_) => Box::new(
                            rhs.eval(input.clone())
                                .map(|r| r.map(|r| boolean(is_truthy(&r)))),
                        ),
                        Err(e) => fail(e),
                    }
                }))
            }
            Expr::Pipe(lhs, rhs) => Box::new(lhs.eval(input).flat_map(move |r| match r {
                Ok(v) => rhs.eval(v),
                Err(e) => fail(e),
            })),
        }
    }
}

fn fail<'a>(error: QueryError) -> Stream<'a> {
    Box::new(iter::once(Err(error)))
}

fn boolean<'a>(value: bool) -> Cow<'a, Value> {
    Cow::Owned(Value::Bool(value))
}

fn null<'a>() -> Cow<'a, Value> {
    Cow::Owned(Value::Null)
}

fn field<'a>(value: Cow<'a, Value>, name: &str) -> Result<Cow<'a, Value>, QueryError> {
    match value {
        Cow::Borrowed(Value::Object(map)) => Ok(map.get(name).map_or_else(null, Cow::Borrowed)),
        Cow::Owned(Value::Object(mut map)) => {
            Ok(Cow::Owned(map.remove(name).unwrap_or(Value::Null)))
        }
        v if v.is_null() => Ok(null()),
        v => Err(QueryError::evaluation(format!(
            "cannot index {} with {}",
            type_name(&v),
            Value::from(name)
        ))),
    }
}

fn index<'a>(value: Cow<'a, Value>, key: &Value) -> Result<Cow<'a, Value>, QueryError> {
    match (value, key) {
        (v, Value::String(name)) => field(v, name),
        (Cow::Borrowed(Value::Array(items)), Value::Number(n)) => Ok(array_position(items.len(), n)
            .and_then(|i| items.get(i))
            .map_or_else(null, Cow::Borrowed)),
        (Cow::Owned(Value::Array(mut items)), Value::Number(n)) => {
            Ok(match array_position(items.len(), n) {
                Some(i) => Cow::Owned(items.swap_remove(i)),
                None => null(),
            })
        }
        (v, Value::Number(_)) if v.is_null() => Ok(null()),
        (v, key) => Err(QueryError::evaluation(format!(
            "cannot index {} with {}",
            type_name(&v),
            type_name(key)
        ))),
    }
}

// Resolves a possibly negative index against an array of `len` items.
fn array_position(len: usize, n: &Number) -> Option<usize> {
    let i = match n.as_i64() {
        Some(i) => i,
        None => n.as_f64()?.floor() as i64,
    };
    let position = if i < 0 {
        len.checked_sub(usize::try_from(i.unsigned_abs()).ok()?)?
    } else {
        usize::try_from(i).ok()?
    };
    (position < len).then_some(position)
}

fn iterate<'a>(value: Cow<'a, Value>) -> Stream<'a> {
    match value {
        Cow::Borrowed(Value::Array(items)) => Box::new(items.iter().map(|v| Ok(Cow::Borrowed(v)))),
        Cow::Borrowed(Value::Object(map)) => Box::new(map.values().map(|v| Ok(Cow::Borrowed(v)))),
        Cow::Owned(Value::Array(items)) => Box::new(items.into_iter().map(|v| Ok(Cow::Owned(v)))),
        Cow::Owned(Value::Object(map)) => {
            Box::new(map.into_iter().map(|(_, v)| Ok(Cow::Owned(v))))
        }
        v => fail(QueryError::evaluation(format!(
            "cannot iterate over {}",
            type_name(&v)
        ))),
    }
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

// Structural equality; numbers compare by value regardless of representation.
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, x)| b.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => lhs == rhs,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use serde_json::json;

    fn first(query: &str, input: &Value) -> Result<Option<Value>, QueryError> {
        Query::parse(query)?.first(input)
    }

    fn all(query: &str, input: &Value) -> Vec<Value> {
        let query = Query::parse(query).unwrap();
        query
            .expr()
            .eval(Cow::Borrowed(input))
            .map(|r| r.unwrap().into_owned())
            .collect()
    }

    #[test]
    fn test_identity() {
        let input = json!({"a": 1});
        assert_eq!(first(".", &input).unwrap(), Some(input.clone()));
    }

    #[test]
    fn test_field_access() {
        let input = json!({"a": {"b": "c"}});
        assert_eq!(first(".a.b", &input).unwrap(), Some(json!("c")));
    }

    #[test]
    fn test_missing_field_is_null() {
        let input = json!({"a": 1});
        assert_eq!(first(".missing", &input).unwrap(), Some(Value::Null));
        assert_eq!(first(".missing.deeper", &input).unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_field_on_scalar_is_an_error() {
        let input = json!({"id": "i-123"});
        let err = first(".id.value", &input).unwrap_err();
        assert_eq!(
            err,
            QueryError::evaluation(r#"cannot index string with "value""#)
        );
    }

    #[test]
    fn test_iterate_array_and_object() {
        assert_eq!(all(".[]", &json!([1, 2, 3])), vec![json!(1), json!(2), json!(3)]);
        assert_eq!(all(".[]", &json!({"a": 1, "b": 2})), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_iterate_scalar_is_an_error() {
        let err = first(".[]", &json!("text")).unwrap_err();
        assert_eq!(err, QueryError::evaluation("cannot iterate over string"));
    }

    #[test]
    fn test_empty_iteration_is_not_found() {
        assert_eq!(first(".[]", &json!([])).unwrap(), None);
    }

    #[test]
    fn test_array_index() {
        let input = json!(["a", "b", "c"]);
        assert_eq!(first(".[0]", &input).unwrap(), Some(json!("a")));
        assert_eq!(first(".[-1]", &input).unwrap(), Some(json!("c")));
        assert_eq!(first(".[5]", &input).unwrap(), Some(Value::Null));
        assert_eq!(first(".[0]", &json!([])).unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_index_type_mismatch_is_an_error() {
        let err = first(".[0]", &json!({"a": 1})).unwrap_err();
        assert_eq!(err, QueryError::evaluation("cannot index object with number"));
    }

    #[test]
    fn test_string_index_on_object() {
        let input = json!({"tags": {"Name": "web"}});
        assert_eq!(first(r#".tags["Name"]"#, &input).unwrap(), Some(json!("web")));
    }

    #[test]
    fn test_select_filters_stream() {
        let input = json!([
            {"name": "a", "v": 1},
            {"name": "b", "v": 2},
        ]);
        assert_eq!(
            first(r#".[] | select(.name == "b") | .v"#, &input).unwrap(),
            Some(json!(2))
        );
        assert_eq!(
            first(r#".[] | select(.name == "z")"#, &input).unwrap(),
            None
        );
    }

    #[test]
    fn test_equality_is_total() {
        let input = json!({"s": "x", "n": null});
        assert_eq!(first(r#".n == "x""#, &input).unwrap(), Some(json!(false)));
        assert_eq!(first(".missing == null", &input).unwrap(), Some(json!(true)));
        assert_eq!(first(r#".s == 1"#, &input).unwrap(), Some(json!(false)));
    }

    #[test]
    fn test_numeric_equality_ignores_representation() {
        let input = json!({"i": 1, "f": 1.0});
        assert_eq!(first(".i == .f", &input).unwrap(), Some(json!(true)));
    }

    #[test]
    fn test_and_uses_truthiness() {
        let input = json!({"a": 1, "b": null, "c": "x"});
        assert_eq!(first(".a and .c", &input).unwrap(), Some(json!(true)));
        assert_eq!(first(".a and .b", &input).unwrap(), Some(json!(false)));
        assert_eq!(first(".b and .missing.x", &input).unwrap(), Some(json!(false)));
    }

    #[test]
    fn test_and_short_circuits() {
        // the right side would fail on a string if evaluated
        let input = json!({"flag": false, "s": "x"});
        assert_eq!(first(".flag and .s.x", &input).unwrap(), Some(json!(false)));
    }

    #[test]
    fn test_only_first_result_is_evaluated() {
        // the second element would raise an error, but evaluation stops at the first match
        let input = json!([{"a": 1}, "not-an-object"]);
        assert_eq!(first(".[] | .a", &input).unwrap(), Some(json!(1)));
        assert!(first(".[] | select(.a == 2)", &input).is_err());
    }

    #[test]
    fn test_evaluation_does_not_mutate_input() {
        let input = json!([{"instances": [{"attributes": {"id": "x"}}]}]);
        let before = input.clone();
        let _ = first(".[] | .instances[0].attributes.id", &input).unwrap();
        assert_eq!(input, before);
    }

    #[test]
    fn test_literal_output() {
        assert_eq!(first(r#""x""#, &Value::Null).unwrap(), Some(json!("x")));
    }

    #[test]
    fn test_array_position() {
        let n = |v: i64| Number::from(v);
        assert_eq!(array_position(3, &n(0)), Some(0));
        assert_eq!(array_position(3, &n(-3)), Some(0));
        assert_eq!(array_position(3, &n(-4)), None);
        assert_eq!(array_position(3, &n(3)), None);
    }
}
