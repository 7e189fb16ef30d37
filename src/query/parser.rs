//! Pest grammar front-end for the query language

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use serde_json::Value;

use super::{Expr, QueryError};

#[derive(Parser)]
#[grammar = "../grammar/query.pest"]
struct QueryParser;

type ParseResult<T> = Result<T, QueryError>;

/// Parse query text into an expression tree.
pub fn parse_query(input: &str) -> ParseResult<Expr> {
    let pair = QueryParser::parse(Rule::query, input)
        .map_err(|e| QueryError::invalid(input, e.to_string()))?
        .next()
        .ok_or_else(|| QueryError::invalid(input, "empty query"))?;

    build_pipe(first_inner(pair)?)
}

fn first_inner(pair: Pair<Rule>) -> ParseResult<Pair<Rule>> {
    let text = pair.as_str();
    pair.into_inner()
        .next()
        .ok_or_else(|| QueryError::invalid(text, "expected an expression"))
}

// Left-folds `operand (op operand)*`; operator tokens are skipped.
fn fold_binary(
    pair: Pair<Rule>,
    operand: fn(Pair<Rule>) -> ParseResult<Expr>,
    combine: fn(Expr, Expr) -> Expr,
) -> ParseResult<Expr> {
    let text = pair.as_str();
    let mut operands = pair
        .into_inner()
        .filter(|p| !matches!(p.as_rule(), Rule::and_op | Rule::eq_op))
        .map(operand);

    let first = operands
        .next()
        .ok_or_else(|| QueryError::invalid(text, "expected an operand"))??;
    operands.try_fold(first, |acc, next: ParseResult<Expr>| {
        next.map(|rhs| combine(acc, rhs))
    })
}

fn build_pipe(pair: Pair<Rule>) -> ParseResult<Expr> {
    fold_binary(pair, build_conjunction, Expr::pipe)
}

fn build_conjunction(pair: Pair<Rule>) -> ParseResult<Expr> {
    fold_binary(pair, build_comparison, Expr::and)
}

fn build_comparison(pair: Pair<Rule>) -> ParseResult<Expr> {
    fold_binary(pair, build_term, Expr::eq)
}

fn build_term(pair: Pair<Rule>) -> ParseResult<Expr> {
    let text = pair.as_str();
    let mut inner = pair.into_inner();
    let head = inner
        .next()
        .ok_or_else(|| QueryError::invalid(text, "expected a term"))?;

    let mut expr = match head.as_rule() {
        Rule::group => build_pipe(first_inner(head)?)?,
        Rule::select => Expr::select(build_pipe(first_inner(head)?)?),
        Rule::path => match head.into_inner().next() {
            Some(step) => apply_step(Expr::Identity, step)?,
            None => Expr::Identity,
        },
        _ => Expr::Literal(build_literal(head)?),
    };

    for step in inner {
        expr = apply_step(expr, step)?;
    }
    Ok(expr)
}

fn apply_step(base: Expr, step: Pair<Rule>) -> ParseResult<Expr> {
    match step.as_rule() {
        Rule::field => Ok(Expr::field(base, build_key(first_inner(step)?)?)),
        Rule::ident | Rule::string => Ok(Expr::field(base, build_key(step)?)),
        Rule::bracket => {
            let text = step.as_str();
            match step.into_inner().next() {
                None => Ok(Expr::iterate(base)),
                Some(literal) => match build_literal(literal)? {
                    key @ (Value::String(_) | Value::Number(_)) => Ok(Expr::index(base, key)),
                    _ => Err(QueryError::invalid(
                        text,
                        "index must be a string or a number",
                    )),
                },
            }
        }
        other => Err(QueryError::invalid(
            step.as_str(),
            format!("unexpected {other:?} in path"),
        )),
    }
}

fn build_key(pair: Pair<Rule>) -> ParseResult<String> {
    match pair.as_rule() {
        Rule::ident => Ok(pair.as_str().to_string()),
        Rule::string => serde_json::from_str(pair.as_str())
            .map_err(|e| QueryError::invalid(pair.as_str(), e.to_string())),
        other => Err(QueryError::invalid(
            pair.as_str(),
            format!("expected a field name, found {other:?}"),
        )),
    }
}

fn build_literal(pair: Pair<Rule>) -> ParseResult<Value> {
    match pair.as_rule() {
        Rule::string | Rule::number => serde_json::from_str(pair.as_str())
            .map_err(|e| QueryError::invalid(pair.as_str(), e.to_string())),
        Rule::true_lit => Ok(Value::Bool(true)),
        Rule::false_lit => Ok(Value::Bool(false)),
        Rule::null_lit => Ok(Value::Null),
        other => Err(QueryError::invalid(
            pair.as_str(),
            format!("expected a literal, found {other:?}"),
        )),
    }
}
