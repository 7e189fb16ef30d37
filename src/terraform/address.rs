//! Resource address parsing.
//!
//! An address such as `module.app.aws_instance.web["a"].private_ip` is split
//! into a resource selector, run against the state's resource list to find
//! the instance attributes, and an attribute selector, run against those
//! attributes. Both are built as typed [`Expr`] trees, so resource names are
//! never spliced into query text.

use std::str::FromStr;

use serde_json::Value;

use crate::error::{Result, TfstateError};
use crate::query::{Expr, Query};

type SegmentResult<T> = std::result::Result<T, &'static str>;

/// A parsed resource address.
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    /// Selects the matching instance's `attributes` object from the resource list.
    pub resource_selector: Query,
    /// Narrows the attributes object down to the addressed attribute (`.` when none).
    pub attribute_selector: Query,
}

impl Address {
    pub fn parse(address: &str) -> Result<Self> {
        let invalid = |reason: &str| TfstateError::invalid_address(address, reason);

        let segments =
            split_segments(address).ok_or_else(|| invalid("unbalanced brackets or quotes"))?;
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty segment"));
        }
        let too_short = match segments.first() {
            Some(&"module") => segments.len() < 4,
            Some(&"data") => segments.len() < 3,
            _ => segments.len() < 2,
        };
        if too_short {
            return Err(invalid("too few segments"));
        }

        let mut stages = Vec::new();
        let mut rest = segments.as_slice();
        // NOTE: a single module level only; nested `module.a.module.b` is not resolved
        if let ["module", name, tail @ ..] = rest {
            stages.push(Expr::select(Expr::field_eq(
                "module",
                format!("module.{name}"),
            )));
            rest = tail;
        }

        let attributes = match rest {
            ["data", kind, name, attributes @ ..] => {
                stages.push(data_selector(kind, name).map_err(invalid)?);
                attributes
            }
            ["data", ..] => return Err(invalid("data resource requires a type and a name")),
            [kind, name, attributes @ ..] => {
                stages.extend(managed_selector(kind, name).map_err(invalid)?);
                attributes
            }
            _ => return Err(invalid("missing resource type or name")),
        };

        let resource_selector = stages
            .into_iter()
            .fold(Expr::iterate(Expr::Identity), Expr::pipe);
        let attribute_selector = attribute_path(attributes).map_err(invalid)?;

        Ok(Self {
            resource_selector: resource_selector.into(),
            attribute_selector: attribute_selector.into(),
        })
    }
}

impl FromStr for Address {
    type Err = TfstateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// `.mode == <mode> and .type == <kind> and .name == <name>`
fn resource_predicate(mode: &str, kind: &str, name: &str) -> Expr {
    Expr::and(
        Expr::and(Expr::field_eq("mode", mode), Expr::field_eq("type", kind)),
        Expr::field_eq("name", name),
    )
}

// `<resource>.instances[0].attributes`
fn first_instance_attributes(resource: Expr) -> Expr {
    Expr::field(
        Expr::index(Expr::field(resource, "instances"), 0),
        "attributes",
    )
}

fn bare<'s>(segment: &'s str, reason: &'static str) -> SegmentResult<&'s str> {
    if segment.contains('[') {
        Err(reason)
    } else {
        Ok(segment)
    }
}

fn data_selector(kind: &str, name: &str) -> SegmentResult<Expr> {
    let kind = bare(kind, "resource type cannot be indexed")?;
    let name = bare(name, "data resources cannot be indexed")?;
    Ok(first_instance_attributes(Expr::select(resource_predicate(
        "data", kind, name,
    ))))
}

fn managed_selector(kind: &str, segment: &str) -> SegmentResult<Vec<Expr>> {
    let kind = bare(kind, "resource type cannot be indexed")?;
    let (name, keys) = split_index(segment)?;
    let predicate = resource_predicate("managed", kind, name);

    match keys.as_slice() {
        // single instance: the resource must not use for_each/count
        [] => Ok(vec![first_instance_attributes(Expr::select(Expr::and(
            predicate,
            Expr::field_eq("each", Value::Null),
        )))]),
        [key] => Ok(vec![
            Expr::iterate(Expr::field(Expr::select(predicate), "instances")),
            Expr::field(
                Expr::select(Expr::field_eq("index_key", key.clone())),
                "attributes",
            ),
        ]),
        _ => Err("a resource name takes at most one index"),
    }
}

fn attribute_path(segments: &[&str]) -> SegmentResult<Expr> {
    segments
        .iter()
        .try_fold(Expr::Identity, |path, segment| -> SegmentResult<Expr> {
            let (name, keys) = split_index(segment)?;
            Ok(keys.into_iter().fold(Expr::field(path, name), Expr::index))
        })
}

/// Split on `.` outside of `[...]`, so keys like `["example.com"]` stay whole.
fn split_segments(address: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let (mut depth, mut start) = (0usize, 0);
    let mut quotes = StringScanner::default();

    for (i, c) in address.char_indices() {
        if quotes.skip(c, depth > 0) {
            continue;
        }
        match c {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            '.' if depth == 0 => {
                segments.push(&address[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 || quotes.in_string {
        return None;
    }
    segments.push(&address[start..]);
    Some(segments)
}

/// Split `name["key"][0]` into `name` and its index literals.
fn split_index(segment: &str) -> SegmentResult<(&str, Vec<Value>)> {
    let (name, mut rest) = segment.split_at(segment.find('[').unwrap_or(segment.len()));
    if name.is_empty() {
        return Err("missing name before index");
    }

    let mut keys = Vec::new();
    while !rest.is_empty() {
        let body = rest
            .strip_prefix('[')
            .ok_or("unexpected text after index")?;
        let close = closing_bracket(body).ok_or("unterminated index")?;
        let key: Value = serde_json::from_str(&body[..close])
            .map_err(|_| "index must be a quoted string or a number")?;
        if !(key.is_string() || key.is_number()) {
            return Err("index must be a quoted string or a number");
        }
        keys.push(key);
        rest = &body[close + 1..];
    }
    Ok((name, keys))
}

fn closing_bracket(body: &str) -> Option<usize> {
    let mut quotes = StringScanner::default();
    body.char_indices()
        .find_map(|(i, c)| (!quotes.skip(c, true) && c == ']').then_some(i))
}

// Tracks JSON string literals while scanning an address char by char.
#[derive(Debug, Default)]
struct StringScanner {
    in_string: bool,
    escaped: bool,
}

impl StringScanner {
    /// Consume `c`; true when it belongs to a string literal, quotes included.
    /// A string can only start where `opens` holds.
    fn skip(&mut self, c: char, opens: bool) -> bool {
        if self.in_string {
            match c {
                _ if self.escaped => self.escaped = false,
                '\\' => self.escaped = true,
                '"' => self.in_string = false,
                _ => {}
            }
            true
        } else if opens && c == '"' {
            self.in_string = true;
            true
        } else {
            false
        }
    }
}
