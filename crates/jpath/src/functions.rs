//! Built-in filter functions.
//!
//! | name       | parameters      | result  |
//! |------------|-----------------|---------|
//! | `length`   | value           | value   |
//! | `count`    | nodes           | value   |
//! | `match`    | value, value    | logical |
//! | `search`   | value, value    | logical |
//! | `value`    | nodes           | value   |
//! | `values`   | nodes           | value   |
//! | `subset`   | value, value    | logical |
//! | `contains` | value, value    | logical |
use crate::environment::{Environment, Function};
use crate::error::EvalError;
use crate::operators::json_equal;
use crate::value::{FilterValue, ValueType};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Mutex;

/// Adds the built-in functions to `env`.
pub fn register_builtins(env: Environment) -> Environment {
    use ValueType::{Json, Logical, Nodes};
    env.with_function("length", Function::new(vec![Json], Json, length))
        .with_function("count", Function::new(vec![Nodes], Json, count))
        .with_function("match", Function::new(vec![Json, Json], Logical, full_match))
        .with_function("search", Function::new(vec![Json, Json], Logical, search))
        .with_function("value", Function::new(vec![Nodes], Json, value))
        .with_function("values", Function::new(vec![Nodes], Json, values))
        .with_function("subset", Function::new(vec![Json, Json], Logical, subset))
        .with_function("contains", Function::new(vec![Json, Json], Logical, contains))
}

fn json_arg<'v>(args: &'v [FilterValue<'_>], index: usize) -> Option<&'v Value> {
    args.get(index).and_then(FilterValue::json)
}

fn nodes_arg<'a>(args: Vec<FilterValue<'a>>) -> Vec<&'a Value> {
    match args.into_iter().next() {
        Some(FilterValue::Nodes(nodes)) => nodes,
        _ => Vec::new(),
    }
}

/// Code points of a string, elements of an array or members of an object.
fn length<'a>(
    _root: &'a Value,
    _current: &'a Value,
    args: Vec<FilterValue<'a>>,
) -> Result<FilterValue<'a>, EvalError> {
    let length = match json_arg(&args, 0) {
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(map)) => map.len(),
        _ => return Ok(FilterValue::absent()),
    };
    Ok(FilterValue::owned(Value::from(length)))
}

fn count<'a>(
    _root: &'a Value,
    _current: &'a Value,
    args: Vec<FilterValue<'a>>,
) -> Result<FilterValue<'a>, EvalError> {
    Ok(FilterValue::owned(Value::from(nodes_arg(args).len())))
}

fn full_match<'a>(
    _root: &'a Value,
    _current: &'a Value,
    args: Vec<FilterValue<'a>>,
) -> Result<FilterValue<'a>, EvalError> {
    Ok(FilterValue::Logical(regex_test(&args, true)))
}

fn search<'a>(
    _root: &'a Value,
    _current: &'a Value,
    args: Vec<FilterValue<'a>>,
) -> Result<FilterValue<'a>, EvalError> {
    Ok(FilterValue::Logical(regex_test(&args, false)))
}

/// The single node's value, or absent unless exactly one node was selected.
fn value<'a>(
    _root: &'a Value,
    _current: &'a Value,
    args: Vec<FilterValue<'a>>,
) -> Result<FilterValue<'a>, EvalError> {
    Ok(match nodes_arg(args).as_slice() {
        [single] => FilterValue::borrowed(*single),
        _ => FilterValue::absent(),
    })
}

/// All selected values, as an array.
fn values<'a>(
    _root: &'a Value,
    _current: &'a Value,
    args: Vec<FilterValue<'a>>,
) -> Result<FilterValue<'a>, EvalError> {
    let items = nodes_arg(args).into_iter().cloned().collect();
    Ok(FilterValue::Json(Some(Cow::Owned(Value::Array(items)))))
}

/// True when every element of the first array equals some element of the second.
fn subset<'a>(
    _root: &'a Value,
    _current: &'a Value,
    args: Vec<FilterValue<'a>>,
) -> Result<FilterValue<'a>, EvalError> {
    let is_subset = match (json_arg(&args, 0), json_arg(&args, 1)) {
        (Some(Value::Array(sub)), Some(Value::Array(sup))) => sub
            .iter()
            .all(|item| sup.iter().any(|candidate| json_equal(item, candidate))),
        _ => false,
    };
    Ok(FilterValue::Logical(is_subset))
}

/// True when the array in the first argument holds the scalar in the second.
fn contains<'a>(
    _root: &'a Value,
    _current: &'a Value,
    args: Vec<FilterValue<'a>>,
) -> Result<FilterValue<'a>, EvalError> {
    let found = match (json_arg(&args, 0), json_arg(&args, 1)) {
        (_, Some(Value::Array(_) | Value::Object(_))) => false,
        (Some(Value::Array(items)), Some(needle)) => {
            items.iter().any(|item| json_equal(item, needle))
        }
        _ => false,
    };
    Ok(FilterValue::Logical(found))
}

fn regex_test(args: &[FilterValue<'_>], anchored: bool) -> bool {
    let (Some(Value::String(text)), Some(Value::String(pattern))) =
        (json_arg(args, 0), json_arg(args, 1))
    else {
        return false;
    };
    match cached_iregexp(pattern, anchored) {
        Ok(regex) => regex.is_match(text),
        Err(e) => {
            log::trace!("pattern '{}' is not a valid regular expression: {}", pattern, e);
            false
        }
    }
}

const REGEX_CACHE_CAPACITY: usize = 256;

type CompiledPattern = Result<Regex, regex::Error>;

static REGEX_CACHE: Lazy<Mutex<IndexMap<(String, bool), CompiledPattern>>> =
    Lazy::new(|| Mutex::new(IndexMap::new()));

/// Compiles `pattern` once per (pattern, anchoring) pair; the oldest entry is
/// evicted when the cache is full.
fn cached_iregexp(pattern: &str, anchored: bool) -> CompiledPattern {
    let key = (pattern.to_string(), anchored);
    let Ok(mut cache) = REGEX_CACHE.lock() else {
        return compile_iregexp(pattern, anchored);
    };
    if let Some(compiled) = cache.get(&key) {
        return compiled.clone();
    }
    let compiled = compile_iregexp(pattern, anchored);
    if cache.len() >= REGEX_CACHE_CAPACITY {
        cache.shift_remove_index(0);
    }
    cache.insert(key, compiled.clone());
    compiled
}

/// Compiles an I-Regexp (RFC 9485) pattern. `.` matches any character except
/// line breaks; `anchored` requires the pattern to match the entire text.
pub fn compile_iregexp(pattern: &str, anchored: bool) -> Result<Regex, regex::Error> {
    let translated = translate_dot(pattern);
    if anchored {
        Regex::new(&format!(r"\A(?:{translated})\z"))
    } else {
        Regex::new(&translated)
    }
}

fn translate_dot(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut in_class = false;
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            '.' if !in_class => out.push_str(r"[^\n\r]"),
            c => out.push(c),
        }
    }
    out
}
