//! The values filter expressions evaluate to.
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// The three sorts a filter expression can produce. Every evaluation is told
/// which sort its caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// A truth value that is not itself a JSON value.
    Logical,
    /// A single JSON value, or the absence of one.
    Json,
    /// A list of nodes selected from the document.
    Nodes,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::Logical => "logical",
            ValueType::Json => "JSON value",
            ValueType::Nodes => "node-list",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue<'a> {
    Logical(bool),
    /// `None` is the absent value, distinct from JSON `null`.
    Json(Option<Cow<'a, Value>>),
    Nodes(Vec<&'a Value>),
}

impl<'a> FilterValue<'a> {
    pub fn absent() -> Self {
        FilterValue::Json(None)
    }

    pub fn owned(value: Value) -> Self {
        FilterValue::Json(Some(Cow::Owned(value)))
    }

    pub fn borrowed(value: &'a Value) -> Self {
        FilterValue::Json(Some(Cow::Borrowed(value)))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            FilterValue::Logical(_) => ValueType::Logical,
            FilterValue::Json(_) => ValueType::Json,
            FilterValue::Nodes(_) => ValueType::Nodes,
        }
    }

    /// The JSON value held by a `Json` result; `None` for absent and for the other sorts.
    pub fn json(&self) -> Option<&Value> {
        match self {
            FilterValue::Json(value) => value.as_deref(),
            _ => None,
        }
    }

    pub fn nodes(&self) -> Option<&[&'a Value]> {
        match self {
            FilterValue::Nodes(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// A short description used in error messages, e.g. `node-list of 3`.
    pub fn describe(&self) -> String {
        match self {
            FilterValue::Logical(b) => format!("logical {b}"),
            FilterValue::Json(value) => describe_json(value.as_deref()).to_string(),
            FilterValue::Nodes(nodes) => format!("node-list of {}", nodes.len()),
        }
    }
}

impl From<bool> for FilterValue<'_> {
    fn from(value: bool) -> Self {
        FilterValue::Logical(value)
    }
}

impl From<Value> for FilterValue<'_> {
    fn from(value: Value) -> Self {
        FilterValue::owned(value)
    }
}

/// Names the kind of a JSON value (or its absence) for diagnostics.
pub fn describe_json(value: Option<&Value>) -> &'static str {
    match value {
        None => "absent value",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(n)) if n.is_f64() => "float",
        Some(Value::Number(_)) => "integer",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}
