//! Concrete locations of values inside a JSON document.
//!
//! A [`Location`] is a persistent list of steps from the document root. Child
//! locations share their parent's chain, so extending a location never copies
//! the steps already taken.

use serde_json::Value;
use std::fmt::{self, Write};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A single step from a container to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum LocationStep {
    /// An object member, by name.
    Member(String),
    /// An array element, by zero-based position.
    Index(usize),
}

impl fmt::Display for LocationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationStep::Member(name) => write!(f, "[{}]", quote_member_name(name)),
            LocationStep::Index(index) => write!(f, "[{index}]"),
        }
    }
}

struct Link {
    parent: Location,
    step: LocationStep,
}

/// The singular path from a document root to one value.
///
/// `Display` renders the normalized path form, e.g. `$['store']['book'][0]`.
#[derive(Clone, Default)]
pub struct Location(Option<Arc<Link>>);

impl Location {
    /// The location of the document root, `$`.
    pub fn root() -> Self {
        Self(None)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the location of the named member of the value at `self`.
    pub fn member(&self, name: impl Into<String>) -> Self {
        self.child(LocationStep::Member(name.into()))
    }

    /// Returns the location of the element at `index` of the value at `self`.
    pub fn index(&self, index: usize) -> Self {
        self.child(LocationStep::Index(index))
    }

    pub fn child(&self, step: LocationStep) -> Self {
        Self(Some(Arc::new(Link {
            parent: self.clone(),
            step,
        })))
    }

    pub fn parent(&self) -> Option<&Location> {
        self.0.as_ref().map(|link| &link.parent)
    }

    /// The final step, or `None` for the root.
    pub fn last(&self) -> Option<&LocationStep> {
        self.0.as_ref().map(|link| &link.step)
    }

    /// Number of steps below the root.
    pub fn depth(&self) -> usize {
        self.steps_from_leaf().count()
    }

    /// The steps of this location, outermost first.
    pub fn steps(&self) -> Vec<&LocationStep> {
        let mut steps: Vec<_> = self.steps_from_leaf().collect();
        steps.reverse();
        steps
    }

    fn steps_from_leaf(&self) -> impl Iterator<Item = &LocationStep> {
        let mut cursor = self;
        std::iter::from_fn(move || {
            let link = cursor.0.as_ref()?;
            cursor = &link.parent;
            Some(&link.step)
        })
    }

    /// Looks up the value this location designates inside `root`.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.steps()
            .into_iter()
            .try_fold(root, |value, step| match (step, value) {
                (LocationStep::Member(name), Value::Object(map)) => map.get(name),
                (LocationStep::Index(index), Value::Array(items)) => items.get(*index),
                _ => None,
            })
    }

    /// Renders the location as an RFC 6901 JSON Pointer.
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for step in self.steps() {
            pointer.push('/');
            match step {
                LocationStep::Member(name) => {
                    pointer.push_str(&name.replace('~', "~0").replace('/', "~1"))
                }
                LocationStep::Index(index) => pointer.push_str(&index.to_string()),
            }
        }
        pointer
    }

    /// Renders the location with dot shorthand wherever the member name allows it,
    /// e.g. `$.store.book[0]['first name']`.
    pub fn to_dot_notation(&self) -> String {
        let mut out = String::from("$");
        for step in self.steps() {
            match step {
                LocationStep::Member(name) if is_shorthand_name(name) => {
                    out.push('.');
                    out.push_str(name);
                }
                other => {
                    let _ = write!(out, "{other}");
                }
            }
        }
        out
    }
}

fn is_shorthand_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first >= '\u{80}' => chars
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c >= '\u{80}'),
        _ => false,
    }
}

/// Quotes a member name the way normalized paths do: single quotes, with
/// `'` and `\` escaped and control characters written as escapes.
pub fn quote_member_name(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('\'');
    for c in name.chars() {
        match c {
            '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            '\u{8}' => quoted.push_str("\\b"),
            '\u{c}' => quoted.push_str("\\f"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c < '\u{20}' => {
                let _ = write!(quoted, "\\u{:04x}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('$')?;
        for step in self.steps() {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Location")
            .field(&format_args!("{self}"))
            .finish()
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        let (mut left, mut right) = (self, other);
        loop {
            match (&left.0, &right.0) {
                (None, None) => return true,
                (Some(a), Some(b)) => {
                    if Arc::ptr_eq(a, b) {
                        return true;
                    }
                    if a.step != b.step {
                        return false;
                    }
                    left = &a.parent;
                    right = &b.parent;
                }
                _ => return false,
            }
        }
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for step in self.steps_from_leaf() {
            step.hash(state);
        }
        self.depth().hash(state);
    }
}

// Unlinks the chain iteratively so that dropping a very deep location cannot
// exhaust the stack.
impl Drop for Location {
    fn drop(&mut self) {
        let mut next = self.0.take();
        while let Some(link) = next {
            next = match Arc::try_unwrap(link) {
                Ok(mut link) => link.parent.0.take(),
                Err(_) => None,
            };
        }
    }
}

impl FromIterator<LocationStep> for Location {
    fn from_iter<T: IntoIterator<Item = LocationStep>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Location::root(), |location, step| location.child(step))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Location {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
