use crate::location::Location;
use serde_json::Value;

/// A value selected from a document, paired with where it was found.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LocatedValue<'a> {
    pub location: Location,
    pub value: &'a Value,
}

impl<'a> LocatedValue<'a> {
    pub fn new(value: &'a Value, location: Location) -> Self {
        Self { location, value }
    }

    /// The document root itself, located at `$`.
    pub fn root(value: &'a Value) -> Self {
        Self::new(value, Location::root())
    }

    /// Locates `value` as the member `name` of this value.
    pub fn member(&self, name: &str, value: &'a Value) -> Self {
        Self::new(value, self.location.member(name))
    }

    /// Locates `value` as element `index` of this value.
    pub fn element(&self, index: usize, value: &'a Value) -> Self {
        Self::new(value, self.location.index(index))
    }

    /// The direct children of this value in document order: array elements
    /// by position, object members in the object's own order.
    pub fn children(&self) -> Vec<LocatedValue<'a>> {
        match self.value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.element(index, item))
                .collect(),
            Value::Object(map) => map
                .iter()
                .map(|(name, member)| self.member(name, member))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn into_parts(self) -> (&'a Value, Location) {
        (self.value, self.location)
    }
}
