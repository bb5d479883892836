use crate::error::Error;
use jsonsift_jpath::{Environment, Path, evaluate, parse};
use jsonsift_types::{LocatedValue, Location};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A parsed query, remembering the mode it was parsed in.
///
/// The mode also governs evaluation: a strict query reports type errors, a
/// lenient one recovers from them.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    path: Path,
    strict: bool,
}

impl JsonPath {
    /// Parses `text` following RFC 9535 exactly.
    pub fn parse(text: &str) -> Result<Self, Error> {
        Ok(Self {
            path: parse(text, true)?,
            strict: true,
        })
    }

    /// Parses `text` with the relaxed syntax, for evaluation in lenient mode.
    pub fn parse_lenient(text: &str) -> Result<Self, Error> {
        Ok(Self {
            path: parse(text, false)?,
            strict: false,
        })
    }

    pub fn from_path(path: Path, strict: bool) -> Self {
        Self { path, strict }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// True when the query can select at most one value.
    pub fn is_singular(&self) -> bool {
        self.path.is_singular()
    }

    /// The selected values, in document order.
    pub fn query<'a>(&self, root: &'a Value) -> Result<Vec<&'a Value>, Error> {
        Ok(self
            .query_located(root)?
            .into_iter()
            .map(|node| node.value)
            .collect())
    }

    /// The selected values with their locations, using the built-in functions.
    pub fn query_located<'a>(&self, root: &'a Value) -> Result<Vec<LocatedValue<'a>>, Error> {
        Ok(evaluate(&self.path, root, None, self.strict)?)
    }

    /// Like [`JsonPath::query_located`], resolving variables and functions in `environment`.
    pub fn query_with<'a>(
        &self,
        root: &'a Value,
        environment: &Environment,
    ) -> Result<Vec<LocatedValue<'a>>, Error> {
        Ok(evaluate(&self.path, root, Some(environment), self.strict)?)
    }

    /// The locations of the selected values.
    pub fn locations(&self, root: &Value) -> Result<Vec<Location>, Error> {
        Ok(self
            .query_located(root)?
            .into_iter()
            .map(|node| node.location)
            .collect())
    }

    /// The single selected value; `None` when the query selects nothing or more than one value.
    pub fn query_one<'a>(&self, root: &'a Value) -> Result<Option<&'a Value>, Error> {
        let mut found = self.query(root)?;
        Ok(if found.len() == 1 { found.pop() } else { None })
    }
}

impl FromStr for JsonPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JsonPath::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_is_remembered() {
        assert!(JsonPath::parse("$.a").unwrap().is_strict());
        assert!(!JsonPath::parse_lenient("$.a").unwrap().is_strict());
    }

    #[test]
    fn test_from_str_is_strict() {
        let path: JsonPath = "$['a'][0]".parse().unwrap();
        assert!(path.is_singular());
        assert!("$.a ".parse::<JsonPath>().is_err());
    }

    #[test]
    fn test_query_one() {
        let doc = json!({ "a": [1, 2] });
        let one = JsonPath::parse("$.a[0]").unwrap();
        assert_eq!(one.query_one(&doc).unwrap(), Some(&json!(1)));
        let many = JsonPath::parse("$.a[*]").unwrap();
        assert_eq!(many.query_one(&doc).unwrap(), None);
    }

    #[test]
    fn test_display_is_canonical() {
        let path = JsonPath::parse("$.a[?@.b>1]").unwrap();
        assert_eq!(path.to_string(), "$['a'][?@['b'] > 1]");
    }
}
