//! Query `serde_json` documents with JSON Path (RFC 9535).
//!
//! ```
//! use serde_json::json;
//!
//! let doc = json!({ "store": { "book": [
//!     { "title": "Sayings of the Century", "price": 8.95 },
//!     { "title": "Sword of Honour", "price": 12.99 }
//! ] } });
//!
//! let titles = jsonsift::query("$.store.book[?@.price < 10].title", &doc).unwrap();
//! assert_eq!(titles, vec![&json!("Sayings of the Century")]);
//! ```
//!
//! Parse a query once with [`JsonPath::parse`] to run it against many documents,
//! or [`JsonPath::parse_lenient`] to accept the relaxed syntax and recover from
//! type errors during evaluation.

pub mod error;
pub mod path;

pub use error::Error;
pub use path::JsonPath;

pub use jsonsift_jpath::{
    EvalError, Environment, FilterValue, Function, FunctionImpl, MAX_EXACT_INTEGER,
    MAX_NESTING_DEPTH, ParseError, Path, ValueType, ast,
};
pub use jsonsift_types::{LocatedValue, Location, LocationStep};

use serde_json::Value;

/// Parses `query` strictly and returns the values it selects from `root`.
pub fn query<'a>(query: &str, root: &'a Value) -> Result<Vec<&'a Value>, Error> {
    JsonPath::parse(query)?.query(root)
}

/// Parses `query` strictly and returns the values it selects from `root`,
/// each with its location.
pub fn query_located<'a>(query: &str, root: &'a Value) -> Result<Vec<LocatedValue<'a>>, Error> {
    JsonPath::parse(query)?.query_located(root)
}
