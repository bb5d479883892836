pub mod fixtures;

use jsonsift::{Error, JsonPath};
use serde_json::Value;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Runs a strict query and clones the selected values.
pub fn values(query: &str, doc: &Value) -> Result<Vec<Value>, Error> {
    Ok(JsonPath::parse(query)?
        .query(doc)?
        .into_iter()
        .cloned()
        .collect())
}

/// Runs a lenient query and clones the selected values.
pub fn lenient_values(query: &str, doc: &Value) -> Result<Vec<Value>, Error> {
    Ok(JsonPath::parse_lenient(query)?
        .query(doc)?
        .into_iter()
        .cloned()
        .collect())
}

/// The bracket-notation locations a strict query selects.
pub fn locations(query: &str, doc: &Value) -> Result<Vec<String>, Error> {
    Ok(JsonPath::parse(query)?
        .locations(doc)?
        .iter()
        .map(ToString::to_string)
        .collect())
}
