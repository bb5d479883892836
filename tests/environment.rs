mod common;

use common::fixtures::bookstore;
use common::{TestResult, init_logger};
use jsonsift::{Environment, Error, EvalError, FilterValue, Function, JsonPath, ValueType};
use serde_json::{Value, json};

fn is_priced_above_root_limit<'a>(
    root: &'a Value,
    current: &'a Value,
    _args: Vec<FilterValue<'a>>,
) -> Result<FilterValue<'a>, EvalError> {
    let limit = root["limit"].as_f64().unwrap_or(f64::INFINITY);
    let price = current["price"].as_f64().unwrap_or(0.0);
    Ok(FilterValue::Logical(price > limit))
}

fn upper<'a>(
    _root: &'a Value,
    _current: &'a Value,
    args: Vec<FilterValue<'a>>,
) -> Result<FilterValue<'a>, EvalError> {
    match args.first().and_then(FilterValue::json) {
        Some(Value::String(s)) => Ok(FilterValue::from(Value::String(s.to_uppercase()))),
        _ => Ok(FilterValue::absent()),
    }
}

fn titles(found: Vec<jsonsift::LocatedValue<'_>>) -> Vec<Value> {
    found.into_iter().map(|node| node.value.clone()).collect()
}

#[test]
fn test_variables() -> TestResult {
    init_logger();
    let doc = bookstore();
    let env = Environment::default().with_variable("limit", json!(10));
    let path = JsonPath::parse("$.store.book[?@.price < limit].title")?;
    assert_eq!(
        titles(path.query_with(&doc, &env)?),
        vec![json!("Sayings of the Century"), json!("Moby Dick")]
    );
    assert_eq!(
        path.query(&doc),
        Err(Error::Eval(EvalError::UnknownVariable {
            name: "limit".into()
        }))
    );
    Ok(())
}

#[test]
fn test_custom_functions() -> TestResult {
    init_logger();
    let doc = json!({
        "limit": 5,
        "items": [ { "name": "pen", "price": 2 }, { "name": "ink", "price": 9 } ]
    });
    let env = Environment::default()
        .with_function(
            "expensive",
            Function::new(vec![], ValueType::Logical, is_priced_above_root_limit),
        )
        .with_function(
            "upper",
            Function::new(vec![ValueType::Json], ValueType::Json, upper),
        );

    let path = JsonPath::parse("$.items[?expensive()].name")?;
    assert_eq!(titles(path.query_with(&doc, &env)?), vec![json!("ink")]);

    let path = JsonPath::parse("$.items[?upper(@.name) == 'PEN'].price")?;
    assert_eq!(titles(path.query_with(&doc, &env)?), vec![json!(2)]);

    let path = JsonPath::parse("$.items[?upper(@.name, 1) == 'PEN']")?;
    assert_eq!(
        path.query_with(&doc, &env),
        Err(Error::Eval(EvalError::ArityMismatch {
            function: "upper".into(),
            expected: 1,
            found: 2
        }))
    );
    Ok(())
}

#[test]
fn test_extension_functions() -> TestResult {
    init_logger();
    let doc = json!([
        { "id": 1, "tags": ["a", "b"] },
        { "id": 2, "tags": ["b", "c"] },
        { "id": 3, "tags": [] }
    ]);
    let ids = |query: &str| -> Result<Vec<Value>, Error> {
        Ok(JsonPath::parse(query)?
            .query(&doc)?
            .into_iter()
            .cloned()
            .collect())
    };
    assert_eq!(ids("$[?contains(@.tags, 'b')].id")?, vec![json!(1), json!(2)]);
    assert!(ids("$[?subset(@.tags, ['a', 'b', 'x'])].id").is_err());
    assert_eq!(
        ids("$[?subset(values(@.tags[*]), values($[0].tags[*]))].id")?,
        vec![json!(1), json!(3)]
    );
    Ok(())
}
