//! A JSON Path (RFC 9535) query engine over `serde_json` values.
//!
//! Queries are parsed once into a [`Path`] and can then be evaluated against
//! any number of documents. Evaluation returns every selected value together
//! with its [`Location`] in the document, in document order.
//!
//! ```
//! use jsonsift_jpath::{evaluate, parse};
//! use serde_json::json;
//!
//! let doc = json!({ "items": [ { "id": 1 }, { "id": 7 } ] });
//! let path = parse("$.items[?@.id > 2].id", true).unwrap();
//! let found = evaluate(&path, &doc, None, true).unwrap();
//! assert_eq!(found[0].value, &json!(7));
//! assert_eq!(found[0].location.to_string(), "$['items'][1]['id']");
//! ```

pub mod ast;
pub mod engine;
pub mod environment;
pub mod error;
pub mod functions;
pub mod operators;
mod parser;
pub mod value;

// --- Public API ---
pub use ast::{BinaryOperator, Expression, Path, PrefixOperator, Segment, Selector};
pub use engine::{EvaluationContext, evaluate, evaluate_expression};
pub use environment::{Environment, Function, FunctionImpl};
pub use error::{EvalError, ParseError};
pub use jsonsift_types::{LocatedValue, Location, LocationStep};
pub use parser::{MAX_EXACT_INTEGER, MAX_NESTING_DEPTH, parse};
pub use value::{FilterValue, ValueType};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn first_is_even<'a>(
        _root: &'a Value,
        _current: &'a Value,
        args: Vec<FilterValue<'a>>,
    ) -> Result<FilterValue<'a>, EvalError> {
        match args.first().and_then(FilterValue::json).and_then(Value::as_i64) {
            Some(n) => Ok(FilterValue::Logical(n % 2 == 0)),
            None => Err(EvalError::function("is_even", "expected an integer")),
        }
    }

    #[test]
    fn test_parse_and_evaluate_simple_path() {
        init_logger();
        let path = parse("$.customer.name", true).unwrap();
        let data = json!({ "customer": { "name": "ACME" } });
        let found = evaluate(&path, &data, None, true).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, &json!("ACME"));
        assert_eq!(found[0].location.to_dot_notation(), "$.customer.name");
    }

    #[test]
    fn test_custom_function() {
        init_logger();
        let env = Environment::default().with_function(
            "is_even",
            Function::new(vec![ValueType::Json], ValueType::Logical, first_is_even),
        );
        let data = json!([1, 2, 3, 4]);
        let path = parse("$[?is_even(@)]", true).unwrap();
        let found: Vec<_> = evaluate(&path, &data, Some(&env), true)
            .unwrap()
            .into_iter()
            .map(|node| node.value.clone())
            .collect();
        assert_eq!(found, vec![json!(2), json!(4)]);

        let mixed = json!([2, "x"]);
        assert_eq!(
            evaluate(&path, &mixed, Some(&env), true),
            Err(EvalError::Function {
                function: "is_even".into(),
                message: "expected an integer".into()
            })
        );
    }

    #[test]
    fn test_empty_environment_has_no_builtins() {
        let path = parse("$[?length(@) > 1]", true).unwrap();
        let env = Environment::empty();
        assert_eq!(
            evaluate(&path, &json!(["ab"]), Some(&env), true),
            Err(EvalError::UnknownFunction {
                name: "length".into()
            })
        );
    }

    #[test]
    fn test_locations_resolve_to_their_values() {
        let data = json!({ "a": [ { "b": [1, 2] }, { "b": { "c": 3 } } ], "d's": 4 });
        let path = parse("$..*", true).unwrap();
        for node in evaluate(&path, &data, None, true).unwrap() {
            assert_eq!(node.location.resolve(&data), Some(node.value));
        }
    }

    #[test]
    fn test_paths_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Path>();
        assert_send_sync::<Environment>();
    }
}
