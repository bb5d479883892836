//! Variables and functions visible to filter expressions.
use crate::error::EvalError;
use crate::functions;
use crate::value::{FilterValue, ValueType};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The callable side of a filter function.
///
/// `root` is the queried document and `current` the node under test. The
/// arguments have already been evaluated at the declared parameter types.
pub trait FunctionImpl: Send + Sync {
    fn call<'a>(
        &self,
        root: &'a Value,
        current: &'a Value,
        args: Vec<FilterValue<'a>>,
    ) -> Result<FilterValue<'a>, EvalError>;
}

impl<F> FunctionImpl for F
where
    F: for<'a> Fn(&'a Value, &'a Value, Vec<FilterValue<'a>>) -> Result<FilterValue<'a>, EvalError>
        + Send
        + Sync,
{
    fn call<'a>(
        &self,
        root: &'a Value,
        current: &'a Value,
        args: Vec<FilterValue<'a>>,
    ) -> Result<FilterValue<'a>, EvalError> {
        self(root, current, args)
    }
}

/// A typed function signature together with its implementation.
#[derive(Clone)]
pub struct Function {
    params: Vec<ValueType>,
    result: ValueType,
    implementation: Arc<dyn FunctionImpl>,
}

impl Function {
    pub fn new<F>(params: Vec<ValueType>, result: ValueType, implementation: F) -> Self
    where
        F: for<'a> Fn(
                &'a Value,
                &'a Value,
                Vec<FilterValue<'a>>,
            ) -> Result<FilterValue<'a>, EvalError>
            + Send
            + Sync
            + 'static,
    {
        Self::from_impl(params, result, Arc::new(implementation))
    }

    /// Builds a function from any [`FunctionImpl`], such as a type carrying its own state.
    pub fn from_impl(
        params: Vec<ValueType>,
        result: ValueType,
        implementation: Arc<dyn FunctionImpl>,
    ) -> Self {
        Self {
            params,
            result,
            implementation,
        }
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn result_type(&self) -> ValueType {
        self.result
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn call<'a>(
        &self,
        root: &'a Value,
        current: &'a Value,
        args: Vec<FilterValue<'a>>,
    ) -> Result<FilterValue<'a>, EvalError> {
        self.implementation.call(root, current, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

static DEFAULT_ENVIRONMENT: Lazy<Environment> = Lazy::new(Environment::default);

/// Named variables and functions, composed by value.
///
/// `Environment::default()` holds the built-in functions and no variables.
/// An environment is immutable once built and can be shared across threads.
#[derive(Clone, Debug)]
pub struct Environment {
    variables: IndexMap<String, Value>,
    functions: IndexMap<String, Function>,
}

impl Environment {
    /// An environment with no variables and no functions.
    pub fn empty() -> Self {
        Self {
            variables: IndexMap::new(),
            functions: IndexMap::new(),
        }
    }

    pub fn new(variables: IndexMap<String, Value>, functions: IndexMap<String, Function>) -> Self {
        Self {
            variables,
            functions,
        }
    }

    /// The process-wide built-in environment used when a query is evaluated
    /// without an explicit one.
    pub fn shared() -> &'static Environment {
        &DEFAULT_ENVIRONMENT
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, function: Function) -> Self {
        self.functions.insert(name.into(), function);
        self
    }

    /// Adds every entry of `other`, replacing entries with the same name.
    pub fn extend(mut self, other: Environment) -> Self {
        self.variables.extend(other.variables);
        self.functions.extend(other.functions);
        self
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl Default for Environment {
    fn default() -> Self {
        functions::register_builtins(Self::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn always_true<'a>(
        _root: &'a Value,
        _current: &'a Value,
        _args: Vec<FilterValue<'a>>,
    ) -> Result<FilterValue<'a>, EvalError> {
        Ok(FilterValue::Logical(true))
    }

    #[test]
    fn test_default_has_builtins_in_order() {
        let names: Vec<_> = Environment::default().function_names().map(String::from).collect();
        assert_eq!(
            names,
            ["length", "count", "match", "search", "value", "values", "subset", "contains"]
        );
        assert_eq!(Environment::default().variable_names().count(), 0);
    }

    #[test]
    fn test_empty_has_nothing() {
        let env = Environment::empty();
        assert!(env.function("length").is_none());
        assert_eq!(env.function_names().count(), 0);
    }

    #[test]
    fn test_composition_overrides_by_name() {
        let base = Environment::empty()
            .with_variable("limit", json!(10))
            .with_function("yes", Function::new(vec![], ValueType::Logical, always_true));
        let overlay = Environment::empty().with_variable("limit", json!(20));
        let env = base.extend(overlay);

        assert_eq!(env.variable("limit"), Some(&json!(20)));
        let yes = env.function("yes").unwrap();
        assert_eq!(yes.arity(), 0);
        assert_eq!(yes.result_type(), ValueType::Logical);
        let doc = json!(null);
        assert_eq!(yes.call(&doc, &doc, vec![]).unwrap(), FilterValue::Logical(true));
    }

    #[test]
    fn test_environment_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Environment>();
        assert_send_sync::<Function>();
        assert!(Environment::shared().function("count").is_some());
    }
}
