//! The evaluation engine for executing a parsed `Path` against a `serde_json::Value`.

use crate::ast::{BinaryOperator, Expression, Path, PrefixOperator, Segment, Selector};
use crate::environment::Environment;
use crate::error::EvalError;
use crate::operators;
use crate::value::{FilterValue, ValueType};
use jsonsift_types::{LocatedValue, Location};
use serde_json::Value;
use std::borrow::Cow;

/// Everything evaluation needs besides the expression itself.
/// `'a` is the lifetime of the queried document, `'d` that of the environment.
pub struct EvaluationContext<'a, 'd> {
    pub root: &'a Value,
    pub environment: &'d Environment,
    /// If true, type errors are reported instead of being recovered from.
    pub strict: bool,
}

impl<'a, 'd> EvaluationContext<'a, 'd> {
    pub fn new(root: &'a Value, environment: &'d Environment, strict: bool) -> Self {
        Self {
            root,
            environment,
            strict,
        }
    }
}

/// Evaluates `path` against `root`, returning the selected values with their
/// locations in document order. `None` uses the built-in environment.
pub fn evaluate<'a>(
    path: &Path,
    root: &'a Value,
    environment: Option<&Environment>,
    strict: bool,
) -> Result<Vec<LocatedValue<'a>>, EvalError> {
    let environment = environment.unwrap_or_else(|| Environment::shared());
    let e_ctx = EvaluationContext::new(root, environment, strict);
    let results = select(path, &LocatedValue::root(root), &e_ctx)?;
    log::debug!(
        "evaluated {} ({} mode): {} result(s)",
        path,
        if strict { "strict" } else { "lenient" },
        results.len()
    );
    Ok(results)
}

/// Runs `path` from `current`, or from the document root when the path starts with `$`.
pub fn select<'a>(
    path: &Path,
    current: &LocatedValue<'a>,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Vec<LocatedValue<'a>>, EvalError> {
    let (start, segments) = path.segments();
    let start = match start {
        Path::Root => LocatedValue::root(e_ctx.root),
        _ => current.clone(),
    };
    let mut nodes = vec![start];
    for segment in segments {
        let mut selected = Vec::new();
        for node in &nodes {
            apply_segment(segment, node, &mut selected, e_ctx)?;
        }
        nodes = selected;
    }
    Ok(nodes)
}

fn apply_segment<'a>(
    segment: &Segment,
    node: &LocatedValue<'a>,
    out: &mut Vec<LocatedValue<'a>>,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<(), EvalError> {
    match segment {
        Segment::Children(selectors) => {
            for selector in selectors {
                apply_selector(selector, node, out, e_ctx)?;
            }
        }
        Segment::Descendants(selectors) => {
            // Pre-order walk, the node itself first, children in document order.
            let mut stack = vec![node.clone()];
            while let Some(visited) = stack.pop() {
                for selector in selectors {
                    apply_selector(selector, &visited, out, e_ctx)?;
                }
                stack.extend(visited.children().into_iter().rev());
            }
        }
    }
    Ok(())
}

fn apply_selector<'a>(
    selector: &Selector,
    node: &LocatedValue<'a>,
    out: &mut Vec<LocatedValue<'a>>,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<(), EvalError> {
    match (selector, node.value) {
        (Selector::Wildcard, _) => out.extend(node.children()),
        (Selector::Member(name), Value::Object(map)) => {
            if let Some(member) = map.get(name) {
                out.push(node.member(name, member));
            }
        }
        (Selector::Index(index), Value::Array(items)) => {
            if let Some(i) = normalize_index(*index, items.len()) {
                out.push(node.element(i, &items[i]));
            }
        }
        (Selector::Slice { start, end, step }, Value::Array(items)) => {
            for i in slice_indices(*start, *end, *step, items.len()) {
                out.push(node.element(i, &items[i]));
            }
        }
        (Selector::Filter(expr), Value::Array(_) | Value::Object(_)) => {
            for child in node.children() {
                if test_filter(expr, child.value, e_ctx)? {
                    out.push(child);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Resolves a possibly negative index against an array of `len` elements.
pub fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index >= 0 {
        usize::try_from(index).ok()?
    } else {
        len.checked_sub(usize::try_from(index.unsigned_abs()).ok()?)?
    };
    (resolved < len).then_some(resolved)
}

/// The indices an array slice selects, in selection order.
pub fn slice_indices(
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
    len: usize,
) -> Vec<usize> {
    let step = step.unwrap_or(1);
    if step == 0 || len == 0 {
        return Vec::new();
    }
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let normalize = |i: i64| if i >= 0 { i } else { len.saturating_add(i) };

    let mut indices = Vec::new();
    if step > 0 {
        let lower = normalize(start.unwrap_or(0)).clamp(0, len);
        let upper = normalize(end.unwrap_or(len)).clamp(0, len);
        let mut i = lower;
        while i < upper {
            indices.push(i as usize);
            let Some(next) = i.checked_add(step) else { break };
            i = next;
        }
    } else {
        let upper = normalize(start.unwrap_or(len - 1)).clamp(-1, len - 1);
        let lower = match end {
            Some(end) => normalize(end).clamp(-1, len - 1),
            None => -1,
        };
        let mut i = upper;
        while lower < i {
            indices.push(i as usize);
            let Some(next) = i.checked_add(step) else { break };
            i = next;
        }
    }
    indices
}

fn test_filter<'a>(
    expr: &Expression,
    candidate: &'a Value,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<bool, EvalError> {
    match evaluate_expression(expr, candidate, ValueType::Logical, e_ctx)? {
        FilterValue::Logical(keep) => Ok(keep),
        _ if e_ctx.strict => Err(EvalError::NonLogicalFilterResult {
            expression: expr.to_string(),
        }),
        other => {
            log::trace!(
                "filter '{}' produced {}; candidate excluded",
                expr,
                other.describe()
            );
            Ok(false)
        }
    }
}

/// Evaluates a filter expression with `current` as `@`, producing a value of
/// the `expected` sort wherever the expression's own sort can be adapted to it.
pub fn evaluate_expression<'a>(
    expr: &Expression,
    current: &'a Value,
    expected: ValueType,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<FilterValue<'a>, EvalError> {
    match expr {
        Expression::Null => Ok(FilterValue::owned(Value::Null)),
        Expression::Bool(b) => Ok(FilterValue::owned(Value::Bool(*b))),
        Expression::Integer(i) => Ok(FilterValue::owned(Value::from(*i))),
        Expression::Float(f) => Ok(FilterValue::Json(
            serde_json::Number::from_f64(*f).map(|n| Cow::Owned(Value::Number(n))),
        )),
        Expression::String(s) => Ok(FilterValue::owned(Value::String(s.clone()))),
        Expression::Variable(name) => match e_ctx.environment.variable(name) {
            Some(value) => Ok(FilterValue::owned(value.clone())),
            None => Err(EvalError::UnknownVariable { name: name.clone() }),
        },
        Expression::Query(path) | Expression::SingularQuery(path) => {
            let located = select(path, &LocatedValue::new(current, Location::root()), e_ctx)?;
            let nodes = located.into_iter().map(|node| node.value).collect();
            let singular = matches!(expr, Expression::SingularQuery(_));
            coerce_nodes(nodes, expected, singular, path, e_ctx)
        }
        Expression::FunctionCall { name, args } => {
            call_function(name, args, current, expected, e_ctx)
        }
        Expression::PrefixOp {
            op: PrefixOperator::Not,
            expr: operand,
        } => {
            let value = evaluate_expression(operand, current, ValueType::Logical, e_ctx)?;
            let truth = logical_operand(value, "operand of '!'", e_ctx)?;
            Ok(logical_result(!truth, expected))
        }
        Expression::PrefixOp {
            op: PrefixOperator::Negate,
            expr: operand,
        } => {
            let value = evaluate_expression(operand, current, ValueType::Json, e_ctx)?;
            let value = json_operand(value, "operand of '-'", e_ctx)?;
            Ok(FilterValue::owned(operators::negate(value.as_deref())?))
        }
        Expression::BinaryOp { left, op, right } if op.is_logical() => {
            evaluate_logical(*op, left, right, current, expected, e_ctx)
        }
        Expression::BinaryOp { left, op, right } => {
            let context = format!("operands of '{op}'");
            let lhs = evaluate_expression(left, current, ValueType::Json, e_ctx)?;
            let lhs = json_operand(lhs, &context, e_ctx)?;
            let rhs = evaluate_expression(right, current, ValueType::Json, e_ctx)?;
            let rhs = json_operand(rhs, &context, e_ctx)?;
            if op.is_comparison() {
                let outcome = operators::compare(*op, lhs.as_deref(), rhs.as_deref());
                return Ok(logical_result(outcome, expected));
            }
            match operators::arithmetic(*op, lhs.as_deref(), rhs.as_deref()) {
                Ok(value) => Ok(FilterValue::Json(value.map(Cow::Owned))),
                Err(EvalError::TypeMismatch { found, .. }) if !e_ctx.strict => {
                    log::trace!("'{}' on {} yields nothing in lenient mode", op, found);
                    Ok(FilterValue::absent())
                }
                Err(e) => Err(e),
            }
        }
    }
}

fn evaluate_logical<'a>(
    op: BinaryOperator,
    left: &Expression,
    right: &Expression,
    current: &'a Value,
    expected: ValueType,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<FilterValue<'a>, EvalError> {
    let context = format!("operands of '{op}'");
    if expected == ValueType::Nodes {
        return Err(EvalError::type_mismatch(
            context,
            ValueType::Nodes,
            ValueType::Logical,
        ));
    }
    let lhs = evaluate_expression(left, current, expected, e_ctx)?;
    let lhs = truth_of(lhs, expected, &context, e_ctx)?;
    let decided = match op {
        BinaryOperator::And => !lhs,
        _ => lhs,
    };
    if decided {
        return Ok(logical_result(lhs, expected));
    }
    let rhs = evaluate_expression(right, current, expected, e_ctx)?;
    let rhs = truth_of(rhs, expected, &context, e_ctx)?;
    Ok(logical_result(rhs, expected))
}

/// The truth value of an operand of `&&` / `||` evaluated at `sort`.
fn truth_of(
    value: FilterValue<'_>,
    sort: ValueType,
    context: &str,
    e_ctx: &EvaluationContext<'_, '_>,
) -> Result<bool, EvalError> {
    match (sort, value) {
        (ValueType::Json, FilterValue::Json(Some(json))) if json.is_boolean() => {
            Ok(json.as_bool() == Some(true))
        }
        (ValueType::Json, FilterValue::Logical(b)) => Ok(b),
        (ValueType::Json, other) => Err(EvalError::type_mismatch(
            context,
            "JSON boolean",
            other.describe(),
        )),
        (_, value) => logical_operand(value, context, e_ctx),
    }
}

/// Coerces a value to a truth value: logicals as-is, node-lists by non-emptiness.
/// Lenient mode also accepts JSON booleans.
fn logical_operand(
    value: FilterValue<'_>,
    context: &str,
    e_ctx: &EvaluationContext<'_, '_>,
) -> Result<bool, EvalError> {
    match value {
        FilterValue::Logical(b) => Ok(b),
        FilterValue::Nodes(nodes) => Ok(!nodes.is_empty()),
        FilterValue::Json(Some(json)) if !e_ctx.strict && json.is_boolean() => {
            Ok(json.as_bool() == Some(true))
        }
        other => Err(EvalError::type_mismatch(
            context,
            ValueType::Logical,
            other.describe(),
        )),
    }
}

/// Coerces a value to a single JSON value or absent.
fn json_operand<'a>(
    value: FilterValue<'a>,
    context: &str,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Option<Cow<'a, Value>>, EvalError> {
    match value {
        FilterValue::Json(json) => Ok(json),
        FilterValue::Logical(b) => Ok(Some(Cow::Owned(Value::Bool(b)))),
        FilterValue::Nodes(nodes) => {
            if nodes.len() > 1 && e_ctx.strict {
                return Err(EvalError::type_mismatch(
                    context,
                    "single node",
                    format!("node-list of {}", nodes.len()),
                ));
            }
            Ok(nodes.first().map(|node| Cow::Borrowed(*node)))
        }
    }
}

fn logical_result<'a>(truth: bool, expected: ValueType) -> FilterValue<'a> {
    match expected {
        ValueType::Json => FilterValue::owned(Value::Bool(truth)),
        _ => FilterValue::Logical(truth),
    }
}

fn coerce_nodes<'a>(
    nodes: Vec<&'a Value>,
    expected: ValueType,
    singular: bool,
    query: &Path,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<FilterValue<'a>, EvalError> {
    match expected {
        ValueType::Logical => Ok(FilterValue::Logical(!nodes.is_empty())),
        ValueType::Nodes => Ok(FilterValue::Nodes(nodes)),
        ValueType::Json if !singular && e_ctx.strict => Err(EvalError::type_mismatch(
            format!("query {query}"),
            "singular query",
            "non-singular query",
        )),
        ValueType::Json => Ok(FilterValue::Json(nodes.first().map(|node| Cow::Borrowed(*node)))),
    }
}

fn call_function<'a>(
    name: &str,
    args: &[Expression],
    current: &'a Value,
    expected: ValueType,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<FilterValue<'a>, EvalError> {
    let function = e_ctx
        .environment
        .function(name)
        .ok_or_else(|| EvalError::UnknownFunction {
            name: name.to_string(),
        })?;
    if args.len() != function.arity() {
        return Err(EvalError::ArityMismatch {
            function: name.to_string(),
            expected: function.arity(),
            found: args.len(),
        });
    }

    let mut evaluated_args = Vec::with_capacity(args.len());
    for (position, (arg, &param)) in args.iter().zip(function.params()).enumerate() {
        let value = evaluate_expression(arg, current, param, e_ctx)?;
        let context = format!("argument {} of {}()", position + 1, name);
        evaluated_args.push(check_argument(value, param, &context, e_ctx)?);
    }

    let result = function.call(e_ctx.root, current, evaluated_args)?;
    if result.value_type() != function.result_type() {
        return Err(EvalError::type_mismatch(
            format!("result of {name}()"),
            function.result_type(),
            result.describe(),
        ));
    }
    adapt_result(result, expected, name, e_ctx)
}

fn check_argument<'a>(
    value: FilterValue<'a>,
    param: ValueType,
    context: &str,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<FilterValue<'a>, EvalError> {
    match (param, value) {
        (ValueType::Logical, FilterValue::Logical(b)) => Ok(FilterValue::Logical(b)),
        (ValueType::Logical, FilterValue::Nodes(nodes)) => {
            Ok(FilterValue::Logical(!nodes.is_empty()))
        }
        (ValueType::Json, value @ FilterValue::Json(_)) => Ok(value),
        (ValueType::Nodes, value @ FilterValue::Nodes(_)) => Ok(value),
        (ValueType::Json, value) if !e_ctx.strict => {
            log::trace!("{context}: using {} as a JSON value", value.describe());
            Ok(FilterValue::Json(json_operand(value, context, e_ctx)?))
        }
        (ValueType::Logical, value) if !e_ctx.strict => {
            Ok(FilterValue::Logical(logical_operand(value, context, e_ctx)?))
        }
        (param, value) => Err(EvalError::type_mismatch(context, param, value.describe())),
    }
}

fn adapt_result<'a>(
    result: FilterValue<'a>,
    expected: ValueType,
    name: &str,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<FilterValue<'a>, EvalError> {
    match (expected, result) {
        (ValueType::Logical, FilterValue::Nodes(nodes)) => {
            Ok(FilterValue::Logical(!nodes.is_empty()))
        }
        (ValueType::Json, FilterValue::Logical(b)) => Ok(FilterValue::owned(Value::Bool(b))),
        (ValueType::Json, nodes @ FilterValue::Nodes(_)) => Ok(FilterValue::Json(json_operand(
            nodes,
            &format!("result of {name}()"),
            e_ctx,
        )?)),
        (_, result) => Ok(result),
    }
}
