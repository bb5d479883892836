//! Comparison, arithmetic and negation over JSON values.
//!
//! Operands are `Option<&Value>`; `None` is the absent value.
use crate::ast::BinaryOperator;
use crate::error::EvalError;
use crate::value::describe_json;
use serde_json::{Number, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
enum Numeric {
    Int(i64),
    /// Only for integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
}

impl Numeric {
    fn of(value: &Value) -> Option<Numeric> {
        let Value::Number(n) = value else {
            return None;
        };
        if let Some(i) = n.as_i64() {
            return Some(Numeric::Int(i));
        }
        match n.as_u64() {
            Some(u) => Some(Numeric::UInt(u)),
            None => n.as_f64().map(Numeric::Float),
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::UInt(u) => u as f64,
            Numeric::Float(f) => f,
        }
    }

    fn cmp(self, other: Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => Some(a.cmp(&b)),
            (Numeric::UInt(a), Numeric::UInt(b)) => Some(a.cmp(&b)),
            (Numeric::Int(_), Numeric::UInt(_)) => Some(Ordering::Less),
            (Numeric::UInt(_), Numeric::Int(_)) => Some(Ordering::Greater),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }
}

fn float_value(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}

/// Deep structural equality where numbers compare by numeric value, so `1 == 1.0`.
pub fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => matches!(
            Numeric::of(left).zip(Numeric::of(right)).and_then(|(a, b)| a.cmp(b)),
            Some(Ordering::Equal)
        ),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(name, x)| b.get(name).is_some_and(|y| json_equal(x, y)))
        }
        _ => left == right,
    }
}

/// Equality including the absent value: absent equals only absent.
pub fn equals(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(a), Some(b)) => json_equal(a, b),
        _ => false,
    }
}

/// Orders two values of the same comparable kind: booleans, numbers or strings.
fn ordering(left: Option<&Value>, right: Option<&Value>) -> Option<Ordering> {
    let (left, right) = (left?, right?);
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(_), Value::Number(_)) => Numeric::of(left)?.cmp(Numeric::of(right)?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Applies a comparison operator. Ordering between incomparable kinds is false;
/// `<=` and `>=` also hold for two absent values and for two nulls.
pub fn compare(op: BinaryOperator, left: Option<&Value>, right: Option<&Value>) -> bool {
    let both_empty = matches!(
        (left, right),
        (None, None) | (Some(Value::Null), Some(Value::Null))
    );
    match op {
        BinaryOperator::Equals => equals(left, right),
        BinaryOperator::NotEquals => !equals(left, right),
        BinaryOperator::Less => ordering(left, right) == Some(Ordering::Less),
        BinaryOperator::Greater => ordering(left, right) == Some(Ordering::Greater),
        BinaryOperator::LessOrEqual => {
            both_empty || matches!(ordering(left, right), Some(Ordering::Less | Ordering::Equal))
        }
        BinaryOperator::GreaterOrEqual => {
            both_empty
                || matches!(
                    ordering(left, right),
                    Some(Ordering::Greater | Ordering::Equal)
                )
        }
        _ => false,
    }
}

/// Applies `+ - * /`.
///
/// Integer pairs use wrapping arithmetic; a float on either side promotes the
/// pair to float. `+` also concatenates two strings. A zero divisor is an error;
/// a non-finite float result is absent.
pub fn arithmetic(
    op: BinaryOperator,
    left: Option<&Value>,
    right: Option<&Value>,
) -> Result<Option<Value>, EvalError> {
    match (left.and_then(Numeric::of), right.and_then(Numeric::of)) {
        (Some(a), Some(b)) => numeric_arithmetic(op, a, b),
        _ => match (op, left, right) {
            (BinaryOperator::Add, Some(Value::String(a)), Some(Value::String(b))) => {
                Ok(Some(Value::String(format!("{a}{b}"))))
            }
            _ => Err(EvalError::type_mismatch(
                format!("operands of '{op}'"),
                if op == BinaryOperator::Add {
                    "two numbers or two strings"
                } else {
                    "two numbers"
                },
                format!("{} and {}", describe_json(left), describe_json(right)),
            )),
        },
    }
}

fn numeric_arithmetic(
    op: BinaryOperator,
    left: Numeric,
    right: Numeric,
) -> Result<Option<Value>, EvalError> {
    if let (Numeric::Int(a), Numeric::Int(b)) = (left, right) {
        let result = match op {
            BinaryOperator::Add => a.wrapping_add(b),
            BinaryOperator::Subtract => a.wrapping_sub(b),
            BinaryOperator::Multiply => a.wrapping_mul(b),
            BinaryOperator::Divide if b == 0 => return Err(EvalError::DivisionByZero),
            BinaryOperator::Divide => a.wrapping_div(b),
            _ => return Ok(None),
        };
        return Ok(Some(Value::from(result)));
    }

    let (a, b) = (left.to_f64(), right.to_f64());
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide if b == 0.0 => return Err(EvalError::DivisionByZero),
        BinaryOperator::Divide => a / b,
        _ => return Ok(None),
    };
    Ok(float_value(result))
}

/// Arithmetic negation of a number, or logical negation of a boolean.
pub fn negate(value: Option<&Value>) -> Result<Value, EvalError> {
    let cannot = || EvalError::CannotNegate {
        operand: describe_json(value).to_string(),
    };
    match value {
        Some(Value::Bool(b)) => Ok(Value::Bool(!b)),
        Some(v) => match Numeric::of(v) {
            Some(Numeric::Int(i)) => Ok(Value::from(i.wrapping_neg())),
            Some(n @ (Numeric::UInt(_) | Numeric::Float(_))) => {
                float_value(-n.to_f64()).ok_or_else(cannot)
            }
            None => Err(cannot()),
        },
        None => Err(cannot()),
    }
}
