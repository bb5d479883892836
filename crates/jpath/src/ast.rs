//! Defines the Abstract Syntax Tree (AST) for JSON Path queries.
//!
//! Every node implements `Display` in a canonical form that parses back to an
//! equal tree.

use itertools::Itertools;
use jsonsift_types::quote_member_name;
use std::fmt;

/// A query: a starting node followed by a chain of segments.
#[derive(Debug)]
pub enum Path {
    /// `$`, the root of the queried document.
    Root,
    /// `@`, the node currently under test in a filter.
    Current,
    /// A segment applied to every node the inner path selects.
    Select(Box<Path>, Segment),
}

impl Path {
    pub fn select(self, segment: Segment) -> Path {
        Path::Select(Box::new(self), segment)
    }

    /// A path is singular when every segment is a child segment holding exactly
    /// one name or index selector. Such a path selects at most one node.
    pub fn is_singular(&self) -> bool {
        let (_, segments) = self.segments();
        segments.iter().all(|segment| segment.is_singular())
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self.segments().0, Path::Root)
    }

    /// Splits the path into its starting node and its segments, outermost first.
    pub fn segments(&self) -> (&Path, Vec<&Segment>) {
        let mut segments = Vec::new();
        let mut path = self;
        while let Path::Select(inner, segment) = path {
            segments.push(segment);
            path = inner;
        }
        segments.reverse();
        (path, segments)
    }
}

// Clone, equality and drop walk the segment chain in a loop, so a path with
// very many segments cannot exhaust the stack.
impl Clone for Path {
    fn clone(&self) -> Self {
        let (start, segments) = self.segments();
        let start = match start {
            Path::Current => Path::Current,
            _ => Path::Root,
        };
        segments
            .into_iter()
            .fold(start, |path, segment| path.select(segment.clone()))
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        let (mut left, mut right) = (self, other);
        loop {
            match (left, right) {
                (Path::Root, Path::Root) | (Path::Current, Path::Current) => return true,
                (Path::Select(a, a_segment), Path::Select(b, b_segment)) => {
                    if a_segment != b_segment {
                        return false;
                    }
                    left = a;
                    right = b;
                }
                _ => return false,
            }
        }
    }
}

impl Drop for Path {
    fn drop(&mut self) {
        let Path::Select(inner, _) = self else {
            return;
        };
        let mut next = std::mem::replace(&mut **inner, Path::Root);
        while let Path::Select(inner, _) = &mut next {
            let parent = std::mem::replace(&mut **inner, Path::Root);
            next = parent;
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, segments) = self.segments();
        match start {
            Path::Current => f.write_str("@")?,
            _ => f.write_str("$")?,
        }
        for segment in segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Applies its selectors to the node itself (`[...]`, `.name`, `.*`).
    Children(Vec<Selector>),
    /// Applies its selectors to the node and all of its descendants (`..`).
    Descendants(Vec<Selector>),
}

impl Segment {
    pub fn selectors(&self) -> &[Selector] {
        match self {
            Segment::Children(selectors) | Segment::Descendants(selectors) => selectors,
        }
    }

    pub fn is_singular(&self) -> bool {
        match self {
            Segment::Children(selectors) => {
                matches!(selectors.as_slice(), [Selector::Member(_) | Selector::Index(_)])
            }
            Segment::Descendants(_) => false,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let selectors = self.selectors().iter().join(", ");
        match self {
            Segment::Children(_) => write!(f, "[{selectors}]"),
            Segment::Descendants(_) => write!(f, "..[{selectors}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Wildcard,
    Member(String),
    /// Negative indices count back from the end of the array.
    Index(i64),
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    Filter(Expression),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Wildcard => f.write_str("*"),
            Selector::Member(name) => f.write_str(&quote_member_name(name)),
            Selector::Index(index) => write!(f, "{index}"),
            Selector::Slice { start, end, step } => {
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                f.write_str(":")?;
                if let Some(end) = end {
                    write!(f, "{end}")?;
                }
                if let Some(step) = step {
                    write!(f, ":{step}")?;
                }
                Ok(())
            }
            Selector::Filter(expr) => write!(f, "?{expr}"),
        }
    }
}

/// A filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// A bare name resolved against the environment's variables.
    Variable(String),
    /// A query that may select any number of nodes.
    Query(Path),
    /// A query that selects at most one node.
    SingularQuery(Path),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    PrefixOp {
        op: PrefixOperator,
        expr: Box<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
}

impl Expression {
    /// Wraps a parsed query, classifying it as singular or not.
    pub fn query(path: Path) -> Expression {
        if path.is_singular() {
            Expression::SingularQuery(path)
        } else {
            Expression::Query(path)
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expression::Null
                | Expression::Bool(_)
                | Expression::Integer(_)
                | Expression::Float(_)
                | Expression::String(_)
        )
    }

    fn precedence(&self) -> Option<u8> {
        match self {
            Expression::BinaryOp { op, .. } => Some(op.precedence()),
            _ => None,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Null => f.write_str("null"),
            Expression::Bool(b) => write!(f, "{b}"),
            Expression::Integer(i) => write!(f, "{i}"),
            // `Debug` keeps a fraction or exponent, so the literal reads back as a float.
            Expression::Float(x) => write!(f, "{x:?}"),
            Expression::String(s) => f.write_str(&quote_member_name(s)),
            Expression::Variable(name) => f.write_str(name),
            Expression::Query(path) | Expression::SingularQuery(path) => write!(f, "{path}"),
            Expression::FunctionCall { name, args } => {
                write!(f, "{name}({})", args.iter().join(", "))
            }
            Expression::PrefixOp { op, expr } => {
                write!(f, "{op}")?;
                let numeric = matches!(**expr, Expression::Integer(_) | Expression::Float(_));
                expr.fmt_operand(f, numeric || expr.precedence().is_some())
            }
            Expression::BinaryOp { left, op, right } => {
                let level = op.precedence();
                left.fmt_operand(f, left.precedence().is_some_and(|p| p < level))?;
                write!(f, " {op} ")?;
                right.fmt_operand(f, right.precedence().is_some_and(|p| p <= level))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Not,
    Negate,
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOperator::Not => f.write_str("!"),
            PrefixOperator::Negate => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Equals,
    NotEquals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    /// Binding strength; higher binds tighter. All operators are left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 0,
            BinaryOperator::And => 1,
            BinaryOperator::Equals
            | BinaryOperator::NotEquals
            | BinaryOperator::Less
            | BinaryOperator::LessOrEqual
            | BinaryOperator::Greater
            | BinaryOperator::GreaterOrEqual => 2,
            BinaryOperator::Add | BinaryOperator::Subtract => 3,
            BinaryOperator::Multiply | BinaryOperator::Divide => 4,
        }
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == 2
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Equals => "==",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(path: Path, name: &str) -> Path {
        path.select(Segment::Children(vec![Selector::Member(name.into())]))
    }

    #[test]
    fn test_singularity() {
        let singular = member(member(Path::Current, "a"), "b")
            .select(Segment::Children(vec![Selector::Index(-1)]));
        assert!(singular.is_singular());
        assert!(Path::Root.is_singular());

        let wildcard = member(Path::Root, "a").select(Segment::Children(vec![Selector::Wildcard]));
        assert!(!wildcard.is_singular());

        let two = Path::Root.select(Segment::Children(vec![
            Selector::Index(0),
            Selector::Index(1),
        ]));
        assert!(!two.is_singular());

        let descendant =
            Path::Root.select(Segment::Descendants(vec![Selector::Member("a".into())]));
        assert!(!descendant.is_singular());
    }

    #[test]
    fn test_long_paths_clone_compare_and_drop() {
        let long = (0..100_000).fold(Path::Root, |path, i| {
            path.select(Segment::Children(vec![Selector::Index(i % 7)]))
        });
        let copy = long.clone();
        assert_eq!(copy, long);
        assert_ne!(copy, member(Path::Root, "a"));
        assert_eq!(long.segments().1.len(), 100_000);
        drop(copy);
        drop(long);
    }

    #[test]
    fn test_segments_are_outermost_first() {
        let path = member(member(Path::Root, "a"), "b");
        let (start, segments) = path.segments();
        assert_eq!(start, &Path::Root);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].to_string(), "['a']");
        assert!(path.is_absolute());
        assert!(!member(Path::Current, "a").is_absolute());
    }

    #[test]
    fn test_display_of_selectors() {
        let path = Path::Root
            .select(Segment::Descendants(vec![Selector::Wildcard]))
            .select(Segment::Children(vec![
                Selector::Slice { start: None, end: Some(-1), step: None },
                Selector::Slice { start: Some(1), end: None, step: Some(2) },
                Selector::Member("o'k".into()),
            ]));
        assert_eq!(path.to_string(), r"$..[*][:-1, 1::2, 'o\'k']");
    }

    #[test]
    fn test_display_parenthesizes_by_precedence() {
        let sum = Expression::BinaryOp {
            left: Box::new(Expression::Integer(1)),
            op: BinaryOperator::Add,
            right: Box::new(Expression::Integer(2)),
        };
        let product = Expression::BinaryOp {
            left: Box::new(sum.clone()),
            op: BinaryOperator::Multiply,
            right: Box::new(Expression::Integer(3)),
        };
        assert_eq!(product.to_string(), "(1 + 2) * 3");

        let right_nested = Expression::BinaryOp {
            left: Box::new(Expression::Integer(5)),
            op: BinaryOperator::Subtract,
            right: Box::new(sum),
        };
        assert_eq!(right_nested.to_string(), "5 - (1 + 2)");

        let negated = Expression::PrefixOp {
            op: PrefixOperator::Negate,
            expr: Box::new(Expression::Integer(4)),
        };
        assert_eq!(negated.to_string(), "-(4)");
    }

    #[test]
    fn test_display_of_literals_and_calls() {
        let call = Expression::FunctionCall {
            name: "match".into(),
            args: vec![
                Expression::SingularQuery(member(Path::Current, "name")),
                Expression::String("^a.*".into()),
            ],
        };
        assert_eq!(call.to_string(), "match(@['name'], '^a.*')");
        assert_eq!(Expression::Float(1.0).to_string(), "1.0");
        assert_eq!(Expression::Null.to_string(), "null");
    }
}
