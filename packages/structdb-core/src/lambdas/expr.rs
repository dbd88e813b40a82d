//! Expression model callers build predicates, orderings and includes with.

use crate::value::Value;

use super::nodes::SortDirection;

/// Method names the where parser understands.
pub mod methods {
    pub const IN_SET: &str = "in_set";
    pub const STARTS_WITH: &str = "starts_with";
    pub const IS_NULL: &str = "is_null";
    pub const IS_NOT_NULL: &str = "is_not_null";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MemberSegment {
    name: String,
    sequence: bool,
}

/// A member access chain rooted at the document, e.g. `x.Customer.Address.City`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberExpr {
    segments: Vec<MemberSegment>,
}

impl MemberExpr {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            segments: vec![MemberSegment {
                name: name.into(),
                sequence: false,
            }],
        }
    }

    /// Accesses a child member.
    pub fn dot(mut self, name: impl Into<String>) -> Self {
        self.segments.push(MemberSegment {
            name: name.into(),
            sequence: false,
        });
        self
    }

    /// Steps through the sequence held by the current member, addressing
    /// every element.
    pub fn each(mut self) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.sequence = true;
        }
        self
    }

    /// Dotted path of the chain.
    pub fn path(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Whether any segment of the chain is reached through a sequence.
    pub fn is_element_of_enumerable(&self) -> bool {
        self.segments.iter().any(|s| s.sequence)
    }

    fn compare(self, op: BinaryOp, value: impl Into<Value>) -> Expr {
        Expr::binary(op, Expr::Member(self), Expr::Constant(value.into()))
    }

    pub fn eq(self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Eq, value)
    }

    pub fn ne(self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Ne, value)
    }

    pub fn lt(self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Lt, value)
    }

    pub fn le(self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Le, value)
    }

    pub fn gt(self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Gt, value)
    }

    pub fn ge(self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Ge, value)
    }

    /// Set membership: the member value is one of `values`.
    pub fn in_set<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Expr {
        let set = Value::List(values.into_iter().map(Into::into).collect());
        self.call(methods::IN_SET, vec![Expr::Constant(set)])
    }

    pub fn starts_with(self, prefix: impl Into<String>) -> Expr {
        self.call(
            methods::STARTS_WITH,
            vec![Expr::Constant(Value::Text(prefix.into()))],
        )
    }

    pub fn is_null(self) -> Expr {
        self.call(methods::IS_NULL, Vec::new())
    }

    pub fn is_not_null(self) -> Expr {
        self.call(methods::IS_NOT_NULL, Vec::new())
    }

    /// Arbitrary method call on the member.
    pub fn call(self, method: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call {
            method: method.into(),
            target: Box::new(Expr::Member(self)),
            args,
        }
    }
}

/// Predicate expression over a document type.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Member(MemberExpr),
    Constant(Value),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    Call {
        method: String,
        target: Box<Expr>,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Starts a member chain at the document root.
    pub fn member(name: impl Into<String>) -> MemberExpr {
        MemberExpr::new(name)
    }

    pub fn constant(value: impl Into<Value>) -> Expr {
        Expr::Constant(value.into())
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::And, self, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::Or, self, other)
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl From<MemberExpr> for Expr {
    fn from(member: MemberExpr) -> Self {
        Expr::Member(member)
    }
}

/// One sort key selector.
///
/// A selector without a direction sorts descending.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSelector {
    pub expr: Expr,
    pub direction: Option<SortDirection>,
}

impl SortSelector {
    pub fn new(expr: impl Into<Expr>) -> Self {
        Self {
            expr: expr.into(),
            direction: None,
        }
    }

    pub fn asc(expr: impl Into<Expr>) -> Self {
        Self {
            expr: expr.into(),
            direction: Some(SortDirection::Asc),
        }
    }

    pub fn desc(expr: impl Into<Expr>) -> Self {
        Self {
            expr: expr.into(),
            direction: Some(SortDirection::Desc),
        }
    }
}

/// Eagerly fetches the `target` structure referenced by a foreign id member.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeSelector {
    pub target: String,
    pub expr: Expr,
}

impl IncludeSelector {
    pub fn new(target: impl Into<String>, expr: impl Into<Expr>) -> Self {
        Self {
            target: target.into(),
            expr: expr.into(),
        }
    }
}
