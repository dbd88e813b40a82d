//! Node variants of a parsed lambda.

use std::fmt;

use crate::value::Value;

/// Comparison and logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    Not,
    /// Member value is one of a set carried by one `Value::List`
    In,
    /// Text member starts with a literal prefix
    StartsWith,
}

impl Operator {
    /// Number of operands the operator consumes.
    pub fn arity(&self) -> usize {
        match self {
            Operator::Not => 1,
            _ => 2,
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::And | Operator::Or | Operator::Not)
    }

    /// SQL spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::In => "in",
            Operator::StartsWith => "like",
        }
    }
}

/// A member path segment chain collapsed into one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberNode {
    /// Dotted path from the document root
    pub path: String,
    /// Last segment name
    pub name: String,
    /// Path of the parent member, if any
    pub parent: Option<String>,
    /// Set when any ancestor segment is reached through a sequence
    pub is_element_of_enumerable: bool,
}

impl MemberNode {
    pub fn new(path: impl Into<String>, is_element_of_enumerable: bool) -> Self {
        let path = path.into();
        let (parent, name) = match path.rsplit_once('.') {
            Some((parent, name)) => (Some(parent.to_string()), name.to_string()),
            None => (None, path.clone()),
        };
        Self {
            path,
            name,
            parent,
            is_element_of_enumerable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "Asc",
            SortDirection::Desc => "Desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortingNode {
    pub member: MemberNode,
    pub direction: SortDirection,
}

/// Eager fetch of another structure type through a foreign id member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncludeNode {
    /// Name of the referenced structure type
    pub referenced_structure_name: String,
    /// Member on the root type holding the referenced id
    pub member: MemberNode,
}

/// One node of a parsed lambda.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Member(MemberNode),
    Operator(Operator),
    Value(Value),
    Sorting(SortingNode),
    Include(IncludeNode),
}

impl Node {
    /// Kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Member(_) => "Member",
            Node::Operator(_) => "Operator",
            Node::Value(_) => "Value",
            Node::Sorting(_) => "Sorting",
            Node::Include(_) => "Include",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Member(m) if m.is_element_of_enumerable => write!(f, "m*:{}", m.path),
            Node::Member(m) => write!(f, "m:{}", m.path),
            Node::Operator(op) => write!(f, "op:{}", op.symbol()),
            Node::Value(v) => write!(f, "v:{}:{}", v.kind(), v),
            Node::Sorting(s) => write!(f, "s:{} {}", s.member.path, s.direction.sql()),
            Node::Include(i) => write!(f, "i:{}<-{}", i.referenced_structure_name, i.member.path),
        }
    }
}
