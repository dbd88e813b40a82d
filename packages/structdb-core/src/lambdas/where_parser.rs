//! Converts predicate expressions into postfix node sequences.

use crate::error::{Result, StructureError};
use crate::value::Value;

use super::expr::{methods, BinaryOp, Expr, MemberExpr};
use super::nodes::{MemberNode, Node, Operator};
use super::parsed_lambda::ParsedLambda;

/// Parses a predicate over a document type into a `ParsedLambda`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhereParser;

impl WhereParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a predicate.
    ///
    /// # Returns
    /// `Result<ParsedLambda>`; fails with `UnsupportedNodeType` on method
    /// calls outside the allow-list and on constant predicates.
    pub fn parse(&self, predicate: &Expr) -> Result<ParsedLambda> {
        let mut nodes = Vec::new();
        self.visit_predicate(predicate, &mut nodes)?;
        Ok(ParsedLambda::new(nodes))
    }

    fn visit_predicate(&self, expr: &Expr, out: &mut Vec<Node>) -> Result<()> {
        match expr {
            // A bare member used as a condition means `member == true`.
            Expr::Member(member) => {
                out.push(member_node(member));
                out.push(Node::Value(Value::Bool(true)));
                out.push(Node::Operator(Operator::Equal));
                Ok(())
            }
            Expr::Constant(value) => Err(StructureError::unsupported_node(format!(
                "Constant predicate {}",
                value
            ))),
            Expr::Binary { op, left, right } => match op {
                BinaryOp::And | BinaryOp::Or => {
                    self.visit_predicate(left, out)?;
                    self.visit_predicate(right, out)?;
                    out.push(Node::Operator(logical_operator(*op)));
                    Ok(())
                }
                _ => {
                    self.visit_operand(left, out)?;
                    self.visit_operand(right, out)?;
                    out.push(Node::Operator(comparison_operator(*op)));
                    Ok(())
                }
            },
            Expr::Not(inner) => {
                self.visit_predicate(inner, out)?;
                out.push(Node::Operator(Operator::Not));
                Ok(())
            }
            Expr::Call {
                method,
                target,
                args,
            } => self.visit_call(method, target, args, out),
        }
    }

    fn visit_operand(&self, expr: &Expr, out: &mut Vec<Node>) -> Result<()> {
        match expr {
            Expr::Member(member) => {
                out.push(member_node(member));
                Ok(())
            }
            Expr::Constant(value) => {
                out.push(Node::Value(value.clone()));
                Ok(())
            }
            Expr::Binary { .. } | Expr::Not(_) => Err(StructureError::unsupported_node(
                "Predicate used as a comparison operand",
            )),
            Expr::Call { method, .. } => Err(StructureError::unsupported_node(format!(
                "Method call '{}' used as a comparison operand",
                method
            ))),
        }
    }

    fn visit_call(
        &self,
        method: &str,
        target: &Expr,
        args: &[Expr],
        out: &mut Vec<Node>,
    ) -> Result<()> {
        let Expr::Member(member) = target else {
            return Err(StructureError::unsupported_node(format!(
                "Method call '{}' on a non-member target",
                method
            )));
        };

        match (method, args) {
            (methods::IN_SET, [Expr::Constant(Value::List(values))]) => {
                out.push(member_node(member));
                out.push(Node::Value(Value::List(values.clone())));
                out.push(Node::Operator(Operator::In));
            }
            (methods::STARTS_WITH, [Expr::Constant(Value::Text(prefix))]) => {
                out.push(member_node(member));
                out.push(Node::Value(Value::Text(prefix.clone())));
                out.push(Node::Operator(Operator::StartsWith));
            }
            (methods::IS_NULL, []) => {
                out.push(member_node(member));
                out.push(Node::Value(Value::Null));
                out.push(Node::Operator(Operator::Equal));
            }
            (methods::IS_NOT_NULL, []) => {
                out.push(member_node(member));
                out.push(Node::Value(Value::Null));
                out.push(Node::Operator(Operator::NotEqual));
            }
            _ => {
                return Err(StructureError::unsupported_node(format!(
                    "Method call '{}' with {} argument(s)",
                    method,
                    args.len()
                )))
            }
        }
        Ok(())
    }
}

fn member_node(member: &MemberExpr) -> Node {
    Node::Member(MemberNode::new(
        member.path(),
        member.is_element_of_enumerable(),
    ))
}

fn logical_operator(op: BinaryOp) -> Operator {
    match op {
        BinaryOp::And => Operator::And,
        _ => Operator::Or,
    }
}

fn comparison_operator(op: BinaryOp) -> Operator {
    match op {
        BinaryOp::Eq => Operator::Equal,
        BinaryOp::Ne => Operator::NotEqual,
        BinaryOp::Lt => Operator::LessThan,
        BinaryOp::Le => Operator::LessThanOrEqual,
        BinaryOp::Gt => Operator::GreaterThan,
        BinaryOp::Ge => Operator::GreaterThanOrEqual,
        BinaryOp::And => Operator::And,
        BinaryOp::Or => Operator::Or,
    }
}
