use crate::error::{Result, StructureError};

use super::expr::{Expr, SortSelector};
use super::nodes::{MemberNode, Node, SortDirection, SortingNode};
use super::parsed_lambda::ParsedLambda;

/// Parses ordered sort selectors into Sorting nodes, input order preserved.
#[derive(Debug, Default, Clone, Copy)]
pub struct SortingParser;

impl SortingParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, selectors: &[SortSelector]) -> Result<ParsedLambda> {
        let mut nodes = Vec::with_capacity(selectors.len());
        for selector in selectors {
            let Expr::Member(member) = &selector.expr else {
                return Err(StructureError::unsupported_node(format!(
                    "Sort selector {:?} is not a member access",
                    selector.expr
                )));
            };
            nodes.push(Node::Sorting(SortingNode {
                member: MemberNode::new(member.path(), member.is_element_of_enumerable()),
                direction: selector.direction.unwrap_or(SortDirection::Desc),
            }));
        }
        Ok(ParsedLambda::new(nodes))
    }
}
