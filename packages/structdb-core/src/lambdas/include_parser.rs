use crate::error::{Result, StructureError};

use super::expr::{Expr, IncludeSelector};
use super::nodes::{IncludeNode, MemberNode, Node};
use super::parsed_lambda::ParsedLambda;

/// Parses include selectors into Include nodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct IncludeParser;

impl IncludeParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, selectors: &[IncludeSelector]) -> Result<ParsedLambda> {
        let mut nodes = Vec::with_capacity(selectors.len());
        for selector in selectors {
            let Expr::Member(member) = &selector.expr else {
                return Err(StructureError::unsupported_node(format!(
                    "Include selector {:?} is not a member access",
                    selector.expr
                )));
            };
            if member.is_element_of_enumerable() {
                return Err(StructureError::unsupported_node(format!(
                    "Include through sequence member '{}'",
                    member.path()
                )));
            }
            nodes.push(Node::Include(IncludeNode {
                referenced_structure_name: selector.target.clone(),
                member: MemberNode::new(member.path(), false),
            }));
        }
        Ok(ParsedLambda::new(nodes))
    }
}
