//! Single-pass operand-stack lowering of predicate nodes into SQL.

use crate::error::{Result, StructureError};
use crate::lambdas::{MemberNode, Node, Operator, ParsedLambda};
use crate::schema::{DbSchemaNames, StructureSchema, STRUCTURE_ID_COLUMN};
use crate::value::Value;

use super::sql::{escape_like, quote_identifier, ParameterSet};

/// Alias of the structures table in generated SQL.
pub(crate) const STRUCTURE_ALIAS: &str = "s";
/// Alias of the indexes table inside correlated subqueries.
pub(crate) const INDEX_ALIAS: &str = "si";

/// Column a member node resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ColumnRef {
    /// Physical id column of the structures table
    Id,
    /// Index accessor column of the indexes table
    Index(String),
}

#[derive(Debug)]
enum Operand {
    Member(ColumnRef),
    Value(Value),
    Predicate(String),
}

impl Operand {
    fn kind(&self) -> &'static str {
        match self {
            Operand::Member(_) => "Member",
            Operand::Value(_) => "Value",
            Operand::Predicate(_) => "Predicate",
        }
    }
}

/// Resolves a member node against the schema.
pub(crate) fn resolve_member(schema: &StructureSchema, member: &MemberNode) -> Result<ColumnRef> {
    if schema.is_id_path(&member.path) {
        return Ok(ColumnRef::Id);
    }
    schema
        .index_accessor(&member.path)
        .map(|a| ColumnRef::Index(a.name.clone()))
        .ok_or_else(|| StructureError::MemberNotIndexed {
            structure: schema.name.clone(),
            path: member.path.clone(),
        })
}

pub(crate) fn id_column() -> String {
    format!("{}.{}", STRUCTURE_ALIAS, quote_identifier(STRUCTURE_ID_COLUMN))
}

/// `where`-less correlated subquery over the structure's index rows.
pub(crate) fn index_rows_of_structure(names: &DbSchemaNames) -> String {
    format!(
        "from {} {a} where {a}.{id} = {}",
        quote_identifier(&names.indexes_table),
        id_column(),
        a = INDEX_ALIAS,
        id = quote_identifier(STRUCTURE_ID_COLUMN),
    )
}

pub(crate) fn index_column(column: &str) -> String {
    format!("{}.{}", INDEX_ALIAS, quote_identifier(column))
}

/// Compiles the predicate nodes of one lambda.
pub(crate) struct WhereCompiler<'a> {
    schema: &'a StructureSchema,
    names: DbSchemaNames,
    params: &'a mut ParameterSet,
}

impl<'a> WhereCompiler<'a> {
    pub(crate) fn new(schema: &'a StructureSchema, params: &'a mut ParameterSet) -> Self {
        Self {
            schema,
            names: DbSchemaNames::for_schema(schema),
            params,
        }
    }

    /// Walks the nodes left to right; root predicates left on the stack are conjoined.
    ///
    /// # Returns
    /// `Ok(None)` for an empty lambda.
    pub(crate) fn compile(&mut self, lambda: &ParsedLambda) -> Result<Option<String>> {
        let mut stack: Vec<Operand> = Vec::new();

        for node in lambda.nodes() {
            match node {
                Node::Member(member) => {
                    stack.push(Operand::Member(resolve_member(self.schema, member)?));
                }
                Node::Value(value) => stack.push(Operand::Value(value.clone())),
                Node::Operator(op) => {
                    if stack.len() < op.arity() {
                        return Err(StructureError::unsupported_node(format!(
                            "Operator '{}' is missing operands",
                            op.symbol()
                        )));
                    }
                    let composed = if *op == Operator::Not {
                        let operand = pop(&mut stack)?;
                        format!("not ({})", self.predicate(operand, "not")?)
                    } else if op.is_logical() {
                        let right = pop(&mut stack)?;
                        let left = pop(&mut stack)?;
                        format!(
                            "({} {} {})",
                            self.predicate(left, op.symbol())?,
                            op.symbol(),
                            self.predicate(right, op.symbol())?
                        )
                    } else {
                        let right = pop(&mut stack)?;
                        let left = pop(&mut stack)?;
                        self.comparison(*op, left, right)?
                    };
                    stack.push(Operand::Predicate(composed));
                }
                Node::Sorting(_) | Node::Include(_) => {
                    return Err(StructureError::unsupported_node(format!(
                        "{} node in a where lambda",
                        node.kind()
                    )))
                }
            }
        }

        let mut predicates = Vec::with_capacity(stack.len());
        for operand in stack {
            predicates.push(self.predicate(operand, "where")?);
        }
        Ok(match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(predicates.join(" and ")),
        })
    }

    fn predicate(&self, operand: Operand, context: &str) -> Result<String> {
        match operand {
            Operand::Predicate(sql) => Ok(sql),
            other => Err(StructureError::unsupported_node(format!(
                "{} operand used as a predicate in '{}'",
                other.kind(),
                context
            ))),
        }
    }

    fn comparison(&mut self, op: Operator, left: Operand, right: Operand) -> Result<String> {
        match (left, right) {
            (Operand::Member(column), Operand::Value(value)) => {
                self.member_vs_value(column, op, value)
            }
            (Operand::Value(value), Operand::Member(column)) => {
                let flipped = flip(op).ok_or_else(|| {
                    StructureError::unsupported_node(format!(
                        "Value on the left of '{}'",
                        op.symbol()
                    ))
                })?;
                self.member_vs_value(column, flipped, value)
            }
            (left, right) => Err(StructureError::unsupported_node(format!(
                "{} compared with {} using '{}'",
                left.kind(),
                right.kind(),
                op.symbol()
            ))),
        }
    }

    fn member_vs_value(&mut self, column: ColumnRef, op: Operator, value: Value) -> Result<String> {
        let target = match &column {
            ColumnRef::Id => id_column(),
            ColumnRef::Index(name) => index_column(name),
        };

        let condition = match (op, value) {
            (Operator::Equal, Value::Null) | (Operator::NotEqual, Value::Null) => {
                return Ok(self.null_check(&column, &target, op == Operator::Equal));
            }
            (_, Value::Null) => {
                return Err(StructureError::unsupported_node(format!(
                    "Null compared using '{}'",
                    op.symbol()
                )))
            }
            (Operator::In, Value::List(values)) => {
                if values.is_empty() {
                    return Ok("1 = 0".to_string());
                }
                let names: Vec<String> = values.into_iter().map(|v| self.params.add(v)).collect();
                format!("{} in ({})", target, names.join(", "))
            }
            (Operator::StartsWith, Value::Text(prefix)) if column != ColumnRef::Id => {
                let name = self.params.add(Value::Text(format!("{}%", escape_like(&prefix))));
                format!("{} like {}", target, name)
            }
            (Operator::In, _) | (Operator::StartsWith, _) | (_, Value::List(_)) => {
                return Err(StructureError::unsupported_node(format!(
                    "Operator '{}' with this operand combination",
                    op.symbol()
                )))
            }
            (op, value) => {
                let name = self.params.add(value);
                format!("{} {} {}", target, op.symbol(), name)
            }
        };

        Ok(match column {
            ColumnRef::Id => condition,
            ColumnRef::Index(_) => self.exists(&condition),
        })
    }

    fn null_check(&self, column: &ColumnRef, target: &str, is_null: bool) -> String {
        match column {
            ColumnRef::Id if is_null => format!("{} is null", target),
            ColumnRef::Id => format!("{} is not null", target),
            ColumnRef::Index(_) => {
                let has_value = self.exists(&format!("{} is not null", target));
                if is_null {
                    format!("not {}", has_value)
                } else {
                    has_value
                }
            }
        }
    }

    fn exists(&self, condition: &str) -> String {
        format!(
            "exists (select 1 {} and {})",
            index_rows_of_structure(&self.names),
            condition
        )
    }
}

fn pop(stack: &mut Vec<Operand>) -> Result<Operand> {
    stack
        .pop()
        .ok_or_else(|| StructureError::unsupported_node("Operand stack underflow"))
}

/// Mirrors a comparison so the member ends up on the left.
fn flip(op: Operator) -> Option<Operator> {
    match op {
        Operator::Equal => Some(Operator::Equal),
        Operator::NotEqual => Some(Operator::NotEqual),
        Operator::LessThan => Some(Operator::GreaterThan),
        Operator::LessThanOrEqual => Some(Operator::GreaterThanOrEqual),
        Operator::GreaterThan => Some(Operator::LessThan),
        Operator::GreaterThanOrEqual => Some(Operator::LessThanOrEqual),
        _ => None,
    }
}
