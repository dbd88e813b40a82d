//! Evaluates query commands directly over the in-memory tables.
//!
//! Semantics follow the generated SQL: member conditions hold when any of
//! the structure's index values satisfies them, null checks test for the
//! absence of a non-null value, and sort keys on index members use the
//! smallest value ascending and the largest descending.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Result, StructureError};
use crate::lambdas::{Node, Operator, ParsedLambda, SortDirection};
use crate::query::{resolve_member, ColumnRef, QueryCommand};
use crate::schema::{DbSchemaNames, StructureSchema, JSON_COLUMN, STRUCTURE_ID_COLUMN};
use crate::value::Value;

use super::backend::{MemoryBackend, MemoryTable};

/// One selected structure.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow {
    pub id: Value,
    pub json: String,
    /// Body of each included structure, in include order; `None` when the
    /// referenced structure does not exist
    pub includes: Vec<Option<String>>,
}

struct Candidate {
    id: Value,
    json: String,
    values: HashMap<String, Vec<Value>>,
}

impl Candidate {
    fn values_of(&self, column: &ColumnRef) -> Vec<&Value> {
        match column {
            ColumnRef::Id => vec![&self.id],
            ColumnRef::Index(name) => self
                .values
                .get(name)
                .map(|v| v.iter().collect())
                .unwrap_or_default(),
        }
    }

    fn sort_key(&self, column: &ColumnRef, direction: SortDirection) -> Option<&Value> {
        let values = self.values_of(column).into_iter();
        let order = |a: &&Value, b: &&Value| a.compare(b).unwrap_or(Ordering::Equal);
        match direction {
            SortDirection::Asc => values.min_by(order),
            SortDirection::Desc => values.max_by(order),
        }
    }
}

#[derive(Debug)]
enum Operand {
    Member(ColumnRef),
    Value(Value),
    Bool(bool),
}

impl MemoryBackend {
    /// Runs a query against the loaded rows of the schema's structure.
    ///
    /// # Returns
    /// `Result<Vec<QueryRow>>` in query order; unsupported query shapes fail
    /// exactly as they fail to compile.
    pub fn query(&self, schema: &StructureSchema, query: &QueryCommand) -> Result<Vec<QueryRow>> {
        let names = DbSchemaNames::for_schema(schema);
        self.with_tables(|tables| {
            let mut selected = select(schema, &names, query, tables)?;

            let sortings = sort_keys(schema, query.sortings.as_ref())?;
            if !sortings.is_empty() {
                selected.sort_by(|a, b| compare_candidates(a, b, &sortings));
            } else if query.paging.is_some() {
                selected.sort_by(|a, b| a.id.compare(&b.id).unwrap_or(Ordering::Equal));
            }

            let selected: Vec<Candidate> = match (query.paging, query.take) {
                (Some(paging), _) => selected
                    .into_iter()
                    .skip(paging.skip()?)
                    .take(paging.page_size)
                    .collect(),
                (None, Some(take)) => selected.into_iter().take(take).collect(),
                (None, None) => selected,
            };

            let includes = include_keys(schema, &query.includes)?;
            Ok(selected
                .into_iter()
                .map(|candidate| {
                    let included = includes
                        .iter()
                        .map(|(target, column)| {
                            let key = candidate.sort_key(column, SortDirection::Asc)?;
                            find_body(tables.get(&target.structures_table)?, key)
                        })
                        .collect();
                    QueryRow {
                        id: candidate.id,
                        json: candidate.json,
                        includes: included,
                    }
                })
                .collect())
        })
    }

    /// Counts the structures matching the query's predicate.
    pub fn count(&self, schema: &StructureSchema, query: &QueryCommand) -> Result<usize> {
        let names = DbSchemaNames::for_schema(schema);
        self.with_tables(|tables| Ok(select(schema, &names, query, tables)?.len()))
    }
}

fn select(
    schema: &StructureSchema,
    names: &DbSchemaNames,
    query: &QueryCommand,
    tables: &HashMap<String, MemoryTable>,
) -> Result<Vec<Candidate>> {
    let mut selected = Vec::new();
    for candidate in load_candidates(names, tables) {
        let keep = match &query.where_lambda {
            Some(lambda) if query.has_where() => matches(schema, lambda, &candidate)?,
            _ => true,
        };
        if keep {
            selected.push(candidate);
        }
    }
    Ok(selected)
}

fn load_candidates(names: &DbSchemaNames, tables: &HashMap<String, MemoryTable>) -> Vec<Candidate> {
    let mut values: HashMap<String, HashMap<String, Vec<Value>>> = HashMap::new();
    if let Some(indexes) = tables.get(&names.indexes_table) {
        for row in indexes.rows() {
            let Some(owner) = row.get(STRUCTURE_ID_COLUMN) else {
                continue;
            };
            let columns = values.entry(owner.identity_key()).or_default();
            for (column, value) in row {
                if value.is_null() || DbSchemaNames::is_system_column(column) {
                    continue;
                }
                columns.entry(column.clone()).or_default().push(value.clone());
            }
        }
    }

    let Some(structures) = tables.get(&names.structures_table) else {
        return Vec::new();
    };
    structures
        .rows()
        .iter()
        .filter_map(|row| {
            let id = row.get(STRUCTURE_ID_COLUMN)?.clone();
            let json = match row.get(JSON_COLUMN)? {
                Value::Text(json) => json.clone(),
                _ => return None,
            };
            let values = values.remove(&id.identity_key()).unwrap_or_default();
            Some(Candidate { id, json, values })
        })
        .collect()
}

fn find_body(table: &MemoryTable, key: &Value) -> Option<String> {
    table.rows().iter().find_map(|row| {
        let id = row.get(STRUCTURE_ID_COLUMN)?;
        if id.compare(key) != Some(Ordering::Equal) {
            return None;
        }
        match row.get(JSON_COLUMN)? {
            Value::Text(json) => Some(json.clone()),
            _ => None,
        }
    })
}

fn matches(schema: &StructureSchema, lambda: &ParsedLambda, candidate: &Candidate) -> Result<bool> {
    let mut stack: Vec<Operand> = Vec::new();

    for node in lambda.nodes() {
        match node {
            Node::Member(member) => stack.push(Operand::Member(resolve_member(schema, member)?)),
            Node::Value(value) => stack.push(Operand::Value(value.clone())),
            Node::Operator(op) => {
                let result = if op.is_logical() {
                    let right = truth(pop(&mut stack)?, op)?;
                    match op {
                        Operator::Not => !right,
                        Operator::And => truth(pop(&mut stack)?, op)? && right,
                        _ => truth(pop(&mut stack)?, op)? || right,
                    }
                } else {
                    let right = pop(&mut stack)?;
                    let left = pop(&mut stack)?;
                    compare(candidate, *op, left, right)?
                };
                stack.push(Operand::Bool(result));
            }
            Node::Sorting(_) | Node::Include(_) => {
                return Err(StructureError::unsupported_node(format!(
                    "{} node in a where lambda",
                    node.kind()
                )))
            }
        }
    }

    let mut result = true;
    for operand in stack {
        result &= truth(operand, &Operator::And)?;
    }
    Ok(result)
}

fn pop(stack: &mut Vec<Operand>) -> Result<Operand> {
    stack
        .pop()
        .ok_or_else(|| StructureError::unsupported_node("Operand stack underflow"))
}

fn truth(operand: Operand, op: &Operator) -> Result<bool> {
    match operand {
        Operand::Bool(b) => Ok(b),
        other => Err(StructureError::unsupported_node(format!(
            "{:?} used as a predicate in '{}'",
            other,
            op.symbol()
        ))),
    }
}

fn compare(candidate: &Candidate, op: Operator, left: Operand, right: Operand) -> Result<bool> {
    let (column, op, value) = match (left, right) {
        (Operand::Member(column), Operand::Value(value)) => (column, op, value),
        (Operand::Value(value), Operand::Member(column)) => {
            let flipped = match op {
                Operator::LessThan => Operator::GreaterThan,
                Operator::LessThanOrEqual => Operator::GreaterThanOrEqual,
                Operator::GreaterThan => Operator::LessThan,
                Operator::GreaterThanOrEqual => Operator::LessThanOrEqual,
                Operator::Equal | Operator::NotEqual => op,
                _ => {
                    return Err(StructureError::unsupported_node(format!(
                        "Value on the left of '{}'",
                        op.symbol()
                    )))
                }
            };
            (column, flipped, value)
        }
        (left, right) => {
            return Err(StructureError::unsupported_node(format!(
                "{:?} compared with {:?} using '{}'",
                left,
                right,
                op.symbol()
            )))
        }
    };

    let values = candidate.values_of(&column);
    match (op, &value) {
        (Operator::Equal, Value::Null) => Ok(values.is_empty()),
        (Operator::NotEqual, Value::Null) => Ok(!values.is_empty()),
        (_, Value::Null) => Err(StructureError::unsupported_node(format!(
            "Null compared using '{}'",
            op.symbol()
        ))),
        (Operator::In, Value::List(set)) => Ok(values
            .iter()
            .any(|v| set.iter().any(|s| v.compare(s) == Some(Ordering::Equal)))),
        (Operator::StartsWith, Value::Text(prefix)) if column != ColumnRef::Id => Ok(values
            .iter()
            .any(|v| matches!(v, Value::Text(text) if text.starts_with(prefix.as_str())))),
        (Operator::In, _) | (Operator::StartsWith, _) | (_, Value::List(_)) => {
            Err(StructureError::unsupported_node(format!(
                "Operator '{}' with this operand combination",
                op.symbol()
            )))
        }
        (op, value) => Ok(values.iter().any(|v| match v.compare(value) {
            Some(ordering) => satisfies(op, ordering),
            None => false,
        })),
    }
}

fn satisfies(op: Operator, ordering: Ordering) -> bool {
    match op {
        Operator::Equal => ordering == Ordering::Equal,
        Operator::NotEqual => ordering != Ordering::Equal,
        Operator::LessThan => ordering == Ordering::Less,
        Operator::LessThanOrEqual => ordering != Ordering::Greater,
        Operator::GreaterThan => ordering == Ordering::Greater,
        Operator::GreaterThanOrEqual => ordering != Ordering::Less,
        _ => false,
    }
}

fn sort_keys(
    schema: &StructureSchema,
    sortings: Option<&ParsedLambda>,
) -> Result<Vec<(ColumnRef, SortDirection)>> {
    let Some(sortings) = sortings else {
        return Ok(Vec::new());
    };
    sortings
        .nodes()
        .iter()
        .map(|node| match node {
            Node::Sorting(sorting) => Ok((resolve_member(schema, &sorting.member)?, sorting.direction)),
            other => Err(StructureError::unsupported_node(format!(
                "{} node in a sorting lambda",
                other.kind()
            ))),
        })
        .collect()
}

fn include_keys(
    schema: &StructureSchema,
    includes: &[ParsedLambda],
) -> Result<Vec<(DbSchemaNames, ColumnRef)>> {
    includes
        .iter()
        .flat_map(|l| l.nodes())
        .map(|node| match node {
            Node::Include(include) => Ok((
                DbSchemaNames::for_name(&include.referenced_structure_name),
                resolve_member(schema, &include.member)?,
            )),
            other => Err(StructureError::unsupported_node(format!(
                "{} node in an include lambda",
                other.kind()
            ))),
        })
        .collect()
}

/// Orders by each key in turn; a missing key sorts lowest.
fn compare_candidates(
    a: &Candidate,
    b: &Candidate,
    sortings: &[(ColumnRef, SortDirection)],
) -> Ordering {
    for (column, direction) in sortings {
        let ordering = match (a.sort_key(column, *direction), b.sort_key(column, *direction)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.compare(y).unwrap_or(Ordering::Equal),
        };
        let ordering = match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
