//! Assembles select, where, order-by and include fragments.

use crate::error::{Result, StructureError};
use crate::lambdas::{Node, ParsedLambda, SortDirection};
use crate::schema::{DbSchemaNames, StructureSchema, JSON_COLUMN, STRUCTURE_ID_COLUMN};
use crate::value::Value;

use super::command::QueryCommand;
use super::sql::{quote_identifier, ParameterSet, SqlCommandInfo};
use super::where_compiler::{
    id_column, index_column, index_rows_of_structure, resolve_member, ColumnRef, WhereCompiler,
    STRUCTURE_ALIAS,
};

/// Lowers query commands into parameterized SQL. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryGenerator;

impl QueryGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generates the full select statement for a query.
    ///
    /// # Arguments
    /// * `query` - Parsed query parts
    /// * `schema` - Schema of the queried structure type
    ///
    /// # Returns
    /// `Result<SqlCommandInfo>` holding the statement and its parameters.
    pub fn generate(&self, query: &QueryCommand, schema: &StructureSchema) -> Result<SqlCommandInfo> {
        let names = DbSchemaNames::for_schema(schema);
        let mut params = ParameterSet::default();

        let criteria = self.where_criteria(query, schema, &mut params)?;
        let mut order_by = if query.has_sortings() {
            self.order_by(query.sortings.as_ref(), schema, &names)?
        } else {
            None
        };
        let includes = self.includes(&query.includes, schema, &names)?;

        let mut sql = String::from("select ");
        if query.paging.is_none() {
            if let Some(take) = query.take {
                sql.push_str(&format!("top({}) ", params.add(sql_count(take, "take")?)));
            }
        }
        sql.push_str(&format!(
            "{}, {}.{}",
            id_column(),
            STRUCTURE_ALIAS,
            quote_identifier(JSON_COLUMN)
        ));
        for include in &includes {
            sql.push_str(&format!(", {}", include.column));
        }
        sql.push_str(&format!(
            " from {} {}",
            quote_identifier(&names.structures_table),
            STRUCTURE_ALIAS
        ));
        for include in &includes {
            sql.push(' ');
            sql.push_str(&include.join);
        }
        if let Some(criteria) = criteria {
            sql.push_str(" where ");
            sql.push_str(&criteria);
        }

        if let Some(paging) = query.paging {
            // offset/fetch needs an ordering
            let order = order_by.take().unwrap_or_else(|| format!("{} Asc", id_column()));
            let skip = params.add(sql_count(paging.skip()?, "skip")?);
            let size = params.add(sql_count(paging.page_size, "page size")?);
            sql.push_str(&format!(
                " order by {} offset {} rows fetch next {} rows only",
                order, skip, size
            ));
        } else if let Some(order) = order_by {
            sql.push_str(" order by ");
            sql.push_str(&order);
        }
        sql.push(';');

        Ok(SqlCommandInfo {
            sql,
            parameters: params.into_parameters(),
        })
    }

    /// Generates only the where criteria fragment; empty SQL when the
    /// query has no predicate.
    pub fn generate_where(&self, query: &QueryCommand, schema: &StructureSchema) -> Result<SqlCommandInfo> {
        let mut params = ParameterSet::default();
        let sql = self
            .where_criteria(query, schema, &mut params)?
            .unwrap_or_default();
        Ok(SqlCommandInfo {
            sql,
            parameters: params.into_parameters(),
        })
    }

    /// Generates a count of the structures matching the predicate.
    pub fn generate_count(&self, query: &QueryCommand, schema: &StructureSchema) -> Result<SqlCommandInfo> {
        let names = DbSchemaNames::for_schema(schema);
        let mut params = ParameterSet::default();
        let mut sql = format!(
            "select count(*) from {} {}",
            quote_identifier(&names.structures_table),
            STRUCTURE_ALIAS
        );
        if let Some(criteria) = self.where_criteria(query, schema, &mut params)? {
            sql.push_str(" where ");
            sql.push_str(&criteria);
        }
        sql.push(';');
        Ok(SqlCommandInfo {
            sql,
            parameters: params.into_parameters(),
        })
    }

    fn where_criteria(
        &self,
        query: &QueryCommand,
        schema: &StructureSchema,
        params: &mut ParameterSet,
    ) -> Result<Option<String>> {
        match &query.where_lambda {
            Some(lambda) if query.has_where() => WhereCompiler::new(schema, params).compile(lambda),
            _ => Ok(None),
        }
    }

    fn order_by(
        &self,
        sortings: Option<&ParsedLambda>,
        schema: &StructureSchema,
        names: &DbSchemaNames,
    ) -> Result<Option<String>> {
        let Some(sortings) = sortings else {
            return Ok(None);
        };

        let mut parts = Vec::with_capacity(sortings.nodes().len());
        for node in sortings.nodes() {
            let Node::Sorting(sorting) = node else {
                return Err(StructureError::unsupported_node(format!(
                    "{} node in a sorting lambda",
                    node.kind()
                )));
            };
            let expression = match resolve_member(schema, &sorting.member)? {
                ColumnRef::Id => id_column(),
                ColumnRef::Index(column) => {
                    // Enumerable members sort by their smallest/largest element.
                    let aggregate = match sorting.direction {
                        SortDirection::Asc => "min",
                        SortDirection::Desc => "max",
                    };
                    format!(
                        "(select {}({}) {})",
                        aggregate,
                        index_column(&column),
                        index_rows_of_structure(names)
                    )
                }
            };
            parts.push(format!("{} {}", expression, sorting.direction.sql()));
        }

        Ok(if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        })
    }

    fn includes(
        &self,
        includes: &[ParsedLambda],
        schema: &StructureSchema,
        names: &DbSchemaNames,
    ) -> Result<Vec<IncludeFragment>> {
        let mut fragments = Vec::new();
        for node in includes.iter().flat_map(|l| l.nodes()) {
            let Node::Include(include) = node else {
                return Err(StructureError::unsupported_node(format!(
                    "{} node in an include lambda",
                    node.kind()
                )));
            };

            let key = match resolve_member(schema, &include.member)? {
                ColumnRef::Id => id_column(),
                ColumnRef::Index(column) => format!(
                    "(select min({}) {})",
                    index_column(&column),
                    index_rows_of_structure(names)
                ),
            };

            let alias = format!("inc{}", fragments.len());
            let target = DbSchemaNames::for_name(&include.referenced_structure_name);
            fragments.push(IncludeFragment {
                column: format!(
                    "{alias}.{} as {}",
                    quote_identifier(JSON_COLUMN),
                    quote_identifier(&format!("{}Json", alias)),
                ),
                join: format!(
                    "left join {} {alias} on {alias}.{} = {}",
                    quote_identifier(&target.structures_table),
                    quote_identifier(STRUCTURE_ID_COLUMN),
                    key,
                ),
            });
        }
        Ok(fragments)
    }
}

/// Row counts travel as bigint parameters.
fn sql_count(count: usize, what: &str) -> Result<Value> {
    i64::try_from(count)
        .map(Value::Integer)
        .map_err(|_| StructureError::InvalidQuery(format!("{} of {} exceeds bigint", what, count)))
}

struct IncludeFragment {
    column: String,
    join: String,
}
