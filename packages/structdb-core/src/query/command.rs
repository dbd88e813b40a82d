//! Query command model and its builder.

use crate::error::{Result, StructureError};
use crate::lambdas::{
    Expr, IncludeParser, IncludeSelector, ParsedLambda, SortSelector, SortingParser, WhereParser,
};

/// Zero-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page_index: usize,
    pub page_size: usize,
}

impl Paging {
    /// Number of structures before the page; fails when it overflows.
    pub fn skip(&self) -> Result<usize> {
        self.page_index.checked_mul(self.page_size).ok_or_else(|| {
            StructureError::InvalidQuery(format!(
                "Page {} of size {} is out of range",
                self.page_index, self.page_size
            ))
        })
    }
}

/// Parsed parts of one query against a structure type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryCommand {
    pub where_lambda: Option<ParsedLambda>,
    pub sortings: Option<ParsedLambda>,
    pub includes: Vec<ParsedLambda>,
    /// Maximum number of structures; ignored when `paging` is set
    pub take: Option<usize>,
    pub paging: Option<Paging>,
}

impl QueryCommand {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    pub fn has_where(&self) -> bool {
        self.where_lambda.as_ref().is_some_and(|l| !l.is_empty())
    }

    pub fn has_sortings(&self) -> bool {
        self.sortings.as_ref().is_some_and(|l| !l.is_empty())
    }
}

/// Builds a `QueryCommand`, parsing expressions as they are added.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    command: QueryCommand,
}

impl QueryBuilder {
    /// Adds a predicate; several predicates are conjoined.
    pub fn where_(mut self, predicate: &Expr) -> Result<Self> {
        let parsed = WhereParser::new().parse(predicate)?;
        self.command.where_lambda = Some(match self.command.where_lambda.take() {
            Some(existing) => existing.merge_as_new(&parsed),
            None => parsed,
        });
        Ok(self)
    }

    /// Appends sort keys after any already present.
    pub fn order_by(mut self, selectors: &[SortSelector]) -> Result<Self> {
        let parsed = SortingParser::new().parse(selectors)?;
        self.command.sortings = Some(match self.command.sortings.take() {
            Some(existing) => existing.merge_as_new(&parsed),
            None => parsed,
        });
        Ok(self)
    }

    pub fn include(mut self, selectors: &[IncludeSelector]) -> Result<Self> {
        let parsed = IncludeParser::new().parse(selectors)?;
        self.command.includes.push(parsed);
        Ok(self)
    }

    pub fn take(mut self, count: usize) -> Self {
        self.command.take = Some(count);
        self
    }

    pub fn page(mut self, page_index: usize, page_size: usize) -> Self {
        self.command.paging = Some(Paging {
            page_index,
            page_size,
        });
        self
    }

    pub fn build(self) -> QueryCommand {
        self.command
    }
}
