//! Query expressions, the parsed-lambda node model, and its parsers.

mod expr;
mod include_parser;
mod nodes;
mod parsed_lambda;
mod sorting_parser;
mod where_parser;

pub use expr::{methods, BinaryOp, Expr, IncludeSelector, MemberExpr, SortSelector};
pub use include_parser::IncludeParser;
pub use nodes::{IncludeNode, MemberNode, Node, Operator, SortDirection, SortingNode};
pub use parsed_lambda::ParsedLambda;
pub use sorting_parser::SortingParser;
pub use where_parser::WhereParser;
