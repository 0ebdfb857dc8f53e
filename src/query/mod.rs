mod eval;
mod parse;
mod retrieve;
mod types;
mod visit;

pub use eval::check_condition;
pub use parse::{normalize_query_condition, parse_condition_json, parse_find_json};
pub use retrieve::{classify, classify_by_complex_find_operation, retrieve};
pub use types::{
    BsonType, Classified, Clause, CmpOp, ComplexFindOperation, FieldCondition, FindOperation,
    QueryCondition, SimpleFindOperation, UNSUPPORTED_OPERATORS, bson_type_of, is_query_condition,
};
pub use visit::{FindOperationVisitor, find_operation_to_value, visit_find_operation};
