mod apply;
mod arith;
mod merge;
mod normalize;
mod retarget;
mod sort;
mod types;
mod validate;
mod visit;

pub use apply::{MAX_ARRAY_PADDING, update, update_and_restore, update_prop, update_prop_and_restore, update_struct};
pub use merge::{merge_raw_update_operations, merge_update_operations};
pub use normalize::{normalize_update_operation, parse_update_json};
pub use retarget::{retarget_and_restore, retarget_operation};
pub use sort::sort_by_notation;
pub use types::{Operand, UpdateOperation, UpdateOperator, ValidationResult};
pub use validate::validate_update_operation;
pub use visit::{UpdateOperationVisitor, create_update_operation, reduce_update_operation, visit_update_operation};
