use crate::value::Value;

use super::types::{Operand, UpdateOperation, UpdateOperator};

/// Hooks for rewriting an update operation's operands.
///
/// For each present operator, `operation` runs first, then the operator's own hook.
/// Every hook defaults to the identity.
#[allow(unused_variables)]
pub trait UpdateOperationVisitor {
    fn operation(&mut self, operator: UpdateOperator, operand: Operand) -> Operand {
        operand
    }

    fn set(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn inc(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn min(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn max(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn mul(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn add_to_set(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn pop(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn pull(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn pull_all(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn push(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn current_date(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn bit(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn unset(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn restore(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn rename(&mut self, operand: Operand) -> Operand {
        operand
    }
    fn append(&mut self, operand: Operand) -> Operand {
        operand
    }
}

fn visit_operator<V: UpdateOperationVisitor + ?Sized>(
    visitor: &mut V,
    operator: UpdateOperator,
    operand: Operand,
) -> Operand {
    let operand = visitor.operation(operator, operand);
    match operator {
        UpdateOperator::Set => visitor.set(operand),
        UpdateOperator::Inc => visitor.inc(operand),
        UpdateOperator::Min => visitor.min(operand),
        UpdateOperator::Max => visitor.max(operand),
        UpdateOperator::Mul => visitor.mul(operand),
        UpdateOperator::AddToSet => visitor.add_to_set(operand),
        UpdateOperator::Pop => visitor.pop(operand),
        UpdateOperator::Pull => visitor.pull(operand),
        UpdateOperator::PullAll => visitor.pull_all(operand),
        UpdateOperator::Push => visitor.push(operand),
        UpdateOperator::CurrentDate => visitor.current_date(operand),
        UpdateOperator::Bit => visitor.bit(operand),
        UpdateOperator::Unset => visitor.unset(operand),
        UpdateOperator::Restore => visitor.restore(operand),
        UpdateOperator::Rename => visitor.rename(operand),
        UpdateOperator::Append => visitor.append(operand),
    }
}

/// Rebuild `operation` with the visitor applied to each present operator, walking
/// operators in [`UpdateOperator::ALL`] order. Operator positions are kept.
pub fn visit_update_operation<V: UpdateOperationVisitor + ?Sized>(
    operation: &UpdateOperation,
    visitor: &mut V,
) -> UpdateOperation {
    let mut visited = operation.clone();
    for operator in UpdateOperator::ALL {
        if let Some(slot) = visited.operators.get_mut(&operator) {
            *slot = visit_operator(visitor, operator, std::mem::take(slot));
        }
    }
    visited
}

/// Fold over the operators of `operation` in their order.
pub fn reduce_update_operation<T, F>(operation: &UpdateOperation, mut f: F, init: T) -> T
where
    F: FnMut(T, UpdateOperator, &Operand) -> T,
{
    operation.iter().fold(init, |acc, (operator, operand)| f(acc, operator, operand))
}

/// One-operator operation from `(path, value)` pairs.
#[must_use]
pub fn create_update_operation<I, P>(operator: UpdateOperator, pairs: I) -> UpdateOperation
where
    I: IntoIterator<Item = (P, Value)>,
    P: Into<String>,
{
    let mut operation = UpdateOperation::new();
    for (path, value) in pairs {
        operation.insert(operator, path, value);
    }
    operation
}
