//! Applying update operations to documents.
//!
//! Every operator returns a new root. Only the containers on a written path are
//! copied; all other subtrees are shared with the input. An operator reads the
//! document as it was before the operator ran, computes the values to write for all
//! of its paths, and only then writes them, so a failing path leaves nothing behind.

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::{DocError, Result};
use crate::num::resolve_offset;
use crate::op_trace;
use crate::path::{Attribute, create_document_path, get_by_attributes, parse_document_path};
use crate::query::{ComplexFindOperation, classify_by_complex_find_operation};
use crate::value::{Constructor, Map, UNDEFINED, Value};

use super::arith;
use super::retarget::retarget_operation;
use super::sort::sort_by_notation;
use super::types::{Operand, UpdateOperation, UpdateOperator};

/// How far past the end of an array a write may land; the gap is filled with
/// undefined slots.
pub const MAX_ARRAY_PADDING: usize = 10_000;

/// Write `value` at `attrs`, copying the containers along the way.
///
/// Missing or scalar intermediates become empty objects. An array takes an index
/// (or a digit-only key) in place; any other key turns it into an object keyed by
/// position. When the slot already holds an equal value, `doc` itself is returned.
pub(crate) fn set_in(doc: &Value, attrs: &[Attribute], value: Value) -> Result<Value> {
    let Some((last, parents)) = attrs.split_last() else {
        return Ok(if *doc == value { doc.clone() } else { value });
    };
    let mut chain: Vec<Option<&Value>> = Vec::with_capacity(attrs.len());
    let mut cur = Some(doc).filter(|d| !d.is_primitive());
    chain.push(cur);
    for attr in parents {
        cur = cur.and_then(|c| c.child(attr)).filter(|c| !c.is_primitive());
        chain.push(cur);
    }
    let existing = cur.and_then(|c| c.child(last)).unwrap_or(&UNDEFINED);
    if *existing == value {
        return Ok(doc.clone());
    }
    chain
        .into_iter()
        .zip(attrs)
        .rev()
        .try_fold(value, |acc, (container, attr)| assign(container, attr, acc))
        .map_err(|index| DocError::IndexOutOfRange { path: create_document_path(attrs), index })
}

/// `Err` carries an array index too far past the end of its array.
fn assign(container: Option<&Value>, attr: &Attribute, value: Value) -> std::result::Result<Value, usize> {
    if let (Some(Value::Array(items)), Some(i)) = (container, attr.as_index()) {
        if i.saturating_sub(items.len()) > MAX_ARRAY_PADDING {
            return Err(i);
        }
        let mut items = items.to_vec();
        if i >= items.len() {
            items.resize(i + 1, Value::Undefined);
        }
        items[i] = value;
        return Ok(Value::array(items));
    }
    let mut map = match container {
        Some(Value::Array(items)) => items.iter().enumerate().map(|(i, v)| (i.to_string(), v.clone())).collect(),
        Some(c) => c.as_map().cloned().unwrap_or_default(),
        None => Map::new(),
    };
    map.insert(attr.to_string(), value);
    Ok(Value::object(map))
}

fn set_all(doc: &Value, writes: Vec<(Vec<Attribute>, Value)>) -> Result<Value> {
    writes.into_iter().try_fold(doc.clone(), |acc, (attrs, v)| set_in(&acc, &attrs, v))
}

/// Compute one write per path from the current value and the operand value, then
/// apply them all. `None` skips the path.
fn derive<F>(doc: &Value, operand: &Operand, mut f: F) -> Result<Value>
where
    F: FnMut(&str, &Value, &Value) -> Result<Option<Value>>,
{
    let mut writes = Vec::with_capacity(operand.len());
    for (path, arg) in operand {
        let attrs = parse_document_path(path)?;
        if let Some(v) = f(path, get_by_attributes(doc, &attrs), arg)? {
            writes.push((attrs, v));
        }
    }
    set_all(doc, writes)
}

fn array_at(operator: UpdateOperator, path: &str, current: &Value) -> Result<Vec<Value>> {
    match current {
        Value::Undefined | Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.to_vec()),
        _ => Err(DocError::NotAnArray { operator: operator.as_str().to_string(), path: path.to_string() }),
    }
}

fn each_of(operator: UpdateOperator, modifier: &Value) -> Result<&[Value]> {
    modifier
        .as_map()
        .and_then(|m| m.get("$each"))
        .and_then(Value::as_array)
        .ok_or_else(|| DocError::operand(operator.as_str(), "$each must be an array"))
}

fn set(doc: &Value, operand: &Operand) -> Result<Value> {
    derive(doc, operand, |_, _, v| Ok(Some(v.clone())))
}

fn numeric(doc: &Value, operator: UpdateOperator, operand: &Operand) -> Result<Value> {
    derive(doc, operand, |path, current, v| {
        let base = arith::current_number(operator, path, current)?;
        let combined = match operator {
            UpdateOperator::Mul => arith::mul(operator, &base, v)?,
            _ => arith::add(operator, &base, v)?,
        };
        Ok(Some(combined))
    })
}

fn bound(doc: &Value, operand: &Operand, replace_when: std::cmp::Ordering) -> Result<Value> {
    derive(doc, operand, |_, current, v| {
        let replace = current.is_nullish() || v.compare(current) == Some(replace_when);
        Ok(replace.then(|| v.clone()))
    })
}

fn add_to_set(doc: &Value, operand: &Operand) -> Result<Value> {
    let operator = UpdateOperator::AddToSet;
    derive(doc, operand, |path, current, modifier| {
        let mut items = array_at(operator, path, current)?;
        let fresh: Vec<Value> = each_of(operator, modifier)?.iter().filter(|v| !items.contains(*v)).cloned().collect();
        items.extend(fresh);
        Ok(Some(Value::array(items)))
    })
}

fn pop(doc: &Value, operand: &Operand) -> Result<Value> {
    let operator = UpdateOperator::Pop;
    derive(doc, operand, |path, current, v| {
        let mut items = array_at(operator, path, current)?;
        match v.as_i64() {
            Some(1) => {
                items.pop();
            }
            Some(-1) if !items.is_empty() => {
                items.remove(0);
            }
            Some(-1) => {}
            _ => return Err(DocError::operand(operator.as_str(), format!("expected 1 or -1, got {v}"))),
        }
        Ok(Some(Value::array(items)))
    })
}

fn pull(doc: &Value, operand: &Operand) -> Result<Value> {
    derive(doc, operand, |path, current, condition| {
        let items = array_at(UpdateOperator::Pull, path, current)?;
        let op = ComplexFindOperation::try_from(condition)?;
        let kept = classify_by_complex_find_operation(items, &op)?.unmatched;
        Ok(Some(Value::array(kept)))
    })
}

fn pull_all(doc: &Value, operand: &Operand) -> Result<Value> {
    let operator = UpdateOperator::PullAll;
    derive(doc, operand, |path, current, values| {
        let values = values.as_array().ok_or_else(|| DocError::operand(operator.as_str(), "expected an array"))?;
        let mut items = array_at(operator, path, current)?;
        items.retain(|item| !values.contains(item));
        Ok(Some(Value::array(items)))
    })
}

fn int_modifier(modifier: &Map, key: &str) -> Result<Option<i64>> {
    match modifier.get(key) {
        None | Some(Value::Undefined | Value::Null) => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| DocError::operand("$push", format!("{key} must be an integer"))),
    }
}

fn push(doc: &Value, operand: &Operand) -> Result<Value> {
    let operator = UpdateOperator::Push;
    derive(doc, operand, |path, current, modifier| {
        let mut items = array_at(operator, path, current)?;
        let each = each_of(operator, modifier)?;
        let modifier = modifier.as_map().ok_or_else(|| DocError::operand(operator.as_str(), "expected a modifier"))?;
        let at = int_modifier(modifier, "$position")?.map_or(items.len(), |p| resolve_offset(p, items.len()));
        let tail = items.split_off(at);
        items.extend(each.iter().cloned());
        items.extend(tail);
        if let Some(notation) = modifier.get("$sort").filter(|n| !n.is_nullish()) {
            items = sort_by_notation(&items, notation)?;
        }
        if let Some(n) = int_modifier(modifier, "$slice")? {
            let cut = resolve_offset(n, items.len());
            if n >= 0 {
                items.truncate(cut);
            } else {
                items.drain(..cut);
            }
        }
        Ok(Some(Value::array(items)))
    })
}

fn current_date(doc: &Value, operand: &Operand) -> Result<Value> {
    let now = Utc::now();
    derive(doc, operand, |_, _, arg| {
        let kind = match arg {
            Value::Bool(true) => "date",
            other => other.as_map().and_then(|m| m.get("$type")).and_then(Value::as_str).unwrap_or(""),
        };
        match kind {
            "date" => Ok(Some(Value::Date(now))),
            "timestamp" => Ok(Some(Value::Int(now.timestamp_millis()))),
            _ => Err(DocError::operand("$currentDate", format!("expected true or {{$type: \"date\" | \"timestamp\"}}, got {arg}"))),
        }
    })
}

fn bit(doc: &Value, operand: &Operand) -> Result<Value> {
    let operator = UpdateOperator::Bit;
    let integer = |v: &Value, what: &str| {
        v.as_i64().ok_or_else(|| DocError::operand(operator.as_str(), format!("{what} must be an integer, got {v}")))
    };
    derive(doc, operand, |path, current, arg| {
        let base = integer(&arith::current_number(operator, path, current)?, path)?;
        let arg = arg.as_map().ok_or_else(|| DocError::operand(operator.as_str(), "expected {and | or | xor: n}"))?;
        let applied = if let Some(v) = arg.get("and") {
            base & integer(v, "and")?
        } else if let Some(v) = arg.get("or") {
            base | integer(v, "or")?
        } else if let Some(v) = arg.get("xor") {
            base ^ integer(v, "xor")?
        } else {
            return Ok(None);
        };
        Ok(Some(Value::Int(applied)))
    })
}

/// Replace the container holding `attrs`' last attribute with `rebuild`'s result.
/// `rebuild` returning `None` leaves the document as is.
fn with_container<F>(doc: Value, attrs: &[Attribute], rebuild: F) -> Result<Value>
where
    F: FnOnce(&Value, &Attribute) -> Result<Option<Value>>,
{
    let Some((last, parents)) = attrs.split_last() else {
        return Ok(doc);
    };
    let container = get_by_attributes(&doc, parents);
    match rebuild(container, last)? {
        None => Ok(doc),
        Some(copy) if parents.is_empty() => Ok(copy),
        Some(copy) => set_in(&doc, parents, copy),
    }
}

fn unset(doc: &Value, operand: &Operand) -> Result<Value> {
    operand.keys().try_fold(doc.clone(), |acc, path| {
        let attrs = parse_document_path(path)?;
        with_container(acc, &attrs, |container, last| {
            Ok(match container {
                Value::Array(items) => last.as_index().filter(|i| *i < items.len()).map(|i| {
                    let mut items = items.to_vec();
                    items[i] = Value::Undefined;
                    Value::array(items)
                }),
                Value::Object(_) | Value::Instance(_) => container.as_map().and_then(|m| {
                    let key = last.to_string();
                    m.contains_key(&key).then(|| {
                        let mut m = m.clone();
                        m.shift_remove(&key);
                        Value::object(m)
                    })
                }),
                _ => None,
            })
        })
    })
}

fn rename(doc: &Value, operand: &Operand) -> Result<Value> {
    operand.iter().try_fold(doc.clone(), |acc, (path, new_name)| {
        let new_name = new_name
            .as_str()
            .ok_or_else(|| DocError::operand("$rename", format!("new name for '{path}' must be a string")))?;
        let attrs = parse_document_path(path)?;
        with_container(acc, &attrs, |container, last| match container {
            Value::Array(_) => Err(DocError::InvalidRename(path.clone())),
            Value::Object(_) | Value::Instance(_) => Ok(container.as_map().and_then(|m| {
                let key = last.to_string();
                let moved = m.get(&key)?.clone();
                let mut m = m.clone();
                m.shift_remove(&key);
                m.insert(new_name.to_string(), moved);
                Some(Value::object(m))
            })),
            _ => Ok(None),
        })
    })
}

fn append(doc: &Value, operand: &Operand) -> Result<Value> {
    derive(doc, operand, |path, current, v| match current {
        Value::Array(_) => Err(DocError::InvalidAppend(path.to_string())),
        c if c.is_primitive() => Ok(Some(v.clone())),
        c => {
            let extra = v
                .as_map()
                .ok_or_else(|| DocError::operand("$append", format!("value for '{path}' must be an object")))?;
            let mut merged = c.as_map().cloned().unwrap_or_default();
            merged.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
            Ok(Some(Value::object(merged)))
        }
    })
}

fn original_constructor(original: &Value, attrs: &[Attribute]) -> Option<Constructor> {
    match get_by_attributes(original, attrs) {
        Value::Instance(inst) => Some(inst.constructor().clone()),
        _ => None,
    }
}

fn restore(original: &Value, doc: &Value, operand: &Operand) -> Result<Value> {
    let mut writes = Vec::with_capacity(operand.len());
    for (path, arg) in operand {
        let attrs = parse_document_path(path)?;
        let current = get_by_attributes(doc, &attrs);
        if current.is_primitive() {
            continue;
        }
        let constructor = match arg {
            Value::Constructor(c) => Some(c.clone()),
            _ => original_constructor(original, &attrs),
        };
        if let Some(constructor) = constructor {
            writes.push((attrs, constructor.construct(current.clone())?));
        }
    }
    set_all(doc, writes)
}

fn apply_operator(doc: &Value, operator: UpdateOperator, operand: &Operand) -> Result<Value> {
    match operator {
        UpdateOperator::Set => set(doc, operand),
        UpdateOperator::Inc | UpdateOperator::Mul => numeric(doc, operator, operand),
        UpdateOperator::Min => bound(doc, operand, std::cmp::Ordering::Less),
        UpdateOperator::Max => bound(doc, operand, std::cmp::Ordering::Greater),
        UpdateOperator::AddToSet => add_to_set(doc, operand),
        UpdateOperator::Pop => pop(doc, operand),
        UpdateOperator::Pull => pull(doc, operand),
        UpdateOperator::PullAll => pull_all(doc, operand),
        UpdateOperator::Push => push(doc, operand),
        UpdateOperator::CurrentDate => current_date(doc, operand),
        UpdateOperator::Bit => bit(doc, operand),
        UpdateOperator::Unset => unset(doc, operand),
        UpdateOperator::Rename => rename(doc, operand),
        UpdateOperator::Append => append(doc, operand),
        UpdateOperator::Restore => Ok(doc.clone()),
    }
}

fn trace_operator(operator: UpdateOperator, operand: &Operand) {
    let paths: Vec<&str> = operand.keys().map(String::as_str).collect();
    op_trace!("{operator} {}", paths.join(","));
}

fn apply_operation(doc: &Value, operation: &UpdateOperation) -> Result<Value> {
    let mut updated = doc.clone();
    for (operator, operand) in operation.iter() {
        if operator == UpdateOperator::Restore {
            continue;
        }
        trace_operator(operator, operand);
        updated = apply_operator(&updated, operator, operand)?;
    }
    if let Some(operand) = operation.get(UpdateOperator::Restore) {
        trace_operator(UpdateOperator::Restore, operand);
        updated = restore(doc, &updated, operand)?;
    }
    Ok(updated)
}

/// Apply `operations` one after another. `$restore` runs last within each
/// operation, against the document as it was before that operation.
///
/// # Errors
/// The first operator failure aborts the call: `MalformedPath`, `NotAnArray`,
/// `InvalidRename`, `InvalidAppend`, `IndexOutOfRange`, `InvalidOperand`, `Restore`, or a query error
/// from a `$pull` condition.
pub fn update(doc: &Value, operations: &[UpdateOperation]) -> Result<Value> {
    operations.iter().try_fold(doc.clone(), |acc, operation| apply_operation(&acc, operation))
}

/// Apply an operation written for the value at `path`.
///
/// # Errors
/// As [`update`].
pub fn update_prop(doc: &Value, path: &str, operation: &UpdateOperation) -> Result<Value> {
    update(doc, &[retarget_operation(path, operation)])
}

fn restore_root(original: &Value, updated: Value) -> Result<Value> {
    match original {
        Value::Instance(inst) => inst.constructor().construct(updated),
        _ => Ok(updated),
    }
}

/// [`update`], then rebuild the root with the constructor of `doc`.
///
/// # Errors
/// As [`update`], or `Restore` when the constructor rejects the result.
pub fn update_and_restore(doc: &Value, operation: &UpdateOperation) -> Result<Value> {
    let updated = update(doc, std::slice::from_ref(operation))?;
    restore_root(doc, updated)
}

/// [`update_prop`], then rebuild the root with the constructor of `doc`.
///
/// # Errors
/// As [`update_and_restore`].
pub fn update_prop_and_restore(doc: &Value, path: &str, operation: &UpdateOperation) -> Result<Value> {
    let updated = update_prop(doc, path, operation)?;
    restore_root(doc, updated)
}

/// Update a serde value by round-tripping it through [`Value`].
///
/// # Errors
/// As [`update`], or `Json` when the result no longer deserializes into `T`.
pub fn update_struct<T>(value: &T, operations: &[UpdateOperation]) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let plain = Value::from(serde_json::to_value(value)?);
    let updated = update(&plain, operations)?;
    Ok(serde_json::from_value(serde_json::Value::from(&updated))?)
}
