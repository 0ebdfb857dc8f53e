//! Numeric conversions shared by the matcher and the updater.
//!
//! - Fallible conversions (`Option<T>`) where an out-of-range value must reject the operand.
//! - Saturating conversions where clamping is the expected outcome (slice and position bounds).

use std::cmp::Ordering;

#[inline]
#[must_use]
pub fn i64_to_usize(v: i64) -> Option<usize> {
    usize::try_from(v).ok()
}

#[inline]
#[must_use]
pub fn usize_to_i64_saturating(v: usize) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[inline]
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn i64_to_f64(v: i64) -> f64 {
    v as f64
}

/// `Some` only for finite doubles with no fractional part that fit in an `i64`.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn f64_to_i64_exact(v: f64) -> Option<i64> {
    if !v.is_finite() || v.fract() != 0.0 {
        return None;
    }
    if v < i64::MIN as f64 || v >= i64::MAX as f64 {
        return None;
    }
    Some(v as i64)
}

/// Exact ordering of an integer against a double. NaN sorts above every integer.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn cmp_i64_f64(i: i64, f: f64) -> Ordering {
    // 2^63, exactly representable
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return Ordering::Less;
    }
    let whole = f.trunc();
    if whole >= BOUND {
        return Ordering::Less;
    }
    if whole < -BOUND {
        return Ordering::Greater;
    }
    i.cmp(&(whole as i64)).then_with(|| 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal))
}

/// Resolve a possibly negative offset against a length, clamped to `0..=len`.
#[inline]
#[must_use]
pub fn resolve_offset(offset: i64, len: usize) -> usize {
    if offset >= 0 {
        i64_to_usize(offset).map_or(len, |o| o.min(len))
    } else {
        len.saturating_sub(usize::try_from(offset.unsigned_abs()).unwrap_or(usize::MAX))
    }
}
