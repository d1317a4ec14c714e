//! Arithmetic on JSON numbers.
//!
//! Integer operands stay integers as long as the result fits in `i64`;
//! anything else is computed in `f64`. Results that are not finite are
//! rejected because JSON cannot represent them.

use serde_json::Number;

/// Compute `base + delta`.
pub fn add(base: &Number, delta: &Number) -> Option<Number> {
    if let (Some(a), Some(b)) = (base.as_i64(), delta.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Some(Number::from(sum));
        }
    }
    Number::from_f64(base.as_f64()? + delta.as_f64()?)
}

/// Compute `base - delta`.
pub fn sub(base: &Number, delta: &Number) -> Option<Number> {
    if let (Some(a), Some(b)) = (base.as_i64(), delta.as_i64()) {
        if let Some(diff) = a.checked_sub(b) {
            return Some(Number::from(diff));
        }
    }
    Number::from_f64(base.as_f64()? - delta.as_f64()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: serde_json::Value) -> Number {
        match v {
            serde_json::Value::Number(n) => n,
            other => panic!("not a number: {other}"),
        }
    }

    #[test]
    fn integers_stay_integers() {
        let r = add(&n(2.into()), &n(1.into())).unwrap();
        assert_eq!(r.as_i64(), Some(3));
        let r = sub(&n(2.into()), &n(5.into())).unwrap();
        assert_eq!(r.as_i64(), Some(-3));
    }

    #[test]
    fn mixed_operands_use_floats() {
        let r = add(&n(2.into()), &n(0.5.into())).unwrap();
        assert_eq!(r.as_f64(), Some(2.5));
        assert!(r.as_i64().is_none());
    }

    #[test]
    fn overflow_falls_back_to_float() {
        let r = add(&n(i64::MAX.into()), &n(1.into())).unwrap();
        assert!(r.as_i64().is_none());
        assert!(r.as_f64().unwrap() > 9.2e18);
    }

    #[test]
    fn non_finite_results_are_rejected() {
        let big = n(f64::MAX.into());
        assert!(add(&big, &big).is_none());
    }
}
