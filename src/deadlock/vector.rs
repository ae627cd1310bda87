//! Resource vector arithmetic shared by the safety engine and the
//! prevention simulator.
//!
//! All operations return fresh vectors. Lengths are never checked: a missing
//! element on the right counts as zero for `add`/`sub`, and makes `leq` false.
//! Arithmetic saturates at the `i64` bounds.

pub type ResourceVector = Vec<i64>;

pub fn add(a: &[i64], b: &[i64]) -> ResourceVector {
    a.iter()
        .enumerate()
        .map(|(i, v)| v.saturating_add(b.get(i).copied().unwrap_or(0)))
        .collect()
}

pub fn sub(a: &[i64], b: &[i64]) -> ResourceVector {
    a.iter()
        .enumerate()
        .map(|(i, v)| v.saturating_sub(b.get(i).copied().unwrap_or(0)))
        .collect()
}

/// Elementwise `a <= b`.
pub fn leq(a: &[i64], b: &[i64]) -> bool {
    a.iter()
        .enumerate()
        .all(|(i, v)| b.get(i).map_or(false, |w| v <= w))
}

pub fn format(v: &[i64]) -> String {
    v.iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sub() {
        assert_eq!(add(&[1, 2, 3], &[3, 2, 1]), vec![4, 4, 4]);
        assert_eq!(sub(&[7, 5, 3], &[0, 1, 0]), vec![7, 4, 3]);
    }

    #[test]
    fn test_leq() {
        assert!(leq(&[1, 2], &[1, 3]));
        assert!(!leq(&[2, 2], &[1, 3]));
        assert!(leq(&[], &[1]));
    }

    #[test]
    fn test_mismatched_lengths() {
        assert_eq!(add(&[1, 1, 1], &[1]), vec![2, 1, 1]);
        assert_eq!(sub(&[1], &[1, 5]), vec![0]);
        assert!(!leq(&[0, 0], &[5]));
    }

    #[test]
    fn test_saturates_at_bounds() {
        assert_eq!(add(&[i64::MAX, 1], &[1, 1]), vec![i64::MAX, 2]);
        assert_eq!(sub(&[i64::MIN], &[1]), vec![i64::MIN]);
    }

    #[test]
    fn test_negative_need_passes_comparison() {
        assert!(leq(&[-1, 0], &[0, 0]));
    }
}
