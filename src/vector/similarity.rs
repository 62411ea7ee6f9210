//! Similarity primitives used by the exact scan.
//!
//! Scores are dot products of vectors normalised by `‖v‖₂ + EPSILON`. The
//! epsilon keeps zero vectors finite: a zero vector scores `0.0` against
//! everything instead of producing NaN. Norms are computed on a rescaled
//! copy and components are normalised before multiplying, so very large but
//! finite vectors do not overflow.

/// Stabiliser added to every L2 norm before dividing.
pub const EPSILON: f64 = 1e-8;

/// Calculate the L2 norm (magnitude) of a vector.
///
/// Infinite only if the true norm exceeds `f64::MAX`.
pub fn l2_norm(v: &[f64]) -> f64 {
    let scale = v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    scale * v.iter().map(|x| (x / scale).powi(2)).sum::<f64>().sqrt()
}

/// Dot product of two equally sized slices.
///
/// Callers validate lengths; extra components of the longer slice are ignored.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Return `v / (‖v‖₂ + EPSILON)`.
pub fn normalize(v: &[f64]) -> Vec<f64> {
    let denom = l2_norm(v) + EPSILON;
    v.iter().map(|x| x / denom).collect()
}

/// Score of `query` against `target` given their precomputed L2 norms.
///
/// Equal to `dot(normalize(query), normalize(target))`.
pub fn normalized_dot(query: &[f64], query_norm: f64, target: &[f64], target_norm: f64) -> f64 {
    let query_scale = 1.0 / (query_norm + EPSILON);
    let target_scale = 1.0 / (target_norm + EPSILON);
    query
        .iter()
        .zip(target.iter())
        .map(|(x, y)| (x * query_scale) * (y * target_scale))
        .sum()
}

/// Check that every component and the L2 norm are finite.
pub fn is_finite(v: &[f64]) -> bool {
    v.iter().all(|x| x.is_finite()) && l2_norm(v).is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_norm() {
        assert_eq!(l2_norm(&[3.0, 4.0]), 5.0);
        assert_eq!(l2_norm(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_normalize_zero_vector_stays_zero() {
        let n = normalize(&[0.0, 0.0, 0.0]);
        assert!(n.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_normalize_unit_length() {
        let n = normalize(&[3.0, 4.0]);
        assert!((l2_norm(&n) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_dot_matches_definition() {
        let a = [1.0, 2.0, -0.5];
        let b = [0.3, -1.0, 2.0];
        let expected = dot(&normalize(&a), &normalize(&b));
        let actual = normalized_dot(&a, l2_norm(&a), &b, l2_norm(&b));
        assert!((expected - actual).abs() < 1e-12);
    }

    #[test]
    fn test_orthogonal_and_identical() {
        let x = [1.0, 0.0, 0.0];
        let y = [0.0, 1.0, 0.0];
        assert_eq!(normalized_dot(&x, 1.0, &y, 1.0), 0.0);
        assert!((normalized_dot(&x, 1.0, &x, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_is_finite() {
        assert!(is_finite(&[1.0, -2.0]));
        assert!(!is_finite(&[f64::NAN]));
        assert!(!is_finite(&[f64::INFINITY, 0.0]));
        assert!(!is_finite(&[f64::MAX, f64::MAX]));
    }

    #[test]
    fn test_large_vectors_do_not_overflow() {
        let big = [1e200, 1e200];
        let norm = l2_norm(&big);
        assert!(norm.is_finite());
        assert!((norm / 1e200 - 2.0_f64.sqrt()).abs() < 1e-12);

        let score = normalized_dot(&big, norm, &big, norm);
        assert!((score - 1.0).abs() < 1e-9);

        let unit = [1.0, 0.0];
        let score = normalized_dot(&big, norm, &unit, 1.0);
        assert!((score - 1.0 / 2.0_f64.sqrt()).abs() < 1e-6);
    }
}
