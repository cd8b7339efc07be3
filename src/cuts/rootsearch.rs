//! Scalar root search for the ESH line search.

/// Bisection root search on `[a, b]` for a scalar function with
/// `f(a) < 0 <= f(b)`.
///
/// Returns the final bracket `(interior, exterior)` where `f(interior) <= 0`
/// and `f(exterior) > 0`, or `None` when the endpoints do not bracket a sign
/// change. Stops when the bracket width drops below `tol` or after
/// `max_iter` halvings.
pub fn bisection<F>(f: F, a: f64, b: f64, max_iter: usize, tol: f64) -> Option<(f64, f64)>
where
    F: Fn(f64) -> f64,
{
    let mut lo = a;
    let mut hi = b;

    if f(lo) > 0.0 || f(hi) <= 0.0 {
        return None;
    }

    for _ in 0..max_iter {
        if hi - lo < tol {
            break;
        }

        let mid = 0.5 * (lo + hi);
        if f(mid) > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    Some((lo, hi))
}
