//! Small numeric helpers shared by the aggregator and the reporter.
//!
//! Everything here returns `None` where a statistic is undefined (empty input,
//! too few points) instead of falling back to zero.

/// Computes the arithmetic mean of a slice of values.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`n - 1` denominator). Needs at least two values.
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    Some(variance.sqrt())
}

/// Returns a sorted copy of `values`.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Quantile of already-sorted data using linear interpolation between the
/// closest ranks, `q` in `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted(values), q)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Least-squares line through `(x, y)` pairs, returned as `(slope, intercept)`.
///
/// Undefined for fewer than two points or when every `x` is the same.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let my = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = points.iter().map(|p| (p.0 - mx) * (p.1 - my)).sum();
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

/// Gaussian kernel bandwidth by Scott's rule: `std * n^(-1/5)`.
///
/// A constant sample has no spread, so a bandwidth proportional to its
/// magnitude is used to keep the estimate drawable.
pub fn scott_bandwidth(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let std = sample_stddev(values).unwrap_or(0.0);
    let bw = std * (values.len() as f64).powf(-0.2);
    if bw > 0.0 {
        Some(bw)
    } else {
        Some((m.abs() * 0.05).max(1.0))
    }
}

/// Gaussian kernel density estimate of `values`, evaluated at every point of
/// `grid`.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let bw = scott_bandwidth(values)?;
    let norm = 1.0 / ((values.len() as f64) * bw * (2.0 * std::f64::consts::PI).sqrt());
    Some(
        grid.iter()
            .map(|x| {
                values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / bw).powi(2)).exp())
                    .sum::<f64>()
                    * norm
            })
            .collect(),
    )
}

/// `steps` evenly spaced points from `lo` to `hi` inclusive.
pub fn linspace(lo: f64, hi: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (steps - 1) as f64;
            (0..steps).map(|i| lo + step * i as f64).collect()
        }
    }
}

/// Inverse of the standard normal CDF (Acklam's rational approximation,
/// relative error below 1.2e-9). Returns `None` outside `(0, 1)`.
pub fn normal_quantile(p: f64) -> Option<f64> {
    if !(p > 0.0 && p < 1.0) {
        return None;
    }

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    let x = if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    };
    Some(x)
}

/// Normal probability plot points: `(theoretical quantile, ordered value)`.
///
/// Plotting positions follow Filliben's order-statistic medians.
pub fn qq_points(values: &[f64]) -> Vec<(f64, f64)> {
    let ordered = sorted(values);
    let n = ordered.len();
    if n == 0 {
        return Vec::new();
    }
    let last = 0.5f64.powf(1.0 / n as f64);
    ordered
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let p = if n == 1 {
                0.5
            } else if i == 0 {
                1.0 - last
            } else if i == n - 1 {
                last
            } else {
                (i as f64 + 1.0 - 0.3175) / (n as f64 + 0.365)
            };
            normal_quantile(p).map(|q| (q, *v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_mean_and_stddev() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
        assert_eq!(sample_stddev(&[5.0]), None);
        let sd = sample_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(close(sd, 2.138089935));
    }

    #[test]
    fn test_quantiles_interpolate_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(median(&v), Some(2.5));
        assert_eq!(quantile(&v, 0.25), Some(1.75));
        assert_eq!(quantile(&v, 0.75), Some(3.25));
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[7.0, 1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn test_linear_fit() {
        let (slope, intercept) = linear_fit(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert!(close(slope, 2.0));
        assert!(close(intercept, 1.0));
        assert_eq!(linear_fit(&[(1.0, 1.0)]), None);
        assert_eq!(linear_fit(&[(1.0, 1.0), (1.0, 2.0)]), None);
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let values = [10.0, 12.0, 13.0, 15.0, 20.0];
        let grid = linspace(-40.0, 70.0, 2001);
        let density = gaussian_kde(&values, &grid).unwrap();
        let step = grid[1] - grid[0];
        let area: f64 = density.iter().sum::<f64>() * step;
        assert!((area - 1.0).abs() < 1e-3, "area = {area}");
        assert!(gaussian_kde(&[], &grid).is_none());
    }

    #[test]
    fn test_kde_constant_sample_is_finite() {
        let density = gaussian_kde(&[5.0, 5.0, 5.0], &[5.0]).unwrap();
        assert!(density[0].is_finite() && density[0] > 0.0);
    }

    #[test]
    fn test_normal_quantile() {
        assert!(close(normal_quantile(0.5).unwrap(), 0.0));
        assert!((normal_quantile(0.975).unwrap() - 1.959964).abs() < 1e-5);
        assert!((normal_quantile(0.01).unwrap() + 2.326348).abs() < 1e-5);
        assert_eq!(normal_quantile(0.0), None);
        assert_eq!(normal_quantile(1.0), None);
    }

    #[test]
    fn test_qq_points_are_ordered_and_symmetric() {
        let pts = qq_points(&[3.0, 1.0, 2.0]);
        assert_eq!(pts.iter().map(|p| p.1).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
        assert!(close(pts[0].0, -pts[2].0));
        assert!(close(pts[1].0, 0.0));
        assert!(qq_points(&[]).is_empty());
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
