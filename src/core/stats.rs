//! Small-sample statistics used to score candidate partitions.
//!
//! Conventions follow the usual scientific-Python defaults so scores are
//! comparable with spreadsheets people already have:
//! - standard deviation is the sample estimate (n - 1 denominator),
//! - ranks are 1-based and ties share their average rank,
//! - the rank-sum test uses the large-sample normal approximation with no
//!   tie or continuity correction, two-sided.

use std::cmp::Ordering;

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation. NaN when fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Total order with every NaN placed after all numbers.
pub fn cmp_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// 1-based ranks; tied values (NaNs included) share the mean of their ranks.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| cmp_nan_last(values[a], values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len()
            && cmp_nan_last(values[order[end + 1]], values[order[start]]) == Ordering::Equal
        {
            end += 1;
        }
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            ranks[idx] = rank;
        }
        start = end + 1;
    }
    ranks
}

/// Complementary error function (Chebyshev fit, relative error below 1.2e-7).
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 { ans } else { 2.0 - ans }
}

/// Standard normal CDF.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankSum {
    pub statistic: f64,
    pub p_value: f64,
}

/// Two-sample Wilcoxon rank-sum test of `x` against `y`.
///
/// The statistic is the z-score of the rank sum of `x` in the pooled sample.
/// Either sample being empty yields NaN for both fields.
pub fn rank_sum(x: &[f64], y: &[f64]) -> RankSum {
    let n1 = x.len();
    let n2 = y.len();
    if n1 == 0 || n2 == 0 {
        return RankSum {
            statistic: f64::NAN,
            p_value: f64::NAN,
        };
    }

    let pooled: Vec<f64> = x.iter().chain(y.iter()).copied().collect();
    let ranks = average_ranks(&pooled);
    let s: f64 = ranks[..n1].iter().sum();

    let (n1, n2) = (n1 as f64, n2 as f64);
    let expected = n1 * (n1 + n2 + 1.0) / 2.0;
    let z = (s - expected) / (n1 * n2 * (n1 + n2 + 1.0) / 12.0).sqrt();
    let p_value = (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0);
    RankSum {
        statistic: z,
        p_value,
    }
}

/// Linear-interpolated percentile of already sorted values, `q` in [0, 1].
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
            let lo = h.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}

/// Five-number summary drawn as a box plot (Tukey whiskers at 1.5 IQR).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_lo: f64,
    pub whisker_hi: f64,
}

impl BoxSummary {
    /// NaNs are ignored. `None` when nothing finite remains.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| cmp_nan_last(*a, *b));

        let q1 = percentile_sorted(&sorted, 0.25);
        let median = percentile_sorted(&sorted, 0.5);
        let q3 = percentile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;
        let whisker_lo = sorted
            .iter()
            .copied()
            .find(|&v| v >= lo_fence)
            .unwrap_or(q1)
            .min(q1);
        let whisker_hi = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= hi_fence)
            .unwrap_or(q3)
            .max(q3);
        Some(Self {
            q1,
            median,
            q3,
            whisker_lo,
            whisker_hi,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sample_std_uses_n_minus_one() {
        assert_abs_diff_eq!(sample_std(&[1.0, 2.0, 3.0, 4.0]), 1.290_994_448_7, epsilon = 1e-9);
        assert_abs_diff_eq!(sample_std(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn sample_std_of_single_value_is_nan() {
        assert!(sample_std(&[3.0]).is_nan());
        assert!(sample_std(&[]).is_nan());
    }

    #[test]
    fn average_ranks_share_ties() {
        assert_eq!(average_ranks(&[10.0, 20.0, 20.0, 30.0]), vec![1.0, 2.5, 2.5, 4.0]);
        assert_eq!(average_ranks(&[3.0, 1.0, 2.0]), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn average_ranks_put_nan_last() {
        let ranks = average_ranks(&[f64::NAN, 2.0, -f64::NAN, 1.0]);
        assert_eq!(ranks, vec![3.5, 2.0, 3.5, 1.0]);
    }

    #[test]
    fn normal_cdf_known_points() {
        assert_abs_diff_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-7);
        assert_abs_diff_eq!(normal_cdf(1.959_963_985), 0.975, epsilon = 1e-7);
        assert_abs_diff_eq!(normal_cdf(-1.0), 0.158_655_253_9, epsilon = 1e-7);
    }

    #[test]
    fn rank_sum_separated_samples() {
        let r = rank_sum(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_abs_diff_eq!(r.statistic, -1.963_961_012_1, epsilon = 1e-9);
        assert_abs_diff_eq!(r.p_value, 0.049_534_613_4, epsilon = 1e-6);
    }

    #[test]
    fn rank_sum_is_symmetric_in_p() {
        let a = [1.0, 4.0, 9.0, 2.0];
        let b = [3.0, 8.0, 5.0];
        let ab = rank_sum(&a, &b);
        let ba = rank_sum(&b, &a);
        assert_abs_diff_eq!(ab.p_value, ba.p_value, epsilon = 1e-12);
        assert_abs_diff_eq!(ab.statistic, -ba.statistic, epsilon = 1e-12);
    }

    #[test]
    fn rank_sum_identical_samples_is_one() {
        let r = rank_sum(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(r.statistic, 0.0);
        assert_abs_diff_eq!(r.p_value, 1.0, epsilon = 1e-7);
    }

    #[test]
    fn rank_sum_singletons() {
        let r = rank_sum(&[1.0], &[2.0]);
        assert_abs_diff_eq!(r.statistic, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.p_value, 0.317_310_507_9, epsilon = 1e-6);
    }

    #[test]
    fn rank_sum_empty_is_nan() {
        assert!(rank_sum(&[], &[1.0]).p_value.is_nan());
    }

    #[test]
    fn percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(percentile_sorted(&v, 0.25), 1.75);
        assert_abs_diff_eq!(percentile_sorted(&v, 0.5), 2.5);
        assert_abs_diff_eq!(percentile_sorted(&v, 0.75), 3.25);
        assert_abs_diff_eq!(percentile_sorted(&[7.0], 0.3), 7.0);
    }

    #[test]
    fn box_summary_clips_whiskers() {
        let b = BoxSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_abs_diff_eq!(b.q1, 2.0);
        assert_abs_diff_eq!(b.median, 3.0);
        assert_abs_diff_eq!(b.q3, 4.0);
        assert_abs_diff_eq!(b.whisker_lo, 1.0);
        assert_abs_diff_eq!(b.whisker_hi, 4.0);
        assert!(BoxSummary::from_values(&[f64::NAN]).is_none());
    }
}
