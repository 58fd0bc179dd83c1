//! Distribution functions used by the ANOVA table.
//!
//! - Log gamma (Lanczos approximation)
//! - Regularized incomplete beta function (continued fraction)
//! - F-distribution upper tail probability
//! - Student t CDF and two-sided critical values

use std::f64::consts::PI;

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function.
///
/// Uses the reflection formula below 0.5. Returns infinity at the poles
/// (zero and negative integers).
#[must_use]
pub fn ln_gamma(x: f64) -> f64 {
    if x <= 0.0 && x.fract() == 0.0 {
        return f64::INFINITY;
    }
    if x < 0.5 {
        // Γ(x)Γ(1−x) = π / sin(πx)
        return (PI / (PI * x).sin()).abs().ln() - ln_gamma(1.0 - x);
    }

    let z = x - 1.0;
    let series = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS[0], |acc, (i, &c)| acc + c / (z + i as f64));
    let t = z + LANCZOS_G + 0.5;

    0.5 * (2.0 * PI).ln() + (z + 0.5) * t.ln() - t + series.ln()
}

/// Regularized incomplete beta function I_x(a, b).
///
/// Evaluated with the modified Lentz continued fraction, switching to
/// 1 − I_{1−x}(b, a) where that converges faster.
#[must_use]
pub fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(1.0 - x, b, a);
    }

    let ln_front = a * x.ln() + b * (1.0 - x).ln() - ln_beta(a, b);
    ln_front.exp() * beta_continued_fraction(x, a, b) / a
}

fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const TINY: f64 = 1e-300;
    const EPS: f64 = 1e-14;
    const MAX_ITER: usize = 1000;

    let clamp = |v: f64| if v.abs() < TINY { TINY } else { v };

    let mut c = 1.0;
    let mut d = 1.0 / clamp(1.0 - (a + b) * x / (a + 1.0));
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let even = m * (b - m) * x / ((a + m2 - 1.0) * (a + m2));
        d = 1.0 / clamp(1.0 + even * d);
        c = clamp(1.0 + even / c);
        h *= d * c;

        let odd = -(a + m) * (a + b + m) * x / ((a + m2) * (a + m2 + 1.0));
        d = 1.0 / clamp(1.0 + odd * d);
        c = clamp(1.0 + odd / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Upper-tail probability P(F > f) for an F(df1, df2) distribution.
///
/// Returns 1.0 for non-positive `f` or zero degrees of freedom.
#[must_use]
pub fn f_distribution_p_value(f: f64, df1: usize, df2: usize) -> f64 {
    if f <= 0.0 || df1 == 0 || df2 == 0 || f.is_nan() {
        return 1.0;
    }
    if f.is_infinite() {
        return 0.0;
    }
    let (d1, d2) = (df1 as f64, df2 as f64);
    regularized_incomplete_beta(d2 / (d2 + d1 * f), d2 / 2.0, d1 / 2.0)
}

/// Cumulative distribution function of Student's t with `df` degrees of freedom.
#[must_use]
pub fn student_t_cdf(t: f64, df: usize) -> f64 {
    if df == 0 || t.is_nan() {
        return f64::NAN;
    }
    let v = df as f64;
    let tail = 0.5 * regularized_incomplete_beta(v / (v + t * t), v / 2.0, 0.5);
    if t >= 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Two-sided critical value t such that P(−t < T < t) = `confidence`.
///
/// Returns NaN for a confidence outside (0, 1) and infinity for `df == 0`.
#[must_use]
pub fn t_value(confidence: f64, df: usize) -> f64 {
    if !(confidence > 0.0 && confidence < 1.0) {
        return f64::NAN;
    }
    if df == 0 {
        return f64::INFINITY;
    }

    let target = 0.5 + confidence / 2.0;
    let mut hi = 1.0;
    while student_t_cdf(hi, df) < target {
        hi *= 2.0;
        if hi > 1e12 {
            return f64::INFINITY;
        }
    }

    let mut lo = 0.0;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if student_t_cdf(mid, df) < target {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-12 * hi.max(1.0) {
            break;
        }
    }
    0.5 * (lo + hi)
}
