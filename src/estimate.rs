//! Cardinality estimation algorithms over a dense register array.
//!
//! Two independent estimators are provided: an empirically bias-corrected
//! harmonic-mean estimator (the correction data lives in [`crate::bias`]) and
//! a maximum-likelihood estimator that needs no empirical tables. Both are
//! read-only over the registers.

use std::f64::consts::LN_2;

use crate::bias;

/// Secant iterations are cut off here; convergence normally takes well under
/// ten steps.
const MAX_ITERATIONS: usize = 64;
/// Relative tolerance of the maximum-likelihood solver, scaled by `1 / sqrt(m)`
/// so the numerical error stays well below the estimator's statistical error.
const RELATIVE_TOLERANCE: f64 = 1e-2;

/// Standard bias constant `alpha_m` of the harmonic-mean estimator.
pub(crate) fn alpha(buckets: usize) -> f64 {
    match buckets {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / buckets as f64),
    }
}

/// Linear counting: estimate from the fraction of still-empty buckets.
pub(crate) fn linear_counting(buckets: f64, zeros: f64) -> f64 {
    buckets * (buckets / zeros).ln()
}

/// Raw harmonic-mean estimate `alpha_m * m^2 / sum(2^-register)`.
pub(crate) fn raw_estimate(registers: &[u8]) -> f64 {
    let mut inverse_sum = 0.0;
    for &register in registers {
        inverse_sum += (-f64::from(register)).exp2();
    }
    let buckets = registers.len() as f64;
    alpha(registers.len()) * buckets * buckets / inverse_sum
}

/// Bias-corrected estimate: linear counting while enough buckets are still
/// empty, otherwise the raw estimate minus the interpolated empirical bias
/// for raw estimates up to `5 * m`.
pub(crate) fn bias_corrected(registers: &[u8], precision: u8) -> f64 {
    let buckets = registers.len();
    let zeros = registers.iter().filter(|&&r| r == 0).count();
    if zeros != 0 {
        let linear = linear_counting(buckets as f64, zeros as f64);
        if linear <= bias::LINEAR_COUNTING_THRESHOLD[usize::from(precision - 4)] {
            return linear;
        }
    }

    let mut raw = raw_estimate(registers);
    if raw <= 5.0 * buckets as f64 {
        raw -= bias::estimate_bias(raw, precision);
    }
    raw
}

/// Maximum-likelihood estimate from a register histogram.
///
/// Under the Poisson model a register is at most `k` with probability
/// `exp(-n / (m * 2^k))`, so the log-likelihood of the observed histogram is a
/// smooth unimodal function of the per-bucket load `phi = n / m`. The solver
/// finds the root of its derivative with a secant iteration, starting from a
/// cheap lower bound on `phi`.
pub(crate) fn maximum_likelihood(histogram: &[u32], buckets: usize) -> f64 {
    let top = histogram.len() - 1;
    let buckets_f = buckets as f64;

    if histogram[0] as usize == buckets {
        return 0.0;
    }
    // every register sharing one value below the cap has a closed-form
    // stationary point at phi = 2^k * ln(2)
    if let Some(k) = (1..top).find(|&k| histogram[k] as usize == buckets) {
        return buckets_f * (k as f64).exp2() * LN_2;
    }
    // a fully saturated array carries no finite maximum
    if histogram[top] as usize == buckets {
        return f64::INFINITY;
    }

    let mut phi = initial_load(histogram, buckets_f);
    let mut derivative_prev = log_likelihood_derivative(histogram, phi);
    if derivative_prev <= 0.0 {
        return buckets_f * phi;
    }

    let tolerance = RELATIVE_TOLERANCE / buckets_f.sqrt();
    let mut phi_prev = phi;
    phi *= 1.5;
    for _ in 0..MAX_ITERATIONS {
        let derivative = log_likelihood_derivative(histogram, phi);
        let denominator = derivative - derivative_prev;
        if denominator == 0.0 {
            break;
        }
        let mut next = phi - derivative * (phi - phi_prev) / denominator;
        if next <= 0.0 {
            next = 0.5 * phi;
        }
        phi_prev = phi;
        derivative_prev = derivative;
        let step = (next - phi).abs();
        phi = next;
        if step <= phi * tolerance {
            break;
        }
    }
    buckets_f * phi
}

/// Lower bound on the per-bucket load used to seed the secant iteration.
fn initial_load(histogram: &[u32], buckets: f64) -> f64 {
    let top = histogram.len() - 1;
    // Horner evaluation of sum(histogram[k] * 2^-k) for k in [1, top - 1]
    let mut mass = 0.0;
    for k in (1..top).rev() {
        mass = 0.5 * mass + f64::from(histogram[k]);
    }
    mass *= 0.5;

    let tail = mass + f64::from(histogram[top]) * (-((top - 1) as f64)).exp2();
    let weight = mass + f64::from(histogram[0]);
    let live = buckets - f64::from(histogram[0]);
    if tail <= 1.5 * weight {
        live / (0.5 * tail + weight)
    } else {
        live / tail * (tail / weight).ln_1p()
    }
}

/// Derivative of the register histogram's log-likelihood with respect to the
/// per-bucket load.
fn log_likelihood_derivative(histogram: &[u32], phi: f64) -> f64 {
    let top = histogram.len() - 1;
    let mut derivative = -f64::from(histogram[0]);
    for k in 1..top {
        if histogram[k] == 0 {
            continue;
        }
        let scale = (-(k as f64)).exp2();
        let filled = -(-phi * scale).exp_m1();
        derivative += f64::from(histogram[k]) * scale * (1.0 - 2.0 * filled) / filled;
    }
    if histogram[top] != 0 {
        let scale = (-((top - 1) as f64)).exp2();
        let filled = -(-phi * scale).exp_m1();
        derivative += f64::from(histogram[top]) * scale * (1.0 - filled) / filled;
    }
    derivative
}
