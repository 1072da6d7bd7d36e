//! Statistical diagnostics for integer sequences.
//!
//! Three checks are provided: a Cesàro estimate of π from the coprimality of
//! consecutive pairs, a chi-square bit-balance test, and a Wald–Wolfowitz runs
//! test over the raw bit stream.  Each returns a serializable report.

use std::f64::consts::PI;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::{LabError, Result};

/// Critical chi-square value for one degree of freedom at 5 % significance.
pub const CHI_SQUARE_CRITICAL: f64 = 3.841;

/// Critical |z| value for a two-sided test at 5 % significance.
pub const Z_CRITICAL: f64 = 1.96;

/// Pairs between successive intermediate π estimates.
pub const CESARO_CHECKPOINT: usize = 100;

/// Largest integer drawn by the system-entropy Cesàro routine.
pub const SYSTEM_MAX: u64 = (1 << 31) - 1;

/// Greatest common divisor by Euclid's algorithm; `gcd(0, x) = x`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Result of a Cesàro π estimation.
#[derive(Debug, Clone, Serialize)]
pub struct CesaroReport {
    /// Number of pairs drawn.
    pub pairs: usize,
    /// Pairs whose gcd was 1.
    pub coprime_pairs: usize,
    /// `coprime_pairs / pairs`.
    pub coprime_probability: f64,
    /// `√(6 / p̂)`, or `0` when no coprime pair was seen.
    pub pi_estimate: f64,
    /// `|pi_estimate − π|`, infinite in the degenerate case.
    pub error: f64,
    /// `error / π · 100`.
    pub error_percentage: f64,
    /// Intermediate estimates, one every [`CESARO_CHECKPOINT`] pairs.
    pub history: Vec<f64>,
}

/// Estimates π from `num_pairs` consecutive pairs drawn from `source`.
///
/// The source is consumed in place (two values per pair) and is not reset.
pub fn estimate_pi<I>(source: &mut I, num_pairs: usize) -> Result<CesaroReport>
where
    I: Iterator<Item = u64> + ?Sized,
{
    if num_pairs == 0 {
        return Err(LabError::InvalidCount("pair count"));
    }
    let mut coprime_pairs = 0usize;
    let mut history = Vec::new();
    for drawn in 1..=num_pairs {
        let (Some(x), Some(y)) = (source.next(), source.next()) else {
            return Err(LabError::SequenceTooShort);
        };
        if gcd(x, y) == 1 {
            coprime_pairs += 1;
        }
        if drawn % CESARO_CHECKPOINT == 0 && coprime_pairs > 0 {
            history.push((6.0 / (coprime_pairs as f64 / drawn as f64)).sqrt());
        }
    }

    let coprime_probability = coprime_pairs as f64 / num_pairs as f64;
    let (pi_estimate, error) = if coprime_pairs > 0 {
        let estimate = (6.0 / coprime_probability).sqrt();
        (estimate, (estimate - PI).abs())
    } else {
        (0.0, f64::INFINITY)
    };
    debug!(num_pairs, coprime_pairs, pi_estimate, "cesaro estimate");
    Ok(CesaroReport {
        pairs: num_pairs,
        coprime_pairs,
        coprime_probability,
        pi_estimate,
        error,
        error_percentage: error / PI * 100.0,
        history,
    })
}

/// Runs the Cesàro estimator on integers drawn uniformly from `[1, SYSTEM_MAX]` by `rng`.
pub fn estimate_pi_with_rng<R>(rng: &mut R, num_pairs: usize) -> Result<CesaroReport>
where
    R: Rng,
{
    let mut source = std::iter::repeat_with(|| rng.gen_range(1..=SYSTEM_MAX));
    estimate_pi(&mut source, num_pairs)
}

/// Runs the Cesàro estimator on the thread-local system generator for comparison.
pub fn estimate_pi_system(num_pairs: usize) -> Result<CesaroReport> {
    estimate_pi_with_rng(&mut rand::thread_rng(), num_pairs)
}

/// Number of significant binary digits of `value`; zero is written as a single `0`.
#[inline]
fn natural_width(value: u64) -> u32 {
    (u64::BITS - value.leading_zeros()).max(1)
}

/// Bits of `value` from the most significant set bit down, without zero padding.
fn raw_bits(value: u64) -> impl Iterator<Item = bool> {
    (0..natural_width(value)).rev().map(move |i| (value >> i) & 1 == 1)
}

/// Result of the bit-balance test.
#[derive(Debug, Clone, Serialize)]
pub struct FrequencyReport {
    /// Total one bits.
    pub ones_count: u64,
    /// Total zero bits.
    pub zeros_count: u64,
    /// `ones / total`.
    pub ones_ratio: f64,
    /// `zeros / total`.
    pub zeros_ratio: f64,
    /// Chi-square statistic against a 50/50 split.
    pub chi_square: f64,
    /// `chi_square < 3.841`.
    pub is_random: bool,
}

/// Chi-square bit-balance test with each value zero-padded to `bit_width` bits.
///
/// Values wider than `bit_width` contribute all of their significant bits.
pub fn frequency_test(sequence: &[u64], bit_width: u32) -> Result<FrequencyReport> {
    if bit_width == 0 || bit_width > u64::BITS {
        return Err(LabError::InvalidBitWidth(bit_width));
    }
    if sequence.is_empty() {
        return Err(LabError::EmptySequence);
    }
    let mut ones_count = 0u64;
    let mut zeros_count = 0u64;
    for &value in sequence {
        let width = natural_width(value).max(bit_width);
        let ones = value.count_ones();
        ones_count += u64::from(ones);
        zeros_count += u64::from(width - ones);
    }
    let total = (ones_count + zeros_count) as f64;
    let expected = total / 2.0;
    let chi_square = ((ones_count as f64 - expected).powi(2)
        + (zeros_count as f64 - expected).powi(2))
        / expected;
    Ok(FrequencyReport {
        ones_count,
        zeros_count,
        ones_ratio: ones_count as f64 / total,
        zeros_ratio: zeros_count as f64 / total,
        chi_square,
        is_random: chi_square < CHI_SQUARE_CRITICAL,
    })
}

/// Result of the Wald–Wolfowitz runs test.
#[derive(Debug, Clone, Serialize)]
pub struct RunsReport {
    /// Observed maximal runs of identical bits.
    pub runs: u64,
    /// `2·ones·zeros/n + 1`.
    pub expected_runs: f64,
    /// Variance of the run count under randomness.
    pub variance: f64,
    /// `(runs − expected_runs) / √variance`.
    pub z_statistic: f64,
    /// `|z| < 1.96`.
    pub is_random: bool,
}

/// Runs test over the concatenated unpadded binary forms of `sequence`.
pub fn runs_test(sequence: &[u64]) -> Result<RunsReport> {
    let mut bits = sequence.iter().flat_map(|&value| raw_bits(value));
    let Some(mut previous) = bits.next() else {
        return Err(LabError::SequenceTooShort);
    };
    let mut n = 1u64;
    let mut ones = u64::from(previous);
    let mut runs = 1u64;
    for bit in bits {
        n += 1;
        ones += u64::from(bit);
        if bit != previous {
            runs += 1;
        }
        previous = bit;
    }
    if n < 2 {
        return Err(LabError::SequenceTooShort);
    }
    let zeros = n - ones;
    if ones == 0 || zeros == 0 {
        return Err(LabError::UniformBits);
    }

    let n = n as f64;
    let product = 2.0 * ones as f64 * zeros as f64;
    let expected_runs = product / n + 1.0;
    let variance = product * (product - n) / (n * n * (n - 1.0));
    if variance <= 0.0 {
        return Err(LabError::NonPositiveVariance);
    }
    let z_statistic = (runs as f64 - expected_runs) / variance.sqrt();
    Ok(RunsReport {
        runs,
        expected_runs,
        variance,
        z_statistic,
        is_random: z_statistic.abs() < Z_CRITICAL,
    })
}

/// Combined frequency and runs verdicts for one sequence.
#[derive(Debug, Clone, Serialize)]
pub struct RandomnessReport {
    /// Frequency test result, or the reason it could not run.
    pub frequency: std::result::Result<FrequencyReport, String>,
    /// Runs test result, or the reason it could not run.
    pub runs: std::result::Result<RunsReport, String>,
    /// True only when both tests ran and both declared randomness.
    pub passed: bool,
}

/// Runs both bit-level tests and records each outcome.
pub fn randomness_report(sequence: &[u64], bit_width: u32) -> RandomnessReport {
    let frequency = frequency_test(sequence, bit_width).map_err(|e| e.to_string());
    let runs = runs_test(sequence).map_err(|e| e.to_string());
    let passed = matches!(&frequency, Ok(f) if f.is_random) && matches!(&runs, Ok(r) if r.is_random);
    RandomnessReport {
        frequency,
        runs,
        passed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::{Lcg, LcgParams};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(12, 8), 4);
        assert_eq!(gcd(17, 5), 1);
        assert_eq!(gcd(100, 50), 50);
        assert_eq!(gcd(5, 5), 5);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(gcd(7, 0), 7);
    }

    #[test]
    fn test_cesaro_reference_generator() {
        let mut lcg = Lcg::new(LcgParams::REFERENCE).unwrap();
        let report = estimate_pi(&mut lcg, 1_000).unwrap();
        assert!(report.pi_estimate > 2.0 && report.pi_estimate < 4.0);
        assert_eq!(report.history.len(), 10);
        assert_eq!(report.pairs, 1_000);
        assert!((report.error - (report.pi_estimate - PI).abs()).abs() < 1e-12);
    }

    #[test]
    fn test_cesaro_degenerate_source() {
        let mut evens = std::iter::repeat(4u64);
        let report = estimate_pi(&mut evens, 250).unwrap();
        assert_eq!(report.coprime_pairs, 0);
        assert_eq!(report.pi_estimate, 0.0);
        assert!(report.error.is_infinite());
        assert!(report.history.is_empty());
    }

    #[test]
    fn test_cesaro_exhausted_source() {
        let mut short = vec![1u64, 2, 3].into_iter();
        assert!(matches!(
            estimate_pi(&mut short, 2),
            Err(LabError::SequenceTooShort)
        ));
    }

    #[test]
    fn test_cesaro_huge_count_on_finite_source() {
        let mut short = vec![1u64, 2, 3].into_iter();
        assert!(matches!(
            estimate_pi(&mut short, usize::MAX / 4),
            Err(LabError::SequenceTooShort)
        ));
    }

    #[test]
    fn test_cesaro_system_rng() {
        let mut rng = StdRng::seed_from_u64(17);
        let report = estimate_pi_with_rng(&mut rng, 5_000).unwrap();
        assert!(report.pi_estimate > 2.5 && report.pi_estimate < 3.8);
        assert!((0.0..=1.0).contains(&report.coprime_probability));
    }

    #[test]
    fn test_frequency_fixed_values() {
        let report = frequency_test(&[5, 0], 8).unwrap();
        assert_eq!(report.ones_count, 2);
        assert_eq!(report.zeros_count, 14);
        assert!((report.chi_square - 9.0).abs() < 1e-12);
        assert!(!report.is_random);

        let balanced = frequency_test(&[0b1010], 4).unwrap();
        assert_eq!(balanced.chi_square, 0.0);
        assert!(balanced.is_random);
        assert!((balanced.ones_ratio + balanced.zeros_ratio - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_frequency_wide_value_not_truncated() {
        let report = frequency_test(&[0xFFFF], 4).unwrap();
        assert_eq!(report.ones_count, 16);
        assert_eq!(report.zeros_count, 0);
    }

    #[test]
    fn test_frequency_errors() {
        assert!(matches!(frequency_test(&[], 32), Err(LabError::EmptySequence)));
        assert!(matches!(
            frequency_test(&[1], 0),
            Err(LabError::InvalidBitWidth(0))
        ));
    }

    #[test]
    fn test_runs_fixed_values() {
        // 101 ++ 10 => 1,0,1,1,0: four runs over three ones and two zeros.
        let report = runs_test(&[5, 2]).unwrap();
        assert_eq!(report.runs, 4);
        assert!((report.expected_runs - 3.4).abs() < 1e-12);
        assert!((report.variance - 0.84).abs() < 1e-12);
        assert!((report.z_statistic - 0.6 / 0.84f64.sqrt()).abs() < 1e-12);
        assert!(report.is_random);
    }

    #[test]
    fn test_runs_errors() {
        assert!(matches!(runs_test(&[]), Err(LabError::SequenceTooShort)));
        assert!(matches!(runs_test(&[1]), Err(LabError::SequenceTooShort)));
        assert!(matches!(runs_test(&[7, 3]), Err(LabError::UniformBits)));
        assert!(matches!(
            runs_test(&[2]),
            Err(LabError::NonPositiveVariance)
        ));
    }

    #[test]
    fn test_randomness_report_records_failures() {
        let report = randomness_report(&[7, 3], 2);
        assert!(report.frequency.is_ok());
        assert!(report.runs.is_err());
        assert!(!report.passed);
    }
}
