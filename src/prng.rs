//! `crypto_labs` rebuilds textbook primitives from first principles so that
//! every step of the arithmetic stays visible to the reader.
//! Linear-congruential pseudorandom number generator.
//!
//! The generator follows the recurrence `x_{n+1} = (a·x_n + c) mod m`.  Its
//! state is a small value type: four parameters plus the current value.
//! History retention is opt-in through [`Lcg::with_history`], so bulk
//! generation never accumulates memory behind the caller's back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LabError, Result};

/// Upper bound on sequence length accepted by the command-line front end.
pub const MAX_SEQUENCE_LEN: usize = 10_000;

/// Parameters `{m, a, c, x0}` of a linear-congruential generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcgParams {
    /// Modulus, `m > 0`.
    pub m: u64,
    /// Multiplier, `0 ≤ a < m`.
    pub a: u64,
    /// Increment, `0 ≤ c < m`.
    pub c: u64,
    /// Seed, `0 ≤ x0 < m`.
    pub x0: u64,
}

impl LcgParams {
    /// Reference configuration: `m = 2^26 − 1`, `a = 13^3`, `c = 1597`, `x0 = 13`.
    pub const REFERENCE: LcgParams = LcgParams {
        m: (1 << 26) - 1,
        a: 2197,
        c: 1597,
        x0: 13,
    };

    /// Creates a parameter set without validating it.
    pub const fn new(m: u64, a: u64, c: u64, x0: u64) -> Self {
        Self { m, a, c, x0 }
    }

    /// Checks `m > 0` and that `a`, `c` and `x0` lie in `[0, m)`.
    pub fn validate(&self) -> Result<()> {
        if self.m == 0 {
            return Err(LabError::InvalidModulus);
        }
        for (name, value) in [("a", self.a), ("c", self.c), ("x0", self.x0)] {
            if value >= self.m {
                return Err(LabError::ParameterOutOfRange {
                    name,
                    value,
                    modulus: self.m,
                });
            }
        }
        Ok(())
    }

    /// Applies one step of the recurrence to `x`.
    ///
    /// Callers hold validated parameters, so `m` is never zero here.
    #[inline]
    pub(crate) fn step(&self, x: u64) -> u64 {
        ((self.a as u128 * x as u128 + self.c as u128) % self.m as u128) as u64
    }

    /// Longest period the recurrence can reach: `m` with an increment, `m − 1` without.
    pub fn max_period(&self) -> u64 {
        if self.c != 0 {
            self.m
        } else {
            self.m.saturating_sub(1)
        }
    }
}

impl Default for LcgParams {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// A linear-congruential generator.
#[derive(Debug, Clone)]
pub struct Lcg {
    params: LcgParams,
    current: u64,
    history: Option<Vec<u64>>,
}

impl Lcg {
    /// Creates a generator positioned at the seed, without history retention.
    pub fn new(params: LcgParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            current: params.x0,
            history: None,
        })
    }

    /// Enables retention of every emitted value.
    pub fn with_history(mut self) -> Self {
        self.history = Some(Vec::new());
        self
    }

    /// Returns the generator parameters.
    pub fn params(&self) -> &LcgParams {
        &self.params
    }

    /// Returns the most recently emitted value (the seed right after a reset).
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Values emitted since the last reset; empty unless history is enabled.
    pub fn history(&self) -> &[u64] {
        self.history.as_deref().unwrap_or(&[])
    }

    /// Advances the generator and returns the new value.
    pub fn advance(&mut self) -> u64 {
        self.current = self.params.step(self.current);
        if let Some(history) = self.history.as_mut() {
            history.push(self.current);
        }
        self.current
    }

    /// Restores the seed and clears any retained history.
    pub fn reset(&mut self) {
        self.current = self.params.x0;
        if let Some(history) = self.history.as_mut() {
            history.clear();
        }
    }

    /// Resets, then returns the next `n` values.
    pub fn generate_sequence(&mut self, n: usize) -> Result<Vec<u64>> {
        if n == 0 {
            return Err(LabError::InvalidCount("sequence length"));
        }
        self.reset();
        let sequence: Vec<u64> = (0..n).map(|_| self.advance()).collect();
        debug!(len = sequence.len(), m = self.params.m, "generated lcg sequence");
        Ok(sequence)
    }

    /// Resets and searches for the first repeated value.
    ///
    /// The seed counts as index 0.  Returns `(period, true)` once a value
    /// repeats, or `(max_iterations, false)` if none does within the bound.
    pub fn find_period(&mut self, max_iterations: u64) -> (u64, bool) {
        self.reset();
        let mut seen: HashMap<u64, u64> = HashMap::new();
        seen.insert(self.params.x0, 0);
        for index in 1..=max_iterations {
            let value = self.advance();
            if let Some(&first) = seen.get(&value) {
                let period = index - first;
                debug!(period, index, "lcg period found");
                return (period, true);
            }
            seen.insert(value, index);
        }
        debug!(max_iterations, "lcg period not found within bound");
        (max_iterations, false)
    }

    /// Runs [`Lcg::find_period`] and grades the result against the maximum period.
    pub fn period_report(&mut self, max_iterations: u64) -> Result<PeriodReport> {
        if max_iterations == 0 {
            return Err(LabError::InvalidCount("max iterations"));
        }
        let (period, found) = self.find_period(max_iterations);
        let max_possible_period = self.params.max_period();
        let m = self.params.m as f64;
        let quality = if period == max_possible_period {
            PeriodQuality::Excellent
        } else if period as f64 > m / 2.0 {
            PeriodQuality::Good
        } else if period as f64 > m / 4.0 {
            PeriodQuality::Fair
        } else {
            PeriodQuality::Poor
        };
        let percentage = if max_possible_period == 0 {
            0.0
        } else {
            period as f64 / max_possible_period as f64 * 100.0
        };
        Ok(PeriodReport {
            params: self.params,
            period,
            found,
            max_possible_period,
            quality,
            percentage,
        })
    }
}

impl Iterator for Lcg {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        Some(self.advance())
    }
}

/// Qualitative grade for a discovered period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeriodQuality {
    /// The period reaches the theoretical maximum.
    Excellent,
    /// The period exceeds half of `m`.
    Good,
    /// The period exceeds a quarter of `m`.
    Fair,
    /// Anything shorter.
    Poor,
}

/// Outcome of a period search.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodReport {
    /// Generator parameters the search ran with.
    pub params: LcgParams,
    /// Detected period, or the iteration bound when `found` is false.
    pub period: u64,
    /// Whether a repeat was observed.
    pub found: bool,
    /// `m` when `c ≠ 0`, otherwise `m − 1`.
    pub max_possible_period: u64,
    /// Grade relative to `m`.
    pub quality: PeriodQuality,
    /// `period / max_possible_period · 100`.
    pub percentage: f64,
}

/// Descriptive statistics for an integer sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceStats {
    /// Number of values.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
    /// Square root of the variance.
    pub std_dev: f64,
    /// Smallest value.
    pub min: u64,
    /// Largest value.
    pub max: u64,
    /// Number of distinct values.
    pub unique_values: usize,
    /// Up to ten `(value, occurrences)` pairs, most frequent first.
    pub frequency_top10: Vec<(u64, usize)>,
}

/// Computes [`SequenceStats`]; an empty sequence yields `None`.
///
/// Frequency ties are ordered by ascending value.
pub fn statistics(sequence: &[u64]) -> Option<SequenceStats> {
    let (&first, _) = sequence.split_first()?;
    let count = sequence.len();
    let n = count as f64;
    let mean = sequence.iter().map(|&x| x as f64).sum::<f64>() / n;
    let variance = sequence
        .iter()
        .map(|&x| {
            let d = x as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    let mut min = first;
    let mut max = first;
    let mut frequency: HashMap<u64, usize> = HashMap::new();
    for &value in sequence {
        min = min.min(value);
        max = max.max(value);
        *frequency.entry(value).or_insert(0) += 1;
    }
    let unique_values = frequency.len();
    let mut ranked: Vec<(u64, usize)> = frequency.into_iter().collect();
    ranked.sort_unstable_by(|l, r| r.1.cmp(&l.1).then(l.0.cmp(&r.0)));
    ranked.truncate(10);

    Some(SequenceStats {
        count,
        mean,
        variance,
        std_dev: variance.sqrt(),
        min,
        max,
        unique_values,
        frequency_top10: ranked,
    })
}
