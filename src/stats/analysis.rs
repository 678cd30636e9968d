//! Distribution Analysis
//!
//! Compares an observed bucket histogram with the distribution a table
//! promises:
//! - chi-squared goodness of fit against the 0.05 critical value (`df = pins`)
//! - observed vs theoretical RTP with a normal-approximation 95% interval
//! - left/right balance around the center bucket (advisory only)
//!
//! Reports are rebuilt from scratch on every call.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::game::tables::{binomial_distribution, critical_value, expected_rtp, Difficulty, GameTable};

/// Significance level of the tabulated critical values.
pub const SIGNIFICANCE: f64 = 0.05;

/// Left-share deviation from 50% (in points) that earns a bias note.
pub const DEFAULT_BIAS_THRESHOLD_PCT: f64 = 3.0;

/// z-score for a two-sided 95% interval.
const Z_95: f64 = 1.96;

/// Where the expected distribution comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedSource {
    /// The game's probability table.
    #[default]
    Published,
    /// `C(pins, k) * 0.5^pins`, the fair-coin path model.
    Binomial,
}

impl ExpectedSource {
    /// Probability vector for a table under this source.
    pub fn probabilities(&self, table: &GameTable) -> Vec<f64> {
        match self {
            Self::Published => table.probabilities.clone(),
            Self::Binomial => binomial_distribution(table.pins),
        }
    }

    fn other(&self) -> Self {
        match self {
            Self::Published => Self::Binomial,
            Self::Binomial => Self::Published,
        }
    }
}

/// Analyzer knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalysisSettings {
    /// Distribution used for the verdict.
    pub source: ExpectedSource,
    /// Bias note threshold for the symmetry check.
    pub bias_threshold_pct: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            source: ExpectedSource::Published,
            bias_threshold_pct: DEFAULT_BIAS_THRESHOLD_PCT,
        }
    }
}

/// 95% interval around the observed RTP (percent).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

impl ConfidenceInterval {
    /// True if `value` lies within the interval.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Left/right balance around the center bucket.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymmetryCheck {
    /// Rounds strictly left of center.
    pub left: u64,
    /// Rounds strictly right of center.
    pub right: u64,
    /// `left / (left + right) * 100`.
    pub left_pct: f64,
    /// Deviation from 50% exceeded the threshold.
    pub biased: bool,
}

/// Goodness of fit against the alternate expected distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossCheck {
    /// Distribution used.
    pub source: ExpectedSource,
    /// Rounded expected counts.
    pub expected_histogram: Vec<u64>,
    /// Chi-squared statistic.
    pub chi_squared: f64,
    /// Below the critical value; false with no samples.
    pub fair: bool,
    /// RTP implied by this distribution.
    pub theoretical_rtp: f64,
}

/// Full analysis of one histogram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Pin count.
    pub pins: u8,
    /// Risk tier.
    pub difficulty: Difficulty,
    /// Distribution used for the verdict.
    pub expected_source: ExpectedSource,
    /// Total rounds.
    pub sample_count: u64,
    /// Observed counts per bucket.
    pub bucket_histogram: Vec<u64>,
    /// Expected counts per bucket, rounded.
    pub expected_histogram: Vec<u64>,
    /// Chi-squared statistic.
    pub chi_squared: f64,
    /// Degrees of freedom (`pins`).
    pub degrees_of_freedom: u8,
    /// Critical value at [`SIGNIFICANCE`].
    pub critical_value: f64,
    /// `chi_squared < critical_value` over at least one sample.
    pub fair: bool,
    /// `Σ observed[i] * payout[i] / n * 100`; absent with no samples.
    pub observed_rtp: Option<f64>,
    /// `Σ p[i] * payout[i] * 100`.
    pub theoretical_rtp: f64,
    /// Normal-approximation 95% interval; absent with no samples.
    pub confidence_interval: Option<ConfidenceInterval>,
    /// Left/right balance; absent when no round left the center.
    pub symmetry: Option<SymmetryCheck>,
    /// Same test against the other expected distribution.
    pub cross_check: CrossCheck,
    /// The table has not been confirmed against the live game.
    pub unverified_configuration: bool,
}

impl AnalysisReport {
    /// Observed RTP minus theoretical RTP.
    pub fn rtp_difference(&self) -> Option<f64> {
        self.observed_rtp.map(|rtp| rtp - self.theoretical_rtp)
    }
}

/// Analyze a histogram against a table.
///
/// # Errors
///
/// [`ConfigurationError::HistogramMismatch`] if the histogram length is not
/// `pins + 1`; [`ConfigurationError::UnsupportedPins`] if no critical value
/// is tabulated for the pin count.
pub fn analyze(
    histogram: &[u64],
    table: &GameTable,
    settings: &AnalysisSettings,
) -> Result<AnalysisReport, ConfigurationError> {
    if histogram.len() != table.bucket_count() {
        return Err(ConfigurationError::HistogramMismatch {
            pins: table.pins,
            expected: table.bucket_count(),
            got: histogram.len(),
        });
    }

    let critical = critical_value(table.pins)?;
    let n: u64 = histogram.iter().sum();

    let probabilities = settings.source.probabilities(table);
    let expected = expected_histogram(&probabilities, n);
    let chi = chi_squared(histogram, &expected);

    let alternate = settings.source.other();
    let alternate_probabilities = alternate.probabilities(table);
    let alternate_expected = expected_histogram(&alternate_probabilities, n);
    let alternate_chi = chi_squared(histogram, &alternate_expected);

    let observed = observed_rtp(histogram, &table.payouts);

    Ok(AnalysisReport {
        pins: table.pins,
        difficulty: table.difficulty,
        expected_source: settings.source,
        sample_count: n,
        bucket_histogram: histogram.to_vec(),
        expected_histogram: expected,
        chi_squared: chi,
        degrees_of_freedom: table.pins,
        critical_value: critical,
        fair: n > 0 && chi < critical,
        observed_rtp: observed,
        theoretical_rtp: expected_rtp(&probabilities, &table.payouts),
        confidence_interval: observed.map(|rtp| rtp_confidence_interval(rtp, n)),
        symmetry: symmetry_check(histogram, settings.bias_threshold_pct),
        cross_check: CrossCheck {
            source: alternate,
            expected_histogram: alternate_expected,
            chi_squared: alternate_chi,
            fair: n > 0 && alternate_chi < critical,
            theoretical_rtp: expected_rtp(&alternate_probabilities, &table.payouts),
        },
        unverified_configuration: !table.is_verified(),
    })
}

/// Expected count per bucket, rounded to whole rounds.
pub fn expected_histogram(probabilities: &[f64], n: u64) -> Vec<u64> {
    probabilities
        .iter()
        .map(|p| (p * n as f64).round() as u64)
        .collect()
}

/// `Σ (observed - expected)^2 / expected`, skipping buckets expected to be empty.
pub fn chi_squared(observed: &[u64], expected: &[u64]) -> f64 {
    observed
        .iter()
        .zip(expected)
        .filter(|(_, e)| **e > 0)
        .map(|(o, e)| {
            let diff = *o as f64 - *e as f64;
            diff * diff / *e as f64
        })
        .sum()
}

/// `Σ observed[i] * payout[i] / n * 100`, or `None` with no samples.
pub fn observed_rtp(histogram: &[u64], payouts: &[f64]) -> Option<f64> {
    let n: u64 = histogram.iter().sum();
    if n == 0 {
        return None;
    }
    let total: f64 = histogram
        .iter()
        .zip(payouts)
        .map(|(count, payout)| *count as f64 * payout)
        .sum();
    Some(total / n as f64 * 100.0)
}

/// `rtp ± 1.96 * sqrt(rtp * (100 - rtp) / n)`.
///
/// A Bernoulli-style approximation; it understates the spread of skewed payout
/// curves. The variance term is clamped at zero when `rtp > 100`.
pub fn rtp_confidence_interval(rtp: f64, n: u64) -> ConfidenceInterval {
    if n == 0 {
        return ConfidenceInterval { lower: rtp, upper: rtp };
    }
    let variance = (rtp * (100.0 - rtp)).max(0.0) / n as f64;
    let margin = Z_95 * variance.sqrt();
    ConfidenceInterval {
        lower: rtp - margin,
        upper: rtp + margin,
    }
}

/// Compare rounds strictly left and right of the center bucket.
pub fn symmetry_check(histogram: &[u64], bias_threshold_pct: f64) -> Option<SymmetryCheck> {
    let pins = histogram.len().saturating_sub(1);
    let mut left = 0u64;
    let mut right = 0u64;

    // For even pin counts the center bucket is pins / 2 and belongs to neither side.
    for (bucket, count) in histogram.iter().enumerate() {
        if bucket * 2 < pins {
            left += count;
        } else if bucket * 2 > pins {
            right += count;
        }
    }

    let sided = left + right;
    if sided == 0 {
        return None;
    }
    let left_pct = left as f64 / sided as f64 * 100.0;

    Some(SymmetryCheck {
        left,
        right,
        left_pct,
        biased: (left_pct - 50.0).abs() > bias_threshold_pct,
    })
}

// =============================================================================
// TESTS
// =============================================================================
