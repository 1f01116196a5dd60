//! Closed-form LSH candidate probability, used offline for tuning.
//!
//! With `b` bands of `r` rows, a pair with true Jaccard similarity `s`
//! becomes a candidate with probability `P = 1 - (1 - s^r)^b`. Plotted
//! against `s` this is an S-curve whose steep part sits near
//! `(1/b)^(1/r)`.

use crate::config::ConfigError;

/// Probability that a pair with similarity `jaccard` shares at least one band.
///
/// `r` is `signature_length / band_count` (integer division). `jaccard` is
/// clamped to `[0, 1]`.
pub fn candidate_probability(
    signature_length: usize,
    band_count: usize,
    jaccard: f64,
) -> Result<f64, ConfigError> {
    let rows = rows_per_band(signature_length, band_count)?;
    let s = jaccard.clamp(0.0, 1.0);
    Ok(1.0 - (1.0 - s.powf(rows as f64)).powf(band_count as f64))
}

/// Approximate similarity where the S-curve is steepest, `(1/b)^(1/r)`.
pub fn s_curve_threshold(signature_length: usize, band_count: usize) -> Result<f64, ConfigError> {
    let rows = rows_per_band(signature_length, band_count)?;
    Ok((1.0 / band_count as f64).powf(1.0 / rows as f64))
}

/// Pick the divisor of `signature_length` whose S-curve threshold lies
/// closest to `target_threshold`.
pub fn suggest_band_count(signature_length: usize, target_threshold: f64) -> Result<usize, ConfigError> {
    if signature_length == 0 {
        return Err(ConfigError::ZeroSignatureLength);
    }

    let mut best = (1, f64::INFINITY);
    for band_count in (1..=signature_length).filter(|b| signature_length % b == 0) {
        let threshold = s_curve_threshold(signature_length, band_count)?;
        let distance = (threshold - target_threshold).abs();
        if distance < best.1 {
            best = (band_count, distance);
        }
    }
    Ok(best.0)
}

/// One row of a tuning table: `(similarity, probability)` pairs sampled on
/// `steps + 1` evenly spaced points of `[0, 1]`.
pub fn probability_curve(
    signature_length: usize,
    band_count: usize,
    steps: usize,
) -> Result<Vec<(f64, f64)>, ConfigError> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|step| {
            let s = step as f64 / steps as f64;
            candidate_probability(signature_length, band_count, s).map(|p| (s, p))
        })
        .collect()
}

fn rows_per_band(signature_length: usize, band_count: usize) -> Result<usize, ConfigError> {
    if band_count == 0 {
        return Err(ConfigError::ZeroBandCount);
    }
    if signature_length < band_count {
        return Err(ConfigError::IndivisibleBands {
            signature_length,
            band_count,
        });
    }
    Ok(signature_length / band_count)
}
