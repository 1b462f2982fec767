//! Conversion between THT and notions.
//!
//! A notion is the base unit of the chain: 1e-8 THT. The node reports
//! monetary values as decimal THT floats, so conversion has to round rather
//! than truncate to survive the float representation of e.g. `0.00038`.

use thiserror::Error;

/// Number of notions in one THT.
pub const NOTIONS_PER_THOUGHT: u64 = 100_000_000;

/// Largest representable monetary value in notions. Wire amounts are
/// signed 64-bit integers.
const MAX_NOTIONS: u64 = i64::MAX as u64;

/// Errors converting node-reported amounts.
#[derive(Debug, Error)]
pub enum AmountError {
    /// The float was NaN or infinite.
    #[error("invalid thought amount: {0}")]
    Invalid(f64),
    /// The amount was negative or beyond the monetary range.
    #[error("thought amount out of range: {0}")]
    OutOfRange(f64),
}

/// Converts a decimal THT amount to notions, rounding half away from zero.
pub fn notions_from_tht(tht: f64) -> Result<u64, AmountError> {
    if tht.is_nan() || tht.is_infinite() {
        return Err(AmountError::Invalid(tht));
    }
    if tht < 0.0 {
        return Err(AmountError::OutOfRange(tht));
    }
    let notions = (tht * NOTIONS_PER_THOUGHT as f64).round();
    if notions > MAX_NOTIONS as f64 {
        return Err(AmountError::OutOfRange(tht));
    }
    Ok(notions as u64)
}

/// Converts notions back to a decimal THT amount.
pub fn tht_from_notions(notions: u64) -> f64 {
    notions as f64 / NOTIONS_PER_THOUGHT as f64
}
