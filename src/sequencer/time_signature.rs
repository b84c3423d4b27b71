// Time signature - bar structure and tick resolution

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimeSignatureError {
    #[error("invalid numerator {0}: must be greater than zero")]
    InvalidNumerator(u32),

    #[error("invalid denominator {0}: must be a power of two other than 1")]
    InvalidDenominator(u32),

    #[error("{ticks_per_quarter_note} ticks per quarter note is too coarse for a 1/{denominator} note")]
    InvalidResolution {
        ticks_per_quarter_note: u32,
        denominator: u32,
    },
}

/// Time signature with its tick resolution (e.g., 4/4 at 48 ticks per quarter note)
///
/// Every constructor and setter validates, so an instance is always usable by the
/// play head: `ticks_per_bar()` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSignature", into = "RawTimeSignature")]
pub struct TimeSignature {
    numerator: u32,
    denominator: u32,
    ticks_per_quarter_note: u32,
}

impl TimeSignature {
    pub fn new(
        numerator: u32,
        denominator: u32,
        ticks_per_quarter_note: u32,
    ) -> Result<Self, TimeSignatureError> {
        let candidate = Self {
            numerator,
            denominator,
            ticks_per_quarter_note,
        };
        candidate.validate()?;
        Ok(candidate)
    }

    fn validate(&self) -> Result<(), TimeSignatureError> {
        if self.numerator == 0 {
            return Err(TimeSignatureError::InvalidNumerator(self.numerator));
        }
        if self.denominator < 2 || !self.denominator.is_power_of_two() {
            return Err(TimeSignatureError::InvalidDenominator(self.denominator));
        }
        if self.ticks_per_denominator() == 0 {
            return Err(TimeSignatureError::InvalidResolution {
                ticks_per_quarter_note: self.ticks_per_quarter_note,
                denominator: self.denominator,
            });
        }
        Ok(())
    }

    /// Apply `change` to a copy and keep it only if it still validates
    fn update(&mut self, change: impl FnOnce(&mut Self)) -> Result<(), TimeSignatureError> {
        let mut candidate = *self;
        change(&mut candidate);
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    pub fn set_numerator(&mut self, numerator: u32) -> Result<(), TimeSignatureError> {
        self.update(|ts| ts.numerator = numerator)
    }

    pub fn set_denominator(&mut self, denominator: u32) -> Result<(), TimeSignatureError> {
        self.update(|ts| ts.denominator = denominator)
    }

    pub fn set_ticks_per_quarter_note(&mut self, ticks: u32) -> Result<(), TimeSignatureError> {
        self.update(|ts| ts.ticks_per_quarter_note = ticks)
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    pub fn ticks_per_quarter_note(&self) -> u32 {
        self.ticks_per_quarter_note
    }

    /// Ticks in one beat of the denominator's note value.
    /// 48 tpqn: quarter = 48, eighth = 24, half = 96.
    pub fn ticks_per_denominator(&self) -> u64 {
        self.ticks_per_quarter_note as u64 * 4 / self.denominator as u64
    }

    pub fn ticks_per_bar(&self) -> u64 {
        self.ticks_per_denominator() * self.numerator as u64
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
            ticks_per_quarter_note: 48,
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Unvalidated serde shape; deserializing goes through `TimeSignature::new`
#[derive(Serialize, Deserialize)]
struct RawTimeSignature {
    numerator: u32,
    denominator: u32,
    ticks_per_quarter_note: u32,
}

impl TryFrom<RawTimeSignature> for TimeSignature {
    type Error = TimeSignatureError;

    fn try_from(raw: RawTimeSignature) -> Result<Self, Self::Error> {
        TimeSignature::new(raw.numerator, raw.denominator, raw.ticks_per_quarter_note)
    }
}

impl From<TimeSignature> for RawTimeSignature {
    fn from(ts: TimeSignature) -> Self {
        Self {
            numerator: ts.numerator,
            denominator: ts.denominator,
            ticks_per_quarter_note: ts.ticks_per_quarter_note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_per_bar_four_four() {
        let ts = TimeSignature::new(4, 4, 48).unwrap();
        assert_eq!(ts.ticks_per_denominator(), 48);
        assert_eq!(ts.ticks_per_bar(), 192);
    }

    #[test]
    fn test_compound_and_cut_time() {
        // 6/8: six eighths of 24 ticks
        let six_eight = TimeSignature::new(6, 8, 48).unwrap();
        assert_eq!(six_eight.ticks_per_bar(), 144);

        // 2/2: two halves of 96 ticks
        let cut_time = TimeSignature::new(2, 2, 48).unwrap();
        assert_eq!(cut_time.ticks_per_denominator(), 96);
        assert_eq!(cut_time.ticks_per_bar(), 192);
    }

    #[test]
    fn test_invalid_denominators() {
        assert_eq!(
            TimeSignature::new(4, 3, 48),
            Err(TimeSignatureError::InvalidDenominator(3))
        );
        assert_eq!(
            TimeSignature::new(4, 1, 48),
            Err(TimeSignatureError::InvalidDenominator(1))
        );
        assert_eq!(
            TimeSignature::new(4, 0, 48),
            Err(TimeSignatureError::InvalidDenominator(0))
        );
    }

    #[test]
    fn test_invalid_numerator() {
        assert_eq!(
            TimeSignature::new(0, 4, 48),
            Err(TimeSignatureError::InvalidNumerator(0))
        );
    }

    #[test]
    fn test_resolution_too_coarse() {
        assert!(matches!(
            TimeSignature::new(4, 4, 0),
            Err(TimeSignatureError::InvalidResolution { .. })
        ));
        // 1 tick per quarter cannot express a 1/8 note
        assert!(TimeSignature::new(3, 8, 1).is_err());
    }

    #[test]
    fn test_setters_reject_and_keep_previous_value() {
        let mut ts = TimeSignature::default();
        assert!(ts.set_denominator(6).is_err());
        assert_eq!(ts.denominator(), 4);

        assert!(ts.set_numerator(0).is_err());
        assert_eq!(ts.numerator(), 4);

        ts.set_numerator(3).unwrap();
        ts.set_denominator(8).unwrap();
        assert_eq!(ts.ticks_per_bar(), 72);
    }

    #[test]
    fn test_display() {
        assert_eq!(TimeSignature::new(7, 8, 48).unwrap().to_string(), "7/8");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: TimeSignature =
            ron::from_str("(numerator: 3, denominator: 4, ticks_per_quarter_note: 96)").unwrap();
        assert_eq!(ok.ticks_per_bar(), 288);

        let bad: Result<TimeSignature, _> =
            ron::from_str("(numerator: 3, denominator: 5, ticks_per_quarter_note: 96)");
        assert!(bad.is_err());
    }
}
