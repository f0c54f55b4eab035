//! Year-scoped sequential claim identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ClaimNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimNumberError {
    /// The input does not match the `YYYY-NNNNNN` shape.
    #[error("claim number must have the form YYYY-NNNNNN")]
    Malformed,
}

/// A human-readable claim identifier of the form `YYYY-NNNNNN`.
///
/// The first four digits are the calendar year the claim was filed in; the
/// last six are a zero-padded per-year sequence. Claim numbers are unique
/// and immutable once assigned.
///
/// ## Examples
///
/// ```
/// use libro_reclamaciones_core::ClaimNumber;
///
/// let n = ClaimNumber::new(2026, 14);
/// assert_eq!(n.as_str(), "2026-000014");
/// assert_eq!(n.year(), 2026);
///
/// assert!(ClaimNumber::parse("2026-000014").is_ok());
/// assert!(ClaimNumber::parse("2026-14").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(transparent))]
#[serde(transparent)]
pub struct ClaimNumber(String);

impl ClaimNumber {
    /// Build a claim number from a year and a per-year sequence value.
    #[must_use]
    pub fn new(year: i32, seq: i64) -> Self {
        Self(format!("{year:04}-{seq:06}"))
    }

    /// Parse a `ClaimNumber` from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimNumberError::Malformed`] unless the input is exactly
    /// four digits, a dash, and six digits.
    pub fn parse(s: &str) -> Result<Self, ClaimNumberError> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 11
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);

        if well_formed {
            Ok(Self(s.to_owned()))
        } else {
            Err(ClaimNumberError::Malformed)
        }
    }

    /// Returns the claim number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The calendar year encoded in this claim number.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0[..4].parse().unwrap_or(0)
    }
}

impl fmt::Display for ClaimNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ClaimNumber {
    type Err = ClaimNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ClaimNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pads_sequence() {
        assert_eq!(ClaimNumber::new(2026, 1).as_str(), "2026-000001");
        assert_eq!(ClaimNumber::new(2026, 123_456).as_str(), "2026-123456");
    }

    #[test]
    fn test_parse_valid() {
        let n = ClaimNumber::parse("2025-000042").unwrap();
        assert_eq!(n.year(), 2025);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "2025-42", "202X-000042", "2025_000042", "2025-00004a"] {
            assert_eq!(ClaimNumber::parse(bad), Err(ClaimNumberError::Malformed));
        }
    }

    #[test]
    fn test_serde_roundtrip() {
        let n = ClaimNumber::new(2026, 9);
        let json = serde_json::to_string(&n).unwrap();
        assert_eq!(json, "\"2026-000009\"");
        let back: ClaimNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, n);
    }
}
