//! Quantity normalization.
//!
//! The OVH usage API reports magnitudes as a value plus a human-readable unit
//! such as `GiB` or `GBh`. This module turns those pairs into absolute byte
//! counts. The trailing `h` marks the billing period and never affects the
//! magnitude.
//!
//! Every prefix is decimal. OVH writes `GiB` for what it bills as 10^9 bytes,
//! so the `i` marker is accepted and ignored.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SizeError;
use crate::ovh::Quantity;

/// Suffix OVH appends to units billed per hour.
const HOURLY_SUFFIX: char = 'h';

const DECIMAL_BASE: f64 = 1000.0;

static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?) ?([kKmMgGtTpP])?([iI])?[bB]?$").expect("size pattern is valid")
});

/// Result of normalizing a [`Quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Normalized {
    /// Absolute size in bytes.
    pub bytes: i64,
    /// `true` when the quantity could not be parsed and `bytes` was defaulted to zero.
    pub degraded: bool,
}

impl Normalized {
    fn parsed(bytes: i64) -> Self {
        Self {
            bytes,
            degraded: false,
        }
    }

    fn degraded() -> Self {
        Self {
            bytes: 0,
            degraded: true,
        }
    }
}

/// Parse a human-readable size string (`"2.5 GB"`, `"10KiB"`, `"512"`) into bytes.
///
/// Prefixes are powers of 1000 whether or not they carry the `i` marker.
/// Fractional byte counts are truncated.
pub fn parse_human_size(size: &str) -> Result<i64, SizeError> {
    let captures = SIZE_PATTERN
        .captures(size)
        .ok_or_else(|| SizeError::Invalid(size.to_string()))?;

    let value: f64 = captures[1]
        .parse()
        .map_err(|_| SizeError::Invalid(size.to_string()))?;

    let exponent = match captures.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        None => 0,
        Some(prefix) => match prefix.as_str() {
            "k" => 1,
            "m" => 2,
            "g" => 3,
            "t" => 4,
            "p" => 5,
            _ => return Err(SizeError::Invalid(size.to_string())),
        },
    };
    let bytes = value * DECIMAL_BASE.powi(exponent);
    if !bytes.is_finite() || bytes >= i64::MAX as f64 {
        return Err(SizeError::OutOfRange(size.to_string()));
    }

    Ok(bytes.trunc() as i64)
}

/// Convert a usage quantity to bytes.
///
/// A trailing hourly marker is stripped before parsing. Malformed quantities
/// are logged and yield zero with `degraded` set, so one bad field never
/// prevents the others from being published.
pub fn normalize(quantity: &Quantity) -> Normalized {
    let unit = quantity
        .unit
        .strip_suffix(HOURLY_SUFFIX)
        .unwrap_or(&quantity.unit);

    match parse_human_size(format!("{:.6} {}", quantity.value, unit).trim_end()) {
        Ok(bytes) => Normalized::parsed(bytes),
        Err(e) => {
            tracing::warn!(
                unit = %quantity.unit,
                value = quantity.value,
                error = %e,
                "Failed to normalize quantity, defaulting to zero"
            );
            Normalized::degraded()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantity(value: f64, unit: &str) -> Quantity {
        Quantity {
            unit: unit.to_string(),
            value,
        }
    }

    #[test]
    fn test_parse_decimal_units() {
        assert_eq!(parse_human_size("1 KB"), Ok(1_000));
        assert_eq!(parse_human_size("1.5 MB"), Ok(1_500_000));
        assert_eq!(parse_human_size("2 GB"), Ok(2_000_000_000));
        assert_eq!(parse_human_size("3 TB"), Ok(3_000_000_000_000));
        assert_eq!(parse_human_size("1 PB"), Ok(1_000_000_000_000_000));
        assert_eq!(parse_human_size("7g"), Ok(7_000_000_000));
    }

    #[test]
    fn test_parse_ignores_binary_marker() {
        assert_eq!(parse_human_size("1 KiB"), Ok(1_000));
        assert_eq!(parse_human_size("2 GiB"), Ok(2_000_000_000));
        assert_eq!(parse_human_size("1 TiB"), Ok(1_000_000_000_000));
        assert_eq!(parse_human_size("1 mib"), Ok(1_000_000));
        assert_eq!(parse_human_size("3Gi"), Ok(3_000_000_000));
    }

    #[test]
    fn test_parse_plain_bytes() {
        assert_eq!(parse_human_size("512"), Ok(512));
        assert_eq!(parse_human_size("512 B"), Ok(512));
        assert_eq!(parse_human_size("0.000000"), Ok(0));
    }

    #[test]
    fn test_parse_truncates_fractional_bytes() {
        assert_eq!(parse_human_size("1.9"), Ok(1));
        assert_eq!(parse_human_size("0.0015 KB"), Ok(1));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_human_size(""), Err(SizeError::Invalid(_))));
        assert!(matches!(
            parse_human_size("12 XB"),
            Err(SizeError::Invalid(_))
        ));
        assert!(matches!(
            parse_human_size("-1 GB"),
            Err(SizeError::Invalid(_))
        ));
        assert!(matches!(
            parse_human_size("1 GB per month"),
            Err(SizeError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_out_of_range() {
        assert!(matches!(
            parse_human_size("99999999 PB"),
            Err(SizeError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_normalize_hourly_gigabytes() {
        let normalized = normalize(&quantity(2.0, "GBh"));
        assert_eq!(normalized.bytes, 2_000_000_000);
        assert!(!normalized.degraded);

        let normalized = normalize(&quantity(2.0, "GiBh"));
        assert_eq!(normalized.bytes, 2_000_000_000);
        assert!(!normalized.degraded);
    }

    #[test]
    fn test_hourly_marker_does_not_change_magnitude() {
        for unit in ["B", "KB", "KiB", "MB", "MiB", "GB", "GiB", "TB", "TiB", "PB"] {
            for value in [0.0, 1.0, 3.25, 1024.0] {
                let plain = normalize(&quantity(value, unit));
                let hourly = normalize(&quantity(value, &format!("{unit}h")));
                assert_eq!(plain, hourly, "unit {unit} value {value}");
            }
        }
    }

    #[test]
    fn test_normalize_matches_reference_parse() {
        let normalized = normalize(&quantity(12.5, "MiB"));
        assert_eq!(Ok(normalized.bytes), parse_human_size("12.5 MiB"));
    }

    #[test]
    fn test_zero_is_not_degraded() {
        let normalized = normalize(&quantity(0.0, "GiBh"));
        assert_eq!(normalized, Normalized::parsed(0));
    }

    #[test]
    fn test_empty_unit_means_bytes() {
        assert_eq!(normalize(&quantity(42.0, "")).bytes, 42);
        assert_eq!(normalize(&quantity(42.0, "h")).bytes, 42);
    }

    #[test]
    fn test_unparseable_unit_degrades_to_zero() {
        let normalized = normalize(&quantity(5.0, "furlongs"));
        assert_eq!(normalized.bytes, 0);
        assert!(normalized.degraded);

        let normalized = normalize(&quantity(f64::NAN, "GB"));
        assert!(normalized.degraded);

        let normalized = normalize(&quantity(-3.0, "GB"));
        assert!(normalized.degraded);
    }
}
