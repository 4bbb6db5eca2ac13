//! Conversion helpers between storage (TEXT) and domain types.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a TEXT column into a Decimal, with a fallback for scientific
/// notation by parsing as f64 first.
pub fn parse_decimal_tolerant(value_str: &str, field_name: &str) -> Decimal {
    match Decimal::from_str(value_str) {
        Ok(d) => d,
        Err(e_decimal) => match f64::from_str(value_str) {
            Ok(f_val) => match Decimal::from_f64(f_val) {
                Some(dec_val) => dec_val,
                None => {
                    log::error!(
                        "Failed to convert {} '{}' (parsed as f64: {}) to Decimal.",
                        field_name,
                        value_str,
                        f_val
                    );
                    Decimal::ZERO
                }
            },
            Err(e_f64) => {
                log::error!(
                    "Failed to parse {} '{}': as Decimal (err: {}), and as f64 (err: {}). Falling back to ZERO.",
                    field_name, value_str, e_decimal, e_f64
                );
                Decimal::ZERO
            }
        },
    }
}

/// Formats a Decimal for a TEXT column.
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Current time formatted for a TEXT timestamp column.
pub fn now_string() -> String {
    format_datetime(Utc::now())
}

/// Formats a timestamp for a TEXT column (RFC 3339).
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

/// Parses a TEXT timestamp column; malformed values fall back to the epoch
/// rather than poisoning whole result sets.
pub fn parse_datetime_tolerant(value_str: &str, field_name: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value_str) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(err) => {
            log::error!(
                "Failed to parse {} '{}' as RFC 3339 timestamp: {}",
                field_name,
                value_str,
                err
            );
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decimal_round_trip() {
        let value = dec!(1234.5678);
        assert_eq!(
            parse_decimal_tolerant(&format_decimal(value), "amount"),
            value
        );
    }

    #[test]
    fn test_decimal_trailing_zeros_normalized() {
        assert_eq!(format_decimal(dec!(100.00)), "100");
    }

    #[test]
    fn test_malformed_decimal_falls_back_to_zero() {
        assert_eq!(parse_decimal_tolerant("garbage", "amount"), Decimal::ZERO);
    }

    #[test]
    fn test_datetime_round_trip() {
        let now = Utc::now();
        let parsed = parse_datetime_tolerant(&format_datetime(now), "created_at");
        assert_eq!(parsed.timestamp(), now.timestamp());
    }
}
