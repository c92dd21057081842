use std::sync::LazyLock;

use alloy::primitives::utils::{format_units, parse_units, Unit};
use alloy::primitives::U256;
use regex::Regex;

use crate::interfaces::error::UnitsError;

static DECIMAL_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid decimal amount pattern"));

fn check_decimals(decimals: u8) -> Result<u8, UnitsError> {
    Unit::new(decimals)
        .map(|_| decimals)
        .ok_or(UnitsError::UnsupportedDecimals(decimals))
}

/// Converts a human decimal string ("1,234.5") into raw token units.
///
/// The conversion is exact: an amount carrying more fractional digits than
/// the token supports is rejected rather than rounded.
pub fn to_raw_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    let cleaned: String = amount.trim().chars().filter(|c| *c != ',').collect();
    if !DECIMAL_AMOUNT.is_match(&cleaned) {
        return Err(UnitsError::MalformedAmount(amount.to_string()));
    }

    // Trailing fractional zeros carry no precision.
    let exact = match cleaned.split_once('.') {
        Some((int, frac)) => match frac.trim_end_matches('0') {
            "" => int.to_string(),
            frac => format!("{int}.{frac}"),
        },
        None => cleaned,
    };
    let fraction_len = exact.split_once('.').map_or(0, |(_, f)| f.len());
    if fraction_len > decimals as usize {
        return Err(UnitsError::MalformedAmount(amount.to_string()));
    }

    let parsed = parse_units(&exact, check_decimals(decimals)?)
        .map_err(|_| UnitsError::MalformedAmount(amount.to_string()))?;
    Ok(parsed.get_absolute())
}

/// Formats raw units for display, without trailing fractional zeros.
pub fn to_human_units(raw: U256, decimals: u8) -> Result<String, UnitsError> {
    if decimals == 0 {
        return Ok(raw.to_string());
    }
    let formatted = format_units(raw, check_decimals(decimals)?)
        .map_err(|_| UnitsError::UnsupportedDecimals(decimals))?;

    match formatted.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                Ok(int.to_string())
            } else {
                Ok(format!("{int}.{frac}"))
            }
        }
        None => Ok(formatted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_raw_units_exactly() {
        assert_eq!(to_raw_units("12.5", 6).unwrap(), U256::from(12_500_000u64));
        assert_eq!(to_raw_units("0", 18).unwrap(), U256::ZERO);
        assert_eq!(
            to_raw_units("1,000.000001", 6).unwrap(),
            U256::from(1_000_000_001u64)
        );
        assert_eq!(to_raw_units(" 7 ", 0).unwrap(), U256::from(7));
    }

    #[test]
    fn formats_human_units() {
        assert_eq!(to_human_units(U256::from(12_500_000u64), 6).unwrap(), "12.5");
        assert_eq!(to_human_units(U256::from(3_000_000u64), 6).unwrap(), "3");
        assert_eq!(to_human_units(U256::from(1u64), 6).unwrap(), "0.000001");
        assert_eq!(to_human_units(U256::from(42u64), 0).unwrap(), "42");
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", "abc", "-1", "1.", ".5", "1e6", "1.2.3", "0x10"] {
            assert_eq!(
                to_raw_units(bad, 6),
                Err(UnitsError::MalformedAmount(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_excess_precision() {
        assert!(matches!(
            to_raw_units("0.0000001", 6),
            Err(UnitsError::MalformedAmount(_))
        ));
        assert!(matches!(
            to_raw_units("7.5", 0),
            Err(UnitsError::MalformedAmount(_))
        ));
    }

    #[test]
    fn accepts_trailing_zeros_beyond_decimals() {
        assert_eq!(
            to_raw_units("12.5000000", 6).unwrap(),
            U256::from(12_500_000u64)
        );
        assert_eq!(to_raw_units("7.0", 0).unwrap(), U256::from(7));
        assert_eq!(to_raw_units("1,000.000", 2).unwrap(), U256::from(100_000u64));
    }
}
