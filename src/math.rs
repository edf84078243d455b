// src/math.rs
use alloy_primitives::U256;

use crate::shared::errors::AmountError;

/// Allowance at or above this value counts as an unlimited approval
pub const INFINITE_APPROVAL_THRESHOLD: U256 = U256::from_limbs([0x8888_8888_8888_8888; 4]);

/// Number of fractional digits kept for balances shown to the user
pub const DISPLAY_FRACTION_DIGITS: usize = 5;

/// Scale a human decimal string to base units for a token with `decimals` digits.
/// Fraction digits beyond `decimals` are dropped.
pub fn to_raw_amount(human: &str, decimals: u8) -> Result<U256, AmountError> {
    let trimmed = human.trim();
    if let Some(raw) = parse_plain_decimal(trimmed, decimals) {
        return Ok(raw);
    }

    // Exponent notation ("1e3") is a finite number too; f64 Display never prints an exponent
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => {
            parse_plain_decimal(&value.to_string(), decimals)
                .ok_or_else(|| AmountError::InvalidAmount(human.to_string()))
        }
        _ => Err(AmountError::InvalidAmount(human.to_string())),
    }
}

fn parse_plain_decimal(text: &str, decimals: u8) -> Option<U256> {
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (text, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let decimals = decimals as usize;
    let mut digits = String::with_capacity(int_part.len() + decimals);
    digits.push_str(int_part);
    let kept = &frac_part[..frac_part.len().min(decimals)];
    digits.push_str(kept);
    digits.extend(std::iter::repeat('0').take(decimals - kept.len()));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).ok()
}

/// Render a base-unit string as a human decimal string. Never fails: empty or
/// unparsable input renders as "0".
pub fn to_human_amount(raw: &str, decimals: u8) -> String {
    let raw = raw.trim();
    let parsed = U256::from_str_radix(raw, 10).or_else(|_| raw.parse::<U256>());
    match parsed {
        Ok(value) if !raw.is_empty() => format_units(value, decimals),
        _ => "0".to_string(),
    }
}

/// Render a base-unit amount as a human decimal string, trailing zeros trimmed
pub fn format_units(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

/// Cut a decimal string down to `fraction_digits` digits after the point, without rounding
pub fn truncate_fixed(value: &str, fraction_digits: usize) -> String {
    match value.find('.') {
        None => value.to_string(),
        Some(point) if fraction_digits == 0 => value[..point].to_string(),
        Some(point) => {
            let end = value[point + 1..]
                .char_indices()
                .nth(fraction_digits)
                .map_or(value.len(), |(offset, _)| point + 1 + offset);
            value[..end].to_string()
        }
    }
}

/// Unsigned comparison `allowance >= threshold`
pub fn meets_allowance_threshold(allowance: U256, threshold: U256) -> bool {
    allowance >= threshold
}

/// Lenient numeric parse used for comparing user input against displayed balances
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_raw_amount() {
        assert_eq!(to_raw_amount("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(to_raw_amount("1", 18).unwrap(), U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(to_raw_amount(".25", 2).unwrap(), U256::from(25u64));
        assert_eq!(to_raw_amount("0", 18).unwrap(), U256::ZERO);
        assert_eq!(to_raw_amount(" 42 ", 0).unwrap(), U256::from(42u64));
    }

    #[test]
    fn test_to_raw_amount_truncates_extra_fraction_digits() {
        assert_eq!(to_raw_amount("1.23456789", 6).unwrap(), U256::from(1_234_567u64));
        assert_eq!(to_raw_amount("0.9", 0).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_to_raw_amount_accepts_exponent_notation() {
        assert_eq!(to_raw_amount("1e3", 2).unwrap(), U256::from(100_000u64));
    }

    #[test]
    fn test_to_raw_amount_rejects_invalid_input() {
        for input in ["", ".", "abc", "-1", "1.2.3", "NaN", "inf", "1,5"] {
            assert!(
                matches!(to_raw_amount(input, 18), Err(AmountError::InvalidAmount(_))),
                "{input:?} should be rejected"
            );
        }
        let too_large = "9".repeat(80);
        assert!(to_raw_amount(&too_large, 0).is_err());
    }

    #[test]
    fn test_to_human_amount() {
        assert_eq!(to_human_amount("1500000", 6), "1.5");
        assert_eq!(to_human_amount("1", 18), "0.000000000000000001");
        assert_eq!(to_human_amount("1000000000000000000", 18), "1");
        assert_eq!(to_human_amount("123", 0), "123");
        assert_eq!(to_human_amount("0", 6), "0");
    }

    #[test]
    fn test_to_human_amount_never_fails() {
        assert_eq!(to_human_amount("", 18), "0");
        assert_eq!(to_human_amount("not a number", 18), "0");
        assert_eq!(to_human_amount("-5", 18), "0");
    }

    #[test]
    fn test_truncate_fixed() {
        assert_eq!(truncate_fixed("1.239", 2), "1.23");
        assert_eq!(truncate_fixed("1.999999", 5), "1.99999");
        assert_eq!(truncate_fixed("5", 2), "5");
        assert_eq!(truncate_fixed("0.1", 5), "0.1");
        assert_eq!(truncate_fixed("7.89", 0), "7");
    }

    #[test]
    fn test_truncate_fixed_counts_chars_not_bytes() {
        assert_eq!(truncate_fixed("1.€", 1), "1.€");
        assert_eq!(truncate_fixed("1.€€9", 2), "1.€€");
        assert_eq!(truncate_fixed("1.é5", 1), "1.é");
    }

    #[test]
    fn test_truncate_fixed_never_rounds_up() {
        for (input, expected) in [("0.99999999", "0.99"), ("2.555", "2.55"), ("9.9", "9")] {
            let digits = expected.split_once('.').map_or(0, |(_, f)| f.len());
            assert_eq!(truncate_fixed(input, digits), expected);
        }
    }

    #[test]
    fn test_meets_allowance_threshold() {
        let threshold = INFINITE_APPROVAL_THRESHOLD;
        assert!(meets_allowance_threshold(U256::MAX, threshold));
        assert!(meets_allowance_threshold(threshold, threshold));
        assert!(!meets_allowance_threshold(threshold - U256::from(1u64), threshold));
        assert!(!meets_allowance_threshold(U256::ZERO, threshold));
        assert!(meets_allowance_threshold(U256::from(7u64), U256::from(7u64)));
    }

    #[test]
    fn test_infinite_approval_threshold_value() {
        let expected = U256::from_str_radix(&"8".repeat(64), 16).unwrap();
        assert_eq!(INFINITE_APPROVAL_THRESHOLD, expected);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1.5"), Some(1.5));
        assert_eq!(parse_decimal(" 20 "), Some(20.0));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("inf"), None);
    }
}
