//! Utility functions and helpers

use alloy_primitives::Address;

/// Format a ratio string as a percentage with two decimals, "0.00" when unknown
pub fn format_ratio_percent(ratio: Option<&str>) -> String {
    match ratio.and_then(|r| r.trim().parse::<f64>().ok()) {
        Some(value) if value.is_finite() => format!("{:.2}", value * 100.0),
        _ => "0.00".to_string(),
    }
}

/// Shorten an address for log lines and terminal tables
pub fn format_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ratio_percent() {
        assert_eq!(format_ratio_percent(Some("0.4567")), "45.67");
        assert_eq!(format_ratio_percent(Some("1")), "100.00");
        assert_eq!(format_ratio_percent(Some("garbage")), "0.00");
        assert_eq!(format_ratio_percent(None), "0.00");
    }

    #[test]
    fn test_format_address() {
        let address = Address::repeat_byte(0xab);
        let short = format_address(&address);
        assert!(short.starts_with("0x"));
        assert_eq!(short.len(), 6 + 3 + 4);
    }
}
