/// Formats an amount in rupees with Indian digit grouping, e.g. `₹12,34,567.89`.
///
/// Non-finite values are rendered as-is (`inf`, `NaN`).
pub fn format_inr(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("₹{}", amount);
    }

    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let grouped = group_indian(whole);
    if negative {
        format!("-₹{}.{}", grouped, fraction)
    } else {
        format!("₹{}.{}", grouped, fraction)
    }
}

/// Groups digits as lakhs and crores: the last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut parts: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        parts.push(&head[start..end]);
        end = start;
    }
    parts.reverse();

    format!("{},{}", parts.join(","), tail)
}

/// Formats a ratio with two decimals, leaving `inf`/`NaN` visible.
pub fn format_ratio(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indian_grouping() {
        assert_eq!(format_inr(0.0), "₹0.00");
        assert_eq!(format_inr(999.5), "₹999.50");
        assert_eq!(format_inr(1000.0), "₹1,000.00");
        assert_eq!(format_inr(100000.0), "₹1,00,000.00");
        assert_eq!(format_inr(12345678.9), "₹1,23,45,678.90");
        assert_eq!(format_inr(-50000.0), "-₹50,000.00");
    }

    #[test]
    fn test_non_finite_values() {
        assert_eq!(format_inr(f64::INFINITY), "₹inf");
        assert_eq!(format_ratio(f64::NAN), "NaN");
        assert_eq!(format_ratio(12.3456), "12.35");
    }
}
