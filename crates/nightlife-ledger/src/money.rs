//! Money and percentage helpers

/// Apply a percentage (0-100) to an amount
pub fn percent_of(amount: f64, percentage: f64) -> f64 {
    amount * percentage / 100.0
}

/// Divide, yielding 0 instead of NaN/Infinity when the denominator is 0
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Normalize -0.0 to 0.0 for cleaner display
pub fn normalize_zero(val: f64) -> f64 {
    if val == 0.0 { 0.0 } else { val }
}

/// Format an amount as USD with two decimals and thousands grouping
///
/// `1234.5` becomes `"$1,234.50"`, `-42.0` becomes `"-$42.00"`.
pub fn format_currency(amount: f64) -> String {
    let amount = normalize_zero(amount);
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // Rounding can turn a tiny negative into "0.00"
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

/// Format a percentage with one decimal, e.g. `"12.5%"`
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", normalize_zero(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_grouping() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(5.0), "$5.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(1_234_567.891), "$1,234,567.89");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(-42.0), "-$42.00");
        assert_eq!(format_currency(-12_500.0), "-$12,500.00");
        assert_eq!(format_currency(-0.0), "$0.00");
        assert_eq!(format_currency(-0.001), "$0.00");
    }

    #[test]
    fn test_safe_div_zero_denominator() {
        assert_eq!(safe_div(100.0, 0.0), 0.0);
        assert_eq!(safe_div(0.0, 0.0), 0.0);
        assert_eq!(safe_div(50.0, 200.0), 0.25);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(10_000.0, 10.0), 1000.0);
        assert_eq!(percent_of(0.0, 50.0), 0.0);
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(12.345), "12.3%");
        assert_eq!(format_percent(-0.0), "0.0%");
    }
}
