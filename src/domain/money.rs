use thiserror::Error;

/// Money is represented as integer cents to avoid floating-point drift when summing.
/// 1 unit = 100 cents, so 50,000.00 = 5_000_000 cents.
pub type Cents = i64;

/// Largest amount a single transaction may carry (10,000,000,000,000.00).
/// Every amount up to this bound converts to snapshot units and back unchanged.
pub const MAX_AMOUNT_CENTS: Cents = 1_000_000_000_000_000;

/// Format cents as a plain decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Format cents with thousands separators.
/// Example: 9500000 -> "95,000.00"
pub fn format_cents_grouped(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    let units = (abs_cents / 100).to_string();

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{:02}", sign, grouped, abs_cents % 100)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "1,250" -> 125000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    let negative = cleaned.starts_with('-');
    let digits = cleaned.trim_start_matches('-');

    if digits.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }

    let (units_str, decimal_str) = match digits.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (digits, ""),
    };

    if !decimal_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        parse_digits(units_str)?
    };

    // Pad or truncate the fractional part to 2 digits
    let decimal_cents: i64 = match decimal_str.len() {
        0 => 0,
        1 => parse_digits(decimal_str)? * 10,
        _ => parse_digits(&decimal_str[..2])?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::Overflow)?;
    Ok(if negative { -cents } else { cents })
}

fn parse_digits(s: &str) -> Result<i64, ParseCentsError> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseCentsError::InvalidFormat);
    }
    s.parse().map_err(|_| ParseCentsError::Overflow)
}

/// Convert cents to currency units, as written in snapshot files.
pub fn cents_to_units(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// Convert a currency-unit amount to cents, rounding to the nearest cent.
/// Returns `None` for NaN, infinities and values outside the `Cents` range.
pub fn units_to_cents(units: f64) -> Option<Cents> {
    if !units.is_finite() {
        return None;
    }
    let cents = (units * 100.0).round();
    if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
        return None;
    }
    Some(cents as Cents)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    #[error("invalid money format")]
    InvalidFormat,

    #[error("amount is too large")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
    }

    #[test]
    fn test_format_cents_grouped() {
        assert_eq!(format_cents_grouped(0), "0.00");
        assert_eq!(format_cents_grouped(99_999), "999.99");
        assert_eq!(format_cents_grouped(100_000), "1,000.00");
        assert_eq!(format_cents_grouped(9_500_000), "95,000.00");
        assert_eq!(format_cents_grouped(123_456_789_01), "123,456,789.01");
        assert_eq!(format_cents_grouped(-150_000), "-1,500.00");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("-50.00"), Ok(-5000));
        assert_eq!(parse_cents("100.999"), Ok(10099)); // Truncates
        assert_eq!(parse_cents("1,250.00"), Ok(125_000));
        assert_eq!(parse_cents(" 50000 "), Ok(5_000_000));
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert!(parse_cents("abc").is_err());
        assert!(parse_cents("12.34.56").is_err());
        assert!(parse_cents("").is_err());
        assert!(parse_cents("-").is_err());
        assert!(parse_cents("1.-5").is_err());
        assert_eq!(
            parse_cents("99999999999999999999"),
            Err(ParseCentsError::Overflow)
        );
    }

    #[test]
    fn test_units_conversion() {
        assert_eq!(units_to_cents(50000.0), Some(5_000_000));
        assert_eq!(units_to_cents(0.1 + 0.2), Some(30));
        assert_eq!(units_to_cents(0.004), Some(0));
        assert_eq!(units_to_cents(f64::NAN), None);
        assert_eq!(units_to_cents(f64::INFINITY), None);
        assert_eq!(cents_to_units(1250), 12.5);
    }

    #[test]
    fn test_units_conversion_is_exact_up_to_the_bound() {
        for cents in [
            MAX_AMOUNT_CENTS,
            MAX_AMOUNT_CENTS - 1,
            MAX_AMOUNT_CENTS - 7,
            999_999_999_999_993,
            123_456_789_012_345,
        ] {
            assert_eq!(units_to_cents(cents_to_units(cents)), Some(cents));
        }
    }
}
