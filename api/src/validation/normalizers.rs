//! Value normalization helpers
//!
//! Pure functions that turn an already-checked raw value into its canonical
//! form, plus the numeric helpers the amount rules and formatter share.

use rust_decimal::{Decimal, RoundingStrategy};

/// Lower-case an email address
pub fn lowercase_email(email: &str) -> String {
    email.to_lowercase()
}

/// Round half-up to two decimal places
pub fn round_to_cents(value: f64) -> f64 {
    match to_decimal(value) {
        Some(decimal) => decimal
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .to_string()
            .parse::<f64>()
            .unwrap_or(value),
        None => (value * 100.0).round() / 100.0,
    }
}

/// Number of digits after the decimal point in the shortest representation
/// of `value` that round-trips.
pub fn decimal_places(value: f64) -> usize {
    let repr = value.to_string();
    repr.split_once('.')
        .map(|(_, fraction)| fraction.len())
        .unwrap_or(0)
}

/// Integer prefix of a string, the way `parseInt(value, 10)` reads it.
///
/// Leading whitespace and a single sign are accepted; parsing stops at the
/// first non-digit. Returns `None` when no digit is found. Values that do not
/// fit in an `i64` saturate.
pub fn parse_int_prefix(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let signed = if negative { format!("-{digits}") } else { digits };
    Some(
        signed
            .parse::<i64>()
            .unwrap_or(if negative { i64::MIN } else { i64::MAX }),
    )
}

/// Format an amount with thousands separators and exactly two decimals.
///
/// `1234567.89` becomes `"1,234,567.89"` and `1000` becomes `"1,000.00"`.
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let fixed = match to_decimal(amount) {
        Some(decimal) => {
            let mut rounded =
                decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(2);
            rounded.to_string()
        }
        None => format!("{:.2}", amount),
    };

    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    format!("{}{}.{}", sign, group_thousands(integer), fraction)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn to_decimal(value: f64) -> Option<Decimal> {
    value.to_string().parse::<Decimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234567.89), "1,234,567.89");
        assert_eq!(format_amount(1000.0), "1,000.00");
        assert_eq!(format_amount(123.4), "123.40");
        assert_eq!(format_amount(0.5), "0.50");
        assert_eq!(format_amount(999999999.99), "999,999,999.99");
        assert_eq!(format_amount(-1234.5), "-1,234.50");
    }

    #[test]
    fn test_format_amount_rounds_half_up() {
        assert_eq!(format_amount(2.345), "2.35");
        assert_eq!(format_amount(100.0), "100.00");
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places(100.0), 0);
        assert_eq!(decimal_places(123.45), 2);
        assert_eq!(decimal_places(100.123), 3);
        assert_eq!(decimal_places(0.1), 1);
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(123.45), 123.45);
        assert_eq!(round_to_cents(2.345), 2.35);
        assert_eq!(round_to_cents(10.0), 10.0);
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("42"), Some(42));
        assert_eq!(parse_int_prefix("  7"), Some(7));
        assert_eq!(parse_int_prefix("12abc"), Some(12));
        assert_eq!(parse_int_prefix("1.9"), Some(1));
        assert_eq!(parse_int_prefix("-3"), Some(-3));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("99999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn test_lowercase_email() {
        assert_eq!(lowercase_email("USER@Test.COM"), "user@test.com");
    }
}
