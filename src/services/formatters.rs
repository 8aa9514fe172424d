//! Display formatting for prices, percentages and timestamps.

use chrono::DateTime;

/// US dollar amount. Sub-dollar values keep 4 to 6 fraction digits, larger
/// values 2; `compact` abbreviates with K/M/B/T.
pub fn format_usd(value: f64, compact: bool) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    if abs < 1.0 && abs != 0.0 {
        return format!("{}${}", sign, trim_fraction(&format!("{:.6}", abs), 4));
    }

    if compact {
        let (scale, suffix) = compact_unit(abs);
        let scaled = trim_fraction(&format!("{:.2}", abs / scale), 0);
        return format!("{}${}{}", sign, scaled, suffix);
    }

    format!("{}${}", sign, group_decimal(&format!("{:.2}", abs)))
}

/// `+1.23%` / `-1.23%` / `0.00%`; the unsigned form prints the raw value.
pub fn format_percent(value: f64, signed: bool) -> String {
    if !signed {
        return format!("{:.2}%", value);
    }

    let absolute = format!("{:.2}", value.abs());
    if value > 0.0 {
        format!("+{}%", absolute)
    } else if value < 0.0 {
        format!("-{}%", absolute)
    } else {
        "0.00%".to_string()
    }
}

/// BTC amount with 2 to 8 fraction digits
pub fn format_btc(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let digits = trim_fraction(&format!("{:.8}", value.abs()), 2);
    format!("{}{} BTC", sign, group_decimal(&digits))
}

pub fn format_integer(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}", sign, group_thousands(&format!("{:.0}", rounded.abs())))
}

/// e.g. `Oct 14, 2026, 3:05 PM UTC`
pub fn format_date_time(unix_seconds: i64) -> String {
    match DateTime::from_timestamp(unix_seconds, 0) {
        Some(dt) => dt.format("%b %-d, %Y, %-I:%M %p UTC").to_string(),
        None => "n/a".to_string(),
    }
}

const COMPACT_UNITS: [(f64, &str); 5] =
    [(1.0, ""), (1e3, "K"), (1e6, "M"), (1e9, "B"), (1e12, "T")];

/// Largest unit not above `abs`, moved up one step when rounding to two
/// digits would print 1000 of it.
fn compact_unit(abs: f64) -> (f64, &'static str) {
    let mut index = COMPACT_UNITS
        .iter()
        .rposition(|(scale, _)| abs >= *scale)
        .unwrap_or(0);

    let (scale, _) = COMPACT_UNITS[index];
    if ((abs / scale) * 100.0).round() / 100.0 >= 1000.0 && index + 1 < COMPACT_UNITS.len() {
        index += 1;
    }
    COMPACT_UNITS[index]
}

/// Drops trailing fraction zeros but keeps at least `min_digits`.
fn trim_fraction(formatted: &str, min_digits: usize) -> String {
    let Some((int_part, frac)) = formatted.split_once('.') else {
        return formatted.to_string();
    };

    let mut frac = frac.trim_end_matches('0').to_string();
    while frac.len() < min_digits {
        frac.push('0');
    }

    if frac.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac)
    }
}

fn group_decimal(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((int_part, frac)) => format!("{}.{}", group_thousands(int_part), frac),
        None => group_thousands(formatted),
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(64231.456, false), "$64,231.46");
        assert_eq!(format_usd(0.0031, false), "$0.0031");
        assert_eq!(format_usd(0.12345678, false), "$0.123457");
        assert_eq!(format_usd(0.0, false), "$0.00");
        assert_eq!(format_usd(-12.5, false), "-$12.50");
    }

    #[test]
    fn test_format_usd_compact() {
        assert_eq!(format_usd(2_480_000_000_000.0, true), "$2.48T");
        assert_eq!(format_usd(95_500_000_000.0, true), "$95.5B");
        assert_eq!(format_usd(12_000_000.0, true), "$12M");
        assert_eq!(format_usd(640.0, true), "$640");
    }

    #[test]
    fn test_format_usd_compact_rounds_into_next_unit() {
        assert_eq!(format_usd(999_999.0, true), "$1M");
        assert_eq!(format_usd(999.999, true), "$1K");
        assert_eq!(format_usd(999_999_000_000.0, true), "$1T");
        assert_eq!(format_usd(-999_999.0, true), "-$1M");
        assert_eq!(format_usd(995.0, true), "$995");
        assert_eq!(format_usd(999_990.0, true), "$999.99K");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(1.234, true), "+1.23%");
        assert_eq!(format_percent(-0.5, true), "-0.50%");
        assert_eq!(format_percent(0.0, true), "0.00%");
        assert_eq!(format_percent(54.321, false), "54.32%");
    }

    #[test]
    fn test_format_btc_and_integer() {
        assert_eq!(format_btc(0.00001234), "0.00001234 BTC");
        assert_eq!(format_btc(1.5), "1.50 BTC");
        assert_eq!(format_integer(1234567.4), "1,234,567");
        assert_eq!(format_integer(999.0), "999");
    }

    #[test]
    fn test_format_date_time() {
        assert_eq!(format_date_time(1_700_000_000), "Nov 14, 2023, 10:13 PM UTC");
    }
}
