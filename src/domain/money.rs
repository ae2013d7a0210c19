use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// For INR/EUR/USD, 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Largest amount a single invoice or payment may carry: 1,000,000,000,000.00.
/// Sums of tens of thousands of such amounts still fit in an `i64`.
pub const MAX_AMOUNT: Cents = 100_000_000_000_000;

/// Format cents as a human-readable amount.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000, "1,250.50" -> 125050
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input: String = input.trim().chars().filter(|c| *c != ',').collect();
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');

    let (units_str, decimal_str) = match input.split_once('.') {
        Some((units, decimals)) => {
            if decimals.contains('.') {
                return Err(ParseCentsError::InvalidFormat);
            }
            (units, decimals)
        }
        None => (input, ""),
    };

    if units_str.is_empty() && decimal_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }

    if !decimal_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        parse_digits(units_str)?
    };

    // Pad to two digits, truncate anything past the second
    let decimal_cents = match decimal_str.len() {
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
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseCentsError::InvalidFormat);
    }
    s.parse().map_err(|_| ParseCentsError::Overflow)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    Overflow,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::Overflow => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
