//! Numeric token parsing shared by everything that reads numbered names.

/// A run of ASCII decimal digits lifted out of a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericToken {
    /// Digits exactly as written, leading zeros included.
    pub literal: String,
    /// Decimal value with leading zeros stripped.
    pub value: u64,
}

impl NumericToken {
    /// Literal character length (`"007"` -> 3).
    pub fn width(&self) -> usize {
        self.literal.len()
    }
}

/// Why a candidate token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Empty,
    NotDigits,
    Overflow,
}

/// Parse a whole string as a numeric token. Only ASCII digits are accepted:
/// no sign, no separators, no whitespace.
pub fn parse_token(s: &str) -> Result<NumericToken, TokenError> {
    if s.is_empty() {
        return Err(TokenError::Empty);
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TokenError::NotDigits);
    }
    let value = s.parse::<u64>().map_err(|_| TokenError::Overflow)?;
    Ok(NumericToken {
        literal: s.to_string(),
        value,
    })
}

/// Number of decimal digits needed to print `n` (`digit_len(0) == 1`).
pub fn digit_len(n: u64) -> usize {
    let mut len = 1;
    let mut rest = n / 10;
    while rest > 0 {
        len += 1;
        rest /= 10;
    }
    len
}

/// Zero-pad `index` to `width` digits. Wider numbers are never truncated.
pub fn pad_index(index: u64, width: usize) -> String {
    format!("{index:0width$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zeros_are_stripped_for_value_only() {
        let t = parse_token("0007").unwrap();
        assert_eq!(t.value, 7);
        assert_eq!(t.width(), 4);
        assert_eq!(t.literal, "0007");
    }

    #[test]
    fn rejects_non_digits() {
        assert_eq!(parse_token(""), Err(TokenError::Empty));
        assert_eq!(parse_token("-1"), Err(TokenError::NotDigits));
        assert_eq!(parse_token("+1"), Err(TokenError::NotDigits));
        assert_eq!(parse_token("1_000"), Err(TokenError::NotDigits));
        assert_eq!(parse_token("12a"), Err(TokenError::NotDigits));
        // Non-ASCII digits (Arabic-Indic three) are not decimal digits here.
        assert_eq!(parse_token("\u{0663}"), Err(TokenError::NotDigits));
    }

    #[test]
    fn huge_token_overflows() {
        assert_eq!(parse_token("99999999999999999999999"), Err(TokenError::Overflow));
    }

    #[test]
    fn digit_len_edges() {
        assert_eq!(digit_len(0), 1);
        assert_eq!(digit_len(9), 1);
        assert_eq!(digit_len(10), 2);
        assert_eq!(digit_len(150), 3);
        assert_eq!(digit_len(u64::MAX), 20);
    }

    #[test]
    fn pad_never_truncates() {
        assert_eq!(pad_index(5, 4), "0005");
        assert_eq!(pad_index(12345, 3), "12345");
    }
}
