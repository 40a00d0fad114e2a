//! Numeric and currency input normalisation.
//!
//! Typed input is stripped to digits and separators, the decimal separator
//! is canonicalised, the value is rounded half-up to a fixed number of
//! decimals, and two strings come out: a canonical one for storage and
//! computation, and a locale-formatted one for display only.

use thiserror::Error;

/// Integer digits accepted before the value is considered absurd.
const MAX_INTEGER_DIGITS: usize = 18;

/// Decimal and grouping separators of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLocale {
    /// Decimal separator.
    pub decimal: char,
    /// Thousands grouping separator.
    pub grouping: char,
}

impl NumberLocale {
    /// `1,234.56`
    pub const DOT_DECIMAL: Self = Self {
        decimal: '.',
        grouping: ',',
    };

    /// `1.234,56`
    pub const COMMA_DECIMAL: Self = Self {
        decimal: ',',
        grouping: '.',
    };

    /// Separators conventionally used in `country`.
    #[must_use]
    pub fn for_country(country: &str) -> Self {
        match country.to_ascii_uppercase().as_str() {
            "DE" | "AT" | "TR" | "NL" | "BE" | "IT" | "ES" | "PT" | "FR" | "DK" | "NO" | "SE"
            | "FI" | "PL" | "CZ" | "GR" | "RO" | "HR" | "SI" | "BR" | "AR" | "ID" => {
                Self::COMMA_DECIMAL
            }
            _ => Self::DOT_DECIMAL,
        }
    }
}

/// Failure to interpret numeric input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NumberError {
    /// No digit was typed.
    #[error("no digits in input")]
    Empty,

    /// The input cannot be read as one number.
    #[error("input is not a single number")]
    Malformed,

    /// The integer part is too long.
    #[error("number has more than {MAX_INTEGER_DIGITS} integer digits")]
    TooLarge,
}

/// Result of normalising numeric input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedNumber {
    /// Canonical form: optional `-`, digits, `.` and exactly `decimals` digits.
    pub canonical: String,
    /// Locale-formatted text. Never parse this.
    pub display: String,
    /// Value scaled by `10^decimals`.
    pub minor_units: i128,
    /// Decimal places.
    pub decimals: u8,
}

impl NormalizedNumber {
    /// Value as a float, for range comparisons only.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        self.minor_units as f64 / 10f64.powi(i32::from(self.decimals))
    }
}

/// Normalises typed numeric input.
///
/// # Errors
///
/// Returns `NumberError::Empty` when no digit was typed,
/// `NumberError::Malformed` when the separators cannot be resolved to a single
/// number, and `NumberError::TooLarge` for more than 18 integer digits.
pub fn normalize(raw: &str, decimals: u8, locale: NumberLocale) -> Result<NormalizedNumber, NumberError> {
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(*c, '.' | ',' | '-'))
        .collect();

    let negative = stripped.starts_with('-');
    let body = stripped.trim_start_matches('-');
    if body.contains('-') {
        return Err(NumberError::Malformed);
    }
    if !body.chars().any(|c| c.is_ascii_digit()) {
        return Err(NumberError::Empty);
    }

    let decimal_sep = decimal_separator(body, locale);
    let (int_part, frac_part) = match decimal_sep {
        Some(sep) => {
            let idx = body.rfind(sep).ok_or(NumberError::Malformed)?;
            (&body[..idx], &body[idx + sep.len_utf8()..])
        }
        None => (body, ""),
    };
    if !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(NumberError::Malformed);
    }
    let int_digits: String = int_part.chars().filter(char::is_ascii_digit).collect();
    let int_digits = int_digits.trim_start_matches('0');
    if int_digits.len() > MAX_INTEGER_DIGITS {
        return Err(NumberError::TooLarge);
    }

    let scale = 10i128.pow(u32::from(decimals));
    let whole: i128 = if int_digits.is_empty() {
        0
    } else {
        int_digits.parse().map_err(|_| NumberError::Malformed)?
    };
    let mut minor_units = whole * scale;

    let wanted = usize::from(decimals);
    let kept: String = frac_part
        .chars()
        .chain(std::iter::repeat('0'))
        .take(wanted)
        .collect();
    if wanted > 0 {
        minor_units += kept.parse::<i128>().map_err(|_| NumberError::Malformed)?;
    }
    if frac_part.chars().nth(wanted).is_some_and(|c| c >= '5') {
        minor_units += 1;
    }
    if negative {
        minor_units = -minor_units;
    }

    Ok(NormalizedNumber {
        canonical: render(minor_units, decimals, '.', None),
        display: render(minor_units, decimals, locale.decimal, Some(locale.grouping)),
        minor_units,
        decimals,
    })
}

/// Decides which separator (if any) is the decimal one.
fn decimal_separator(body: &str, locale: NumberLocale) -> Option<char> {
    let last_dot = body.rfind('.');
    let last_comma = body.rfind(',');
    match (last_dot, last_comma) {
        (None, None) => None,
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => single_kind_separator(body, '.', locale),
        (None, Some(_)) => single_kind_separator(body, ',', locale),
    }
}

/// With only one kind of separator present, it is grouping when it repeats or
/// when it is the locale's grouping char followed by exactly three digits.
fn single_kind_separator(body: &str, sep: char, locale: NumberLocale) -> Option<char> {
    if body.matches(sep).count() > 1 {
        return None;
    }
    if sep == locale.grouping {
        let tail = body.rsplit(sep).next().unwrap_or_default();
        if tail.len() == 3 && tail.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }
    Some(sep)
}

fn render(minor_units: i128, decimals: u8, decimal: char, grouping: Option<char>) -> String {
    let scale = 10i128.pow(u32::from(decimals));
    let magnitude = minor_units.unsigned_abs();
    let scale = scale.unsigned_abs();
    let whole = (magnitude / scale).to_string();
    let frac = magnitude % scale;

    let mut out = String::new();
    if minor_units < 0 {
        out.push('-');
    }
    match grouping {
        Some(sep) => {
            let len = whole.len();
            for (i, digit) in whole.chars().enumerate() {
                if i > 0 && (len - i) % 3 == 0 {
                    out.push(sep);
                }
                out.push(digit);
            }
        }
        None => out.push_str(&whole),
    }
    if decimals > 0 {
        out.push(decimal);
        out.push_str(&format!("{frac:0width$}", width = usize::from(decimals)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_currency_symbols_and_spaces() {
        let n = normalize("€ 12 500", 2, NumberLocale::COMMA_DECIMAL).unwrap();
        assert_eq!(n.canonical, "12500.00");
        assert_eq!(n.display, "12.500,00");
    }

    #[test]
    fn test_normalize_uses_last_separator_as_decimal_when_both_present() {
        let de = normalize("1.234,567", 2, NumberLocale::COMMA_DECIMAL).unwrap();
        assert_eq!(de.canonical, "1234.57");

        let en = normalize("1,234.5", 2, NumberLocale::DOT_DECIMAL).unwrap();
        assert_eq!(en.canonical, "1234.50");
        assert_eq!(en.display, "1,234.50");
    }

    #[test]
    fn test_normalize_treats_grouping_char_with_three_digit_tail_as_grouping() {
        let n = normalize("1.500", 2, NumberLocale::COMMA_DECIMAL).unwrap();
        assert_eq!(n.canonical, "1500.00");

        let n = normalize("1,500", 0, NumberLocale::DOT_DECIMAL).unwrap();
        assert_eq!(n.canonical, "1500");
    }

    #[test]
    fn test_normalize_accepts_dot_decimal_typed_in_comma_locale() {
        let n = normalize("12.5", 2, NumberLocale::COMMA_DECIMAL).unwrap();
        assert_eq!(n.canonical, "12.50");
        assert_eq!(n.display, "12,50");
    }

    #[test]
    fn test_normalize_rounds_half_up() {
        assert_eq!(normalize("0.125", 2, NumberLocale::DOT_DECIMAL).unwrap().canonical, "0.13");
        assert_eq!(normalize("0.124", 2, NumberLocale::DOT_DECIMAL).unwrap().canonical, "0.12");
        assert_eq!(normalize("9.99", 0, NumberLocale::DOT_DECIMAL).unwrap().canonical, "10");
        assert_eq!(normalize("-2.5", 0, NumberLocale::DOT_DECIMAL).unwrap().canonical, "-3");
    }

    #[test]
    fn test_normalize_repeated_separator_is_grouping() {
        let n = normalize("1.234.567", 0, NumberLocale::DOT_DECIMAL).unwrap();
        assert_eq!(n.canonical, "1234567");
        assert_eq!(n.display, "1,234,567");
    }

    #[test]
    fn test_normalize_rejects_empty_and_malformed_input() {
        assert_eq!(normalize("abc", 2, NumberLocale::DOT_DECIMAL), Err(NumberError::Empty));
        assert_eq!(normalize("12-5", 2, NumberLocale::DOT_DECIMAL), Err(NumberError::Malformed));
        assert_eq!(
            normalize("1234567890123456789", 0, NumberLocale::DOT_DECIMAL),
            Err(NumberError::TooLarge)
        );
    }

    #[test]
    fn test_as_f64_reads_minor_units() {
        let n = normalize("1.234,50", 2, NumberLocale::COMMA_DECIMAL).unwrap();
        assert_eq!(n.minor_units, 123_450);
        assert!((n.as_f64() - 1234.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_for_country_picks_comma_locale_for_germany() {
        assert_eq!(NumberLocale::for_country("de"), NumberLocale::COMMA_DECIMAL);
        assert_eq!(NumberLocale::for_country("US"), NumberLocale::DOT_DECIMAL);
    }
}
