//! Timing and text helpers
//!
//! Formatting of millisecond timestamps for display, parsing them back, and
//! the plain-text view of subtitle text used for character counting.

pub mod errors;

pub use errors::{CoreError, Result};

/// Replacement shown for override blocks when masking is requested
const MASK_CHAR: char = '\u{FF0A}';

/// Format milliseconds as `H:MM:SS.mmm`
///
/// Negative values keep their sign in front of the hours.
///
/// # Examples
///
/// ```rust
/// use subline_core::format_ms;
///
/// assert_eq!(format_ms(1300), "0:00:01.300");
/// assert_eq!(format_ms(3_723_004), "1:02:03.004");
/// assert_eq!(format_ms(-1500), "-0:00:01.500");
/// ```
#[must_use]
pub fn format_ms(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let ms = ms.unsigned_abs();
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!("{sign}{hours}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Parse `H:MM:SS.mmm` (fraction optional, one to three digits) into milliseconds
///
/// # Errors
///
/// Returns [`CoreError::InvalidTime`] if the string is not a well-formed
/// timestamp.
pub fn parse_ms(text: &str) -> Result<i64> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() != 3 {
        return Err(CoreError::InvalidTime(format!("Invalid time format: {text}")));
    }

    let hours: i64 = parts[0]
        .parse()
        .map_err(|_| CoreError::InvalidTime(format!("Invalid hours: {}", parts[0])))?;
    let minutes: i64 = parts[1]
        .parse()
        .map_err(|_| CoreError::InvalidTime(format!("Invalid minutes: {}", parts[1])))?;

    let (seconds_str, frac_str) = match parts[2].split_once('.') {
        Some((seconds, frac)) => (seconds, Some(frac)),
        None => (parts[2], None),
    };
    let seconds: i64 = seconds_str
        .parse()
        .map_err(|_| CoreError::InvalidTime(format!("Invalid seconds: {seconds_str}")))?;

    let millis = match frac_str {
        None => 0,
        Some(frac) if frac.is_empty() || frac.len() > 3 => {
            return Err(CoreError::InvalidTime(format!(
                "Invalid fraction: {frac}"
            )))
        }
        Some(frac) => {
            let value: i64 = frac
                .parse()
                .map_err(|_| CoreError::InvalidTime(format!("Invalid fraction: {frac}")))?;
            value * 10_i64.pow(3 - frac.len() as u32)
        }
    };

    if minutes >= 60 {
        return Err(CoreError::InvalidTime(format!(
            "Minutes must be < 60: {minutes}"
        )));
    }
    if seconds >= 60 {
        return Err(CoreError::InvalidTime(format!(
            "Seconds must be < 60: {seconds}"
        )));
    }

    let total = hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + millis;
    Ok(if negative { -total } else { total })
}

/// Strip `{...}` override blocks and turn `\N`, `\n` and `\h` into spaces
///
/// With `mask` set, every override block is replaced by a single
/// full-width asterisk so the reader can still see that markup is present.
/// An unterminated `{` is kept as literal text.
#[must_use]
pub fn ass_to_plaintext(text: &str, mask: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        if mask {
            out.push(MASK_CHAR);
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);

    out.replace("\\N", " ")
        .replace("\\n", " ")
        .replace("\\h", " ")
}

/// Count the visible word characters of subtitle text
///
/// Markup, whitespace and punctuation do not count.
#[must_use]
pub fn character_count(text: &str) -> usize {
    ass_to_plaintext(text, false)
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ms_pads_components() {
        assert_eq!(format_ms(0), "0:00:00.000");
        assert_eq!(format_ms(59_999), "0:00:59.999");
        assert_eq!(format_ms(36_000_000), "10:00:00.000");
    }

    #[test]
    fn parse_ms_accepts_short_fractions() {
        assert_eq!(parse_ms("0:00:01.3").unwrap(), 1300);
        assert_eq!(parse_ms("0:00:01.30").unwrap(), 1300);
        assert_eq!(parse_ms("0:00:01.300").unwrap(), 1300);
        assert_eq!(parse_ms("1:02:03").unwrap(), 3_723_000);
        assert_eq!(parse_ms("-0:00:00.250").unwrap(), -250);
    }

    #[test]
    fn parse_ms_rejects_malformed_input() {
        assert!(parse_ms("").is_err());
        assert!(parse_ms("1:2").is_err());
        assert!(parse_ms("0:61:00").is_err());
        assert!(parse_ms("0:00:75").is_err());
        assert!(parse_ms("0:00:01.1234").is_err());
        assert!(parse_ms("0:00:01.").is_err());
        assert!(matches!(parse_ms("a:00:00"), Err(CoreError::InvalidTime(_))));
    }

    #[test]
    fn format_and_parse_agree() {
        for value in [0, 1, 999, 61_001, 3_599_999, 7_200_050] {
            assert_eq!(parse_ms(&format_ms(value)).unwrap(), value);
        }
    }

    #[test]
    fn plaintext_strips_and_masks_blocks() {
        assert_eq!(ass_to_plaintext("{\\an8}Top\\Nline", false), "Top line");
        assert_eq!(
            ass_to_plaintext("a{\\i1}b{\\i0}c", true),
            "a\u{FF0A}b\u{FF0A}c"
        );
        assert_eq!(ass_to_plaintext("open { brace", false), "open { brace");
        assert_eq!(ass_to_plaintext("hard\\hspace", false), "hard space");
    }

    #[test]
    fn character_count_skips_punctuation() {
        assert_eq!(character_count("Hello, world!"), 10);
        assert_eq!(character_count("{\\b1}Zażółć{\\b0}"), 6);
        assert_eq!(character_count(""), 0);
    }
}
