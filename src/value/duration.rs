/// `Duration` values in compound unit notation (`1h2m3.5s`, `300ms`).
///
/// Accepted units: `ns`, `us` (also `µs`/`μs`), `ms`, `s`, `m`, `h`. A bare
/// `0` is accepted without a unit. Negative or overflowing durations are
/// rejected. The largest accepted duration is `i64::MAX` nanoseconds, so
/// every rendered duration parses back.
use std::fmt::Write as _;
use std::time::Duration;

use super::Value;
use crate::errors::Error;

const NANOS_PER_SEC: u128 = 1_000_000_000;
const MAX_NANOS: u128 = i64::MAX as u128;
/// Fractional digits beyond this are ignored.
const MAX_FRACTION_DIGITS: usize = 18;

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Parse compound duration text.
///
/// # Errors
///
/// `Error::Parse` for any malformed, negative, or overflowing text.
pub fn parse_duration(text: &str) -> Result<Duration, Error> {
    let (negative, mut rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(Error::Parse);
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_digits, tail) = rest.split_at(int_len);
        let mut whole: u128 = 0;
        for digit in int_digits.bytes() {
            whole = whole
                .checked_mul(10)
                .and_then(|w| w.checked_add(u128::from(digit - b'0')))
                .filter(|w| *w <= MAX_NANOS)
                .ok_or(Error::Parse)?;
        }
        rest = tail;

        let mut fraction: u128 = 0;
        let mut scale: u128 = 1;
        let mut has_fraction = false;
        if let Some(tail) = rest.strip_prefix('.') {
            let frac_len = tail.bytes().take_while(u8::is_ascii_digit).count();
            let (frac_digits, tail) = tail.split_at(frac_len);
            for digit in frac_digits.bytes().take(MAX_FRACTION_DIGITS) {
                fraction = fraction * 10 + u128::from(digit - b'0');
                scale *= 10;
            }
            has_fraction = frac_len > 0;
            rest = tail;
        }
        if int_len == 0 && !has_fraction {
            return Err(Error::Parse);
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        if unit_len == 0 {
            return Err(Error::Parse);
        }
        let (unit, tail) = rest.split_at(unit_len);
        let per_unit = unit_nanos(unit).ok_or(Error::Parse)?;
        rest = tail;

        total = whole
            .checked_mul(per_unit)
            .and_then(|n| n.checked_add(fraction * per_unit / scale))
            .and_then(|n| total.checked_add(n))
            .filter(|n| *n <= MAX_NANOS)
            .ok_or(Error::Parse)?;
    }

    if negative && total != 0 {
        return Err(Error::Parse);
    }
    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| Error::Parse)?;
    let nanos = u32::try_from(total % NANOS_PER_SEC).map_err(|_| Error::Parse)?;
    Ok(Duration::new(secs, nanos))
}

/// Write `value / scale` with the remainder as trimmed decimal digits.
fn push_scaled(out: &mut String, value: u128, scale: u128) {
    let whole = value / scale;
    let fraction = value % scale;
    let _ = write!(out, "{whole}");
    if fraction != 0 {
        let width = scale.ilog10() as usize;
        let digits = format!("{fraction:0width$}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
}

/// Canonical text: `0s`, sub-second values in the largest fitting unit
/// (`1.5ms`), otherwise `[<h>h][<m>m]<s>s`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    let mut out = String::new();
    if nanos == 0 {
        out.push_str("0s");
        return out;
    }
    if nanos < NANOS_PER_SEC {
        let (scale, unit) = if nanos < 1_000 {
            (1, "ns")
        } else if nanos < 1_000_000 {
            (1_000, "µs")
        } else {
            (1_000_000, "ms")
        };
        push_scaled(&mut out, nanos, scale);
        out.push_str(unit);
        return out;
    }

    let total_secs = nanos / NANOS_PER_SEC;
    let hours = total_secs / 3_600;
    let minutes = (total_secs / 60) % 60;
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    push_scaled(&mut out, nanos % (60 * NANOS_PER_SEC), NANOS_PER_SEC);
    out.push('s');
    out
}

impl Value for Duration {
    fn render(&self) -> String {
        format_duration(*self)
    }

    fn parse(&mut self, text: &str) -> Result<(), Error> {
        *self = parse_duration(text)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "duration"
    }
}
