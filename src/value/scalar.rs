/// Built-in scalar values and numeric error normalization.
///
/// Integer parsing follows base-0 conventions: an optional sign, then a
/// `0x`, `0o`, `0b` or bare leading `0` (octal) prefix selects the radix.
use std::num::{IntErrorKind, ParseIntError};

use super::Value;
use crate::errors::Error;

/// Map a numeric conversion failure onto the shared error kinds.
///
/// Syntax failures become `Error::Parse`, overflow becomes `Error::Range`,
/// anything else is passed through as `Error::Other`.
pub(crate) fn num_error(err: &ParseIntError) -> Error {
    match err.kind() {
        IntErrorKind::Empty | IntErrorKind::InvalidDigit => Error::Parse,
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Error::Range,
        _ => Error::Other(anyhow::Error::new(err.clone())),
    }
}

fn split_radix(digits: &str) -> (u32, &str) {
    let bytes = digits.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'0' {
        match bytes[1] {
            b'x' | b'X' => return (16, &digits[2..]),
            b'o' | b'O' => return (8, &digits[2..]),
            b'b' | b'B' => return (2, &digits[2..]),
            _ => return (8, &digits[1..]),
        }
    }
    (10, digits)
}

fn parse_unsigned(text: &str) -> Result<u64, Error> {
    let (radix, digits) = split_radix(text);
    // from_str_radix tolerates a leading '+', base-0 parsing does not.
    if digits.starts_with(['+', '-']) {
        return Err(Error::Parse);
    }
    u64::from_str_radix(digits, radix).map_err(|e| num_error(&e))
}

fn parse_signed(text: &str) -> Result<i64, Error> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = i128::from(parse_unsigned(rest)?);
    let signed = if negative { -magnitude } else { magnitude };
    i64::try_from(signed).map_err(|_| Error::Range)
}

fn parse_float(text: &str) -> Result<f64, Error> {
    let value: f64 = text.parse().map_err(|_| Error::Parse)?;
    // Rust saturates overflowing literals to infinity instead of failing.
    if value.is_infinite() && !text.to_ascii_lowercase().contains("inf") {
        return Err(Error::Range);
    }
    Ok(value)
}

fn parse_bool(text: &str) -> Result<bool, Error> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(Error::Parse),
    }
}

impl Value for bool {
    fn render(&self) -> String {
        self.to_string()
    }

    fn parse(&mut self, text: &str) -> Result<(), Error> {
        *self = parse_bool(text)?;
        Ok(())
    }

    fn is_bool_flag(&self) -> bool {
        true
    }

    fn type_name(&self) -> &'static str {
        ""
    }
}

impl Value for i64 {
    fn render(&self) -> String {
        self.to_string()
    }

    fn parse(&mut self, text: &str) -> Result<(), Error> {
        *self = parse_signed(text)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "int"
    }
}

impl Value for isize {
    fn render(&self) -> String {
        self.to_string()
    }

    fn parse(&mut self, text: &str) -> Result<(), Error> {
        *self = isize::try_from(parse_signed(text)?).map_err(|_| Error::Range)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "int"
    }
}

impl Value for u64 {
    fn render(&self) -> String {
        self.to_string()
    }

    fn parse(&mut self, text: &str) -> Result<(), Error> {
        *self = parse_unsigned(text)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "uint"
    }
}

impl Value for usize {
    fn render(&self) -> String {
        self.to_string()
    }

    fn parse(&mut self, text: &str) -> Result<(), Error> {
        *self = usize::try_from(parse_unsigned(text)?).map_err(|_| Error::Range)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "uint"
    }
}

impl Value for f64 {
    fn render(&self) -> String {
        self.to_string()
    }

    fn parse(&mut self, text: &str) -> Result<(), Error> {
        *self = parse_float(text)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "float"
    }
}

impl Value for String {
    fn render(&self) -> String {
        self.clone()
    }

    fn parse(&mut self, text: &str) -> Result<(), Error> {
        text.clone_into(self);
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "string"
    }
}
