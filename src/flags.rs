/// Named flags: `-name value`, `-name=value`, boolean switches.
///
/// Parsing stops at the first token that is not a flag, or right after a
/// `--` terminator. Both `-name` and `--name` spellings are accepted.
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use tracing::trace;

use crate::errors::Error;
use crate::value::Value;

/// A registered flag.
pub struct Flag {
    name: String,
    usage: String,
    default: String,
    value: Box<dyn Value>,
}

impl Flag {
    /// Flag name without dashes.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text.
    #[must_use]
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Rendered value at registration time.
    #[must_use]
    pub fn default_text(&self) -> &str {
        &self.default
    }

    /// Rendered current value.
    #[must_use]
    pub fn render(&self) -> String {
        self.value.render()
    }

    /// Split a back-quoted placeholder out of the usage text.
    ///
    /// "a `file` to read" yields ("file", "a file to read"). Without
    /// quotes the value's type name is used.
    #[must_use]
    pub fn unquote_usage(&self) -> (String, String) {
        if let Some(start) = self.usage.find('`') {
            if let Some(len) = self.usage[start + 1..].find('`') {
                let name = &self.usage[start + 1..start + 1 + len];
                let usage = format!(
                    "{}{}{}",
                    &self.usage[..start],
                    name,
                    &self.usage[start + 2 + len..]
                );
                return (name.to_owned(), usage);
            }
        }
        (self.value.type_name().to_owned(), self.usage.clone())
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

fn is_zero_default(text: &str) -> bool {
    matches!(text, "" | "0" | "false" | "0s")
}

/// A set of named flags.
#[derive(Debug, Default)]
pub struct FlagSet {
    flags: BTreeMap<String, Flag>,
    args: Vec<String>,
}

impl FlagSet {
    /// Create an empty flag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `name`. A later registration with the same
    /// name replaces the earlier one.
    pub fn var(
        &mut self,
        value: impl Value + 'static,
        name: impl Into<String>,
        usage: impl Into<String>,
    ) -> &mut Self {
        let name = name.into();
        let flag = Flag {
            name: name.clone(),
            usage: usage.into(),
            default: value.render(),
            value: Box::new(value),
        };
        self.flags.insert(name, flag);
        self
    }

    /// Number of registered flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether no flags are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Look up a flag by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.get(name)
    }

    /// Visit every flag in lexical order.
    pub fn visit_all(&self, mut visit: impl FnMut(&Flag)) {
        for flag in self.flags.values() {
            visit(flag);
        }
    }

    /// Positional tokens left by the last [`FlagSet::parse`].
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Consume leading flag tokens and return the positional remainder.
    ///
    /// # Errors
    ///
    /// `UnknownFlag`, `BadFlagSyntax`, `FlagNeedsValue`, or
    /// `InvalidFlagValue` for the first offending token.
    pub fn parse(&mut self, tokens: &[String]) -> Result<Vec<String>, Error> {
        let mut rest = tokens;
        while let Some((token, tail)) = rest.split_first() {
            if token.len() < 2 || !token.starts_with('-') {
                break;
            }
            rest = tail;
            if token == "--" {
                break;
            }
            rest = self.parse_one(token, rest)?;
        }
        self.args = rest.to_vec();
        trace!(positional = self.args.len(), "parsed flags");
        Ok(self.args.clone())
    }

    fn parse_one<'a>(&mut self, token: &str, rest: &'a [String]) -> Result<&'a [String], Error> {
        let body = token
            .strip_prefix("--")
            .or_else(|| token.strip_prefix('-'))
            .unwrap_or(token);
        if body.is_empty() || body.starts_with(['-', '=']) {
            return Err(Error::BadFlagSyntax(token.to_owned()));
        }
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let flag = self
            .flags
            .get_mut(name)
            .ok_or_else(|| Error::UnknownFlag(name.to_owned()))?;

        let (text, rest) = match inline {
            Some(value) => (value, rest),
            None if flag.value.is_bool_flag() => ("true", rest),
            None => match rest.split_first() {
                Some((value, tail)) => (value.as_str(), tail),
                None => return Err(Error::FlagNeedsValue(name.to_owned())),
            },
        };
        flag.value
            .parse(text)
            .map_err(|source| Error::InvalidFlagValue {
                name: name.to_owned(),
                value: text.to_owned(),
                source: Box::new(source),
            })?;
        Ok(rest)
    }

    /// Write one entry per flag: name and type, then the indented usage
    /// and a non-zero default.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn print_defaults(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        for flag in self.flags.values() {
            let mut line = format!("  -{}", flag.name);
            let (type_name, usage) = flag.unquote_usage();
            if !type_name.is_empty() {
                line.push(' ');
                line.push_str(&type_name);
            }
            // Single-letter flags without a type fit on one line.
            if line.len() <= 4 {
                line.push('\t');
            } else {
                line.push_str("\n    \t");
            }
            line.push_str(&usage.replace('\n', "\n    \t"));
            if !is_zero_default(&flag.default) {
                if flag.value.type_name() == "string" {
                    line.push_str(&format!(" (default {:?})", flag.default));
                } else {
                    line.push_str(&format!(" (default {})", flag.default));
                }
            }
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }
}
