/// Ordered positional arguments: parsing and usage rendering.
use std::fmt;
use std::io::Write;

use tracing::trace;

use crate::errors::{BindError, Error};
use crate::value::{SliceValue, Value};

enum Slot {
    Scalar(Box<dyn Value>),
    Tail(Box<dyn SliceValue>),
}

/// A value paired with the description shown in usage text.
pub struct Argument {
    slot: Slot,
    description: String,
}

impl Argument {
    /// Description shown in usage text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether this argument consumes the whole token tail.
    #[must_use]
    pub fn is_tail(&self) -> bool {
        matches!(self.slot, Slot::Tail(_))
    }

    /// Canonical text of the bound value.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.slot {
            Slot::Scalar(value) => value.render(),
            Slot::Tail(value) => value.render(),
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("description", &self.description)
            .field("tail", &self.is_tail())
            .finish_non_exhaustive()
    }
}

/// Positional argument list.
///
/// Each registered value consumes one token in declaration order. A
/// variadic tail, if registered, must come last and receives every
/// remaining token in one call.
#[derive(Debug, Default)]
pub struct Arguments {
    input: Vec<String>,
    consumed: usize,
    args: Vec<Argument>,
}

impl Arguments {
    /// Create an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scalar value.
    pub fn var(&mut self, value: impl Value + 'static, description: impl Into<String>) -> &mut Self {
        self.args.push(Argument {
            slot: Slot::Scalar(Box::new(value)),
            description: description.into(),
        });
        self
    }

    /// Register the variadic tail.
    pub fn var_slice(
        &mut self,
        value: impl SliceValue + 'static,
        description: impl Into<String>,
    ) -> &mut Self {
        self.args.push(Argument {
            slot: Slot::Tail(Box::new(value)),
            description: description.into(),
        });
        self
    }

    /// Number of registered arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether no arguments are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Registered arguments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.args.iter()
    }

    /// Number of tokens required before parsing can succeed.
    #[must_use]
    pub fn required(&self) -> usize {
        self.args.iter().filter(|arg| !arg.is_tail()).count()
    }

    /// Tokens left over by the last successful [`Arguments::parse`].
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.input[self.consumed.min(self.input.len())..]
    }

    /// Check that a variadic tail, if any, is the final argument.
    ///
    /// # Errors
    ///
    /// `BindError::SliceNotLast` naming the misplaced tail.
    pub fn validate(&self) -> Result<(), BindError> {
        let count = self.args.len();
        match self.args.iter().position(Argument::is_tail) {
            Some(position) if position + 1 != count => {
                Err(BindError::SliceNotLast { position, count })
            }
            _ => Ok(()),
        }
    }

    /// Bind leading tokens to the registered values.
    ///
    /// The token count is checked before any value is touched. A value
    /// that fails aborts the walk; values bound before it keep their new
    /// contents.
    ///
    /// # Errors
    ///
    /// `Error::Bind` for a misplaced tail, `Error::NotEnoughArguments` for
    /// too few tokens, or the first value failure.
    pub fn parse(&mut self, input: &[String]) -> Result<(), Error> {
        self.validate()?;
        let required = self.required();
        if input.len() < required {
            return Err(Error::NotEnoughArguments {
                required,
                given: input.len(),
            });
        }

        self.input = input.to_vec();
        self.consumed = 0;
        for (i, arg) in self.args.iter_mut().enumerate() {
            match &mut arg.slot {
                Slot::Scalar(value) => {
                    value.parse(&input[i])?;
                    self.consumed = i + 1;
                }
                Slot::Tail(value) => {
                    value.parse(&input[i..])?;
                    self.consumed = input.len();
                    break;
                }
            }
        }
        trace!(
            consumed = self.consumed,
            remaining = self.input.len() - self.consumed,
            "parsed positional arguments"
        );
        Ok(())
    }

    /// Write the argument descriptions, space separated.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn usage(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        let line = self
            .args
            .iter()
            .map(Argument::description)
            .collect::<Vec<_>>()
            .join(" ");
        writer.write_all(line.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::value::Binding;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[derive(Default)]
    struct Noop;

    impl Value for Noop {
        fn render(&self) -> String {
            String::new()
        }

        fn parse(&mut self, _text: &str) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test]
    fn test_scalar_bindings() {
        let flag = Binding::new(false);
        let count = Binding::new(0_isize);
        let wait = Binding::new(Duration::ZERO);
        let name = Binding::new(String::new());
        let mut args = Arguments::new();
        args.var(flag.clone(), "<flag>")
            .var(count.clone(), "<count>")
            .var(wait.clone(), "<wait>")
            .var(name.clone(), "<name>");

        args.parse(&tokens(&["true", "3", "64s", "foobar"])).unwrap();
        assert!(flag.get());
        assert_eq!(count.get(), 3);
        assert_eq!(wait.get(), Duration::from_secs(64));
        assert_eq!(name.get(), "foobar");
        assert!(args.args().is_empty());
    }

    #[test]
    fn test_trailing_tokens_exposed() {
        let mut args = Arguments::new();
        args.var(Noop, "");
        args.parse(&tokens(&["true", "sub", "x"])).unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args.args(), tokens(&["sub", "x"]).as_slice());
    }

    #[test]
    fn test_not_enough_arguments() {
        let first = Binding::new(7_i64);
        let mut args = Arguments::new();
        args.var(first.clone(), "").var(Noop, "");
        let err = args.parse(&tokens(&["1"])).unwrap_err();
        assert!(matches!(
            err,
            Error::NotEnoughArguments {
                required: 2,
                given: 1
            }
        ));
        assert_eq!(first.get(), 7);

        let mut args = Arguments::new();
        args.var(Noop, "");
        assert!(matches!(
            args.parse(&[]),
            Err(Error::NotEnoughArguments { .. })
        ));
    }

    #[test]
    fn test_failure_keeps_earlier_values() {
        let first = Binding::new(0_i64);
        let second = Binding::new(0_i64);
        let mut args = Arguments::new();
        args.var(first.clone(), "").var(second.clone(), "");
        let err = args.parse(&tokens(&["5", "five"])).unwrap_err();
        assert!(matches!(err, Error::Parse));
        assert_eq!(first.get(), 5);
        assert_eq!(second.get(), 0);
    }

    #[test]
    fn test_range_error() {
        let mut args = Arguments::new();
        args.var(Binding::new(0_isize), "int");
        assert!(matches!(
            args.parse(&tokens(&["18446744073709551615"])),
            Err(Error::Range)
        ));
    }

    #[test]
    fn test_tail_consumes_everything() {
        for input in [vec![], tokens(&["1"]), tokens(&["1", "2", "3"])] {
            let lead = Binding::new(String::new());
            let rest: Binding<Vec<i64>> = Binding::default();
            let mut args = Arguments::new();
            args.var(lead.clone(), "<lead>").var_slice(rest.clone(), "n...");
            let mut full = tokens(&["head"]);
            full.extend(input.iter().cloned());

            args.parse(&full).unwrap();
            assert_eq!(lead.get(), "head");
            assert_eq!(rest.get().len(), input.len());
            assert!(args.args().is_empty());
        }
    }

    #[test]
    fn test_tail_only() {
        let rest: Binding<Vec<i64>> = Binding::default();
        let mut args = Arguments::new();
        args.var_slice(rest.clone(), "n n n n...");
        args.parse(&tokens(&["1", "2", "3"])).unwrap();
        assert_eq!(rest.get(), vec![1, 2, 3]);
    }

    #[test]
    fn test_reparse_rebinds() {
        let value = Binding::new(0_u64);
        let mut args = Arguments::new();
        args.var(value.clone(), "");
        args.parse(&tokens(&["1", "a"])).unwrap();
        args.parse(&tokens(&["2"])).unwrap();
        assert_eq!(value.get(), 2);
        assert!(args.args().is_empty());
    }

    #[test]
    fn test_tail_not_last_rejected() {
        let value = Binding::new(0_u64);
        let mut args = Arguments::new();
        args.var_slice(Vec::<i64>::new(), "n...").var(value.clone(), "<v>");
        assert_eq!(
            args.validate(),
            Err(BindError::SliceNotLast {
                position: 0,
                count: 2
            })
        );
        assert!(matches!(
            args.parse(&tokens(&["1", "2"])),
            Err(Error::Bind(_))
        ));
        assert_eq!(value.get(), 0);
    }

    #[test]
    fn test_usage() {
        let cases: [(&[&str], &str); 3] = [
            (&[], ""),
            (&["<foo>"], "<foo>"),
            (&["<foo>", "<bar>"], "<foo> <bar>"),
        ];
        for (descriptions, want) in cases {
            let mut args = Arguments::new();
            for desc in descriptions {
                args.var(Noop, *desc);
            }
            let mut out = Vec::new();
            args.usage(&mut out).unwrap();
            assert_eq!(String::from_utf8(out).unwrap(), want);
        }
    }
}
