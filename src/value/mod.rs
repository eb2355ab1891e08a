/// Value capabilities: scalar and variadic command-line values.
pub mod binding;
pub mod duration;
pub mod scalar;

pub use binding::Binding;

use crate::errors::Error;

/// One scalar command-line value.
///
/// Implementors parse a single token into themselves and render their
/// canonical text. The eight built-in scalars (`bool`, `isize`, `i64`,
/// `usize`, `u64`, `f64`, `String`, `Duration`) implement this directly;
/// any other type can plug into [`crate::Arguments`], the binder, or a
/// [`crate::FlagSet`] by implementing it.
///
/// With this trait in scope, `s.parse::<T>()` on a `String` or `&String`
/// resolves to [`Value::parse`] instead of [`str::parse`]; call
/// `s.as_str().parse::<T>()` there.
pub trait Value {
    /// Canonical text form of the current value.
    fn render(&self) -> String;

    /// Replace the current value with the one described by `text`.
    ///
    /// # Errors
    ///
    /// `Error::Parse` for malformed text, `Error::Range` for text whose
    /// magnitude does not fit. Custom values may return `Error::Other`.
    fn parse(&mut self, text: &str) -> Result<(), Error>;

    /// Whether a flag holding this value may appear without a value token.
    fn is_bool_flag(&self) -> bool {
        false
    }

    /// Short type name shown in flag usage.
    fn type_name(&self) -> &'static str {
        "value"
    }
}

/// A variadic tail value that consumes every remaining token at once.
pub trait SliceValue {
    /// Canonical text form of the current contents.
    fn render(&self) -> String;

    /// Bind the whole token tail.
    ///
    /// # Errors
    ///
    /// Returns the first element failure; no minimum length is imposed by
    /// the framework.
    fn parse(&mut self, texts: &[String]) -> Result<(), Error>;
}

/// `Vec<T>` collects each token through `T`'s own parser.
///
/// Re-parsing replaces the previous contents. On failure the vector is
/// left untouched.
impl<T: Value + Default> SliceValue for Vec<T> {
    fn render(&self) -> String {
        self.iter().map(Value::render).collect::<Vec<_>>().join(",")
    }

    fn parse(&mut self, texts: &[String]) -> Result<(), Error> {
        let mut items = Vec::with_capacity(texts.len());
        for text in texts {
            let mut item = T::default();
            item.parse(text)?;
            items.push(item);
        }
        *self = items;
        Ok(())
    }
}
