/// Shared storage handles for bound values.
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{SliceValue, Value};
use crate::errors::Error;

/// A bound variable: shared, single-threaded storage for a parsed value.
///
/// Registering a `Binding` with [`crate::Arguments`] or a
/// [`crate::FlagSet`] hands the parser a clone of the handle; the caller
/// keeps another clone and reads the value back after parsing.
pub struct Binding<T>(Rc<RefCell<T>>);

impl<T> Binding<T> {
    /// Create a binding holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Overwrite the stored value.
    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    /// Replace the stored value, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    /// Run `f` against a borrow of the stored value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow())
    }
}

impl<T: Clone> Binding<T> {
    /// Copy of the stored value.
    #[must_use]
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T: Default> Binding<T> {
    /// Move the stored value out, leaving the default behind.
    #[must_use]
    pub fn take(&self) -> T {
        self.0.take()
    }
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Default> Default for Binding<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&self.0.borrow()).finish()
    }
}

impl<T: Value> Value for Binding<T> {
    fn render(&self) -> String {
        self.0.borrow().render()
    }

    fn parse(&mut self, text: &str) -> Result<(), Error> {
        self.0.borrow_mut().parse(text)
    }

    fn is_bool_flag(&self) -> bool {
        self.0.borrow().is_bool_flag()
    }

    fn type_name(&self) -> &'static str {
        self.0.borrow().type_name()
    }
}

impl<T: SliceValue> SliceValue for Binding<T> {
    fn render(&self) -> String {
        self.0.borrow().render()
    }

    fn parse(&mut self, texts: &[String]) -> Result<(), Error> {
        self.0.borrow_mut().parse(texts)
    }
}
