/// Parameter and return-type adapters for bound functions.
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use crate::arguments::Arguments;
use crate::errors::Error;
use crate::value::{Binding, SliceValue, Value};

/// A type that can appear as a parameter of a bound function.
///
/// Registration allocates storage, registers it with the argument list,
/// and returns the handle that [`Param::extract`] reads after parsing.
pub trait Param: Sized + 'static {
    /// Storage handle kept by the binder.
    type Storage: 'static;

    /// Allocate storage and register it in `arguments`.
    fn register(arguments: &mut Arguments, description: &str) -> Self::Storage;

    /// Produce the call argument from parsed storage.
    fn extract(storage: &Self::Storage) -> Self;
}

macro_rules! scalar_param {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Param for $ty {
                type Storage = Binding<$ty>;

                fn register(arguments: &mut Arguments, description: &str) -> Self::Storage {
                    let storage = Binding::<$ty>::default();
                    arguments.var(storage.clone(), description);
                    storage
                }

                fn extract(storage: &Self::Storage) -> Self {
                    storage.get()
                }
            }
        )*
    };
}

scalar_param!(bool, isize, i64, usize, u64, f64, String, Duration);

/// A variadic tail of values; must be the last parameter.
///
/// The parsed vector is moved into the call.
impl<T> Param for Vec<T>
where
    T: Value + Default + 'static,
{
    type Storage = Binding<Vec<T>>;

    fn register(arguments: &mut Arguments, description: &str) -> Self::Storage {
        let storage = Binding::<Vec<T>>::default();
        arguments.var_slice(storage.clone(), description);
        storage
    }

    fn extract(storage: &Self::Storage) -> Self {
        storage.take()
    }
}

/// A parameter parsed through a custom [`Value`] implementation.
///
/// The value is moved into the call; storage is reset to the default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arg<V>(pub V);

impl<V: Value + Default + 'static> Param for Arg<V> {
    type Storage = Binding<V>;

    fn register(arguments: &mut Arguments, description: &str) -> Self::Storage {
        let storage = Binding::<V>::default();
        arguments.var(storage.clone(), description);
        storage
    }

    fn extract(storage: &Self::Storage) -> Self {
        Self(storage.take())
    }
}

/// A variadic tail parsed through a custom [`SliceValue`] implementation.
///
/// Must be the last parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rest<S>(pub S);

impl<S: SliceValue + Default + 'static> Param for Rest<S> {
    type Storage = Binding<S>;

    fn register(arguments: &mut Arguments, description: &str) -> Self::Storage {
        let storage = Binding::<S>::default();
        arguments.var_slice(storage.clone(), description);
        storage
    }

    fn extract(storage: &Self::Storage) -> Self {
        Self(storage.take())
    }
}

impl<V> Deref for Arg<V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.0
    }
}

impl<V> DerefMut for Arg<V> {
    fn deref_mut(&mut self) -> &mut V {
        &mut self.0
    }
}

impl<S> Deref for Rest<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.0
    }
}

impl<S> DerefMut for Rest<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.0
    }
}

/// Return types a bound function may have.
///
/// `()` never fails; a `Result` surfaces its error and discards its value.
pub trait Outcome {
    /// Convert the function result into the dispatch result.
    ///
    /// # Errors
    ///
    /// The function's own error, unwrapped to a crate `Error` when it is one.
    fn into_outcome(self) -> Result<(), Error>;
}

impl Outcome for () {
    fn into_outcome(self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T, E> Outcome for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn into_outcome(self) -> Result<(), Error> {
        self.map(drop).map_err(|err| Error::from_user(err.into()))
    }
}
