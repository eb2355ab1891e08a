/// Function binder: derive positional arguments from a function signature.
///
/// Every parameter type implements [`Param`], which decides how the
/// parameter is stored and registered. Scalars bind one token each;
/// `Vec<T>` and [`Rest`] bind the whole tail and must come last; [`Arg`]
/// wraps custom [`crate::Value`] types. A misplaced tail is detected when
/// the binder is built and reported on every dispatch.
pub mod param;

pub use param::{Arg, Outcome, Param, Rest};

use std::fmt;

use tracing::{debug, trace};

use crate::arguments::Arguments;
use crate::errors::{BindError, Error};

type Invoke = Box<dyn FnMut() -> Result<(), Error>>;

/// A function bound to an argument list.
pub struct Binder {
    arguments: Arguments,
    invoke: Invoke,
    latched: Option<BindError>,
}

impl Binder {
    /// Bind `handler`, taking parameter descriptions positionally.
    ///
    /// Missing descriptions default to the empty string.
    pub fn new<H, P>(handler: H, descriptions: &[&str]) -> Self
    where
        H: Handler<P>,
    {
        handler.into_binder(descriptions)
    }

    fn from_parts(arguments: Arguments, invoke: Invoke) -> Self {
        let latched = arguments.validate().err();
        if let Some(err) = &latched {
            debug!(%err, "callback rejected at bind time");
        }
        Self {
            arguments,
            invoke,
            latched,
        }
    }

    /// The argument list derived from the function's parameters.
    #[must_use]
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// The construction error, if the signature was rejected.
    #[must_use]
    pub fn error(&self) -> Option<&BindError> {
        self.latched.as_ref()
    }

    /// Bind leading tokens to the parameters and return the rest.
    ///
    /// # Errors
    ///
    /// The latched construction error, or the argument parse failure.
    pub fn parse(&mut self, tokens: &[String]) -> Result<Vec<String>, Error> {
        if let Some(err) = &self.latched {
            return Err(err.clone().into());
        }
        self.arguments.parse(tokens)?;
        Ok(self.arguments.args().to_vec())
    }

    /// Call the function with the values bound by the last parse.
    ///
    /// # Errors
    ///
    /// The latched construction error, or whatever the function returned.
    pub fn invoke(&mut self) -> Result<(), Error> {
        if let Some(err) = &self.latched {
            return Err(err.clone().into());
        }
        (self.invoke)()
    }

    /// Parse `tokens`, invoke the function, and return the unconsumed tail.
    ///
    /// # Errors
    ///
    /// Construction, parse, or function errors, unchanged.
    pub fn dispatch(&mut self, name: &str, tokens: &[String]) -> Result<Vec<String>, Error> {
        let rest = self.parse(tokens)?;
        trace!(command = name, "invoking bound callback");
        self.invoke()?;
        Ok(rest)
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("arguments", &self.arguments)
            .field("latched", &self.latched)
            .finish_non_exhaustive()
    }
}

/// Functions that can be turned into a [`Binder`].
///
/// Implemented for `FnMut` closures and functions of up to eight
/// [`Param`] parameters returning an [`Outcome`].
pub trait Handler<P>: 'static {
    /// Build the argument list and the call closure.
    fn into_binder(self, descriptions: &[&str]) -> Binder;
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnMut($($ty),*) -> R + 'static,
            R: Outcome,
            $($ty: Param,)*
        {
            fn into_binder(mut self, descriptions: &[&str]) -> Binder {
                let mut arguments = Arguments::new();
                let mut descriptions = descriptions.iter().copied();
                $(
                    let $ty = $ty::register(&mut arguments, descriptions.next().unwrap_or(""));
                )*
                let invoke = move || (self)($($ty::extract(&$ty)),*).into_outcome();
                Binder::from_parts(arguments, Box::new(invoke))
            }
        }
    };
}

impl_handler!();
impl_handler!(A1);
impl_handler!(A1, A2);
impl_handler!(A1, A2, A3);
impl_handler!(A1, A2, A3, A4);
impl_handler!(A1, A2, A3, A4, A5);
impl_handler!(A1, A2, A3, A4, A5, A6);
impl_handler!(A1, A2, A3, A4, A5, A6, A7);
impl_handler!(A1, A2, A3, A4, A5, A6, A7, A8);
