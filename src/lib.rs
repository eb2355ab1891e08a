#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! cmdbind: bind plain functions to positional arguments and dispatch them
//! through a tree of named subcommands.
//!
//! ```no_run
//! use cmdbind::{Command, ErrorHandling, Opt};
//!
//! let mut app = Command::new("calc", [Opt::error_handling(ErrorHandling::Report)]);
//! app.sub_command(
//!     "add",
//!     [Opt::handler(|a: i64, b: i64| println!("{}", a + b), &["<a>", "<b>"])],
//! );
//! let tokens: Vec<String> = std::env::args().skip(1).collect();
//! if let Err(err) = app.execute(&tokens) {
//!     std::process::exit(err.exit_code());
//! }
//! ```

pub mod arguments;
pub mod bind;
pub mod command;
pub mod errors;
pub mod flags;
pub mod value;

pub use arguments::{Argument, Arguments};
pub use bind::{Arg, Binder, Handler, Outcome, Param, Rest};
pub use command::{Command, CommandFunc, ErrorHandling, Opt, Settings, Sink};
pub use errors::{BindError, Error};
pub use flags::{Flag, FlagSet};
pub use value::{Binding, SliceValue, Value};
