/// Errors for value parsing, argument binding, and command dispatch.
use thiserror::Error;

/// Errors detected while deriving arguments from a function signature.
///
/// These are latched by the binder and returned unchanged on every
/// dispatch attempt, so they must be cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A variadic tail was declared before another argument.
    #[error(
        "variadic argument at position {position} must be the last of {count} arguments"
    )]
    SliceNotLast {
        /// Zero-based position of the misplaced tail.
        position: usize,
        /// Total number of declared arguments.
        count: usize,
    },
}

/// Errors produced while parsing tokens or running a command tree.
#[derive(Debug, Error)]
pub enum Error {
    /// The text is not a valid representation of the target type.
    #[error("parse error")]
    Parse,

    /// The text is well formed but the magnitude does not fit the target type.
    #[error("value out of range")]
    Range,

    /// Fewer positional tokens than required arguments.
    #[error("invalid usage: not enough arguments given (want {required}, got {given})")]
    NotEnoughArguments {
        /// Number of non-variadic arguments.
        required: usize,
        /// Number of tokens supplied.
        given: usize,
    },

    /// The selector token matched no child command.
    #[error("invalid usage: unknown command '{0}'")]
    UnknownCommand(String),

    /// The command has children but no selector token was supplied.
    #[error("invalid usage: a command is required")]
    RequiredCommand,

    /// Neither a callback nor a selected child exists at run time.
    #[error("invalid usage: no callback function was provided for '{0}'")]
    NoCommandFunc(String),

    /// The callback could not be derived from its function signature.
    #[error("invalid callback: {0}")]
    Bind(#[from] BindError),

    /// A flag token named a flag that was never registered.
    #[error("flag provided but not defined: -{0}")]
    UnknownFlag(String),

    /// A flag token is malformed (e.g. `---x` or `-=v`).
    #[error("bad flag syntax: {0}")]
    BadFlagSyntax(String),

    /// A non-boolean flag appeared as the last token with no value.
    #[error("flag needs an argument: -{0}")]
    FlagNeedsValue(String),

    /// The value supplied for a flag was rejected.
    #[error("invalid value \"{value}\" for flag -{name}: {source}")]
    InvalidFlagValue {
        /// Flag name without dashes.
        name: String,
        /// The rejected text.
        value: String,
        /// The underlying value error.
        source: Box<Error>,
    },

    /// Writing usage or diagnostics to the output sink failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The command reported this error and asks the host to exit.
    #[error("{0}")]
    Terminated(Box<Error>),

    /// A failure returned by user code or a custom value, passed through.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Wrap an error returned by user code.
    ///
    /// Crate errors that travelled through `anyhow` are unwrapped so callers
    /// see the original variant.
    #[must_use]
    pub fn from_user(err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(inner) => inner,
            Err(other) => Self::Other(other),
        }
    }

    /// Whether usage text should accompany this error.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        match self {
            Self::NotEnoughArguments { .. }
            | Self::UnknownCommand(_)
            | Self::RequiredCommand
            | Self::NoCommandFunc(_)
            | Self::UnknownFlag(_)
            | Self::BadFlagSyntax(_)
            | Self::FlagNeedsValue(_)
            | Self::InvalidFlagValue { .. } => true,
            Self::Terminated(inner) => inner.is_usage(),
            _ => false,
        }
    }

    /// Return the process exit code a host should use for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Terminated(_) => 2,
            err if err.is_usage() => 2,
            _ => 1,
        }
    }
}
