mod adhoc;
mod configuration;
mod domain_builder;
mod invalid_stored_model;
mod unable_to_create_key;
mod upgrade;

use adhoc::AdhocError;
use configuration::ConfigurationError;
use domain_builder::DomainBuilderError;
use invalid_stored_model::InvalidStoredModelError;
use unable_to_create_key::UnableToCreateKeyError;
use upgrade::UpgradeError;

use std::fmt;
use std::sync::Arc;

/// Returns early with an ad-hoc error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error raised while building or using a domain model.
///
/// The error is a single pointer. Errors form a chain: each error may carry
/// the error that caused it, and `Display` renders the chain outermost
/// first, separated by `": "`.
#[derive(Clone)]
pub struct Error {
    inner: Arc<ErrorInner>,
}

struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    Configuration(ConfigurationError),
    DomainBuilder(DomainBuilderError),
    InvalidStoredModel(InvalidStoredModelError),
    UnableToCreateKey(UnableToCreateKeyError),
    Upgrade(UpgradeError),
}

/// Conversion into an [`Error`], used by [`Error::context`].
pub trait IntoError {
    fn into_error(self) -> Error;
}

impl Error {
    /// Wraps this error in `consequent`, which becomes the outermost error
    /// of the chain. The kind of the result is the kind of `consequent`.
    pub fn context(self, consequent: impl IntoError) -> Error {
        let mut outer = consequent.into_error();

        if let Some(inner) = Arc::get_mut(&mut outer.inner) {
            if inner.cause.is_none() {
                inner.cause = Some(self);
                return outer;
            }
        }

        // `consequent` is shared or already chained: keep its message and
        // start a new link.
        Error::with_cause(
            ErrorKind::Adhoc(AdhocError::from_args(format_args!("{outer}"))),
            self,
        )
    }

    /// Creates an ad-hoc error from format arguments.
    pub fn from_args(args: fmt::Arguments<'_>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::from_args(args)))
    }

    /// The error this one wraps, if any.
    pub fn cause(&self) -> Option<&Error> {
        self.inner.cause.as_ref()
    }

    fn with_cause(kind: ErrorKind, cause: Error) -> Error {
        Error {
            inner: Arc::new(ErrorInner {
                kind,
                cause: Some(cause),
            }),
        }
    }

    fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }

    /// This error followed by its causes.
    fn chain(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |err| err.cause())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Some(cause) = self.cause() {
            return Some(cause);
        }

        match self.kind() {
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.chain().enumerate() {
            if i > 0 {
                f.write_str(": ")?;
            }
            fmt::Display::fmt(err.kind(), f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.debug_struct("Error")
                .field("kind", self.kind())
                .field("cause", &self.cause())
                .finish()
        } else {
            fmt::Display::fmt(self, f)
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anyhow(err) => fmt::Display::fmt(err, f),
            Self::Adhoc(err) => fmt::Display::fmt(err, f),
            Self::Configuration(err) => fmt::Display::fmt(err, f),
            Self::DomainBuilder(err) => fmt::Display::fmt(err, f),
            Self::InvalidStoredModel(err) => fmt::Display::fmt(err, f),
            Self::UnableToCreateKey(err) => fmt::Display::fmt(err, f),
            Self::Upgrade(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Arc::new(ErrorInner { kind, cause: None }),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        anyhow::Error::from(err).into()
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        anyhow::Error::from(err).into()
    }
}

impl IntoError for Error {
    fn into_error(self) -> Error {
        self
    }
}
