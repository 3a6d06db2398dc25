mod adhoc;
mod configuration;
mod field_access;
mod materialization;
mod query_compilation;
mod stalled;

use adhoc::AdhocError;
use configuration::ConfigurationError;
use field_access::FieldAccessError;
use materialization::MaterializationError;
use query_compilation::QueryCompilationError;
use stalled::StalledError;

use std::sync::Arc;

/// Return early with a formatted error.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Create an [`Error`] from a formatted message.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur in Loam.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    Configuration(ConfigurationError),
    QueryCompilation(QueryCompilationError),
    Materialization(MaterializationError),
    FieldAccess(FieldAccessError),
    Stalled(StalledError),
    Unknown,
}

impl Error {
    #[doc(hidden)]
    pub fn from_args(args: std::fmt::Arguments<'_>) -> Self {
        Self::from(ErrorKind::Adhoc(AdhocError::new(args.to_string())))
    }

    /// A fatal mapping misconfiguration, raised during schema resolution.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::from(ErrorKind::Configuration(ConfigurationError::new(
            message.into(),
        )))
    }

    /// A statement that cannot be compiled, raised by `build`.
    pub fn query_compilation(message: impl Into<String>) -> Self {
        Self::from(ErrorKind::QueryCompilation(QueryCompilationError::new(
            message.into(),
        )))
    }

    /// A row that cannot be decoded into an instance.
    pub fn materialization(message: impl Into<String>) -> Self {
        Self::from(ErrorKind::Materialization(MaterializationError::new(
            message.into(),
        )))
    }

    /// A get/set against a field the entity does not declare.
    pub fn field_access(message: impl Into<String>) -> Self {
        Self::from(ErrorKind::FieldAccess(FieldAccessError::new(
            message.into(),
        )))
    }

    /// A resolution task that exceeded its deadline, usually because the
    /// fact it blocks on is never published.
    pub fn stalled(task: impl Into<String>) -> Self {
        Self::from(ErrorKind::Stalled(StalledError::new(task.into())))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration(_))
    }

    pub fn is_query_compilation(&self) -> bool {
        matches!(self.kind(), ErrorKind::QueryCompilation(_))
    }

    pub fn is_materialization(&self) -> bool {
        matches!(self.kind(), ErrorKind::Materialization(_))
    }

    pub fn is_field_access(&self) -> bool {
        matches!(self.kind(), ErrorKind::FieldAccess(_))
    }

    pub fn is_stalled(&self) -> bool {
        matches!(self.kind(), ErrorKind::Stalled(_))
    }

    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context
    /// is shown first, followed by earlier context, ending with the root
    /// cause.
    #[inline(always)]
    pub fn context(self, consequent: Error) -> Error {
        self.context_impl(consequent)
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;
        if err.inner.is_none() {
            err = Error::from(ErrorKind::Unknown);
        }
        let inner = err.inner.as_mut().unwrap();
        assert!(
            inner.cause.is_none(),
            "consequent error must not already have a cause"
        );
        Arc::get_mut(inner).unwrap().cause = Some(self);
        err
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            Configuration(err) => core::fmt::Display::fmt(err, f),
            QueryCompilation(err) => core::fmt::Display::fmt(err, f),
            Materialization(err) => core::fmt::Display::fmt(err, f),
            FieldAccess(err) => core::fmt::Display::fmt(err, f),
            Stalled(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown loam error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}
