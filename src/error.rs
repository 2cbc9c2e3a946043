//! # Errors

/// The crate-wide error type. Every fallible system call, file operation and terminal query is
/// converted into this type, so that `?` can be used end to end from `main` down to the platform
/// shim.
#[derive(Debug)]
pub enum Error {
    /// Wrapper around `std::io::Error`.
    Io(std::io::Error),
    /// The window size obtained through a system call (or its cursor-position fallback) was
    /// invalid, e.g. zero rows or columns.
    InvalidWindowSize,
    /// The response to a cursor position query could not be parsed.
    CursorPosition,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self { Self::Io(err) }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self { Self::Io(std::io::Error::other(err)) }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::InvalidWindowSize => write!(f, "could not determine the terminal window size"),
            Self::CursorPosition => write!(f, "could not parse the cursor position report"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::InvalidWindowSize | Self::CursorPosition => None,
        }
    }
}
