use thiserror::Error;

/// Error type shared by all keyprobe crates.
///
/// The kind is boxed to keep `Result<T>` one pointer wide on the error path.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("{name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("operation not allowed: {name}")]
    InvalidOperation { name: String },

    #[error("{element} failed checksum verification")]
    ChecksumMismatch { element: String },

    #[error("malformed {element}{}{message}", if message.is_empty() { "" } else { ": " })]
    InvalidFormat { element: String, message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("no committed index found at '{path}'")]
    IndexNotFound { path: String },

    #[error(
        "{trial} lookup matched {actual}{} documents, expected {expected}",
        if *exact { "" } else { " or more" })]
    HitCountMismatch {
        trial: String,
        expected: u64,
        actual: u64,
        exact: bool,
    },
}

impl Error {
    fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error::new(ErrorKind::InvalidArgument {
            name: name.into(),
            message: message.into(),
        })
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error::new(ErrorKind::InvalidOperation { name: name.into() })
    }

    pub fn checksum_mismatch(element: impl Into<String>) -> Error {
        Error::new(ErrorKind::ChecksumMismatch {
            element: element.into(),
        })
    }

    pub fn invalid_format(element: impl Into<String>) -> Error {
        Error::new(ErrorKind::InvalidFormat {
            element: element.into(),
            message: String::new(),
        })
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error::new(ErrorKind::Io {
            context: context.into(),
            source,
        })
    }

    pub fn index_not_found(path: impl Into<String>) -> Error {
        Error::new(ErrorKind::IndexNotFound { path: path.into() })
    }

    pub fn hit_count_mismatch(
        trial: impl Into<String>,
        expected: u64,
        actual: u64,
        exact: bool,
    ) -> Error {
        Error::new(ErrorKind::HitCountMismatch {
            trial: trial.into(),
            expected,
            actual,
            exact,
        })
    }

    /// Whether this is a failed lookup verification (as opposed to I/O or corruption).
    pub fn is_verification_failure(&self) -> bool {
        matches!(*self.0, ErrorKind::HitCountMismatch { .. })
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("i/o", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_count_mismatch_message() {
        let err = Error::hit_count_mismatch("string", 1000, 999, true);
        assert!(err.is_verification_failure());
        assert_eq!(
            err.to_string(),
            "string lookup matched 999 documents, expected 1000"
        );

        let err = Error::hit_count_mismatch("numeric", 10, 6, false);
        assert_eq!(
            err.to_string(),
            "numeric lookup matched 6 or more documents, expected 10"
        );
    }

    #[test]
    fn test_format_messages() {
        assert_eq!(
            Error::invalid_format("segment trailer").to_string(),
            "malformed segment trailer"
        );
        let err: Error = ErrorKind::InvalidFormat {
            element: "postings".into(),
            message: "offsets not increasing".into(),
        }
        .into();
        assert_eq!(err.to_string(), "malformed postings: offsets not increasing");
        assert_eq!(
            Error::checksum_mismatch("manifest").to_string(),
            "manifest failed checksum verification"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let err: Error = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert!(matches!(err.kind(), ErrorKind::Io { .. }));
        assert!(!err.is_verification_failure());
    }
}
