use std::result::Result as StdResult;

use arrow::error::ArrowError;

/// A specialized `Result` type for the COPY codec.
pub type Result<T> = StdResult<T, Error>;

/// Represents all the ways the COPY codec and the type resolver can fail.
///
/// None of these are recovered from internally: a failure aborts the current stream.
/// Reaching the end of the data is not an error; see [`ReadStatus`][crate::ReadStatus]
/// and [`WriteStatus`][crate::WriteStatus].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The binary COPY stream does not follow the wire format: bad signature, a field
    /// length that disagrees with the bytes its value occupies, an invalid sign code, etc.
    #[error("malformed COPY stream: {0}")]
    MalformedStream(String),

    /// The input ended in the middle of a field.
    ///
    /// The stream reader leaves its cursor at the start of the record, so the caller may
    /// supply more bytes and retry.
    #[error("unexpected end of input (expected {expected} bytes but found {remaining})")]
    UnexpectedEof { expected: usize, remaining: usize },

    /// No codec exists between a database type and an Arrow type.
    #[error("can't convert {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    /// A type, class or array type was looked up (or referenced) but never registered.
    #[error("Netezza {what} with oid {oid} not found")]
    UnknownCatalogReference { what: &'static str, oid: u32 },

    /// A temporal value could not be converted between units without overflowing `i64`.
    #[error("numeric overflow: {0}")]
    NumericOverflow(String),

    /// A value cannot be represented in the wire format of its target type.
    #[error("error occurred while encoding: {0}")]
    Encode(String),

    /// An orchestrator operation was called out of order.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Error occurred while decoding a value for a specific column.
    #[error("error occurred while decoding column {index} (`{name}`): {source}")]
    ColumnDecode {
        index: usize,
        name: String,

        #[source]
        source: Box<Error>,
    },

    /// Error occurred while encoding a value from a specific column.
    #[error("error occurred while encoding column {index} (`{name}`) of row {row}: {source}")]
    ColumnEncode {
        index: usize,
        name: String,
        row: usize,

        #[source]
        source: Box<Error>,
    },

    /// Error returned by Arrow while assembling or inspecting arrays.
    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

impl Error {
    /// Strips column context wrappers and returns the error that caused them.
    pub fn innermost(&self) -> &Error {
        match self {
            Error::ColumnDecode { source, .. } | Error::ColumnEncode { source, .. } => {
                source.innermost()
            }
            other => other,
        }
    }

    /// Returns `true` if the stream itself is corrupt (including truncation).
    pub fn is_malformed(&self) -> bool {
        matches!(
            self.innermost(),
            Error::MalformedStream(_) | Error::UnexpectedEof { .. }
        )
    }

    /// Returns `true` if the input simply ran out before the record was complete.
    pub fn is_incomplete(&self) -> bool {
        matches!(self.innermost(), Error::UnexpectedEof { .. })
    }

    #[inline]
    pub(crate) fn unsupported(from: impl ToString, to: impl ToString) -> Self {
        Error::UnsupportedConversion {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

// Format an error message as a `MalformedStream` error
macro_rules! err_malformed {
    ($expr:expr) => {
        $crate::error::Error::MalformedStream($expr.into())
    };

    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::MalformedStream(format!($fmt, $($arg)*))
    };
}

// Format an error message as a `NumericOverflow` error
macro_rules! err_overflow {
    ($($arg:tt)*) => {
        $crate::error::Error::NumericOverflow(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn innermost_unwraps_column_context() {
        let err = Error::ColumnDecode {
            index: 1,
            name: "b".into(),
            source: Box::new(Error::UnexpectedEof {
                expected: 4,
                remaining: 2,
            }),
        };

        assert!(err.is_malformed());
        assert!(err.is_incomplete());
        assert!(matches!(err.innermost(), Error::UnexpectedEof { expected: 4, .. }));
        assert_eq!(
            err.to_string(),
            "error occurred while decoding column 1 (`b`): unexpected end of input (expected 4 bytes but found 2)"
        );
    }

    #[test]
    fn overflow_is_not_malformed() {
        let err = Error::NumericOverflow("too big".into());

        assert!(!err.is_malformed());
        assert!(!err.is_incomplete());
    }
}
