//! Errors that can occur in the `bsonpath` crate.

use thiserror::Error;

use crate::spec::ElementType;

/// Alias for `std::result::Result<T, bsonpath::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `bsonpath` crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The byte offset at which the error was detected, if known. For JSON
    /// errors this is an offset into the normalized UTF-8 text.
    pub offset: Option<usize>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(key) = self.key.as_deref() {
            write!(f, "error at key \"{key}\": ")?;
        } else if let Some(offset) = self.offset {
            write!(f, "error at byte offset {offset}: ")?;
        }

        write!(f, "{}", self.kind)
    }
}

/// The types of errors that can occur in the `bsonpath` crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A tag byte outside the recognized set was encountered, or the bytes
    /// cannot form a complete element of the claimed type.
    #[error("invalid element type: 0x{tag:02x}")]
    InvalidElementType {
        /// The offending tag byte.
        tag: u8,
    },

    /// An element payload's length is inconsistent with its size prefix or
    /// with its type's fixed size.
    #[error("invalid element size: {message}")]
    InvalidElementSize {
        /// A message describing the inconsistency.
        message: String,
    },

    /// A typed accessor was used on an element of a different type.
    #[error("incompatible element conversion: expected {expected:?}, got {actual:?}")]
    IncompatibleElementConversion {
        /// The type the accessor expected.
        expected: ElementType,
        /// The element's actual type.
        actual: ElementType,
    },

    /// A native value cannot be encoded into or decoded from the requested
    /// element type.
    #[error("incompatible type conversion: {message}")]
    IncompatibleTypeConversion {
        /// A message describing the mismatch.
        message: String,
    },

    /// A document header's size disagrees with the actual bytes.
    #[error("invalid document size: {message}")]
    InvalidDocumentSize {
        /// A message describing the disagreement.
        message: String,
    },

    /// An element name or document key contains an interior NUL byte.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// A message describing the offending key.
        message: String,
    },

    /// Invalid UTF-8 bytes were encountered where UTF-8 was required.
    #[error("invalid UTF-8")]
    Utf8Encoding,

    /// JSON text could not be parsed.
    #[error("JSON: {kind}")]
    Json {
        /// The kind of JSON error that occurred.
        kind: JsonErrorKind,
    },

    /// A path expression could not be parsed or compiled.
    #[error("expression: {message}")]
    Expression {
        /// A message describing the failure.
        message: String,
    },

    /// A [`std::io::Error`] occurred while writing output.
    #[error("an IO error occurred: {0}")]
    Io(#[from] std::io::Error),
}

/// The ways JSON text can fail to parse.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JsonErrorKind {
    /// A token appeared somewhere the grammar does not allow it.
    #[error("unexpected token: {message}")]
    UnexpectedToken {
        /// What was found, and where it was unexpected.
        message: String,
    },

    /// Input ended inside a string literal.
    #[error("unterminated string")]
    UnterminatedString,

    /// A backslash escape was not in the supported set, or a `\u` escape was
    /// malformed (including unpaired surrogates).
    #[error("invalid escape: {message}")]
    InvalidEscape {
        /// A message describing the escape.
        message: String,
    },

    /// The input was not valid in its detected character encoding.
    #[error("invalid UTF-8 input")]
    InvalidUtf8,

    /// A number literal cannot be represented.
    #[error("number out of range: {literal}")]
    NumberOutOfRange {
        /// The offending literal.
        literal: String,
    },

    /// Input ended before the document was complete.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Non-whitespace input remained after the top-level value.
    #[error("garbage after document")]
    GarbageAfterDocument,
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            offset: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        ErrorKind::Io(value).into()
    }
}

impl Error {
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub(crate) fn invalid_element_type(tag: u8) -> Self {
        ErrorKind::InvalidElementType { tag }.into()
    }

    pub(crate) fn invalid_element_size(message: impl ToString) -> Self {
        ErrorKind::InvalidElementSize {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn incompatible_element_conversion(
        expected: ElementType,
        actual: ElementType,
    ) -> Self {
        ErrorKind::IncompatibleElementConversion { expected, actual }.into()
    }

    pub(crate) fn incompatible_type_conversion(message: impl ToString) -> Self {
        ErrorKind::IncompatibleTypeConversion {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn invalid_document_size(message: impl ToString) -> Self {
        ErrorKind::InvalidDocumentSize {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn invalid_key(message: impl ToString) -> Self {
        ErrorKind::InvalidKey {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn utf8_encoding() -> Self {
        ErrorKind::Utf8Encoding.into()
    }

    pub(crate) fn json(kind: JsonErrorKind, offset: usize) -> Self {
        Error::from(ErrorKind::Json { kind }).with_offset(offset)
    }

    pub(crate) fn expression(message: impl ToString) -> Self {
        ErrorKind::Expression {
            message: message.to_string(),
        }
        .into()
    }

    /// Whether this error is an [`ErrorKind::InvalidElementType`].
    pub fn is_invalid_element_type(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidElementType { .. })
    }

    /// Whether this error is an [`ErrorKind::InvalidElementSize`].
    pub fn is_invalid_element_size(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidElementSize { .. })
    }

    /// Whether this error is an [`ErrorKind::IncompatibleElementConversion`].
    pub fn is_incompatible_element_conversion(&self) -> bool {
        matches!(self.kind, ErrorKind::IncompatibleElementConversion { .. })
    }

    /// Whether this error is an [`ErrorKind::IncompatibleTypeConversion`].
    pub fn is_incompatible_type_conversion(&self) -> bool {
        matches!(self.kind, ErrorKind::IncompatibleTypeConversion { .. })
    }

    /// Whether this error is an [`ErrorKind::InvalidDocumentSize`].
    pub fn is_invalid_document_size(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidDocumentSize { .. })
    }

    /// Whether this error is an [`ErrorKind::InvalidKey`].
    pub fn is_invalid_key(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidKey { .. })
    }
}
