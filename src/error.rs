//! Error taxonomy (§7): argument errors and parser-contract errors are raised
//! synchronously at construction; XML stream errors surface through
//! [`crate::FragmentCursor::last_error`] instead of being swallowed.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum TokenizeError {
    /// The path string was empty.
    EmptyPath,
    /// The path string compiled to an invalid selector (e.g. a trailing or
    /// doubled descendant-or-self axis).
    MalformedSelector(String),
    /// `TokenizerBuilder::charset` was given a name `encoding_rs` does not
    /// recognize.
    UnknownCharset(String),
    /// The underlying reader did not start at character offset zero.
    ReaderWithoutLocation,
    /// The input ended mid-element.
    UnexpectedEof,
    /// A malformed-XML error surfaced by the underlying parser.
    Xml(quick_xml::Error),
    /// The recorded byte window could not be decoded under the configured
    /// charset.
    Decode(String),
    /// An I/O error, typically encountered while closing the stream.
    Io(io::Error),
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizeError::EmptyPath => write!(f, "selector path must not be empty"),
            TokenizeError::MalformedSelector(msg) => write!(f, "malformed selector: {msg}"),
            TokenizeError::UnknownCharset(name) => write!(f, "unknown charset: {name}"),
            TokenizeError::ReaderWithoutLocation => {
                write!(f, "underlying reader does not start at offset 0")
            }
            TokenizeError::UnexpectedEof => write!(f, "unexpected end of document"),
            TokenizeError::Xml(e) => write!(f, "XML error: {e}"),
            TokenizeError::Decode(msg) => write!(f, "decode error: {msg}"),
            TokenizeError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for TokenizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TokenizeError::Xml(e) => Some(e),
            TokenizeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for TokenizeError {
    fn from(e: quick_xml::Error) -> Self {
        TokenizeError::Xml(e)
    }
}

impl From<io::Error> for TokenizeError {
    fn from(e: io::Error) -> Self {
        TokenizeError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, TokenizeError>;
