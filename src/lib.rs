//! Streaming XML tokenizer: given a byte stream and a path-like selector,
//! produces a lazy sequence of contextual XML fragments, one per matched
//! element, reconstructed so each remains independently parseable.
//!
//! ```
//! use std::io::Cursor;
//! use xtokenize::TokenizerBuilder;
//!
//! let xml = r#"<a xmlns="u"><b><c/></b><b/></a>"#;
//! let mut cursor = TokenizerBuilder::new("/a/b")
//!     .build(Cursor::new(xml.as_bytes().to_vec()))
//!     .unwrap();
//!
//! while cursor.has_next() {
//!     println!("{}", cursor.next().unwrap());
//! }
//! ```

mod builder;
mod context;
mod engine;
mod error;
mod fragment;
mod name;
mod recorder;
mod selector;

pub use builder::TokenizerBuilder;
pub use error::TokenizeError;
pub use name::QName;

use std::io::Read;

use engine::MatchEngine;
use error::Result;

/// The public cursor contract (§4.5): `has_next`/`next` with eager
/// one-ahead computation, `close`, and a no-op `remove`.
///
/// Iteration never panics on a malformed document; per §7's redesign of
/// the original silent-swallow policy, a stream error ends iteration the
/// same as a clean end-of-stream, but is retained and can be inspected via
/// [`FragmentCursor::last_error`].
pub struct FragmentCursor<R: Read> {
    engine: MatchEngine<R>,
    pending: Option<String>,
    last_error: Option<TokenizeError>,
}

impl<R: Read> FragmentCursor<R> {
    pub(crate) fn new(mut engine: MatchEngine<R>) -> Result<Self> {
        let (pending, last_error) = Self::advance(&mut engine);
        Ok(FragmentCursor { engine, pending, last_error })
    }

    fn advance(engine: &mut MatchEngine<R>) -> (Option<String>, Option<TokenizeError>) {
        match engine.next_fragment() {
            Ok(fragment) => (fragment, None),
            Err(e) => (None, Some(e)),
        }
    }

    /// Whether a precomputed fragment is waiting.
    pub fn has_next(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the held fragment and eagerly computes its successor.
    /// Returns `None` both at clean end-of-stream and after a stream error;
    /// distinguish the two with [`FragmentCursor::last_error`].
    pub fn next(&mut self) -> Option<String> {
        let current = self.pending.take()?;
        let (pending, err) = Self::advance(&mut self.engine);
        self.pending = pending;
        if err.is_some() {
            self.last_error = err;
        }
        Some(current)
    }

    /// The error that ended iteration, if any. `None` if the stream ended
    /// cleanly or hasn't ended yet.
    pub fn last_error(&self) -> Option<&TokenizeError> {
        self.last_error.as_ref()
    }

    /// Releases the parser. The underlying byte stream is owned by the
    /// caller and outlives this call.
    pub fn close(self) {}

    /// Unsupported; present only to round out the cursor contract.
    pub fn remove(&self) {}
}

impl<R: Read> Iterator for FragmentCursor<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        FragmentCursor::next(self)
    }
}
