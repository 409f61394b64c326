//! Construction inputs (§6) and the C0 builder/config layer that validates
//! them before a cursor is produced, mirroring the split between
//! constructing and configuring a reader that `quick_xml::Reader` itself
//! uses (`reader.config_mut()`).

use std::collections::HashMap;
use std::io::Read;

use crate::engine::MatchEngine;
use crate::error::{Result, TokenizeError};
use crate::selector::Selector;
use crate::FragmentCursor;

/// Collects a selector path, a prefix→URI map, the wrap/inject choice, an
/// optional explicit charset, and builds a [`FragmentCursor`] over a given
/// byte stream.
#[derive(Debug, Default, Clone)]
pub struct TokenizerBuilder {
    path: String,
    prefixes: HashMap<String, String>,
    wrap: bool,
    charset: Option<String>,
}

impl TokenizerBuilder {
    /// Starts a builder for `path`. The path is not compiled until
    /// [`TokenizerBuilder::build`] is called, so namespace prefixes can
    /// still be registered afterwards.
    pub fn new(path: impl Into<String>) -> Self {
        TokenizerBuilder {
            path: path.into(),
            prefixes: HashMap::new(),
            wrap: false,
            charset: None,
        }
    }

    /// Registers a namespace prefix used in the path, e.g.
    /// `.namespace("x", "urn:example")` for a `/x:item` segment.
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), uri.into());
        self
    }

    /// `true` selects wrap mode (ancestor chain reconstructed as opening
    /// tags); `false` (the default) selects inject mode.
    pub fn wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Forces decoding under the named charset (any label `encoding_rs`
    /// recognizes, e.g. `"windows-1252"`), overriding the reader's own
    /// BOM/XML-declaration sniffing. Left unset, the charset is inferred
    /// from the stream, per spec §6.
    pub fn charset(mut self, name: impl Into<String>) -> Self {
        self.charset = Some(name.into());
        self
    }

    /// Compiles the selector and wraps `input` in a [`FragmentCursor`].
    pub fn build<R: Read>(self, input: R) -> Result<FragmentCursor<R>> {
        let selector = Selector::compile(&self.path, &self.prefixes)?;
        let charset = match &self.charset {
            Some(name) => Some(
                encoding_rs::Encoding::for_label(name.as_bytes())
                    .ok_or_else(|| TokenizeError::UnknownCharset(name.clone()))?,
            ),
            None => None,
        };
        let engine = MatchEngine::new(input, selector, self.wrap, charset)?;
        FragmentCursor::new(engine)
    }
}
