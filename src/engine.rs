//! Match engine (C4): drives the pull loop against the compiled selector,
//! maintaining the context stacks (C3) and invoking the fragment builder
//! (C5) on a match.

use std::io::{BufReader, Read};

use encoding_rs::Encoding;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::context::Context;
use crate::error::{Result, TokenizeError};
use crate::fragment;
use crate::name::QName;
use crate::recorder::{RecordingReader, RecordingSink};
use crate::selector::Selector;

enum OpenOutcome {
    /// This is the bottom of the selector: a match was found.
    Matched,
    /// Selector index advanced (or held, on a descendant axis); keep
    /// descending through this element's children normally.
    Continue,
    /// No match and not waiting on a descendant axis: this element's
    /// subtree must be consumed without further selector evaluation.
    Skip,
}

/// Owns the pull parser, the recording window, the selector's cursor state,
/// and the context stacks. `FragmentCursor` (in `lib.rs`) wraps this with
/// the public one-ahead iteration contract.
pub struct MatchEngine<R: Read> {
    reader: NsReader<BufReader<RecordingReader<R>>>,
    sink: RecordingSink,
    selector: Selector,
    wrap: bool,
    charset: Option<&'static Encoding>,
    index: usize,
    /// Selector index captured on entry to each still-open element, in
    /// nesting order; restored verbatim when that element's `END` is
    /// processed. This is what lets `index` correctly return to its prior
    /// value on a subtree that descended (matched a non-bottom segment) but
    /// never found a bottom match anywhere inside it.
    index_stack: Vec<usize>,
    depth: u64,
    backtrack: bool,
    consumed: usize,
    ctx: Context,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: Read> MatchEngine<R> {
    pub fn new(input: R, selector: Selector, wrap: bool, charset: Option<&'static Encoding>) -> Result<Self> {
        let sink = RecordingSink::new();
        let recording = RecordingReader::new(input, sink.clone());
        let reader = NsReader::from_reader(BufReader::new(recording));

        if reader.buffer_position() != 0 {
            return Err(TokenizeError::ReaderWithoutLocation);
        }

        Ok(MatchEngine {
            reader,
            sink,
            wrap,
            charset,
            index: 0,
            index_stack: Vec::new(),
            depth: 0,
            backtrack: false,
            consumed: 0,
            ctx: Context::new(wrap),
            selector,
            buf: Vec::new(),
            finished: false,
        })
    }

    /// Runs the pull loop until the next fragment is produced, or the
    /// document ends. `Ok(None)` means clean end-of-stream; an `Err` means
    /// the underlying parser choked partway through.
    pub fn next_fragment(&mut self) -> Result<Option<String>> {
        if self.finished {
            return Ok(None);
        }
        loop {
            self.buf.clear();
            let (resolved, event) = self.reader.read_resolved_event_into(&mut self.buf)?;
            match event {
                Event::Eof => {
                    self.finished = true;
                    return Ok(None);
                }
                Event::Start(start) => {
                    let name = self.resolve_name(start.name(), resolved);
                    let declared = self.declared_bindings(&start)?;
                    let text = self.capture_window()?;
                    match self.open(name.clone(), text.clone(), declared) {
                        OpenOutcome::Matched => {
                            let fragment = self.finish_match(name, text)?;
                            return Ok(Some(fragment));
                        }
                        OpenOutcome::Continue => {}
                        OpenOutcome::Skip => self.finish_skip(name)?,
                    }
                }
                Event::Empty(start) => {
                    let name = self.resolve_name(start.name(), resolved);
                    let declared = self.declared_bindings(&start)?;
                    let text = self.capture_window()?;
                    match self.open(name.clone(), text.clone(), declared) {
                        OpenOutcome::Matched => {
                            let fragment = self.build_fragment(&name, &text);
                            self.close_element(&name);
                            return Ok(Some(fragment));
                        }
                        OpenOutcome::Continue | OpenOutcome::Skip => {
                            self.close_element(&name);
                        }
                    }
                }
                Event::End(end) => {
                    let name = self.resolve_name(end.name(), resolved);
                    // No verbatim text is captured on END (§4.3); the window
                    // since the last checkpoint belongs to whatever follows.
                    self.close_element(&name);
                }
                _ => {}
            }
        }
    }

    fn resolve_name(&self, raw: quick_xml::name::QName<'_>, resolved: ResolveResult) -> QName {
        let local = String::from_utf8_lossy(raw.local_name().as_ref()).into_owned();
        let prefix = raw
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned())
            .unwrap_or_default();
        let namespace_uri = match resolved {
            ResolveResult::Bound(ns) => String::from_utf8_lossy(ns.into_inner()).into_owned(),
            ResolveResult::Unbound => String::new(),
            ResolveResult::Unknown(raw_prefix) => String::from_utf8_lossy(&raw_prefix).into_owned(),
        };
        QName::new(namespace_uri, local, prefix)
    }

    fn declared_bindings(&self, start: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
        let mut out = Vec::new();
        for attr in start.attributes().with_checks(false) {
            let attr = attr.map_err(|e| TokenizeError::Xml(quick_xml::Error::InvalidAttr(e)))?;
            let key = attr.key.as_ref();
            if key == b"xmlns" {
                let value = self.decode(attr.value.as_ref())?;
                out.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
                let prefix = String::from_utf8_lossy(prefix).into_owned();
                let value = self.decode(attr.value.as_ref())?;
                out.push((prefix, value));
            }
        }
        Ok(out)
    }

    /// Decodes `bytes` using the explicit charset from
    /// [`crate::TokenizerBuilder::charset`] if one was set, otherwise the
    /// reader's own auto-detected decoder (BOM/XML-declaration sniffing).
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        if let Some(encoding) = self.charset {
            let (text, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                return Err(TokenizeError::Decode(format!(
                    "invalid {} byte sequence",
                    encoding.name()
                )));
            }
            return Ok(text.into_owned());
        }
        self.reader
            .decoder()
            .decode(bytes)
            .map(|s| s.into_owned())
            .map_err(|e| TokenizeError::Decode(e.to_string()))
    }

    /// The text since the last checkpoint, up to and including the event
    /// just read (`get-text` + `record()` combined, §4.2).
    fn capture_window(&mut self) -> Result<String> {
        let offset = self.reader.buffer_position();
        let bytes = self.sink.text_to(offset);
        let text = self.decode(&bytes)?;
        self.sink.checkpoint(offset);
        self.consumed = offset;
        Ok(text)
    }

    /// Steps 1-9 of START processing (§4.3), minus the raw subtree capture,
    /// which the caller performs based on the returned outcome.
    fn open(&mut self, name: QName, text: String, declared: Vec<(String, String)>) -> OpenOutcome {
        // Remember the index this element was evaluated against, so its own
        // `END` can restore it regardless of whether anything beneath this
        // element ever matched (see `close_element`).
        self.index_stack.push(self.index);

        self.depth += 1;
        if !self.backtrack && self.wrap {
            self.ctx.push_segment(name.clone(), text);
        }
        self.ctx.enter(name.clone(), declared);
        self.backtrack = false;

        let matches = self
            .selector
            .effective(self.index)
            .map(|m| m.matches(&name))
            .unwrap_or(false);

        if matches {
            if self.selector.is_bottom(self.index) {
                self.backtrack = true;
                OpenOutcome::Matched
            } else {
                if self.selector.is_descendant_axis(self.index) {
                    self.index += 1;
                }
                self.index += 1;
                OpenOutcome::Continue
            }
        } else if self.selector.is_descendant_axis(self.index) {
            OpenOutcome::Continue
        } else {
            OpenOutcome::Skip
        }
    }

    /// Steps 1-3 of END processing (§4.3): pop context, and restore `index`
    /// to whatever it was when this element was itself opened.
    ///
    /// This unconditionally undoes any advance `open()` made for this
    /// element (matched-non-bottom `Continue`), not only when a bottom match
    /// was actually found somewhere inside — a selector like `/a/b/c` over
    /// `<a><b><x/></b><b><c/></b></a>` descends into the first `<b>`
    /// (advancing past the `b` segment) but never finds `c` there; without
    /// restoring on that `<b>`'s own `END`, the second `<b>` would be
    /// compared against the `c` segment instead of `b` and its real `<c/>`
    /// match would be skipped entirely. The push/pop is symmetric with every
    /// `open()` call, matched or not, so this always restores the correct
    /// prior value, including the §9 open-question case (`index == 0`: a
    /// leading descendant axis never advances in `open()`, so it is also
    /// never disturbed here — verified against S3).
    fn close_element(&mut self, name: &QName) {
        self.depth -= 1;
        self.ctx.exit(name);
        if let Some(entry_index) = self.index_stack.pop() {
            self.index = entry_index;
        }
    }

    /// Reads forward past `name`'s descendants (tracked only by a local
    /// depth counter, bypassing the selector entirely) and runs the normal
    /// END bookkeeping once `name`'s own closing tag is reached.
    fn skip_to_own_end(&mut self) -> Result<()> {
        let mut inner = 0i64;
        loop {
            self.buf.clear();
            let (_, event) = self.reader.read_resolved_event_into(&mut self.buf)?;
            match event {
                Event::Start(_) => inner += 1,
                Event::End(_) => {
                    if inner == 0 {
                        return Ok(());
                    }
                    inner -= 1;
                }
                Event::Empty(_) => {}
                Event::Eof => return Err(TokenizeError::UnexpectedEof),
                _ => {}
            }
        }
    }

    /// A non-matching, non-descendant-axis element: consume its subtree
    /// without keeping the bytes, then close it normally.
    fn finish_skip(&mut self, name: QName) -> Result<()> {
        self.skip_to_own_end()?;
        // Discard the window; nothing downstream needs these bytes.
        let offset = self.reader.buffer_position();
        self.sink.checkpoint(offset);
        self.consumed = offset;
        self.close_element(&name);
        Ok(())
    }

    /// A bottom match on a non-empty element: read through its own closing
    /// tag, build the fragment from the still-open context, then close it.
    /// `start_text` is the verbatim text through this element's own start
    /// tag, already captured by the caller before the match was decided.
    fn finish_match(&mut self, name: QName, start_text: String) -> Result<String> {
        self.skip_to_own_end()?;
        let tail = self.capture_window()?;
        let raw = format!("{start_text}{tail}");
        let fragment = self.build_fragment(&name, &raw);
        self.close_element(&name);
        Ok(fragment)
    }

    fn build_fragment(&self, name: &QName, raw: &str) -> String {
        if self.wrap {
            let segs = self.ctx.segments();
            let ancestors = if segs.last().map(|(n, _)| n == name).unwrap_or(false) {
                &segs[..segs.len() - 1]
            } else {
                segs
            };
            fragment::wrap(ancestors, raw)
        } else {
            let frame = self.ctx.namespace_frame().cloned().unwrap_or_default();
            fragment::inject(raw, &frame)
        }
    }
}
