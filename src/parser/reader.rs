//! XML event reader adapter over `quick-xml`.
//!
//! Translates the raw token stream into the four structural events the
//! view-entry extractor consumes: element start, element end, text, and
//! end-of-stream. Adjacent text and CDATA runs (including runs split by
//! comments or processing instructions) are coalesced into one `Text` event.
//! Declarations, comments, PIs, and DOCTYPE are skipped; no schema or DTD
//! validation is ever performed.
//!
//! Recoverable anomalies are reported to an injected [`DiagnosticSink`] with
//! a line/column position and parsing continues. Only I/O failures, syntax
//! corruption, or a parser stuck at the same position abort the stream.

use std::collections::VecDeque;
use std::io::{self, BufRead, Read};

use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

use crate::error::{NotesError, Result};

/// One structural event from the XML stream.
///
/// Element names are local names (namespace prefixes stripped); attribute
/// values are entity-unescaped.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlEvent {
    Start {
        name: String,
        attributes: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Text(String),
    Eof,
}

/// A recoverable structural anomaly, located in the source document.
///
/// Line is 1-based; column is the 1-based byte column on that line.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: u64,
    pub column: u64,
    pub message: String,
}

/// Receives non-fatal structural warnings during parsing.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Allows passing `&mut sink` so the caller keeps ownership.
impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Default sink: forwards every diagnostic to `tracing::warn!`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, d: Diagnostic) {
        warn!(
            line = d.line,
            column = d.column,
            message = %d.message,
            "XML structural warning"
        );
    }
}

/// Discards every diagnostic.
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Collects diagnostics for later inspection.
#[derive(Debug, Default)]
pub struct VecSink(pub Vec<Diagnostic>);

impl DiagnosticSink for VecSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }
}

/// `BufRead` wrapper that tracks the line/column of the consumed position,
/// so diagnostics can point into the source document.
struct PositionedReader<R> {
    inner: R,
    line: u64,
    column: u64,
}

impl<R> PositionedReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            line: 1,
            column: 1,
        }
    }
}

impl<R: BufRead> Read for PositionedReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for PositionedReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if amt > 0 {
            // The bytes being consumed are still buffered, so this fill_buf
            // does no I/O.
            if let Ok(buf) = self.inner.fill_buf() {
                for &b in &buf[..amt.min(buf.len())] {
                    if b == b'\n' {
                        self.line += 1;
                        self.column = 1;
                    } else {
                        self.column += 1;
                    }
                }
            }
        }
        self.inner.consume(amt);
    }
}

/// Pull-based reader of structural XML events.
///
/// Owns the input stream for the duration of the extraction; dropping the
/// reader releases it on every exit path. Holds no cross-entry state and
/// uses O(1) memory per event (one reusable buffer).
pub struct XmlEventReader<R: BufRead, S: DiagnosticSink = TracingSink> {
    inner: Reader<PositionedReader<R>>,
    buf: Vec<u8>,
    pending: VecDeque<XmlEvent>,
    sink: S,
    last_error_pos: Option<u64>,
    done: bool,
}

impl<R: BufRead> XmlEventReader<R> {
    /// Create a reader whose diagnostics go to `tracing`.
    pub fn new(input: R) -> Self {
        Self::with_sink(input, TracingSink)
    }
}

impl<R: BufRead, S: DiagnosticSink> XmlEventReader<R, S> {
    /// Create a reader with a caller-supplied diagnostic sink.
    ///
    /// Pass `&mut sink` to keep ownership and inspect the diagnostics after
    /// parsing, or [`NullSink`] to drop them.
    pub fn with_sink(input: R, sink: S) -> Self {
        let mut inner = Reader::from_reader(PositionedReader::new(input));
        inner.config_mut().trim_text(true);
        Self {
            inner,
            buf: Vec::with_capacity(4096),
            pending: VecDeque::new(),
            sink,
            last_error_pos: None,
            done: false,
        }
    }

    /// Current line/column of the reader in the source document.
    pub fn position(&self) -> (u64, u64) {
        let r = self.inner.get_ref();
        (r.line, r.column)
    }

    /// Pull the next structural event.
    ///
    /// After `Eof` has been returned once, every further call returns `Eof`
    /// again.
    pub fn next_event(&mut self) -> Result<XmlEvent> {
        if let Some(ev) = self.pending.pop_front() {
            return Ok(ev);
        }
        if self.done {
            return Ok(XmlEvent::Eof);
        }
        // The buffer is moved out for the duration of the read so the
        // borrowed quick-xml event and `&mut self` can coexist.
        let mut buf = std::mem::take(&mut self.buf);
        let result = self.read_next(&mut buf);
        buf.clear();
        self.buf = buf;
        result
    }

    fn read_next(&mut self, buf: &mut Vec<u8>) -> Result<XmlEvent> {
        let mut text: Option<String> = None;
        loop {
            buf.clear();
            let event = match self.inner.read_event_into(buf) {
                Ok(ev) => ev,
                Err(err) => {
                    if let Some(ev) = self.recover_or_fail(err)? {
                        return Ok(self.emit(text, ev));
                    }
                    continue;
                }
            };
            match event {
                Event::Start(ref e) => {
                    let ev = self.start_event(e);
                    return Ok(self.emit(text, ev));
                }
                Event::End(ref e) => {
                    let ev = XmlEvent::End {
                        name: decode_name(e.local_name().as_ref()),
                    };
                    return Ok(self.emit(text, ev));
                }
                Event::Empty(ref e) => {
                    // Self-closing element: surface as start + end so the
                    // extractor sees one uniform shape.
                    let name = decode_name(e.local_name().as_ref());
                    let start = self.start_event(e);
                    self.pending.push_back(XmlEvent::End { name });
                    return Ok(self.emit(text, start));
                }
                Event::Text(ref t) => {
                    let chunk = match t.unescape() {
                        Ok(c) => c.into_owned(),
                        Err(err) => {
                            // Undeclared entities and friends: keep the raw
                            // run and carry on.
                            self.report(format!("unresolvable text content: {err}"));
                            String::from_utf8_lossy(t).into_owned()
                        }
                    };
                    if !chunk.is_empty() {
                        text.get_or_insert_with(String::new).push_str(&chunk);
                    }
                }
                Event::CData(ref c) => {
                    let chunk = String::from_utf8_lossy(c).into_owned();
                    if !chunk.is_empty() {
                        text.get_or_insert_with(String::new).push_str(&chunk);
                    }
                }
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => {
                    self.done = true;
                    return Ok(self.emit(text, XmlEvent::Eof));
                }
            }
        }
    }

    /// Return coalesced text first when there is any, queueing `ev` behind it.
    fn emit(&mut self, text: Option<String>, ev: XmlEvent) -> XmlEvent {
        match text {
            Some(t) => {
                self.pending.push_front(ev);
                XmlEvent::Text(t)
            }
            None => ev,
        }
    }

    fn start_event(&mut self, e: &BytesStart) -> XmlEvent {
        let name = decode_name(e.local_name().as_ref());
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            match attr {
                Ok(a) => {
                    let key = decode_name(a.key.local_name().as_ref());
                    let value = match a.unescape_value() {
                        Ok(v) => v.into_owned(),
                        Err(err) => {
                            self.report(format!("unresolvable attribute value: {err}"));
                            String::from_utf8_lossy(&a.value).into_owned()
                        }
                    };
                    attributes.push((key, value));
                }
                Err(err) => self.report(format!("malformed attribute: {err}")),
            }
        }
        XmlEvent::Start { name, attributes }
    }

    /// Decide whether a quick-xml error is survivable.
    ///
    /// Unclosed tags at end of input become a diagnostic plus a clean `Eof`.
    /// Other ill-formed markup is reported and skipped as long as the parser
    /// keeps moving; I/O and syntax failures, or two errors at the same
    /// position, are fatal. `Ok(None)` means "keep reading".
    fn recover_or_fail(&mut self, err: quick_xml::Error) -> Result<Option<XmlEvent>> {
        let pos = self.inner.buffer_position() as u64;
        let (line, column) = self.position();
        match err {
            quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(ref tag)) => {
                self.sink.report(Diagnostic {
                    line,
                    column,
                    message: format!("input ended with '{tag}' still open"),
                });
                self.done = true;
                Ok(Some(XmlEvent::Eof))
            }
            quick_xml::Error::Io(_) | quick_xml::Error::Syntax(_) => {
                self.done = true;
                Err(NotesError::Stream {
                    line,
                    column,
                    source: err,
                })
            }
            other => {
                if self.last_error_pos == Some(pos) {
                    self.done = true;
                    return Err(NotesError::Stream {
                        line,
                        column,
                        source: other,
                    });
                }
                self.last_error_pos = Some(pos);
                self.sink.report(Diagnostic {
                    line,
                    column,
                    message: format!("recoverable XML error: {other}"),
                });
                Ok(None)
            }
        }
    }

    fn report(&mut self, message: String) {
        let (line, column) = self.position();
        self.sink.report(Diagnostic {
            line,
            column,
            message,
        });
    }
}

fn decode_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
