//! View-entry extraction from a Domino view XML export.
//!
//! Walks the event stream produced by [`XmlEventReader`], recognizes
//! `<viewentry>` boundaries and `<entrydata>` field containers, and
//! assembles one [`MailMeta`] per entry. Containers are selected by their
//! Domino column code (the `name` attribute); unrecognized codes are
//! consumed and ignored. Extraction is strict: the first invalid entry
//! aborts the whole call and no records are returned.

use std::collections::BTreeSet;
use std::io::BufRead;

use chrono::{DateTime, FixedOffset};
use tracing::trace;

use crate::error::{NotesError, Result};
use crate::model::mail::MailMeta;
use crate::parser::datetime::parse_notes_datetime;
use crate::parser::reader::{DiagnosticSink, XmlEvent, XmlEventReader};

/// Element bounding one view entry.
const ENTRY_ELEMENT: &str = "viewentry";

/// Element carrying one coded column value inside an entry.
const FIELD_ELEMENT: &str = "entrydata";

/// Attribute on the entry element holding the universal note id.
const UNID_ATTR: &str = "unid";

/// Attribute on the field element holding the column code.
const CODE_ATTR: &str = "name";

/// Semantic meaning of a view column, keyed by its opaque Domino code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `$86`: the message type (`Memo`, `Reply`, ...).
    Type,
    /// `$68`: the delivery date in Notes compact format.
    Date,
    /// `$74`: the subject line.
    Subject,
}

impl FieldKind {
    /// Map a column code to its meaning.
    ///
    /// Unknown codes return `None` and are skipped by the extractor; adding
    /// a column means adding an arm here, nothing else.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "$86" => Some(Self::Type),
            "$68" => Some(Self::Date),
            "$74" => Some(Self::Subject),
            _ => None,
        }
    }
}

/// Streaming extractor for view entries.
///
/// One instance per extraction call. Besides the records themselves, the
/// parser tallies the distinct type values it has produced, available
/// through [`types_seen`](Self::types_seen).
#[derive(Debug, Default)]
pub struct ViewEntryParser {
    types_seen: BTreeSet<String>,
}

impl ViewEntryParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract every view entry from `input`, in document order.
    ///
    /// Returns the complete record sequence, or the first error — there is
    /// no partial-success mode. Structural warnings go to `tracing`; use
    /// [`parse_events`](Self::parse_events) with a custom sink to capture
    /// them instead.
    pub fn parse<R: BufRead>(&mut self, input: R) -> Result<Vec<MailMeta>> {
        self.parse_events(&mut XmlEventReader::new(input))
    }

    /// Extract every view entry from an already-constructed event reader.
    pub fn parse_events<R: BufRead, S: DiagnosticSink>(
        &mut self,
        events: &mut XmlEventReader<R, S>,
    ) -> Result<Vec<MailMeta>> {
        let mut records = Vec::new();
        loop {
            match events.next_event()? {
                XmlEvent::Start { name, attributes } if name == ENTRY_ELEMENT => {
                    let meta = read_entry(&attributes, events)?;
                    trace!(unid = %meta.unid, entry_type = %meta.entry_type, "parsed view entry");
                    self.types_seen.insert(meta.entry_type.clone());
                    records.push(meta);
                }
                XmlEvent::Eof => break,
                _ => {}
            }
        }
        Ok(records)
    }

    /// Distinct `entry_type` values across every record produced so far.
    pub fn types_seen(&self) -> &BTreeSet<String> {
        &self.types_seen
    }
}

/// Read one entry, positioned just after its start element.
fn read_entry<R: BufRead, S: DiagnosticSink>(
    attributes: &[(String, String)],
    events: &mut XmlEventReader<R, S>,
) -> Result<MailMeta> {
    let unid = attributes
        .iter()
        .find(|(k, _)| k == UNID_ATTR)
        .map(|(_, v)| v.trim().to_string())
        .ok_or(NotesError::MissingIdentifier)?;
    if unid.is_empty() {
        return Err(NotesError::EmptyIdentifier);
    }

    let mut entry_type: Option<String> = None;
    let mut date: Option<DateTime<FixedOffset>> = None;
    let mut subject: Option<String> = None;

    loop {
        match events.next_event()? {
            XmlEvent::Start { name, attributes } if name == FIELD_ELEMENT => {
                let code = attributes
                    .iter()
                    .find(|(k, _)| k == CODE_ATTR)
                    .map(|(_, v)| v.as_str());
                // The sub-scan always runs, even for unknown codes, so the
                // cursor stays aligned on the container's end.
                let value = read_single_value(events)?;
                match code.and_then(FieldKind::from_code) {
                    Some(FieldKind::Type) => match value {
                        Some(v) if !v.is_empty() => entry_type = Some(v),
                        _ => return Err(NotesError::EmptyType { unid }),
                    },
                    Some(FieldKind::Date) => {
                        let raw = value.ok_or_else(|| NotesError::NullDate {
                            unid: unid.clone(),
                        })?;
                        date = Some(parse_notes_datetime(&raw)?);
                    }
                    Some(FieldKind::Subject) => subject = value,
                    None => {}
                }
            }
            XmlEvent::End { name } => {
                // An entry is complete as soon as type and date are both
                // known; whatever trails inside the same entry is left for
                // the outer scan, which only reacts to entry starts.
                if let (Some(t), Some(d)) = (&entry_type, &date) {
                    return Ok(MailMeta {
                        unid,
                        entry_type: t.clone(),
                        date: *d,
                        subject,
                    });
                }
                if name == ENTRY_ELEMENT {
                    return Err(NotesError::IncompleteEntry { unid });
                }
            }
            XmlEvent::Eof => return Err(NotesError::TruncatedStream { unid }),
            _ => {}
        }
    }
}

/// Consume a just-opened field container through its matching end element,
/// capturing the first text run found inside a nested sub-element.
///
/// Text directly under the container (indentation between sub-elements) is
/// layout, not a value. Returns `None` when no text appears — the caller
/// decides whether that is an error. Field-agnostic by design: every
/// dispatch arm above reuses it unchanged.
fn read_single_value<R: BufRead, S: DiagnosticSink>(
    events: &mut XmlEventReader<R, S>,
) -> Result<Option<String>> {
    let mut depth: u32 = 1;
    let mut value: Option<String> = None;
    loop {
        match events.next_event()? {
            XmlEvent::Start { .. } => depth += 1,
            XmlEvent::Text(text) => {
                if depth > 1 && value.is_none() {
                    value = Some(text.trim().to_string());
                }
            }
            XmlEvent::End { .. } => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(value);
                }
            }
            // The caller sees Eof on its next pull and raises the
            // truncation error with the entry id attached.
            XmlEvent::Eof => return Ok(value),
        }
    }
}
