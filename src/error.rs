//! Centralized error types for notesview.

use thiserror::Error;

/// All errors produced by the notesview library.
///
/// Every variant is fatal to the extraction call that raised it: the caller
/// gets either the complete record sequence or exactly one of these.
/// Recoverable structural anomalies never surface here; they go to the
/// [`DiagnosticSink`](crate::parser::reader::DiagnosticSink) instead.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Unrecoverable XML stream failure at the given source position.
    #[error("XML stream error at line {line}, column {column}: {source}")]
    Stream {
        line: u64,
        column: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// A view entry has no `unid` attribute.
    #[error("view entry is missing its unid attribute")]
    MissingIdentifier,

    /// A view entry's `unid` attribute is blank after trimming.
    #[error("view entry has a blank unid attribute")]
    EmptyIdentifier,

    /// The type column was present but decoded to nothing.
    #[error("entry '{unid}': type column is empty")]
    EmptyType { unid: String },

    /// The date column was present but held no value.
    #[error("entry '{unid}': date column has no value")]
    NullDate { unid: String },

    /// A Notes date string shorter than the 18-character minimum.
    #[error("Notes date string too short: '{0}'")]
    DateTooShort(String),

    /// A Notes date string that does not decode to a valid calendar date-time.
    #[error("invalid Notes date string '{input}': {reason}")]
    DateFormat { input: String, reason: String },

    /// An entry ended before both its type and date columns were read.
    #[error("entry '{unid}' ended before type and date were read")]
    IncompleteEntry { unid: String },

    /// The stream ended in the middle of an entry.
    #[error("stream ended inside entry '{unid}'")]
    TruncatedStream { unid: String },
}

/// Convenience alias for `Result<T, NotesError>`.
pub type Result<T> = std::result::Result<T, NotesError>;
