//! Mail metadata record extracted from one view entry.

use chrono::{DateTime, FixedOffset};

/// Metadata for a single message in the view export.
///
/// Built by the extractor only once the identifier, type, and date have all
/// been read and validated; plain immutable data afterwards. Records are
/// returned in document order, one per source entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MailMeta {
    /// Universal note id (the entry's `unid` attribute). Never empty.
    pub unid: String,

    /// Message type from the `$86` column (e.g. `Memo`, `Reply`). Never empty.
    pub entry_type: String,

    /// Delivery date from the `$68` column, carrying the timezone offset
    /// encoded in the export. Not normalized to UTC or any other zone.
    pub date: DateTime<FixedOffset>,

    /// Subject from the `$74` column; `None` when the entry has no subject.
    pub subject: Option<String>,
}
