//! View-export parsing: XML event reader adapter, view-entry extractor, and
//! the Notes compact date-time decoder.

pub mod datetime;
pub mod reader;
pub mod view;
