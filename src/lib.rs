//! `notesview` — streaming parser for Lotus Domino view XML exports.
//!
//! This crate converts a `?ReadViewEntries`-style XML export of a mail view
//! into an ordered sequence of [`model::mail::MailMeta`] records. The
//! interesting columns are selected by their opaque Domino codes (`$86` type,
//! `$68` date, `$74` subject); everything else in the document is
//! structurally skipped in a single forward pass, without backtracking.

pub mod error;
pub mod model;
pub mod parser;
