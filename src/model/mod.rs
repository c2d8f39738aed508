//! Core data model types for view-entry mail metadata.

pub mod mail;
