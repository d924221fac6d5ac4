//! Token-budgeted reduction of financial-data pages for LLM context windows.
//!
//! `fincontext-core` parses a financial page into sections and tables, keeps a
//! bounded window of quarterly and annual columns per section, renders compact
//! markup, and estimates its size against a context ceiling. External lookups
//! that fill gaps in the page go through a file-backed TTL cache keyed by
//! normalized company name. Reduction is deterministic: identical inputs always
//! produce identical output, byte-for-byte.

pub mod cache;
pub mod config;
pub mod document;
pub mod selection;
pub mod types;
