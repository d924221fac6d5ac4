pub mod document;
pub mod parser;
pub mod render;

pub use crate::types::identifiers::DocumentVersion;
pub use document::{
    DataTable, GrowthTable, KeyRatio, Section, SectionKind, StructuredDocument, UnknownSection,
};
