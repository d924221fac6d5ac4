pub mod identifiers;

pub use identifiers::{normalize_entity_name, DocumentVersion, EntityId};
