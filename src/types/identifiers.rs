use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Corporate suffixes dropped from the end of an entity name.
const CORPORATE_SUFFIXES: [&str; 4] = ["LIMITED", "LTD", "INCORPORATED", "INC"];

/// Canonicalize an entity name for use as a cache key.
///
/// Uppercases, trims, then repeatedly drops a trailing corporate suffix token
/// ("LIMITED", "LTD", "INCORPORATED", "INC"). A suffix is only dropped when it is
/// a whole whitespace-separated token and something precedes it, so "LTD" alone
/// stays "LTD" and "ACME LTD." keeps its period.
///
/// The result is idempotent: `normalize_entity_name(&normalize_entity_name(x)) == normalize_entity_name(x)`.
pub fn normalize_entity_name(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    let mut name = upper.as_str();

    while let Some(split) = name.rfind(char::is_whitespace) {
        let (head, tail) = name.split_at(split);
        let tail = tail.trim_start();
        if !CORPORATE_SUFFIXES.contains(&tail) {
            break;
        }
        name = head.trim_end();
    }

    name.trim().to_string()
}

/// Normalized entity identifier used to partition the lookup cache.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Normalize `raw` into an identifier. Returns `None` when nothing is left,
    /// since an empty key would merge unrelated entities.
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = normalize_entity_name(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(EntityId(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest of reduced markup, `sha256:<hex>`. Two reductions with equal
/// versions produced byte-identical context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentVersion(String);

impl DocumentVersion {
    const PREFIX: &'static str = "sha256:";

    pub fn of_markup(markup: &str) -> Self {
        let digest = Sha256::digest(markup.as_bytes());
        DocumentVersion(format!("{}{}", Self::PREFIX, hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        let hex = &self.0[Self::PREFIX.len()..];
        &hex[..hex.len().min(12)]
    }
}

impl std::fmt::Display for DocumentVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
