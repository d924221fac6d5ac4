use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::identifiers::DocumentVersion;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid section: {name}. Valid sections: {}", SectionKind::valid_names().join(", "))]
pub struct UnknownSection {
    pub name: String,
}

/// The fixed set of financial sections a document can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    Quarters,
    ProfitLoss,
    BalanceSheet,
    CashFlow,
    Ratios,
    Shareholding,
}

impl SectionKind {
    /// Canonical emission order.
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Quarters,
        SectionKind::ProfitLoss,
        SectionKind::BalanceSheet,
        SectionKind::CashFlow,
        SectionKind::Ratios,
        SectionKind::Shareholding,
    ];

    /// The `id` attribute of the section element in source markup.
    pub fn id(self) -> &'static str {
        match self {
            SectionKind::Quarters => "quarters",
            SectionKind::ProfitLoss => "profit-loss",
            SectionKind::BalanceSheet => "balance-sheet",
            SectionKind::CashFlow => "cash-flow",
            SectionKind::Ratios => "ratios",
            SectionKind::Shareholding => "shareholding",
        }
    }

    pub fn valid_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.id()).collect()
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SectionKind {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.id() == s)
            .ok_or_else(|| UnknownSection { name: s.to_string() })
    }
}

/// A "data-table": positional headers and rows.
///
/// `headers` is `None` when the source table had no header block; such a table
/// renders empty because columns cannot be selected without headers.
/// `rows` is `None` when the source table had no body block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataTable {
    pub headers: Option<Vec<String>>,
    pub rows: Option<Vec<Vec<String>>>,
}

impl DataTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers: Some(headers),
            rows: Some(rows),
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.as_ref().map_or(0, Vec::len)
    }
}

/// A "ranges-table" of growth metrics. Copied through reduction untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrowthTable {
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: Option<String>,
    pub tables: Vec<DataTable>,
    pub growth_tables: Vec<GrowthTable>,
}

impl Section {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            title: None,
            tables: Vec::new(),
            growth_tables: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRatio {
    pub name: String,
    pub value: String,
}

/// A financial document broken into the pieces the reducer understands.
///
/// Root-level blocks (title, key ratios, about, pros, cons) are never filtered.
/// `key_ratios`, `pros` and `cons` are `None` when the source lacked the
/// container, and `Some(vec![])` when the container was present but empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub title: Option<String>,
    pub key_ratios: Option<Vec<KeyRatio>>,
    pub about: Option<String>,
    pub pros: Option<Vec<String>>,
    pub cons: Option<Vec<String>>,
    pub sections: Vec<Section>,
}

impl StructuredDocument {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Content hash of the rendered markup.
    pub fn version(&self) -> DocumentVersion {
        DocumentVersion::of_markup(&self.render())
    }
}
