pub mod filters;
pub mod columns;
pub mod budgeting;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{DocumentVersion, Section, SectionKind, StructuredDocument, UnknownSection};
pub use budgeting::{
	classify, estimate, reduction_guidance, ApproxUnitCounter, BudgetEstimator, BudgetReport,
	BudgetStatus, Guidance, UnitCounter,
};
pub use columns::{select_columns, ColumnSelection};

pub const DEFAULT_MAX_YEARS: usize = 5;
pub const DEFAULT_MAX_QUARTERS: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReduceError {
	#[error(transparent)]
	UnknownSection(#[from] UnknownSection),
}

/// Caller-supplied reduction knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionParams {
	pub max_years: usize,
	pub max_quarters: usize,
	/// Sections to emit, in emission order. `None` means every section in
	/// canonical order.
	pub include_sections: Option<Vec<SectionKind>>,
	pub aggressive: bool,
}

impl Default for ReductionParams {
	fn default() -> Self {
		Self {
			max_years: DEFAULT_MAX_YEARS,
			max_quarters: DEFAULT_MAX_QUARTERS,
			include_sections: None,
			aggressive: false,
		}
	}
}

impl ReductionParams {
	/// Restrict output to the named sections. Every name is validated before
	/// anything else happens; repeated names keep their first position.
	pub fn with_sections<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, ReduceError> {
		let mut kinds = Vec::with_capacity(names.len());
		for name in names {
			let kind: SectionKind = name.as_ref().trim().parse()?;
			if !kinds.contains(&kind) {
				kinds.push(kind);
			}
		}
		self.include_sections = Some(kinds);
		Ok(self)
	}

	/// Like [`ReductionParams::with_sections`] for a comma-separated list.
	/// A blank list means "all sections".
	pub fn parse_sections(self, list: &str) -> Result<Self, ReduceError> {
		if list.trim().is_empty() {
			return Ok(self);
		}
		let names: Vec<&str> = list.split(',').collect();
		self.with_sections(&names)
	}

	fn sections(&self) -> &[SectionKind] {
		self.include_sections.as_deref().unwrap_or(&SectionKind::ALL)
	}
}

/// Build the reduced document. Pure: the input is never touched and identical
/// inputs give identical output.
pub fn reduce(document: &StructuredDocument, params: &ReductionParams) -> StructuredDocument {
	let sections = params
		.sections()
		.iter()
		.filter_map(|&kind| document.section(kind))
		.map(|section| reduce_section(section, params))
		.collect();

	StructuredDocument {
		title: document.title.clone(),
		key_ratios: document.key_ratios.clone(),
		about: document.about.clone(),
		pros: document.pros.clone(),
		cons: document.cons.clone(),
		sections,
	}
}

fn reduce_section(section: &Section, params: &ReductionParams) -> Section {
	let tables = section
		.tables
		.iter()
		.map(|table| {
			filters::reduce_table(
				table,
				section.kind,
				params.max_years,
				params.max_quarters,
				params.aggressive,
			)
		})
		.collect();

	Section {
		kind: section.kind,
		title: section.title.clone(),
		tables,
		growth_tables: section.growth_tables.clone(),
	}
}

/// Parse raw page markup, reduce it and render the compact markup.
pub fn extract_financial_data(html: &str, params: &ReductionParams) -> String {
	let document = StructuredDocument::parse(html);
	let reduced = reduce(&document, params);
	let markup = reduced.render();
	tracing::debug!(
		sections = reduced.sections.len(),
		version = %DocumentVersion::of_markup(&markup).short(),
		"extracted financial data"
	);
	markup
}

/// Size comparison between the raw page and the reduced markup, in characters,
/// plus the digest of the reduced markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReductionStats {
	pub original_chars: usize,
	pub reduced_chars: usize,
	pub reduction_pct: f64,
	pub reduced_version: DocumentVersion,
}

impl ReductionStats {
	pub fn new(original: &str, reduced: &str) -> Self {
		let original_chars = original.chars().count();
		let reduced_chars = reduced.chars().count();
		let reduction_pct = if original_chars == 0 {
			0.0
		} else {
			(original_chars as f64 - reduced_chars as f64) / original_chars as f64 * 100.0
		};

		Self {
			original_chars,
			reduced_chars,
			reduction_pct,
			reduced_version: DocumentVersion::of_markup(reduced),
		}
	}
}
