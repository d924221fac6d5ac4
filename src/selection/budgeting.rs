use std::fmt;

use serde::Serialize;

use super::ReductionParams;

/// Characters per context unit for markup-heavy text.
pub const MARKUP_CHARS_PER_UNIT: f64 = 2.5;
/// Characters per context unit for plain prose.
pub const PROSE_CHARS_PER_UNIT: f64 = 4.0;
pub const DEFAULT_CONTEXT_CEILING: usize = 4096;

/// Many inference servers refuse contexts above this, whatever the caller declares.
const COMMON_SERVER_CAP: usize = 4096;
/// Fraction of the ceiling above which a total counts as near the limit.
const NEAR_LIMIT_RATIO: f64 = 0.9;

pub trait UnitCounter {
    fn count_units(&self, content: &str) -> usize;
}

/// units(content) := floor(chars(content) / chars_per_unit)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxUnitCounter {
    chars_per_unit: f64,
}

impl ApproxUnitCounter {
    /// A zero or negative density counts any non-empty text as `usize::MAX` units.
    pub fn new(chars_per_unit: f64) -> Self {
        Self { chars_per_unit }
    }

    pub fn markup() -> Self {
        Self::new(MARKUP_CHARS_PER_UNIT)
    }

    pub fn prose() -> Self {
        Self::new(PROSE_CHARS_PER_UNIT)
    }
}

impl UnitCounter for ApproxUnitCounter {
    fn count_units(&self, content: &str) -> usize {
        estimate(content, self.chars_per_unit)
    }
}

pub fn estimate(text: &str, chars_per_unit: f64) -> usize {
    (text.chars().count() as f64 / chars_per_unit).floor() as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Within,
    Near,
    Over,
}

impl BudgetStatus {
    /// Whether the caller should surface size-reduction guidance.
    pub fn needs_attention(self) -> bool {
        !matches!(self, BudgetStatus::Within)
    }
}

pub fn classify(total: usize, ceiling: usize) -> BudgetStatus {
    if total > ceiling {
        BudgetStatus::Over
    } else if total as f64 > ceiling as f64 * NEAR_LIMIT_RATIO {
        BudgetStatus::Near
    } else {
        BudgetStatus::Within
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetReport {
    pub prompt_units: usize,
    pub document_units: usize,
    pub total: usize,
    pub ceiling: usize,
    pub status: BudgetStatus,
}

/// Estimates prompt + document size against a declared ceiling.
///
/// The estimator only classifies. Deciding whether to proceed, abort or
/// re-reduce is up to the caller.
pub struct BudgetEstimator<P = ApproxUnitCounter, D = ApproxUnitCounter> {
    prompt_counter: P,
    document_counter: D,
    ceiling: usize,
}

impl Default for BudgetEstimator {
    fn default() -> Self {
        Self {
            prompt_counter: ApproxUnitCounter::prose(),
            document_counter: ApproxUnitCounter::markup(),
            ceiling: DEFAULT_CONTEXT_CEILING,
        }
    }
}

impl<P, D> BudgetEstimator<P, D>
where
    P: UnitCounter,
    D: UnitCounter,
{
    pub fn new(prompt_counter: P, document_counter: D, ceiling: usize) -> Self {
        Self {
            prompt_counter,
            document_counter,
            ceiling,
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn report(&self, prompt: &str, document: &str) -> BudgetReport {
        if self.ceiling > COMMON_SERVER_CAP {
            tracing::warn!(
                ceiling = self.ceiling,
                "context ceiling above {COMMON_SERVER_CAP} units; many servers cap below this"
            );
        }

        let prompt_units = self.prompt_counter.count_units(prompt);
        let document_units = self.document_counter.count_units(document);
        let total = prompt_units.saturating_add(document_units);
        let status = classify(total, self.ceiling);

        tracing::debug!(prompt_units, document_units, total, ceiling = self.ceiling, ?status, "budget estimated");

        BudgetReport {
            prompt_units,
            document_units,
            total,
            ceiling: self.ceiling,
            status,
        }
    }
}

/// A concrete way to shrink the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guidance {
    ReduceYears(usize),
    ReduceQuarters(usize),
    LimitSections,
    EnableAggressive,
    RaiseCeiling,
}

impl fmt::Display for Guidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guidance::ReduceYears(n) => write!(f, "Reduce years: --max-years {n}"),
            Guidance::ReduceQuarters(n) => write!(f, "Reduce quarters: --max-quarters {n}"),
            Guidance::LimitSections => {
                f.write_str("Limit sections: --sections profit-loss,balance-sheet,ratios")
            }
            Guidance::EnableAggressive => f.write_str("Enable aggressive compression: --aggressive"),
            Guidance::RaiseCeiling => f.write_str("Increase context limit: --max-context <new_limit>"),
        }
    }
}

/// Suggestions for bringing a near/over-budget request back under the ceiling.
pub fn reduction_guidance(params: &ReductionParams) -> Vec<Guidance> {
    let years = params.max_years.max(1);
    let quarters = params.max_quarters.max(1);

    let mut out = vec![
        Guidance::ReduceYears(years.saturating_sub(2).max(1).max(3)),
        Guidance::ReduceQuarters(quarters.saturating_sub(4).max(1).max(4)),
    ];
    let many_sections = params
        .include_sections
        .as_ref()
        .map_or(true, |sections| sections.len() > 3);
    if many_sections {
        out.push(Guidance::LimitSections);
    }
    out.push(Guidance::EnableAggressive);
    out.push(Guidance::RaiseCeiling);
    out
}
