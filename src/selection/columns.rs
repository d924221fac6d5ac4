use crate::document::SectionKind;

/// Zero-based column indices kept for one data table, ascending and unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection(Vec<usize>);

impl ColumnSelection {
    fn from_unsorted(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        ColumnSelection(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Pick the columns to keep for a table in a section of the given kind.
///
/// Column 0 holds row labels and is always kept by the quarterly and annual
/// policies. Sections without a policy keep every column.
pub fn select_columns(
    kind: SectionKind,
    headers: &[String],
    max_years: usize,
    max_quarters: usize,
) -> ColumnSelection {
    match kind {
        SectionKind::Quarters => recent_quarters(headers.len(), max_quarters),
        SectionKind::ProfitLoss
        | SectionKind::BalanceSheet
        | SectionKind::CashFlow
        | SectionKind::Ratios => ttm_and_recent_years(headers, max_years),
        SectionKind::Shareholding => ColumnSelection((0..headers.len()).collect()),
    }
}

/// Label column plus the trailing `max_quarters` columns.
fn recent_quarters(total: usize, max_quarters: usize) -> ColumnSelection {
    let start = total.saturating_sub(max_quarters).max(1);
    let mut indices = vec![0];
    indices.extend(start..total);
    ColumnSelection::from_unsorted(indices)
}

/// Label column, the first "TTM" column if any, and the last `max_years`
/// remaining columns.
fn ttm_and_recent_years(headers: &[String], max_years: usize) -> ColumnSelection {
    let mut indices = vec![0];

    let ttm = headers.iter().position(|h| h.eq_ignore_ascii_case("TTM"));
    if let Some(ttm) = ttm {
        indices.push(ttm);
    }

    let years: Vec<usize> = (1..headers.len()).filter(|&i| Some(i) != ttm).collect();
    let skip = years.len().saturating_sub(max_years);
    indices.extend_from_slice(&years[skip..]);

    ColumnSelection::from_unsorted(indices)
}
