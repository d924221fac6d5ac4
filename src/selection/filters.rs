use crate::document::{DataTable, SectionKind};

use super::columns::{select_columns, ColumnSelection};

/// Keep only the cells at the selected indices, in ascending index order.
///
/// Indices past the end of a short row contribute nothing. In aggressive mode
/// empty cells are dropped outright, so later cells shift left and the row no
/// longer lines up with the header row. Consumers read such rows as label/value
/// text, not as a grid.
pub fn filter_row(row: &[String], columns: &ColumnSelection, aggressive: bool) -> Vec<String> {
    columns
        .indices()
        .iter()
        .filter_map(|&i| row.get(i))
        .filter(|cell| !(aggressive && cell.is_empty()))
        .cloned()
        .collect()
}

pub fn filter_headers(headers: &[String], columns: &ColumnSelection) -> Vec<String> {
    columns
        .indices()
        .iter()
        .filter_map(|&i| headers.get(i))
        .cloned()
        .collect()
}

/// Reduce one data table. Header-less tables pass through as empty tables.
pub fn reduce_table(
    table: &DataTable,
    kind: SectionKind,
    max_years: usize,
    max_quarters: usize,
    aggressive: bool,
) -> DataTable {
    let Some(headers) = &table.headers else {
        return DataTable::default();
    };

    let columns = select_columns(kind, headers, max_years, max_quarters);

    DataTable {
        headers: Some(filter_headers(headers, &columns)),
        rows: table.rows.as_ref().map(|rows| {
            rows.iter()
                .map(|row| filter_row(row, &columns, aggressive))
                .collect()
        }),
    }
}
