use fincontext_core::document::SectionKind;
use fincontext_core::selection::select_columns;
use proptest::prelude::*;

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn quarters_keep_label_and_most_recent() {
    let h = headers(&["Particulars", "Q1", "Q2", "Q3", "Q4", "Q5"]);
    let selection = select_columns(SectionKind::Quarters, &h, 5, 3);
    assert_eq!(selection.indices(), &[0, 3, 4, 5]);
}

#[test]
fn quarters_keep_everything_when_fewer_than_limit() {
    let h = headers(&["Particulars", "Q1", "Q2"]);
    let selection = select_columns(SectionKind::Quarters, &h, 5, 8);
    assert_eq!(selection.indices(), &[0, 1, 2]);
}

#[test]
fn quarters_with_zero_limit_keep_only_labels() {
    let h = headers(&["Particulars", "Q1", "Q2"]);
    let selection = select_columns(SectionKind::Quarters, &h, 5, 0);
    assert_eq!(selection.indices(), &[0]);
}

#[test]
fn annual_keeps_ttm_and_last_years() {
    let h = headers(&["Particulars", "TTM", "2020", "2021", "2022"]);
    let selection = select_columns(SectionKind::Ratios, &h, 2, 8);
    assert_eq!(selection.indices(), &[0, 1, 3, 4]);

    let h = headers(&["Particulars", "TTM", "2020", "2021", "2022", "2023"]);
    let selection = select_columns(SectionKind::Ratios, &h, 2, 8);
    assert_eq!(selection.indices(), &[0, 1, 4, 5]);
}

#[test]
fn annual_ttm_match_is_case_insensitive_and_first_wins() {
    let h = headers(&["Particulars", "2021", "2022", "ttm", "TTM"]);
    let selection = select_columns(SectionKind::ProfitLoss, &h, 1, 8);
    // First "ttm" at 3 is kept as TTM; the later "TTM" at 4 is an ordinary column.
    assert_eq!(selection.indices(), &[0, 3, 4]);
}

#[test]
fn annual_without_ttm_keeps_last_years() {
    let h = headers(&["Particulars", "2019", "2020", "2021"]);
    let selection = select_columns(SectionKind::CashFlow, &h, 2, 8);
    assert_eq!(selection.indices(), &[0, 2, 3]);
}

#[test]
fn annual_zero_years_keeps_label_and_ttm() {
    let h = headers(&["Particulars", "2020", "TTM"]);
    let selection = select_columns(SectionKind::BalanceSheet, &h, 0, 8);
    assert_eq!(selection.indices(), &[0, 2]);
}

#[test]
fn shareholding_keeps_all_columns() {
    let h = headers(&["", "Mar 2020", "Jun 2020", "Sep 2020", "Dec 2020"]);
    let selection = select_columns(SectionKind::Shareholding, &h, 1, 1);
    assert_eq!(selection.indices(), &[0, 1, 2, 3, 4]);
}

#[test]
fn empty_header_row_keeps_label_column_only_for_policies() {
    let selection = select_columns(SectionKind::Quarters, &[], 5, 8);
    assert_eq!(selection.indices(), &[0]);
    let selection = select_columns(SectionKind::Shareholding, &[], 5, 8);
    assert!(selection.is_empty());
}

fn arb_headers(with_ttm: bool) -> impl Strategy<Value = Vec<String>> {
    (1usize..20, any::<prop::sample::Index>()).prop_map(move |(total, ttm_at)| {
        let mut h: Vec<String> = (0..total).map(|i| format!("C{i}")).collect();
        if with_ttm && total > 1 {
            let at = 1 + ttm_at.index(total - 1);
            h[at] = "TTM".to_string();
        }
        h
    })
}

proptest! {
    #[test]
    fn quarters_selection_size_and_tail(h in arb_headers(false), max_quarters in 0usize..12) {
        let total = h.len();
        let selection = select_columns(SectionKind::Quarters, &h, 5, max_quarters);
        let indices = selection.indices();

        prop_assert_eq!(indices[0], 0);
        prop_assert_eq!(indices.len() - 1, (total - 1).min(max_quarters));
        for (offset, &i) in indices[1..].iter().rev().enumerate() {
            prop_assert_eq!(i, total - 1 - offset);
        }
    }

    #[test]
    fn ttm_always_selected(h in arb_headers(true), max_years in 0usize..6) {
        let selection = select_columns(SectionKind::ProfitLoss, &h, max_years, 8);
        prop_assert!(selection.contains(0));
        if let Some(ttm) = h.iter().position(|x| x == "TTM") {
            prop_assert!(selection.contains(ttm));
        }
        prop_assert!(selection.indices().windows(2).all(|w| w[0] < w[1]));
    }
}
