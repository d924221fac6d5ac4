//! Structured extraction from raw page markup.
//!
//! Only the elements the reducer consumes are looked at; everything else in the
//! page (scripts, navigation, charts) is dropped here. Missing elements are
//! normal and simply leave the corresponding field empty.

use scraper::{ElementRef, Html};

use super::document::{
    DataTable, GrowthTable, KeyRatio, Section, SectionKind, StructuredDocument,
};

const KEY_RATIOS_ID: &str = "top-ratios";
const DATA_TABLE_CLASS: &str = "data-table";
const RANGES_TABLE_CLASS: &str = "ranges-table";

impl StructuredDocument {
    /// Parse raw markup. Never fails: malformed markup is recovered by the
    /// HTML5 parser and absent sections are skipped.
    pub fn parse(html: &str) -> Self {
        let page = Html::parse_document(html);
        let root = page.root_element();

        let title = find(root, |e| is_tag(e, "h1")).map(text_of);

        let key_ratios = find(root, |e| is_tag(e, "ul") && e.value().id() == Some(KEY_RATIOS_ID))
            .map(|ul| {
                find_all(ul, |e| is_tag(e, "li"))
                    .filter_map(|li| {
                        let name = find(li, |e| is_tag(e, "span") && has_class(e, "name"))?;
                        let value = find(li, |e| is_tag(e, "span") && has_class(e, "value"))?;
                        Some(KeyRatio {
                            name: text_of(name),
                            value: text_of(value),
                        })
                    })
                    .collect()
            });

        let about = find(root, |e| is_tag(e, "div") && has_class(e, "about")).map(text_of);
        let pros = find(root, |e| is_tag(e, "div") && has_class(e, "pros")).map(list_items);
        let cons = find(root, |e| is_tag(e, "div") && has_class(e, "cons")).map(list_items);

        let sections = SectionKind::ALL
            .iter()
            .filter_map(|&kind| {
                find(root, |e| is_tag(e, "section") && e.value().id() == Some(kind.id()))
                    .map(|el| parse_section(kind, el))
            })
            .collect();

        StructuredDocument {
            title,
            key_ratios,
            about,
            pros,
            cons,
            sections,
        }
    }
}

fn parse_section(kind: SectionKind, el: ElementRef<'_>) -> Section {
    let title = find(el, |e| is_tag(e, "h2")).map(text_of);

    let tables = find_all(el, |e| is_tag(e, "table") && has_class(e, DATA_TABLE_CLASS))
        .map(parse_data_table)
        .collect();

    let growth_tables = find_all(el, |e| is_tag(e, "table") && has_class(e, RANGES_TABLE_CLASS))
        .map(|table| GrowthTable {
            rows: find_all(table, |e| is_tag(e, "tr")).map(cells_of).collect(),
        })
        .collect();

    Section {
        kind,
        title,
        tables,
        growth_tables,
    }
}

fn parse_data_table(table: ElementRef<'_>) -> DataTable {
    // Rows are only meaningful relative to a header row.
    let Some(thead) = find(table, |e| is_tag(e, "thead")) else {
        return DataTable::default();
    };

    let headers = find_all(thead, |e| is_tag(e, "th")).map(text_of).collect();
    let rows = find(table, |e| is_tag(e, "tbody"))
        .map(|tbody| find_all(tbody, |e| is_tag(e, "tr")).map(cells_of).collect());

    DataTable {
        headers: Some(headers),
        rows,
    }
}

fn cells_of(tr: ElementRef<'_>) -> Vec<String> {
    find_all(tr, |e| is_tag(e, "td") || is_tag(e, "th"))
        .map(text_of)
        .collect()
}

fn list_items(container: ElementRef<'_>) -> Vec<String> {
    find_all(container, |e| is_tag(e, "li")).map(text_of).collect()
}

/// Every text node trimmed, empty pieces dropped, joined without separator.
fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_tag(el: ElementRef<'_>, name: &str) -> bool {
    el.value().name() == name
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Descendant elements in document order, excluding `el` itself.
fn find_all<'a, P>(el: ElementRef<'a>, pred: P) -> impl Iterator<Item = ElementRef<'a>>
where
    P: Fn(ElementRef<'a>) -> bool,
{
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |e| pred(*e))
}

fn find<'a, P>(el: ElementRef<'a>, pred: P) -> Option<ElementRef<'a>>
where
    P: Fn(ElementRef<'a>) -> bool,
{
    find_all(el, pred).next()
}
