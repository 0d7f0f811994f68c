//! HTML parser for the multi-table task export.

use scraper::{ElementRef, Html, Selector};

/// Cell text of one `<table>`, row by row.
///
/// Rows of tables nested inside this one belong to the nested table only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

/// Collects every `<table>` of an HTML document in document order.
///
/// Cell text has its whitespace runs (non-breaking spaces included) collapsed
/// to single spaces and is trimmed.
pub fn parse_tables(html: &str) -> Vec<RawTable> {
    let document = Html::parse_document(html);
    let Ok(tables) = Selector::parse("table") else {
        return Vec::new();
    };

    document
        .select(&tables)
        .map(|table| RawTable {
            rows: own_rows(table),
        })
        .collect()
}

fn own_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
        .filter(|row| {
            row.ancestors()
                .find(|n| n.value().as_element().is_some_and(|e| e.name() == "table"))
                .map(|n| n.id())
                == Some((*table).id())
        })
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(cell_text)
                .collect()
        })
        .collect()
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
