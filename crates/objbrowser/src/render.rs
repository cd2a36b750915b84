//! Plain text rendering of a browser window

use std::fmt::Write as _;

use obj_tree::Inspect;

use crate::browser::{ObjectBrowser, Row};
use crate::column::Alignment;

const EXPANDED: &str = "\u{25BE} ";
const COLLAPSED: &str = "\u{25B8} ";
const LEAF: &str = "  ";
const INDENT: &str = "  ";
const SEPARATOR: &str = " | ";
const ELLIPSIS: char = '\u{2026}';

/// Pad or cut `text` to exactly `width` characters
pub fn fit(text: &str, width: usize, alignment: Alignment) -> String {
    let len = text.chars().count();
    if len > width {
        if width == 0 {
            return String::new();
        }
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push(ELLIPSIS);
        return cut;
    }
    match alignment {
        Alignment::Left => format!("{text:<width$}"),
        Alignment::Right => format!("{text:>width$}"),
    }
}

/// The tree table: a header, a rule, then one line per visible row
pub fn render_table<V: Inspect>(browser: &ObjectBrowser<V>) -> String {
    let columns: Vec<_> = browser.visible_columns().collect();
    let mut out = String::new();

    let header: Vec<String> = columns
        .iter()
        .map(|c| fit(c.name, c.width, Alignment::Left))
        .collect();
    push_line(&mut out, &header.join(SEPARATOR));
    let rule: Vec<String> = columns.iter().map(|c| "-".repeat(c.width)).collect();
    push_line(&mut out, &rule.join("-+-"));

    for row in browser.visible_rows() {
        let indent = INDENT.repeat(row.depth());
        let cells: Vec<String> = match &row {
            Row::Node {
                id,
                expanded,
                expandable,
                ..
            } => {
                let marker = match (*expandable, *expanded) {
                    (false, _) => LEAF,
                    (true, true) => EXPANDED,
                    (true, false) => COLLAPSED,
                };
                let mut cells = browser.cells(*id);
                if let Some(first) = cells.first_mut() {
                    *first = format!("{indent}{marker}{first}");
                }
                cells
            }
            Row::Error { message, .. } => {
                let mut cells = vec![String::new(); columns.len()];
                if let Some(first) = cells.first_mut() {
                    *first = format!("{indent}{LEAF}**ERROR**: {message}");
                }
                cells
            }
        };
        let fitted: Vec<String> = columns
            .iter()
            .zip(&cells)
            .map(|(c, text)| fit(text, c.width, c.alignment))
            .collect();
        push_line(&mut out, &fitted.join(SEPARATOR));
    }
    out
}

/// The detail pane of the selected node
pub fn render_details<V: Inspect>(browser: &ObjectBrowser<V>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}]", browser.detail_mode());
    match browser.details() {
        Some(text) => out.push_str(&text),
        None => out.push_str("<nothing selected>"),
    }
    out.push('\n');
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::columns_by_name;
    use crate::detail::DetailMode;
    use obj_tree::value::{Object, Value};
    use obj_tree::InspectError;
    use pretty_assertions::assert_eq;

    fn narrow(browser: ObjectBrowser<Value>) -> ObjectBrowser<Value> {
        let mut columns = columns_by_name(&["name", "repr"]).unwrap();
        columns[0].width = 12;
        columns[1].width = 10;
        let mut browser = browser.with_columns(columns);
        browser.set_show_callables(false);
        browser.set_show_dunder_attributes(false);
        browser
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("abc", 5, Alignment::Left), "abc  ");
        assert_eq!(fit("abc", 5, Alignment::Right), "  abc");
        assert_eq!(fit("abcdef", 4, Alignment::Left), "abc\u{2026}");
        assert_eq!(fit("abc", 0, Alignment::Left), "");
        assert_eq!(fit("\u{e9}t\u{e9}", 3, Alignment::Left), "\u{e9}t\u{e9}");
    }

    #[test]
    fn test_table() {
        let mut browser = narrow(ObjectBrowser::new(
            Value::list(vec![1.into(), "two".into()]),
            "lst",
        ));
        let inspected = browser.tree().inspected();
        browser.expand(inspected).unwrap();
        insta::assert_snapshot!(render_table(&browser), @r###"
        name         | repr
        -------------+-----------
        ▾ lst        | [1, 'two']
          ▸ 0        | 1
          ▸ 1        | 'two'
        "###);
    }

    #[test]
    fn test_long_cells_are_cut() {
        let browser = narrow(ObjectBrowser::new(Value::from("abcdefghijklmnop"), "text"));
        insta::assert_snapshot!(render_table(&browser), @r###"
        name         | repr
        -------------+-----------
        ▸ text       | 'abcdefgh…
        "###);
    }

    #[test]
    fn test_error_row() {
        let broken = Value::object(
            Object::new("Stream").with_items(|_| Err(InspectError::raised("closed"))),
        );
        let mut browser = narrow(ObjectBrowser::new(broken, "stream"));
        let columns = columns_by_name(&["name"]).unwrap();
        browser = browser.with_columns(
            columns
                .into_iter()
                .map(|c| c.width(80))
                .collect(),
        );
        let inspected = browser.tree().inspected();
        browser.expand(inspected).unwrap();
        let table = render_table(&browser);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[3].starts_with("    **ERROR**: "));
        assert!(lines[3].ends_with("closed"));
    }

    #[test]
    fn test_details() {
        let mut browser = ObjectBrowser::new(Value::from(42), "answer");
        browser.set_detail_mode(DetailMode::Repr);
        assert_eq!(render_details(&browser), "[repr]\n42\n");
    }
}
