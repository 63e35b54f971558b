use serde::Serialize;
use stagehand_core::types::Violation;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_violations(violations: &[Violation]) {
    for v in violations {
        println!("  {v}");
    }
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    print!("{}", render_table(headers, &rows));
}

/// Left-aligned columns two spaces apart, a dashed rule under the header.
/// Cells beyond the header count are dropped; trailing padding is trimmed.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(headers[col].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = table_line(headers.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&table_line(rule.iter().map(String::as_str), &widths));
    for row in rows {
        out.push_str(&table_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_columns_fit_widest_cell() {
        let rows = vec![
            vec!["1".to_string(), "Schema".to_string(), "done".to_string()],
            vec!["12".to_string(), "Search API".to_string(), String::new()],
        ];
        assert_eq!(
            render_table(&["PHASE", "NAME", "STATUS"], &rows),
            "PHASE  NAME        STATUS\n\
             -----  ----------  ------\n\
             1      Schema      done\n\
             12     Search API\n"
        );
    }

    #[test]
    fn table_counts_characters_not_bytes() {
        let rows = vec![vec!["naïve".to_string(), "x".to_string()]];
        assert_eq!(render_table(&["P", "Q"], &rows), "P      Q\n-----  -\nnaïve  x\n");
    }
}
