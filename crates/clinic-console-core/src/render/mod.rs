//! Plain-text and CSV rendering of projected rows.

use chrono::{DateTime, NaiveDate, Utc};

use crate::entity::{parse_timestamp, Entity, PatientDirectory};
use crate::models::{wire, Statistics};

/// Headers plus string cells, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Printed instead of rows when there are none.
    pub empty_message: String,
}

impl Table {
    pub fn new(headers: &[&str], empty_message: impl Into<String>) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            empty_message: empty_message.into(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Left-aligned columns separated by two spaces, with a rule under the header.
    pub fn render_text(&self) -> String {
        if self.rows.is_empty() {
            return format!("{}\n", self.empty_message);
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let width = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(width),
                    None => widths.push(width),
                }
            }
        }

        let mut out = String::new();
        out.push_str(&format_line(&self.headers, &widths));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&format_line(&rule, &widths));
        for row in &self.rows {
            out.push_str(&format_line(row, &widths));
        }
        out
    }

    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str(&csv_line(&self.headers));
        for row in &self.rows {
            csv.push_str(&csv_line(row));
        }

        csv
    }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    format!("{}\n", line.trim_end())
}

fn csv_line(cells: &[String]) -> String {
    let line = cells
        .iter()
        .map(|c| escape_csv(c))
        .collect::<Vec<_>>()
        .join(",");
    format!("{}\n", line)
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Build the table for projected entity rows.
pub fn table_for<E: Entity>(rows: &[&E], patients: &PatientDirectory) -> Table {
    let mut table = Table::new(E::COLUMNS, format!("No {} records found", E::LABEL));
    for record in rows {
        table.push(record.cells(patients));
    }
    table
}

pub fn statistics_table(stats: &Statistics) -> Table {
    let mut table = Table::new(&["Counter", "Total"], "No statistics available");
    for (label, value) in stats.rows() {
        table.push(vec![label.to_string(), value.to_string()]);
    }
    table
}

/// `2024-01-10` → `10/01/2024`. Unparseable input is returned as is.
pub fn display_date(raw: &str) -> String {
    let date = wire::date_only(raw.trim());
    match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
        Ok(d) => d.format("%d/%m/%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// `2024-03-05T14:30` → `05/03/2024 14:30`.
pub fn display_datetime(raw: &str) -> String {
    parse_timestamp(raw)
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn display_amount(amount: f64) -> String {
    format!("{:.2} €", amount)
}

/// Uppercase the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;

    #[test]
    fn test_render_text_aligns_columns() {
        let mut table = Table::new(&["ID", "Name"], "empty");
        table.push(vec!["1".into(), "Élodie".into()]);
        table.push(vec!["12".into(), "Bo".into()]);

        let text = table.render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID  Name");
        assert_eq!(lines[1], "--  ------");
        assert_eq!(lines[2], "1   Élodie");
        assert_eq!(lines[3], "12  Bo");
    }

    #[test]
    fn test_empty_table_message() {
        let rows: Vec<&Patient> = Vec::new();
        let table = table_for::<Patient>(&rows, &PatientDirectory::default());
        assert_eq!(table.render_text(), "No patient records found\n");
    }

    #[test]
    fn test_csv_escaping() {
        let mut table = Table::new(&["Name", "Note"], "empty");
        table.push(vec!["Martin, Alice".into(), "says \"hi\"".into()]);
        assert_eq!(
            table.to_csv(),
            "Name,Note\n\"Martin, Alice\",\"says \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_display_helpers() {
        assert_eq!(display_date("2024-01-10T00:00:00.000000Z"), "10/01/2024");
        assert_eq!(display_date("soon"), "soon");
        assert_eq!(display_datetime("2024-03-05 14:30:00"), "05/03/2024 14:30");
        assert_eq!(display_amount(150.0), "150.00 €");
        assert_eq!(capitalize("impayée"), "Impayée");
        assert_eq!(capitalize(""), "");
    }
}
