//! Plain-text table rendering for the console

use qr_client::list::{ListRenderer, ListView};
use qr_client::Error;
use qr_common::{Assessment, Certificate, User};
use std::io::Write;

/// An entity that can be printed as one table row
pub trait TableRow {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl TableRow for User {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "EMAIL", "ORGANIZATION", "VERIFIED", "ACTIVE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.display_name(),
            self.email.clone(),
            self.organization_name.clone(),
            yes_no(self.is_verified),
            yes_no(self.is_active),
        ]
    }
}

impl TableRow for Assessment {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "ORGANIZATION", "STATUS", "RISK", "STAGE", "PROGRESS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.assessment_name.clone(),
            self.organization_name.clone(),
            self.status.clone(),
            self.risk_level.clone(),
            self.current_stage.to_string(),
            format!("{:.0}%", self.progress.overall),
        ]
    }
}

impl TableRow for Certificate {
    const HEADERS: &'static [&'static str] = &["CERTIFICATE", "ORGANIZATION", "SCORE", "ISSUED", "STATUS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.certificate_id.clone(),
            self.organization_name.clone(),
            self.compliance_score
                .map(|score| format!("{:.1}", score))
                .unwrap_or_else(|| "-".to_string()),
            self.issued_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.status.clone(),
        ]
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

/// Prints every applied page to stdout and errors to stderr
pub struct TableRenderer {
    title: &'static str,
}

impl TableRenderer {
    pub fn new(title: &'static str) -> Self {
        Self { title }
    }
}

impl<E: TableRow + Send + Sync> ListRenderer<E> for TableRenderer {
    fn render(&self, view: &ListView<E>) {
        let rows: Vec<Vec<String>> = view.items.iter().map(TableRow::cells).collect();
        let mut widths: Vec<usize> = E::HEADERS.iter().map(|h| h.len()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = std::io::stdout().lock();
        let filters = view
            .filters
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            out,
            "\n== {} (page {}/{}, {} total) {}",
            self.title,
            view.page,
            view.page_count.max(1),
            view.total,
            filters
        );
        let _ = writeln!(out, "{}", format_row(E::HEADERS.iter().map(|h| h.to_string()), &widths));
        if rows.is_empty() {
            let _ = writeln!(out, "(no results)");
        }
        for row in rows {
            let _ = writeln!(out, "{}", format_row(row.into_iter(), &widths));
        }
    }

    fn show_error(&self, context: &str, error: &Error) {
        eprintln!("Failed to load {}: {}", context, error.user_message());
    }
}

fn format_row(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_is_padded_to_widths() {
        let row = format_row(vec!["a".to_string(), "bb".to_string()].into_iter(), &[3, 2]);
        assert_eq!(row, "a    bb");
    }

    #[test]
    fn test_user_cells() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "u-1",
            "email": "ada@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace"
        }))
        .unwrap();
        let cells = user.cells();
        assert_eq!(cells.len(), User::HEADERS.len());
        assert_eq!(cells[1], "Ada Lovelace");
    }
}
