//! Text tables, detail blocks and JSON printing.

use std::time::Duration;

use clap::ValueEnum;
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

/// Output format for command results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Column-aligned table with a header row, two spaces between columns.
pub(crate) struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub(crate) fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub(crate) fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }

        let mut out = String::new();
        for row in std::iter::once(&self.headers).chain(&self.rows) {
            let last = row.len().saturating_sub(1);
            for (i, cell) in row.iter().enumerate() {
                out.push_str(cell);
                if i < last {
                    let pad = widths[i] - cell.chars().count() + 2;
                    out.extend(std::iter::repeat_n(' ', pad));
                }
            }
            out.push('\n');
        }
        out
    }

    pub(crate) fn print(&self) {
        print!("{}", self.render());
    }
}

// ---------------------------------------------------------------------------
// Detail block
// ---------------------------------------------------------------------------

/// `Label:  value` lines with the values aligned. Empty values are skipped.
pub(crate) fn render_details(fields: &[(&str, String)]) -> String {
    let width = fields
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(label, _)| label.chars().count() + 1)
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (label, value) in fields.iter().filter(|(_, v)| !v.is_empty()) {
        out.push_str(&format!("{:<width$} {value}\n", format!("{label}:")));
    }
    out
}

pub(crate) fn print_details(fields: &[(&str, String)]) {
    print!("{}", render_details(fields));
}

// ---------------------------------------------------------------------------
// Cell helpers
// ---------------------------------------------------------------------------

/// Shorten to `max` characters, ending in `...` when cut.
pub(crate) fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = value.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Date part of an ISO timestamp, or `-`.
pub(crate) fn date_only(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.chars().take(10).collect(),
        _ => "-".to_string(),
    }
}

pub(crate) fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

pub(crate) fn opt(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

/// Price in minor units as `12.50 USD`.
pub(crate) fn price(amount: Option<u64>, currency: Option<&str>) -> String {
    match amount {
        Some(cents) => format!(
            "{}.{:02} {}",
            cents / 100,
            cents % 100,
            currency.unwrap_or_default().to_uppercase()
        )
        .trim_end()
        .to_string(),
        None => "-".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Spinner on stderr for multi-request operations.
pub(crate) fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid spinner template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
