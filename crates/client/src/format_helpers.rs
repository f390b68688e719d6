//! Shared formatting utilities for notifications and summaries.

use shared_types::CurrencyTotals;

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format a byte count as "512 B", "1.5 KB", "12.3 MB".
pub fn format_file_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", SIZE_UNITS[unit])
    }
}

/// Format an amount with two decimals and space-grouped thousands, e.g. "1 234.50 PLN".
pub fn format_amount(amount: f64, currency: &str) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    let sign = if negative && cents > 0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac:02} {currency}")
}

/// One line per currency, joined with ", ". Empty totals render as "—".
pub fn format_totals(totals: &CurrencyTotals) -> String {
    if totals.is_empty() {
        return "—".to_string();
    }
    totals
        .iter()
        .map(|(currency, amount)| format_amount(*amount, currency))
        .collect::<Vec<_>>()
        .join(", ")
}

/// "1 file" / "3 files".
pub fn pluralize_files(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{count} files")
    }
}
