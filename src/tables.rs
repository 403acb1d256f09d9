use comfy_table::{Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::core::{
    aggregate::DaySummary,
    publish::{Metric, Metrics},
    record::AcceptanceStatus,
};

#[must_use]
pub fn build_day_summary_table(summary: &DaySummary) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table.set_header(vec!["From", "To", "Price", "Volume", "Status"]);
    for record in &summary.records {
        table.add_row(vec![
            Cell::new(record.window.start.format("%H:%M")),
            Cell::new(record.window.end.format("%H:%M")),
            Cell::new(record.price).set_alignment(CellAlignment::Right),
            Cell::new(record.volume).set_alignment(CellAlignment::Right),
            Cell::new(record.status).fg(match record.status {
                AcceptanceStatus::Accepted => Color::Green,
                AcceptanceStatus::Rejected => Color::Red,
                AcceptanceStatus::Unknown => Color::Reset,
            }),
        ]);
    }
    table
}

#[must_use]
pub fn build_metrics_table(metrics: &Metrics) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table.set_header(vec!["Sensor", "State"]);
    for (metric, published) in metrics {
        table.add_row(vec![
            Cell::new(metric).fg(if *metric == Metric::Status {
                Color::DarkYellow
            } else {
                Color::Reset
            }),
            Cell::new(&published.value),
        ]);
    }
    table
}
