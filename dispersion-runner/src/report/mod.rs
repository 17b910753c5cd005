//! Human-facing renderings of a scan: console tables, alert email bodies,
//! and per-symbol SVG charts.

pub mod chart;
pub mod console;
pub mod email;

pub use chart::{render_all, render_symbol_chart, ChartBatch, ChartError};
pub use console::render_console;
pub use email::{compose, test_summary, AlertEmail};

/// Signed percentage with two decimals, e.g. `+25.00%`.
pub(crate) fn signed_percent(value: f64) -> String {
    format!("{value:+.2}%")
}

pub(crate) fn rule(width: usize) -> String {
    "=".repeat(width)
}
