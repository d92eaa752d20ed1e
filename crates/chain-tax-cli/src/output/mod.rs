//! Renderers for engine results. Every command hands over a JSON value:
//! simulations, comparisons and sweeps arrive in the metadata envelope,
//! `ctax seed` emits a bare run document. Table and CSV recognise the three
//! envelope shapes by their keys (`totals`, `variants`, `matrix`).

pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}
