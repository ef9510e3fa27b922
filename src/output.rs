use crate::error::{PipelineError, Result};
use crate::types::CsvRow;
use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Write `rows` as CSV under the row type's header, which is written even for no rows.
pub fn write_csv<T: CsvRow>(path: &Path, rows: &[T]) -> Result<()> {
    let wrap = |source| PipelineError::WriteCsv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path).map_err(wrap)?;
    wtr.write_record(T::COLUMNS).map_err(wrap)?;
    for r in rows {
        wtr.serialize(r).map_err(wrap)?;
    }
    wtr.flush().map_err(|source| PipelineError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|source| PipelineError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Markdown rendering of the first `max_rows` rows.
pub fn preview_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}
