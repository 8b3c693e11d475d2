//! Export of the derived name list to CSV and XLSX.
//!
//! Each format is an [`ExportAdapter`] that turns rows into bytes; the caller
//! only ever hands over the derived list.

use chrono::SecondsFormat;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::constants::constants;
use crate::model::NameEntry;

pub const HEADERS: [&str; 4] = ["#", "Name", "Timestamp (s)", "Added At"];

#[derive(Debug, Error)]
pub enum ExportError {
  #[error("No names to export.")]
  Empty,
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),
  #[error("XLSX error: {0}")]
  Xlsx(#[from] XlsxError),
}

/// One output row, already formatted the way every format shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
  pub index: usize,
  pub name: String,
  pub timestamp: String,
  pub added_at: String,
}

impl ExportRow {
  /// Rows numbered from 1 in display order.
  pub fn from_entries(entries: &[NameEntry]) -> Vec<Self> {
    entries
      .iter()
      .enumerate()
      .map(|(i, e)| ExportRow {
        index: i + 1,
        name: e.name.clone(),
        timestamp: format!("{:.2}", e.timestamp),
        added_at: e.added_at.to_rfc3339_opts(SecondsFormat::Millis, true),
      })
      .collect()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
  Csv,
  Xlsx,
}

impl ExportFormat {
  pub fn extension(self) -> &'static str {
    match self {
      ExportFormat::Csv => "csv",
      ExportFormat::Xlsx => "xlsx",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      ExportFormat::Csv => "CSV",
      ExportFormat::Xlsx => "Excel",
    }
  }

  pub fn adapter(self) -> Box<dyn ExportAdapter> {
    match self {
      ExportFormat::Csv => Box::new(CsvExporter),
      ExportFormat::Xlsx => Box::new(XlsxExporter { sheet_name: constants().export_sheet_name.clone() }),
    }
  }
}

/// Serializes rows into a complete file body.
pub trait ExportAdapter {
  fn export_rows(&self, rows: &[ExportRow]) -> Result<Vec<u8>, ExportError>;
}

pub struct CsvExporter;

impl ExportAdapter for CsvExporter {
  fn export_rows(&self, rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for row in rows {
      let index = row.index.to_string();
      writer.write_record([index.as_str(), row.name.as_str(), row.timestamp.as_str(), row.added_at.as_str()])?;
    }
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
  }
}

pub struct XlsxExporter {
  pub sheet_name: String,
}

impl ExportAdapter for XlsxExporter {
  fn export_rows(&self, rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(&self.sheet_name)?;

    for (col, header) in HEADERS.iter().enumerate() {
      sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    for (i, row) in rows.iter().enumerate() {
      let r = (i + 1) as u32;
      sheet.write_number(r, 0, row.index as f64)?;
      sheet.write_string(r, 1, &row.name)?;
      sheet.write_string(r, 2, &row.timestamp)?;
      sheet.write_string(r, 3, &row.added_at)?;
    }
    sheet.set_column_width(1, 32)?;
    sheet.set_column_width(3, 26)?;

    Ok(workbook.save_to_buffer()?)
  }
}

/// Fixed output path for `format` inside `dir`.
pub fn export_path(dir: &Path, format: ExportFormat) -> PathBuf {
  dir.join(format!("{}.{}", constants().export_file_stem, format.extension()))
}

/// Write the derived list to `dir` in `format`. Refuses to write an empty list.
pub fn export_entries(entries: &[NameEntry], format: ExportFormat, dir: &Path) -> Result<PathBuf, ExportError> {
  if entries.is_empty() {
    return Err(ExportError::Empty);
  }
  let rows = ExportRow::from_entries(entries);
  let bytes = format.adapter().export_rows(&rows)?;

  std::fs::create_dir_all(dir)?;
  let path = export_path(dir, format);
  std::fs::write(&path, bytes)?;
  info!(path = %path.display(), rows = rows.len(), format = format.extension(), "export: written");
  Ok(path)
}
