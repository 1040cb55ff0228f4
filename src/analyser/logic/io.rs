//! Loading tables from bytes and saving them back.
//!
//! All three formats funnel into the same path: rows of optional text tokens
//! under a header, then per-column inference through [`TokenRules`]. The
//! byte-level functions are pure; only `load_path`/`save_path` touch the
//! filesystem.

use super::inference::TokenRules;
use super::naming::normalise_headers;
use super::table::Table;
use super::types::{Cell, DATETIME_FORMAT, format_float};
use crate::config::InferenceSettings;
use crate::error::{EngineError, Result, ResultExt as _};
use calamine::{Data, Reader as _, Xlsx};
use serde::ser::{SerializeMap as _, SerializeSeq as _};
use serde::{Deserialize, Serialize, Serializer};
use std::io::Cursor;
use std::path::Path;

/// Largest magnitude up to which every whole number survives a trip through f64 (2^53).
const EXACT_INTEGER_LIMIT: i64 = 1 << 53;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataFormat {
    Delimited,
    Spreadsheet,
    Json,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" | "txt" => Ok(Self::Delimited),
            "xlsx" | "xlsm" => Ok(Self::Spreadsheet),
            "json" => Ok(Self::Json),
            _ => Err(EngineError::Other(format!(
                "Unsupported file extension: '{ext}'"
            ))),
        }
    }
}

/// Header plus rows of raw tokens; `None` is a cell with no text at all.
struct RawGrid {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawGrid {
    fn into_table(self, settings: &InferenceSettings) -> Result<Table> {
        if self.headers.is_empty() {
            return Err(EngineError::EmptyOrMalformedInput(
                "no columns in header".to_owned(),
            ));
        }
        if self.rows.is_empty() {
            return Err(EngineError::EmptyOrMalformedInput(
                "no data rows after the header".to_owned(),
            ));
        }

        let rules = TokenRules::new(settings);
        let names = normalise_headers(&self.headers);
        let mut columns = Vec::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            let tokens: Vec<&str> = self
                .rows
                .iter()
                .map(|row| row.get(index).and_then(|t| t.as_deref()).unwrap_or(""))
                .collect();
            columns.push(rules.build_column(name, &tokens)?);
        }
        Table::new(columns)
    }
}

/// Parses `source` with default inference settings.
pub fn load(source: &[u8], format: DataFormat) -> Result<Table> {
    load_with(source, format, &InferenceSettings::default())
}

pub fn load_with(source: &[u8], format: DataFormat, settings: &InferenceSettings) -> Result<Table> {
    if source.iter().all(u8::is_ascii_whitespace) {
        return Err(EngineError::EmptyOrMalformedInput(
            "source is empty".to_owned(),
        ));
    }

    let grid = match format {
        DataFormat::Delimited => read_delimited(source)?,
        DataFormat::Spreadsheet => read_spreadsheet(source)?,
        DataFormat::Json => read_json(source)?,
    };
    grid.into_table(settings)
}

pub fn load_path(path: &Path, settings: &InferenceSettings) -> Result<Table> {
    let format = DataFormat::from_path(path)?;
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    load_with(&bytes, format, settings)
}

fn read_delimited(source: &[u8]) -> Result<RawGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(EngineError::MalformedRow {
                row: index + 1,
                expected: headers.len(),
                found: record.len(),
            });
        }
        rows.push(record.iter().map(|field| Some(field.to_owned())).collect());
    }

    Ok(RawGrid { headers, rows })
}

fn read_spreadsheet(source: &[u8]) -> Result<RawGrid> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(source.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EngineError::EmptyOrMalformedInput("workbook has no sheets".to_owned()))??;

    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        return Err(EngineError::EmptyOrMalformedInput(
            "first sheet is empty".to_owned(),
        ));
    };

    let headers = header_row
        .iter()
        .map(|cell| spreadsheet_token(cell).unwrap_or_default())
        .collect();
    let rows = rows_iter
        .map(|row| row.iter().map(spreadsheet_token).collect())
        .collect();

    Ok(RawGrid { headers, rows })
}

fn spreadsheet_token(cell: &Data) -> Option<String> {
    match cell {
        Data::Int(v) => Some(v.to_string()),
        Data::Float(v) => {
            // workbooks store every number as a float
            if v.fract() == 0.0 && v.abs() <= EXACT_INTEGER_LIMIT as f64 {
                Some(format!("{}", *v as i64))
            } else {
                Some(format_float(*v))
            }
        }
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|dt| dt.format(DATETIME_FORMAT).to_string()),
        Data::Error(_) | Data::Empty => None,
    }
}

fn read_json(source: &[u8]) -> Result<RawGrid> {
    let value: serde_json::Value = serde_json::from_slice(source)
        .map_err(|e| EngineError::EmptyOrMalformedInput(format!("invalid JSON: {e}")))?;
    let serde_json::Value::Array(records) = value else {
        return Err(EngineError::EmptyOrMalformedInput(
            "expected a JSON array of row objects".to_owned(),
        ));
    };

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let serde_json::Value::Object(object) = record else {
            return Err(EngineError::EmptyOrMalformedInput(format!(
                "row {} is not a JSON object",
                index + 1
            )));
        };
        if index == 0 {
            headers = object.keys().cloned().collect();
        }
        if object.len() != headers.len() || !headers.iter().all(|h| object.contains_key(h)) {
            return Err(EngineError::MalformedRow {
                row: index + 1,
                expected: headers.len(),
                found: object.len(),
            });
        }
        rows.push(
            headers
                .iter()
                .map(|h| object.get(h).and_then(json_token))
                .collect(),
        );
    }

    Ok(RawGrid { headers, rows })
}

fn json_token(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
            Some(nested.to_string())
        }
    }
}

// SAVING

pub fn save(table: &Table, format: DataFormat) -> Result<Vec<u8>> {
    match format {
        DataFormat::Delimited => write_delimited(table),
        DataFormat::Spreadsheet => write_spreadsheet(table),
        DataFormat::Json => write_json(table),
    }
}

pub fn save_path(table: &Table, path: &Path) -> Result<()> {
    let format = DataFormat::from_path(path)?;
    let bytes = save(table, format)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn write_delimited(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in 0..table.row_count() {
        writer.write_record(table.row(row).iter().map(|cell| cell.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| EngineError::Serialization(e.to_string()))
}

fn write_spreadsheet(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, column) in table.columns().enumerate() {
        let col = u16::try_from(col)
            .map_err(|_| EngineError::Serialization("too many columns for a worksheet".to_owned()))?;
        sheet.write_string(0, col, column.name())?;

        for (row, cell) in column.cells().iter().enumerate() {
            let row = u32::try_from(row + 1)
                .map_err(|_| EngineError::Serialization("too many rows for a worksheet".to_owned()))?;
            match cell {
                Cell::Integer(v) if v.unsigned_abs() <= EXACT_INTEGER_LIMIT.unsigned_abs() => {
                    sheet.write_number(row, col, *v as f64)?;
                }
                // text keeps every digit and still re-infers as Integer
                Cell::Integer(v) => {
                    sheet.write_string(row, col, v.to_string())?;
                }
                Cell::Float(v) => {
                    sheet.write_number(row, col, *v)?;
                }
                Cell::Boolean(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                Cell::String(s) | Cell::Categorical(s) => {
                    sheet.write_string(row, col, s)?;
                }
                Cell::DateTime(_) => {
                    sheet.write_string(row, col, cell.to_string())?;
                }
                Cell::Missing => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// One table row serialized as an object, keys in column order.
struct JsonRow<'a> {
    table: &'a Table,
    row: usize,
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.column_count()))?;
        for column in self.table.columns() {
            let cell = column.get(self.row).unwrap_or(&Cell::Missing);
            map.serialize_entry(column.name(), &JsonCell(cell))?;
        }
        map.end()
    }
}

struct JsonCell<'a>(&'a Cell);

impl Serialize for JsonCell<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Cell::Integer(v) => serializer.serialize_i64(*v),
            Cell::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Cell::Float(_) | Cell::Missing => serializer.serialize_none(),
            Cell::Boolean(b) => serializer.serialize_bool(*b),
            Cell::String(s) | Cell::Categorical(s) => serializer.serialize_str(s),
            Cell::DateTime(_) => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

struct JsonRows<'a>(&'a Table);

impl Serialize for JsonRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.row_count()))?;
        for row in 0..self.0.row_count() {
            seq.serialize_element(&JsonRow { table: self.0, row })?;
        }
        seq.end()
    }
}

fn write_json(table: &Table) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&JsonRows(table))?)
}
