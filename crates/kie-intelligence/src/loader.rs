// crates/kie-intelligence/src/loader.rs
// ============================================================================
// Module: Data Loader
// Description: CSV/Excel/Parquet/JSON readers with per-column type inference.
// Purpose: Turn consultant data files into one canonical typed table.
// Dependencies: calamine, csv, parquet, serde_json, time
// ============================================================================

//! ## Overview
//! The loader reads a data file selected by extension into the table model
//! and infers per-column types (numeric, categorical, datetime, boolean,
//! textual, identifier). Inference is deterministic: the same file always
//! yields the same types. Quality problems (null-heavy, constant,
//! high-cardinality columns) surface as warnings, never as failures; an
//! unreadable file is an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::path::Path;

use calamine::Data as ExcelData;
use calamine::Reader;
use calamine::open_workbook_auto;
use parquet::file::reader::FileReader;
use parquet::file::reader::SerializedFileReader;
use parquet::record::Field;
use thiserror::Error;
use time::Date;
use time::macros::format_description;
use tracing::debug;

use crate::table::CellValue;
use crate::table::Column;
use crate::table::ColumnType;
use crate::table::DataTable;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Loader errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file extension is not a supported tabular format.
    #[error("unsupported data format: {0}")]
    UnsupportedFormat(String),
    /// The file could not be opened or read.
    #[error("failed to read {path}: {detail}")]
    Read {
        /// Path that could not be read.
        path: String,
        /// Failure detail.
        detail: String,
    },
    /// The file parsed but holds no tabular content.
    #[error("no tabular content in {0}")]
    NoContent(String),
}

impl LoadError {
    /// Creates a read error for the given path.
    fn read(path: &Path, detail: impl Into<String>) -> Self {
        Self::Read {
            path: path.display().to_string(),
            detail: detail.into(),
        }
    }
}

// ============================================================================
// SECTION: Formats
// ============================================================================

/// Supported tabular formats, selected by file extension.
///
/// # Invariants
/// - Variants are stable for evidence reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// Comma-separated values.
    Csv,
    /// Excel workbooks (`.xlsx`, `.xls`).
    Excel,
    /// Apache Parquet.
    Parquet,
    /// JSON array of flat objects.
    Json,
}

/// Detects the format of a data file from its extension.
#[must_use]
pub fn detect_format(path: &Path) -> Option<DataFormat> {
    let extension = path.extension()?.to_string_lossy().to_ascii_lowercase();
    match extension.as_str() {
        "csv" | "tsv" => Some(DataFormat::Csv),
        "xlsx" | "xls" | "xlsm" => Some(DataFormat::Excel),
        "parquet" => Some(DataFormat::Parquet),
        "json" => Some(DataFormat::Json),
        _ => None,
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Loads a data file into a typed table, capped at `max_rows` rows.
///
/// # Errors
///
/// Returns [`LoadError`] when the format is unsupported or the file cannot
/// be read. Quality problems do not error; they surface later as warnings.
pub fn load_table(path: &Path, max_rows: usize) -> Result<DataTable, LoadError> {
    let format = detect_format(path)
        .ok_or_else(|| LoadError::UnsupportedFormat(path.display().to_string()))?;
    let raw = match format {
        DataFormat::Csv => read_csv(path, max_rows)?,
        DataFormat::Excel => read_excel(path, max_rows)?,
        DataFormat::Parquet => read_parquet(path, max_rows)?,
        DataFormat::Json => read_json(path, max_rows)?,
    };
    let table = infer_table(raw);
    debug!(
        rows = table.row_count,
        columns = table.columns.len(),
        "loaded data table"
    );
    Ok(table)
}

/// Raw column contents before type inference.
struct RawTable {
    /// Column names in source order.
    names: Vec<String>,
    /// Cell values per column, pre-inference.
    cells: Vec<Vec<CellValue>>,
}

/// Reads a CSV file into raw text cells.
fn read_csv(path: &Path, max_rows: usize) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|err| LoadError::read(path, err.to_string()))?;
    let names: Vec<String> = reader
        .headers()
        .map_err(|err| LoadError::read(path, err.to_string()))?
        .iter()
        .map(ToString::to_string)
        .collect();
    if names.is_empty() {
        return Err(LoadError::NoContent(path.display().to_string()));
    }
    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];
    for record in reader.records().take(max_rows) {
        let record = record.map_err(|err| LoadError::read(path, err.to_string()))?;
        for (index, column) in cells.iter_mut().enumerate() {
            let field = record.get(index).unwrap_or("");
            column.push(if field.trim().is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(field.trim().to_string())
            });
        }
    }
    Ok(RawTable {
        names,
        cells,
    })
}

/// Reads the first worksheet of an Excel workbook.
fn read_excel(path: &Path, max_rows: usize) -> Result<RawTable, LoadError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| LoadError::read(path, err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NoContent(path.display().to_string()))?
        .map_err(|err| LoadError::read(path, err.to_string()))?;
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(LoadError::NoContent(path.display().to_string()));
    };
    let names: Vec<String> = header.iter().map(excel_header).collect();
    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];
    for row in rows.take(max_rows) {
        for (index, column) in cells.iter_mut().enumerate() {
            column.push(row.get(index).map_or(CellValue::Null, excel_cell));
        }
    }
    Ok(RawTable {
        names,
        cells,
    })
}

/// Renders an Excel header cell as a column name.
fn excel_header(data: &ExcelData) -> String {
    match data {
        ExcelData::String(value) => value.trim().to_string(),
        other => other.to_string(),
    }
}

/// Converts an Excel cell into a raw cell value.
fn excel_cell(data: &ExcelData) -> CellValue {
    match data {
        ExcelData::Empty => CellValue::Null,
        ExcelData::String(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        ExcelData::Float(value) => {
            if value.is_finite() {
                CellValue::Float(*value)
            } else {
                CellValue::Null
            }
        }
        ExcelData::Int(value) => CellValue::Int(*value),
        ExcelData::Bool(value) => CellValue::Bool(*value),
        ExcelData::DateTime(value) => CellValue::Text(value.to_string()),
        ExcelData::DateTimeIso(value) | ExcelData::DurationIso(value) => {
            CellValue::Text(value.clone())
        }
        ExcelData::Error(_) => CellValue::Null,
    }
}

/// Reads a Parquet file through the row API.
fn read_parquet(path: &Path, max_rows: usize) -> Result<RawTable, LoadError> {
    let file = File::open(path).map_err(|err| LoadError::read(path, err.to_string()))?;
    let reader =
        SerializedFileReader::new(file).map_err(|err| LoadError::read(path, err.to_string()))?;
    let mut names: Vec<String> = Vec::new();
    let mut cells: Vec<Vec<CellValue>> = Vec::new();
    let rows = reader
        .get_row_iter(None)
        .map_err(|err| LoadError::read(path, err.to_string()))?;
    for (row_index, row) in rows.enumerate() {
        if row_index >= max_rows {
            break;
        }
        let row = row.map_err(|err| LoadError::read(path, err.to_string()))?;
        for (column_index, (name, field)) in row.get_column_iter().enumerate() {
            if row_index == 0 {
                names.push(name.clone());
                cells.push(Vec::new());
            }
            if let Some(column) = cells.get_mut(column_index) {
                column.push(parquet_cell(field));
            }
        }
    }
    if names.is_empty() {
        return Err(LoadError::NoContent(path.display().to_string()));
    }
    Ok(RawTable {
        names,
        cells,
    })
}

/// Converts a Parquet field into a raw cell value.
fn parquet_cell(field: &Field) -> CellValue {
    match field {
        Field::Null => CellValue::Null,
        Field::Bool(value) => CellValue::Bool(*value),
        Field::Byte(value) => CellValue::Int(i64::from(*value)),
        Field::Short(value) => CellValue::Int(i64::from(*value)),
        Field::Int(value) => CellValue::Int(i64::from(*value)),
        Field::Long(value) => CellValue::Int(*value),
        Field::UByte(value) => CellValue::Int(i64::from(*value)),
        Field::UShort(value) => CellValue::Int(i64::from(*value)),
        Field::UInt(value) => CellValue::Int(i64::from(*value)),
        Field::ULong(value) => i64::try_from(*value).map_or(CellValue::Null, CellValue::Int),
        Field::Float(value) => {
            if value.is_finite() {
                CellValue::Float(f64::from(*value))
            } else {
                CellValue::Null
            }
        }
        Field::Double(value) => {
            if value.is_finite() {
                CellValue::Float(*value)
            } else {
                CellValue::Null
            }
        }
        Field::Str(value) => {
            if value.trim().is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(value.trim().to_string())
            }
        }
        other => CellValue::Text(other.to_string()),
    }
}

/// Reads a JSON array of flat objects.
fn read_json(path: &Path, max_rows: usize) -> Result<RawTable, LoadError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|err| LoadError::read(path, err.to_string()))?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|err| LoadError::read(path, err.to_string()))?;
    let serde_json::Value::Array(rows) = value else {
        return Err(LoadError::read(path, "expected a JSON array of objects"));
    };
    let mut names: Vec<String> = Vec::new();
    for row in &rows {
        if let serde_json::Value::Object(object) = row {
            for key in object.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }
    }
    if names.is_empty() {
        return Err(LoadError::NoContent(path.display().to_string()));
    }
    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];
    for row in rows.iter().take(max_rows) {
        let serde_json::Value::Object(object) = row else {
            continue;
        };
        for (index, name) in names.iter().enumerate() {
            let cell = object.get(name).map_or(CellValue::Null, json_cell);
            if let Some(column) = cells.get_mut(index) {
                column.push(cell);
            }
        }
    }
    Ok(RawTable {
        names,
        cells,
    })
}

/// Converts a JSON value into a raw cell value.
fn json_cell(value: &serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::Null => CellValue::Null,
        serde_json::Value::Bool(flag) => CellValue::Bool(*flag),
        serde_json::Value::Number(number) => number.as_i64().map_or_else(
            || {
                number
                    .as_f64()
                    .filter(|float| float.is_finite())
                    .map_or(CellValue::Null, CellValue::Float)
            },
            CellValue::Int,
        ),
        serde_json::Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        other => CellValue::Text(other.to_string()),
    }
}

// ============================================================================
// SECTION: Type Inference
// ============================================================================

/// Keywords that mark a column name as an identifier.
const IDENTIFIER_KEYWORDS: [&str; 8] =
    ["id", "code", "key", "uuid", "guid", "zip", "fips", "index"];

/// Uniqueness ratio above which an integer column reads as an identifier.
const IDENTIFIER_UNIQUE_RATIO: f64 = 0.99;

/// Distinct-value ratio below which text reads as categorical.
const CATEGORICAL_UNIQUE_RATIO: f64 = 0.5;

/// Distinct-value count below which text reads as categorical regardless of ratio.
const CATEGORICAL_MAX_DISTINCT: usize = 30;

/// Infers column types and converts cells into their final representation.
fn infer_table(raw: RawTable) -> DataTable {
    let columns = raw
        .names
        .into_iter()
        .zip(raw.cells)
        .map(|(name, values)| infer_column(name, values))
        .collect();
    DataTable::new(columns)
}

/// Infers one column's type and converts its cells.
fn infer_column(name: String, values: Vec<CellValue>) -> Column {
    let non_null: Vec<&CellValue> = values.iter().filter(|value| !value.is_null()).collect();
    if non_null.is_empty() {
        return Column::new(name, ColumnType::Textual, values);
    }

    if non_null.iter().all(|value| matches!(value, CellValue::Bool(_))) {
        return Column::new(name, ColumnType::Boolean, values);
    }
    if let Some(converted) = try_boolean(&values) {
        return Column::new(name, ColumnType::Boolean, converted);
    }
    if let Some(converted) = try_numeric(&values) {
        let column = Column::new(name, ColumnType::Numeric, converted);
        return if looks_like_identifier(&column) {
            Column::new(column.name, ColumnType::Identifier, column.values)
        } else {
            column
        };
    }
    if let Some(converted) = try_datetime(&values) {
        return Column::new(name, ColumnType::Datetime, converted);
    }

    let column = Column::new(name, ColumnType::Textual, values);
    if name_has_identifier_keyword(&column.name)
        || column.unique_ratio() >= IDENTIFIER_UNIQUE_RATIO
    {
        return Column::new(column.name, ColumnType::Identifier, column.values);
    }
    if column.unique_ratio() <= CATEGORICAL_UNIQUE_RATIO
        || column.unique_count() <= CATEGORICAL_MAX_DISTINCT
    {
        return Column::new(column.name, ColumnType::Categorical, column.values);
    }
    column
}

/// Attempts an all-boolean reading of textual cells.
fn try_boolean(values: &[CellValue]) -> Option<Vec<CellValue>> {
    let mut converted = Vec::with_capacity(values.len());
    for value in values {
        let cell = match value {
            CellValue::Null => CellValue::Null,
            CellValue::Bool(flag) => CellValue::Bool(*flag),
            CellValue::Text(text) => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" => CellValue::Bool(true),
                "false" | "no" => CellValue::Bool(false),
                _ => return None,
            },
            _ => return None,
        };
        converted.push(cell);
    }
    Some(converted)
}

/// Attempts an all-numeric reading of cells.
fn try_numeric(values: &[CellValue]) -> Option<Vec<CellValue>> {
    let mut converted = Vec::with_capacity(values.len());
    for value in values {
        let cell = match value {
            CellValue::Null => CellValue::Null,
            CellValue::Int(int) => CellValue::Int(*int),
            CellValue::Float(float) => CellValue::Float(*float),
            CellValue::Text(text) => parse_number(text)?,
            _ => return None,
        };
        converted.push(cell);
    }
    Some(converted)
}

/// Parses a textual number, tolerating thousands separators and currency signs.
fn parse_number(text: &str) -> Option<CellValue> {
    let cleaned: String = text
        .chars()
        .filter(|ch| !matches!(ch, ',' | '$' | '€' | '£' | '%' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(int) = cleaned.parse::<i64>() {
        return Some(CellValue::Int(int));
    }
    match cleaned.parse::<f64>() {
        Ok(float) if float.is_finite() => Some(CellValue::Float(float)),
        _ => None,
    }
}

/// Attempts an all-date reading of textual cells.
fn try_datetime(values: &[CellValue]) -> Option<Vec<CellValue>> {
    let mut converted = Vec::with_capacity(values.len());
    for value in values {
        let cell = match value {
            CellValue::Null => CellValue::Null,
            CellValue::Text(text) => CellValue::Date(parse_date(text)?),
            CellValue::Date(date) => CellValue::Date(*date),
            _ => return None,
        };
        converted.push(cell);
    }
    Some(converted)
}

/// Parses a calendar date from the common wire formats.
fn parse_date(text: &str) -> Option<Date> {
    let iso = format_description!("[year]-[month]-[day]");
    let us = format_description!("[month]/[day]/[year]");
    let compact = format_description!("[year][month][day]");
    let candidate = text.split(['T', ' ']).next().unwrap_or(text);
    Date::parse(candidate, &iso)
        .or_else(|_| Date::parse(candidate, &us))
        .or_else(|_| Date::parse(candidate, &compact))
        .ok()
}

/// Returns true when the column name carries an identifier keyword.
fn name_has_identifier_keyword(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    let tokens = tokenize(&lowered);
    IDENTIFIER_KEYWORDS.iter().any(|keyword| tokens.iter().any(|token| token == keyword))
}

/// Returns true for numeric columns exhibiting identifier signatures.
fn looks_like_identifier(column: &Column) -> bool {
    if name_has_identifier_keyword(&column.name) {
        return true;
    }
    column.is_monotone_int() && column.unique_ratio() >= IDENTIFIER_UNIQUE_RATIO
}

/// Splits a column name into lowercase tokens on separators and case bounds.
#[must_use]
pub fn tokenize(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch == ' ' || ch == '.' || ch == '/' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if ch.is_uppercase() && previous_lower && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
