use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray,
};
use arrow::compute::{cast, concat_batches, filter_record_batch};
use arrow::datatypes::{DataType, Float64Type, Int64Type, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::{EncodingError, LoadError, Result};
use super::model::{LoadReport, ValidationIssue};
use super::schema::{self, ColumnType, COLUMNS, KEY_COLUMNS};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Fail the whole load on an unparsable numeric cell instead of
    /// rejecting just that row.
    pub strict_numeric: bool,
}

/// A validated table ready to replace the store's contents.
#[derive(Debug)]
pub struct LoadOutcome {
    pub table: RecordBatch,
    pub report: LoadReport,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a vehicle table from a file.  Dispatch by extension.
///
/// * `.csv`             – header row plus one vehicle per line
/// * `.parquet` / `.pq` – same columns, any castable types
pub fn load_file(path: &Path, options: LoadOptions) -> Result<LoadOutcome> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
                path: path.display().to_string(),
                source,
            })?;
            load_csv_bytes(&bytes, options)
        }
        "parquet" | "pq" => load_parquet(path, options),
        other => Err(LoadError::UnsupportedExtension(other.to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse raw CSV bytes against the fixed column table.
///
/// Columns are matched by header name, so order does not matter and extra
/// columns are ignored. Empty cells become nulls.
pub fn load_csv_bytes(bytes: &[u8], options: LoadOptions) -> Result<LoadOutcome> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let bom_len = bytes.len() - body.len();
    let text = std::str::from_utf8(body).map_err(|e| EncodingError {
        offset: bom_len + e.valid_up_to(),
    })?;
    if text.trim().is_empty() {
        return Err(LoadError::Empty.into());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers().map_err(LoadError::from)?.clone();
    let positions = resolve_columns(headers.iter())?;

    let mut columns: Vec<ColumnBuilder> = COLUMNS
        .iter()
        .map(|(_, ty)| ColumnBuilder::new(*ty))
        .collect();
    let mut report = LoadReport::default();
    let mut data_rows = 0usize;

    for result in reader.records() {
        let record = result.map_err(LoadError::from)?;
        data_rows += 1;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(data_rows as u64 + 1);
        let cell = |col: usize| record.get(positions[col]).unwrap_or("").trim();

        let incomplete = COLUMNS.iter().enumerate().any(|(col, (name, _))| {
            KEY_COLUMNS.contains(name) && cell(col).is_empty()
        });
        if incomplete {
            report.skipped_incomplete += 1;
            continue;
        }

        match parse_row(&cell, line) {
            Ok((row, negatives)) => {
                for (builder, value) in columns.iter_mut().zip(row) {
                    builder.push(value);
                }
                report.issues.extend(negatives);
                report.records += 1;
            }
            Err(bad) => {
                if options.strict_numeric {
                    return Err(bad.into_error(line).into());
                }
                log::warn!("line {line}: rejecting row, {} = '{}'", bad.column, bad.value);
                report.issues.push(ValidationIssue::Rejected {
                    line,
                    column: bad.column.to_string(),
                    value: bad.value,
                });
            }
        }
    }

    if data_rows == 0 {
        return Err(LoadError::Empty.into());
    }

    let arrays: Vec<ArrayRef> = columns.into_iter().map(ColumnBuilder::finish).collect();
    let table = RecordBatch::try_new(schema::arrow_schema(), arrays)?;
    Ok(LoadOutcome { table, report })
}

/// Map each schema column to its index in the file header.
fn resolve_columns<'a>(headers: impl Iterator<Item = &'a str>) -> Result<Vec<usize>> {
    let headers: Vec<&str> = headers.map(str::trim).collect();
    let mut positions = Vec::with_capacity(COLUMNS.len());
    let mut missing = Vec::new();

    for (name, _) in COLUMNS {
        match headers.iter().position(|h| *h == name) {
            Some(idx) => positions.push(idx),
            None => missing.push(name.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(LoadError::MissingColumns(missing).into())
    }
}

#[derive(Debug)]
enum Cell {
    Text(Option<String>),
    Decimal(Option<f64>),
    Integer(Option<i64>),
}

struct BadCell {
    column: &'static str,
    value: String,
    expected: &'static str,
}

impl BadCell {
    fn into_error(self, line: u64) -> LoadError {
        LoadError::InvalidValue {
            line,
            column: self.column.to_string(),
            value: self.value,
            expected: self.expected,
        }
    }
}

fn parse_row<'r>(
    cell: &impl Fn(usize) -> &'r str,
    line: u64,
) -> std::result::Result<(Vec<Cell>, Vec<ValidationIssue>), BadCell> {
    let mut row = Vec::with_capacity(COLUMNS.len());
    let mut negatives = Vec::new();

    for (col, (name, ty)) in COLUMNS.iter().enumerate() {
        let raw = cell(col);
        let bad = || BadCell {
            column: *name,
            value: raw.to_string(),
            expected: expected(*ty),
        };
        let value = match ty {
            ColumnType::Text => Cell::Text((!raw.is_empty()).then(|| raw.to_string())),
            ColumnType::Decimal => Cell::Decimal(parse_decimal(raw).map_err(|_| bad())?),
            ColumnType::Integer => Cell::Integer(parse_integer(raw).map_err(|_| bad())?),
        };
        let numeric = match value {
            Cell::Decimal(Some(v)) => Some(v),
            Cell::Integer(Some(v)) => Some(v as f64),
            _ => None,
        };
        if let Some(v) = numeric.filter(|v| *v < 0.0) {
            negatives.push(ValidationIssue::Negative {
                line,
                column: name.to_string(),
                value: v,
            });
        }
        row.push(value);
    }
    Ok((row, negatives))
}

fn expected(ty: ColumnType) -> &'static str {
    if ty == ColumnType::Integer {
        "integer"
    } else {
        "number"
    }
}

fn parse_decimal(s: &str) -> std::result::Result<Option<f64>, ()> {
    if s.is_empty() {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(()),
    }
}

/// Integers also accept integral decimals such as `4.0`.
fn parse_integer(s: &str) -> std::result::Result<Option<i64>, ()> {
    if s.is_empty() {
        return Ok(None);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Ok(Some(i));
    }
    match parse_decimal(s)? {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
        _ => Err(()),
    }
}

enum ColumnBuilder {
    Text(Vec<Option<String>>),
    Decimal(Vec<Option<f64>>),
    Integer(Vec<Option<i64>>),
}

impl ColumnBuilder {
    fn new(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Text => ColumnBuilder::Text(Vec::new()),
            ColumnType::Decimal => ColumnBuilder::Decimal(Vec::new()),
            ColumnType::Integer => ColumnBuilder::Integer(Vec::new()),
        }
    }

    fn push(&mut self, cell: Cell) {
        match (self, cell) {
            (ColumnBuilder::Text(v), Cell::Text(c)) => v.push(c),
            (ColumnBuilder::Decimal(v), Cell::Decimal(c)) => v.push(c),
            (ColumnBuilder::Integer(v), Cell::Integer(c)) => v.push(c),
            // parse_row walks COLUMNS in the same order as the builders
            _ => unreachable!("cell type does not match column builder"),
        }
    }

    fn finish(self) -> ArrayRef {
        match self {
            ColumnBuilder::Text(v) => Arc::new(v.into_iter().collect::<StringArray>()),
            ColumnBuilder::Decimal(v) => Arc::new(Float64Array::from(v)),
            ColumnBuilder::Integer(v) => Arc::new(Int64Array::from(v)),
        }
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the same columns as the CSV layout.
///
/// Column types are cast to the fixed schema, so files written by Pandas or
/// Polars with e.g. `Int32` seats or `Float32` measures load unchanged. A value
/// the schema type cannot hold is treated like an unparsable CSV cell. Issues
/// carry 1-based row numbers since Parquet has no lines.
pub fn load_parquet(path: &Path, options: LoadOptions) -> Result<LoadOutcome> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(LoadError::from)?;

    let source_schema = builder.schema().clone();
    let names = source_schema.fields().iter().map(|f| f.name().as_str());
    resolve_columns(names)?;

    let reader = builder.build().map_err(LoadError::from)?;
    let target = schema::arrow_schema();
    let mut batches = Vec::new();
    let mut bad_cells = BTreeMap::new();
    let mut offset = 0;
    for batch in reader {
        let batch = batch?;
        batches.push(conform(&batch, &target, offset, &mut bad_cells)?);
        offset += batch.num_rows();
    }

    let table = concat_batches(&target, &batches)?;
    if table.num_rows() == 0 {
        return Err(LoadError::Empty.into());
    }

    let complete = complete_rows(&table);
    let measures = measures(&table);
    let mut report = LoadReport::default();
    let mut keep = Vec::with_capacity(table.num_rows());

    for (row, is_complete) in complete.into_iter().enumerate() {
        let line = row as u64 + 1;
        if !is_complete {
            report.skipped_incomplete += 1;
            keep.push(false);
            continue;
        }
        if let Some(bad) = bad_cells.remove(&row) {
            if options.strict_numeric {
                return Err(bad.into_error(line).into());
            }
            log::warn!("row {line}: rejecting row, {} = '{}'", bad.column, bad.value);
            report.issues.push(ValidationIssue::Rejected {
                line,
                column: bad.column.to_string(),
                value: bad.value,
            });
            keep.push(false);
            continue;
        }
        for (name, values) in &measures {
            if let Some(v) = values.get(row).copied().flatten().filter(|v| *v < 0.0) {
                report.issues.push(ValidationIssue::Negative {
                    line,
                    column: name.to_string(),
                    value: v,
                });
            }
        }
        keep.push(true);
    }

    let table = filter_record_batch(&table, &BooleanArray::from(keep))?;
    report.records = table.num_rows();
    Ok(LoadOutcome { table, report })
}

/// Cast one batch to the fixed schema. The first bad cell of each row is
/// recorded under its file-wide row index (`offset` + row in batch).
fn conform(
    batch: &RecordBatch,
    target: &SchemaRef,
    offset: usize,
    bad_cells: &mut BTreeMap<usize, BadCell>,
) -> Result<RecordBatch> {
    let mut arrays = Vec::with_capacity(COLUMNS.len());
    for (name, ty) in COLUMNS {
        let col = batch
            .column_by_name(name)
            .ok_or_else(|| LoadError::MissingColumns(vec![name.to_string()]))?;
        let (array, bad) = conform_column(ty, col)?;
        for (row, value) in bad {
            bad_cells.entry(offset + row).or_insert(BadCell {
                column: name,
                value,
                expected: expected(ty),
            });
        }
        arrays.push(array);
    }
    Ok(RecordBatch::try_new(target.clone(), arrays)?)
}

/// Returns the column in its schema type plus `(row, raw value)` for every
/// non-null cell the type cannot represent. Those cells come back null.
fn conform_column(ty: ColumnType, col: &ArrayRef) -> Result<(ArrayRef, Vec<(usize, String)>)> {
    if ty == ColumnType::Text {
        return Ok((cast(col, &DataType::Utf8)?, Vec::new()));
    }

    let mut bad = Vec::new();
    let mut values: Vec<Option<f64>> = Vec::with_capacity(col.len());
    if matches!(
        col.data_type(),
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    ) {
        // same parser as CSV cells, so both formats accept the same text
        let text = cast(col, &DataType::Utf8)?;
        for (row, raw) in text.as_string::<i32>().iter().enumerate() {
            let raw = raw.unwrap_or("").trim();
            match parse_decimal(raw) {
                Ok(v) => values.push(v),
                Err(()) => {
                    bad.push((row, raw.to_string()));
                    values.push(None);
                }
            }
        }
    } else {
        let floats = cast(col, &DataType::Float64)?;
        let floats = floats.as_primitive::<Float64Type>();
        for row in 0..col.len() {
            if col.is_null(row) {
                values.push(None);
            } else if floats.is_valid(row) && floats.value(row).is_finite() {
                values.push(Some(floats.value(row)));
            } else {
                let raw = array_value_to_string(col.as_ref(), row).unwrap_or_default();
                bad.push((row, raw));
                values.push(None);
            }
        }
    }

    let array: ArrayRef = match ty {
        ColumnType::Integer => {
            let mut ints = Vec::with_capacity(values.len());
            for (row, value) in values.into_iter().enumerate() {
                match value {
                    Some(f) if f.fract() != 0.0 || f.abs() >= i64::MAX as f64 => {
                        bad.push((row, f.to_string()));
                        ints.push(None);
                    }
                    _ => ints.push(value.map(|f| f as i64)),
                }
            }
            Arc::new(Int64Array::from(ints))
        }
        _ => Arc::new(Float64Array::from(values)),
    };
    Ok((array, bad))
}

/// `true` for rows with every key column present and non-blank.
fn complete_rows(table: &RecordBatch) -> Vec<bool> {
    let keys: Vec<&StringArray> = KEY_COLUMNS
        .iter()
        .filter_map(|name| table.column_by_name(name)?.as_string_opt::<i32>())
        .collect();

    (0..table.num_rows())
        .map(|row| {
            keys.iter()
                .all(|col| col.is_valid(row) && !col.value(row).trim().is_empty())
        })
        .collect()
}

/// Every numeric column as `f64`, for the negative-value check.
fn measures(table: &RecordBatch) -> Vec<(&'static str, Vec<Option<f64>>)> {
    COLUMNS
        .iter()
        .filter(|(_, ty)| ty.is_numeric())
        .filter_map(|(name, ty)| {
            let col = table.column_by_name(name)?;
            let values: Vec<Option<f64>> = match ty {
                ColumnType::Integer => col
                    .as_primitive_opt::<Int64Type>()?
                    .iter()
                    .map(|v| v.map(|i| i as f64))
                    .collect(),
                _ => col.as_primitive_opt::<Float64Type>()?.iter().collect(),
            };
            Some((*name, values))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::DashboardError;

    const HEADER: &str = "brand,model,top_speed_kmh,battery_capacity_kWh,battery_type,number_of_cells,torque_nm,efficiency_wh_per_km,range_km,acceleration_0_100_s,fast_charging_power_kw_dc,fast_charge_port,towing_capacity_kg,cargo_volume_l,seats,drivetrain,segment,length_mm,width_mm,height_mm,car_body_type,source_url";

    fn row(brand: &str, range: &str, cells: &str) -> String {
        format!(
            "{brand},M,200,75.0,Lithium-ion,{cells},450,150,{range},5.1,170,CCS,0,425,5,RWD,C - Medium,4694,1849,1443,Sedan,https://example.com"
        )
    }

    fn csv(rows: &[String]) -> Vec<u8> {
        let mut text = String::from(HEADER);
        for r in rows {
            text.push('\n');
            text.push_str(r);
        }
        text.push('\n');
        text.into_bytes()
    }

    #[test]
    fn loads_rows_with_fixed_types() {
        let bytes = csv(&[row("Tesla", "500", "4680"), row("BMW", "", "")]);
        let out = load_csv_bytes(&bytes, LoadOptions::default()).unwrap();
        assert_eq!(out.report.records, 2);
        assert_eq!(out.table.num_rows(), 2);

        let range = out.table.column_by_name("range_km").unwrap();
        let range = range.as_primitive::<Float64Type>();
        assert_eq!(range.value(0), 500.0);
        assert!(range.is_null(1));
    }

    #[test]
    fn strips_bom_and_accepts_integral_decimals() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend(csv(&[row("Tesla", "500", "4680.0")]));
        let out = load_csv_bytes(&bytes, LoadOptions::default()).unwrap();
        let cells = out.table.column_by_name("number_of_cells").unwrap();
        assert_eq!(cells.as_primitive::<Int64Type>().value(0), 4680);
    }

    #[test]
    fn reports_every_missing_column() {
        let bytes = b"brand,model\nTesla,Model 3\n";
        let err = load_csv_bytes(bytes, LoadOptions::default()).unwrap_err();
        match err {
            DashboardError::Load(LoadError::MissingColumns(cols)) => {
                assert_eq!(cols.len(), 20);
                assert!(cols.contains(&"range_km".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let mut bytes = csv(&[row("Tesla", "500", "1")]);
        bytes.extend([0xff, 0xfe]);
        let err = load_csv_bytes(&bytes, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DashboardError::Encoding(_)));
    }

    #[test]
    fn header_only_and_blank_files_are_empty() {
        for bytes in [format!("{HEADER}\n").into_bytes(), b"  \n".to_vec()] {
            let err = load_csv_bytes(&bytes, LoadOptions::default()).unwrap_err();
            assert!(matches!(err, DashboardError::Load(LoadError::Empty)));
        }
    }

    #[test]
    fn ragged_row_is_malformed() {
        let mut bytes = csv(&[row("Tesla", "500", "1")]);
        bytes.extend(b"Tesla,short\n");
        let err = load_csv_bytes(&bytes, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DashboardError::Load(LoadError::Malformed(_))));
    }

    #[test]
    fn non_numeric_cell_rejects_row_or_file() {
        let bytes = csv(&[row("Tesla", "500", "1"), row("BMW", "far", "1")]);

        let out = load_csv_bytes(&bytes, LoadOptions::default()).unwrap();
        assert_eq!(out.report.records, 1);
        assert_eq!(out.report.rejected(), 1);

        let strict = LoadOptions { strict_numeric: true };
        let err = load_csv_bytes(&bytes, strict).unwrap_err();
        match err {
            DashboardError::Load(LoadError::InvalidValue { line, column, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "range_km");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn incomplete_rows_are_skipped_and_negatives_flagged() {
        let bytes = csv(&[row("", "500", "1"), row("Tesla", "-10", "1")]);
        let out = load_csv_bytes(&bytes, LoadOptions::default()).unwrap();
        assert_eq!(out.report.records, 1);
        assert_eq!(out.report.skipped_incomplete, 1);
        assert!(matches!(
            out.report.issues.as_slice(),
            [ValidationIssue::Negative { column, .. }] if column == "range_km"
        ));
    }

    #[test]
    fn encoding_offset_counts_the_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend(b"brand\xff");
        let err = load_csv_bytes(&bytes, LoadOptions::default()).unwrap_err();
        match err {
            DashboardError::Encoding(e) => assert_eq!(e.offset, 8),
            other => panic!("unexpected error: {other}"),
        }
    }

    /// Every column written as text, one batch.
    fn text_parquet(rows: &[String]) -> tempfile::NamedTempFile {
        use arrow::datatypes::{Field, Schema};
        use parquet::arrow::ArrowWriter;

        let names: Vec<&str> = HEADER.split(',').collect();
        let fields: Vec<Field> = names
            .iter()
            .map(|n| Field::new(*n, DataType::Utf8, true))
            .collect();
        let columns: Vec<ArrayRef> = (0..names.len())
            .map(|i| {
                let values: StringArray =
                    rows.iter().map(|r| r.split(',').nth(i)).collect();
                Arc::new(values) as ArrayRef
            })
            .collect();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap();

        let tmp = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(tmp.reopen().unwrap(), batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        tmp
    }

    #[test]
    fn parquet_issues_keep_source_row_numbers() {
        let tmp = text_parquet(&[
            row("", "500", "1"),
            row("Tesla", "-10", "1"),
            row("BMW", "far", "1"),
            row("Kia", "300", "4.5"),
            row("Audi", "400", "96"),
        ]);
        let out = load_parquet(tmp.path(), LoadOptions::default()).unwrap();
        assert_eq!(out.report.records, 2);
        assert_eq!(out.report.skipped_incomplete, 1);
        assert_eq!(
            out.report.issues,
            vec![
                ValidationIssue::Negative {
                    line: 2,
                    column: "range_km".into(),
                    value: -10.0,
                },
                ValidationIssue::Rejected {
                    line: 3,
                    column: "range_km".into(),
                    value: "far".into(),
                },
                ValidationIssue::Rejected {
                    line: 4,
                    column: "number_of_cells".into(),
                    value: "4.5".into(),
                },
            ]
        );

        let strict = LoadOptions { strict_numeric: true };
        let err = load_parquet(tmp.path(), strict).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::Load(LoadError::InvalidValue { line: 3, .. })
        ));
    }

    #[test]
    fn float_measure_with_fraction_is_not_an_integer() {
        let col: ArrayRef = Arc::new(Float64Array::from(vec![Some(5.0), None, Some(4.5)]));
        let (array, bad) = conform_column(ColumnType::Integer, &col).unwrap();
        let ints = array.as_primitive::<Int64Type>();
        assert_eq!(ints.value(0), 5);
        assert!(ints.is_null(1) && ints.is_null(2));
        assert_eq!(bad, vec![(2, "4.5".to_string())]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("vehicles.xlsx"), LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::Load(LoadError::UnsupportedExtension(ext)) if ext == "xlsx"
        ));
    }
}
