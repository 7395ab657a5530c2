//! CSV uploads read through the Arrow CSV reader.
//!
//! Every column is read as `Utf8` so the validator sees the raw cell text.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use arrow::array::{Array, LargeStringArray, StringArray};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use carbonlex_compliance::MaterialDeclaration;
use carbonlex_emissions::RawRow;

const BATCH_SIZE: usize = 1024;

/// Read an activity upload into raw rows, one per data line.
pub fn read_activity_csv(path: &Path) -> anyhow::Result<Vec<RawRow>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rows = read_rows(BufReader::new(file))
        .with_context(|| format!("reading {}", path.display()))?;
    tracing::info!(rows = rows.len(), path = %path.display(), "read upload");
    Ok(rows)
}

/// Read a material declaration file with columns
/// `component, substance, concentration_ppm[, supplier]`.
pub fn read_materials_csv(path: &Path) -> anyhow::Result<Vec<MaterialDeclaration>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rows = read_rows(BufReader::new(file))
        .with_context(|| format!("reading {}", path.display()))?;
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            material_from_row(row).with_context(|| format!("{} row {}", path.display(), i + 1))
        })
        .collect()
}

/// Read delimited text with a header line into raw rows. Null cells are left out.
pub fn read_rows<R: Read + Seek>(mut reader: R) -> anyhow::Result<Vec<RawRow>> {
    let schema = utf8_schema(&mut reader)?;
    reader.rewind()?;

    let csv = ReaderBuilder::new(schema)
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(reader)?;

    let mut rows = Vec::new();
    for batch in csv {
        append_rows(&batch?, &mut rows);
    }
    Ok(rows)
}

/// Header names from the first line, each typed as nullable `Utf8`.
fn utf8_schema<R: Read>(reader: &mut R) -> anyhow::Result<SchemaRef> {
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(reader, Some(0))?;
    if inferred.fields().is_empty() {
        bail!("no header row");
    }
    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| Field::new(f.name().trim(), DataType::Utf8, true))
        .collect();
    Ok(Arc::new(Schema::new(fields)))
}

fn append_rows(batch: &RecordBatch, rows: &mut Vec<RawRow>) {
    let schema = batch.schema();
    for i in 0..batch.num_rows() {
        let mut row = RawRow::new();
        for (field, col) in schema.fields().iter().zip(batch.columns()) {
            if let Some(value) = get_string(col.as_ref(), i) {
                row.insert(field.name().clone(), value.to_string());
            }
        }
        rows.push(row);
    }
}

/// String value of a Utf8 or LargeUtf8 cell.
fn get_string(col: &dyn Array, i: usize) -> Option<&str> {
    if col.is_null(i) {
        return None;
    }
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        return Some(arr.value(i));
    }
    if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        return Some(arr.value(i));
    }
    None
}

fn material_from_row(row: &RawRow) -> anyhow::Result<MaterialDeclaration> {
    let cell = |name: &str| {
        row.iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    };
    let component = cell("component").context("missing component")?;
    let substance = cell("substance").context("missing substance")?;
    let raw_ppm = cell("concentration_ppm").context("missing concentration_ppm")?;
    let concentration_ppm: f64 = raw_ppm
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite() && *v >= 0.0)
        .with_context(|| format!("invalid concentration {raw_ppm:?}"))?;

    Ok(MaterialDeclaration {
        component: component.to_string(),
        substance: substance.to_string(),
        concentration_ppm,
        supplier: cell("supplier").map(String::from),
    })
}
