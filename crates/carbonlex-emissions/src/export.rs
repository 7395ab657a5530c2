//! Arrow export of emission results for the chart and report renderers.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, Date32Builder, Float64Array, Float64Builder, StringArray, StringBuilder,
    UInt64Builder,
};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use carbonlex_core::reporting;

use crate::result::EmissionResult;

/// One row per priced record, in input order.
pub fn records_batch(result: &EmissionResult) -> Result<RecordBatch, ArrowError> {
    let records = result.records();
    let n = records.len();

    let mut row = UInt64Builder::with_capacity(n);
    let mut activity_type = StringBuilder::with_capacity(n, n * 12);
    let mut category = StringBuilder::with_capacity(n, n * 12);
    let mut scope = StringBuilder::with_capacity(n, n * 7);
    let mut amount = Float64Builder::with_capacity(n);
    let mut unit = StringBuilder::with_capacity(n, n * 3);
    let mut canonical_amount = Float64Builder::with_capacity(n);
    let mut canonical_unit = StringBuilder::with_capacity(n, n * 3);
    let mut factor = Float64Builder::with_capacity(n);
    let mut factor_source = StringBuilder::with_capacity(n, n * 32);
    let mut co2_kg = Float64Builder::with_capacity(n);
    let mut date = Date32Builder::with_capacity(n);

    for r in records {
        row.append_value(r.row as u64);
        activity_type.append_value(r.activity_type.as_str());
        category.append_value(&r.category);
        scope.append_value(r.scope.as_str());
        amount.append_value(r.amount);
        unit.append_value(r.unit.symbol());
        canonical_amount.append_value(r.canonical.amount);
        canonical_unit.append_value(r.canonical.unit.symbol());
        factor.append_value(r.factor);
        factor_source.append_value(&r.factor_source);
        co2_kg.append_value(r.co2_kg);
        date.append_option(r.date.map(reporting::date32));
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(row.finish()),
        Arc::new(activity_type.finish()),
        Arc::new(category.finish()),
        Arc::new(scope.finish()),
        Arc::new(amount.finish()),
        Arc::new(unit.finish()),
        Arc::new(canonical_amount.finish()),
        Arc::new(canonical_unit.finish()),
        Arc::new(factor.finish()),
        Arc::new(factor_source.finish()),
        Arc::new(co2_kg.finish()),
        Arc::new(date.finish()),
    ];
    RecordBatch::try_new(Arc::new(reporting::emission_records_schema()), columns)
}

/// The monthly series, or an empty batch when the run had no dated records.
pub fn monthly_batch(result: &EmissionResult) -> Result<RecordBatch, ArrowError> {
    let monthly = result.monthly().unwrap_or_default();
    let months: StringArray = monthly.iter().map(|m| Some(m.label())).collect();
    let values: Float64Array = monthly.iter().map(|m| Some(m.co2_kg)).collect();
    RecordBatch::try_new(
        Arc::new(reporting::monthly_schema()),
        vec![Arc::new(months), Arc::new(values)],
    )
}
