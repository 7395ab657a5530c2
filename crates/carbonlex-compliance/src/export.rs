//! Arrow export of matched regulations for the report renderer.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use carbonlex_core::reporting;

use crate::matcher::ComplianceResult;

/// One row per match, in result order.
pub fn matches_batch(result: &ComplianceResult) -> Result<RecordBatch, ArrowError> {
    let m = &result.matches;
    let columns = vec![
        utf8(m.iter().map(|m| Some(m.regulation.id.as_str()))),
        utf8(m.iter().map(|m| Some(m.regulation.name.as_str()))),
        utf8(m.iter().map(|m| Some(m.regulation.number.as_str()))),
        utf8(m.iter().map(|m| Some(m.regulation.region.label()))),
        utf8(m.iter().map(|m| Some(m.regulation.authority.as_str()))),
        utf8(m.iter().map(|m| Some(m.regulation.official_url.as_str()))),
        utf8(m.iter().map(|m| Some(m.regulation.legal_reference.as_str()))),
        utf8(m.iter().map(|m| m.reason.scope_term.as_deref())),
    ];
    RecordBatch::try_new(Arc::new(reporting::compliance_matches_schema()), columns)
}

fn utf8<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(values.collect::<StringArray>())
}
