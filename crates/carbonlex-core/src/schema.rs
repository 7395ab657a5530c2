/// Arrow schema definitions for results handed to the reporting layer.
pub mod reporting {
    use arrow::datatypes::{DataType, Date32Type, Field, Schema};
    use chrono::NaiveDate;

    /// Schema for per-record emission rows.
    pub fn emission_records_schema() -> Schema {
        Schema::new(vec![
            Field::new("row", DataType::UInt64, false),
            Field::new("activity_type", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, false),
            Field::new("scope", DataType::Utf8, false),
            Field::new("amount", DataType::Float64, false),
            Field::new("unit", DataType::Utf8, false),
            Field::new("canonical_amount", DataType::Float64, false),
            Field::new("canonical_unit", DataType::Utf8, false),
            Field::new("factor", DataType::Float64, false),
            Field::new("factor_source", DataType::Utf8, false),
            Field::new("co2_kg", DataType::Float64, false),
            Field::new("date", DataType::Date32, true),
        ])
    }

    /// Schema for the monthly emission series. `month` is `YYYY-MM`.
    pub fn monthly_schema() -> Schema {
        Schema::new(vec![
            Field::new("month", DataType::Utf8, false),
            Field::new("co2_kg", DataType::Float64, false),
        ])
    }

    /// Schema for matched regulations in a compliance report.
    pub fn compliance_matches_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
            Field::new("number", DataType::Utf8, false),
            Field::new("region", DataType::Utf8, false),
            Field::new("authority", DataType::Utf8, false),
            Field::new("official_url", DataType::Utf8, false),
            Field::new("legal_reference", DataType::Utf8, false),
            Field::new("scope_term", DataType::Utf8, true),
        ])
    }

    /// Convert a calendar date to an Arrow `Date32` value (days since the epoch).
    pub fn date32(date: NaiveDate) -> i32 {
        Date32Type::from_naive_date(date)
    }
}
