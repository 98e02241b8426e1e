//! CSV rendering of prediction records

use crate::record::PredictionRecord;

pub const CSV_HEADER: [&str; 9] =
  ["Car", "Company", "Model", "Year", "Predicted Price", "Confidence", "Date", "Accuracy", "Saved"];

/// Placeholder for records without an actual price yet
pub const PENDING: &str = "Pending";

pub fn to_csv(records: &[PredictionRecord]) -> String {
  let mut lines = Vec::with_capacity(records.len() + 1);
  lines.push(CSV_HEADER.join(","));

  for record in records {
    let row = [
      record.attributes.display_name(),
      record.attributes.company.clone(),
      record.attributes.model.clone(),
      record.attributes.year.to_string(),
      format_number(record.predicted_price),
      format!("{}%", record.confidence.round() as i64),
      record.created_at.format("%Y-%m-%d").to_string(),
      record.accuracy_label().unwrap_or_else(|| PENDING.to_string()),
      if record.saved { "Yes" } else { "No" }.to_string(),
    ];
    lines.push(row.iter().map(|field| escape_field(field)).collect::<Vec<_>>().join(","));
  }

  lines.join("\n")
}

/// Quote a field when it contains a delimiter, quote or line break
pub fn escape_field(field: &str) -> String {
  if field.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", field.replace('"', "\"\""))
  } else {
    field.to_string()
  }
}

fn format_number(value: f64) -> String {
  if value.fract() == 0.0 && value.abs() < 1e15 {
    format!("{}", value as i64)
  } else {
    value.to_string()
  }
}
