use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StoreError};

/// Unique identifier of a prediction record (milliseconds since the epoch at allocation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl std::str::FromStr for RecordId {
  type Err = std::num::ParseIntError;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    s.trim().parse().map(RecordId)
  }
}

/// Car attributes submitted with a prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarAttributes {
  pub company: String,
  pub model: String,
  pub year: u16,
  pub kms_driven: u64,
  pub fuel_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub transmission: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub owner: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub car_condition: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub insurance_status: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub previous_accidents: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub num_doors: Option<u8>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub engine_size: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub power: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub city: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub emission_norm: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub insurance_eligible: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub maintenance_level: Option<String>,
}

impl CarAttributes {
  /// Attributes with only the required fields set
  pub fn new(
    company: impl Into<String>,
    model: impl Into<String>,
    year: u16,
    kms_driven: u64,
    fuel_type: impl Into<String>,
  ) -> Self {
    Self {
      company: company.into(),
      model: model.into(),
      year,
      kms_driven,
      fuel_type: fuel_type.into(),
      transmission: None,
      owner: None,
      car_condition: None,
      insurance_status: None,
      previous_accidents: None,
      num_doors: None,
      engine_size: None,
      power: None,
      city: None,
      emission_norm: None,
      insurance_eligible: None,
      maintenance_level: None,
    }
  }

  /// "Company Model", the car identity used in listings and exports
  pub fn display_name(&self) -> String {
    format!("{} {}", self.company, self.model)
  }

  pub fn validate(&self) -> Result<()> {
    let required = [("company", &self.company), ("model", &self.model), ("fuel_type", &self.fuel_type)];
    for (field, value) in required {
      if value.trim().is_empty() {
        return Err(StoreError::validation(format!("car attribute '{field}' must not be empty")));
      }
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
  pub min: f64,
  pub max: f64,
}

impl PriceRange {
  /// Band of 10% either side of `price`, floored at zero
  pub fn around(price: f64) -> Self {
    let spread = price.abs() * 0.1;
    Self { min: (price - spread).max(0.0), max: price + spread }
  }
}

/// Extra prediction metadata reported alongside the price
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionDetails {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model_used: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model_performance: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub features_used: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub price_range: Option<PriceRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
  pub id: RecordId,
  #[serde(flatten)]
  pub attributes: CarAttributes,
  pub predicted_price: f64,
  pub confidence: f64,
  #[serde(flatten)]
  pub details: PredictionDetails,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub saved: bool,
  #[serde(default)]
  pub actual_price: Option<f64>,
  #[serde(default)]
  pub accuracy: Option<f64>,
}

impl PredictionRecord {
  pub fn new(
    id: RecordId,
    attributes: CarAttributes,
    predicted_price: f64,
    confidence: f64,
    details: PredictionDetails,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id,
      attributes,
      predicted_price,
      confidence,
      details,
      created_at,
      saved: false,
      actual_price: None,
      accuracy: None,
    }
  }

  /// Record the later-known price; accuracy is always set together with it
  pub fn set_actual_price(&mut self, actual_price: f64) {
    self.actual_price = Some(actual_price);
    self.accuracy = Some(accuracy_for(self.predicted_price, actual_price));
  }

  /// Accuracy as shown to users, e.g. "95.0%"
  pub fn accuracy_label(&self) -> Option<String> {
    self.accuracy.map(format_percent)
  }
}

/// Percentage closeness of a prediction to the actual price, rounded to one decimal.
///
/// A non-positive prediction has no meaningful ratio and scores 0.0.
pub fn accuracy_for(predicted_price: f64, actual_price: f64) -> f64 {
  if predicted_price <= 0.0 {
    return 0.0;
  }
  let raw = (1.0 - (predicted_price - actual_price).abs() / predicted_price) * 100.0;
  if !raw.is_finite() {
    return 0.0;
  }
  (raw * 10.0).round() / 10.0
}

pub fn format_percent(value: f64) -> String {
  format!("{value:.1}%")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_price_range_spans_ten_percent() {
    assert_eq!(PriceRange::around(500_000.0), PriceRange { min: 450_000.0, max: 550_000.0 });
    assert_eq!(PriceRange::around(0.0), PriceRange { min: 0.0, max: 0.0 });
  }

  #[test]
  fn test_accuracy_matches_documented_example() {
    assert_eq!(accuracy_for(1_000_000.0, 950_000.0), 95.0);
    assert_eq!(format_percent(accuracy_for(1_000_000.0, 950_000.0)), "95.0%");
  }

  #[test]
  fn test_accuracy_rounds_to_one_decimal() {
    // 1 - 123/1000 = 0.877
    assert_eq!(accuracy_for(1000.0, 1123.0), 87.7);
    assert_eq!(accuracy_for(3.0, 2.0), 66.7);
  }

  #[test]
  fn test_accuracy_zero_prediction_falls_back() {
    assert_eq!(accuracy_for(0.0, 500.0), 0.0);
  }

  #[test]
  fn test_accuracy_can_go_negative_for_wild_misses() {
    assert_eq!(accuracy_for(100.0, 300.0), -100.0);
  }

  #[test]
  fn test_validate_rejects_blank_company() {
    let attrs = CarAttributes::new("  ", "Swift", 2019, 40_000, "Petrol");
    let err = attrs.validate().unwrap_err();
    assert!(err.to_string().contains("company"));
  }

  #[test]
  fn test_record_json_uses_flat_camel_case_layout() {
    let mut attrs = CarAttributes::new("Maruti", "Swift", 2019, 40_000, "Petrol");
    attrs.transmission = Some("Manual".to_string());
    let details = PredictionDetails { model_used: Some("xgboost".to_string()), ..Default::default() };
    let record = PredictionRecord::new(
      RecordId(42),
      attrs,
      550_000.0,
      87.0,
      details,
      Utc::now(),
    );

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["id"], 42);
    assert_eq!(json["company"], "Maruti");
    assert_eq!(json["kms_driven"], 40_000);
    assert_eq!(json["predictedPrice"], 550_000.0);
    assert_eq!(json["modelUsed"], "xgboost");
    assert_eq!(json["saved"], false);
    assert!(json["actualPrice"].is_null());

    let back: PredictionRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back, record);
  }
}
