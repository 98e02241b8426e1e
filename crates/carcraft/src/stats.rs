use serde::Serialize;

use crate::record::PredictionRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
  pub total_predictions: usize,
  pub total_saved: usize,
  /// Mean confidence over all records, 0.0 when there are none
  pub average_confidence: f64,
  /// Mean accuracy over records that have one
  pub average_accuracy: Option<f64>,
  /// Most frequently predicted company
  pub favorite_brand: Option<String>,
}

/// Aggregate figures over records given newest first
pub fn summarize(records: &[PredictionRecord]) -> StatsSummary {
  let total_predictions = records.len();
  let total_saved = records.iter().filter(|r| r.saved).count();

  let average_confidence = if records.is_empty() {
    0.0
  } else {
    records.iter().map(|r| r.confidence).sum::<f64>() / total_predictions as f64
  };

  let accuracies: Vec<f64> = records.iter().filter_map(|r| r.accuracy).collect();
  let average_accuracy = if accuracies.is_empty() {
    None
  } else {
    Some(accuracies.iter().sum::<f64>() / accuracies.len() as f64)
  };

  StatsSummary {
    total_predictions,
    total_saved,
    average_confidence,
    average_accuracy,
    favorite_brand: favorite_brand(records),
  }
}

// Ties go to whichever brand showed up first
fn favorite_brand(records: &[PredictionRecord]) -> Option<String> {
  let mut counts: Vec<(&str, usize)> = Vec::new();
  for record in records {
    let brand = record.attributes.company.as_str();
    match counts.iter_mut().find(|(name, _)| *name == brand) {
      Some((_, count)) => *count += 1,
      None => counts.push((brand, 1)),
    }
  }

  let mut best: Option<(&str, usize)> = None;
  for (brand, count) in counts {
    if best.map_or(true, |(_, top)| count > top) {
      best = Some((brand, count));
    }
  }
  best.map(|(brand, _)| brand.to_string())
}
