use anyhow::{anyhow, Context, Result};
use chrono::{Local, Utc};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::PredictionApi;
use crate::config::Config;
use crate::medium::{FileMedium, Medium};
use crate::record::{format_percent, CarAttributes, PredictionRecord, RecordId};
use crate::store::{export_filename, PredictionStore};

/// Open the file-backed store configured for this user
pub fn open_store(config: &Config) -> Result<PredictionStore<FileMedium>> {
  Ok(PredictionStore::new(FileMedium::new(config.storage_dir()?)))
}

/// Ask the prediction API for a price and keep the result
pub async fn predict<M: Medium, A: PredictionApi>(
  store: &mut PredictionStore<M>,
  api: &A,
  attributes: CarAttributes,
) -> Result<PredictionRecord> {
  attributes.validate()?;
  let response = api.predict(&attributes).await.context("Failed to get prediction")?;

  let price = response.prediction.round();
  let record = store.create(attributes, price, response.confidence_score, response.details(price))?;

  print_summary(&record);
  if let Some(model) = &record.details.model_used {
    println!("  Model used: {}", model);
  }
  print_price_range(&record);
  println!("{} Saved prediction {}", "✓".green(), record.id.to_string().cyan());
  Ok(record)
}

/// Store a prediction obtained elsewhere
pub fn record_prediction<M: Medium>(
  store: &mut PredictionStore<M>,
  attributes: CarAttributes,
  predicted_price: f64,
  confidence: f64,
) -> Result<PredictionRecord> {
  let record = store.create(attributes, predicted_price, confidence, Default::default())?;
  println!(
    "{} Recorded prediction {} for {}",
    "✓".green(),
    record.id.to_string().cyan(),
    record.attributes.display_name().yellow()
  );
  Ok(record)
}

pub fn list_predictions<M: Medium>(
  store: &PredictionStore<M>,
  saved_only: bool,
  limit: Option<usize>,
) -> Result<()> {
  let mut records = if saved_only { store.get_saved()? } else { store.get_all()? };
  if let Some(limit) = limit {
    records.truncate(limit);
  }

  if records.is_empty() {
    if saved_only {
      println!("No saved predictions found");
    } else {
      println!("No predictions found");
    }
    return Ok(());
  }

  for record in records {
    let marker = if record.saved { "★".yellow() } else { " ".normal() };
    println!(
      "{} {} {} {} ({}% confidence, accuracy {})",
      marker,
      record.id.to_string().cyan(),
      record.attributes.display_name().yellow(),
      format_price(record.predicted_price),
      record.confidence.round(),
      record.accuracy_label().unwrap_or_else(|| "pending".to_string())
    );
  }

  Ok(())
}

pub fn show_prediction<M: Medium>(store: &PredictionStore<M>, id: RecordId) -> Result<()> {
  let record = store.get(id)?.ok_or_else(|| anyhow!("Prediction {} not found", id))?;

  print_summary(&record);
  let attrs = &record.attributes;
  println!("  Year: {}  Kms driven: {}  Fuel: {}", attrs.year, attrs.kms_driven, attrs.fuel_type);
  if let Some(transmission) = &attrs.transmission {
    println!("  Transmission: {}", transmission);
  }
  if let Some(city) = &attrs.city {
    println!("  City: {}", city);
  }
  if let Some(model) = &record.details.model_used {
    println!("  Model used: {}", model);
  }
  print_price_range(&record);
  println!("  Created: {}", record.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
  println!("  Saved: {}", if record.saved { "yes" } else { "no" });
  if let (Some(actual), Some(accuracy)) = (record.actual_price, record.accuracy) {
    println!("  Actual price: {}  Accuracy: {}", format_price(actual), format_percent(accuracy));
  }

  Ok(())
}

pub fn toggle_save<M: Medium>(store: &mut PredictionStore<M>, id: RecordId) -> Result<bool> {
  let Some(record) = store.toggle_save_record(id)? else {
    println!("{} Prediction {} not found", "!".yellow(), id.to_string().cyan());
    return Ok(false);
  };

  let verb = if record.saved { "Saved" } else { "Unsaved" };
  println!("{} {} prediction {}", "✓".green(), verb, id.to_string().cyan());
  Ok(true)
}

pub fn add_actual_price<M: Medium>(
  store: &mut PredictionStore<M>,
  id: RecordId,
  actual_price: f64,
) -> Result<bool> {
  let Some(record) = store.record_actual_price(id, actual_price)? else {
    println!("{} Prediction {} not found", "!".yellow(), id.to_string().cyan());
    return Ok(false);
  };

  let accuracy = record.accuracy_label().unwrap_or_default();
  println!("{} Recorded actual price for {} (accuracy {})", "✓".green(), id.to_string().cyan(), accuracy);
  Ok(true)
}

pub fn delete_prediction<M: Medium>(
  store: &mut PredictionStore<M>,
  id: RecordId,
  force: bool,
) -> Result<bool> {
  if !force && !confirm(&format!("Are you sure you want to delete prediction {}?", id.to_string().cyan()))? {
    println!("Deletion cancelled");
    return Ok(false);
  }

  if !store.delete(id)? {
    println!("{} Prediction {} not found", "!".yellow(), id.to_string().cyan());
    return Ok(false);
  }

  println!("{} Deleted prediction {}", "✓".green(), id.to_string().cyan());
  Ok(true)
}

pub fn clear_predictions<M: Medium>(store: &mut PredictionStore<M>, force: bool) -> Result<bool> {
  if !force && !confirm("Are you sure you want to delete ALL predictions?")? {
    println!("Clear cancelled");
    return Ok(false);
  }

  store.clear_all()?;
  println!("{} Cleared all predictions", "✓".green());
  Ok(true)
}

/// Write the CSV export into `dir`, returning the file path
pub fn export_predictions<M: Medium>(store: &PredictionStore<M>, dir: &Path) -> Result<PathBuf> {
  let csv = store.export_csv()?;
  fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {}", dir.display()))?;

  let path = dir.join(export_filename(Utc::now().date_naive()));
  fs::write(&path, csv).with_context(|| format!("Failed to write {}", path.display()))?;

  println!("{} Exported predictions to {}", "✓".green(), path.display().to_string().cyan());
  Ok(path)
}

pub fn print_csv<M: Medium>(store: &PredictionStore<M>) -> Result<()> {
  println!("{}", store.export_csv()?);
  Ok(())
}

pub fn show_stats<M: Medium>(store: &PredictionStore<M>) -> Result<()> {
  let stats = store.compute_stats()?;

  println!("Total predictions: {}", stats.total_predictions.to_string().cyan());
  println!("Saved predictions: {}", stats.total_saved.to_string().cyan());
  println!("Average confidence: {}%", stats.average_confidence.round());
  match stats.average_accuracy {
    Some(accuracy) => println!("Average accuracy: {}%", accuracy.round()),
    None => println!("Average accuracy: {}", "no actual prices yet".yellow()),
  }
  match stats.favorite_brand {
    Some(brand) => println!("Favorite brand: {}", brand.yellow()),
    None => println!("Favorite brand: -"),
  }

  Ok(())
}

fn print_summary(record: &PredictionRecord) {
  println!(
    "{} {}: {} ({}% confidence)",
    record.id.to_string().cyan(),
    record.attributes.display_name().yellow(),
    format_price(record.predicted_price).green(),
    record.confidence.round()
  );
}

fn print_price_range(record: &PredictionRecord) {
  if let Some(range) = record.details.price_range {
    println!("  Expected range: {} - {}", format_price(range.min), format_price(range.max));
  }
}

fn confirm(prompt: &str) -> Result<bool> {
  println!("{} [y/N]", prompt);

  let mut input = String::new();
  std::io::stdin().read_line(&mut input)?;
  Ok(input.trim().to_lowercase().starts_with('y'))
}

/// Rupee amount with thousands separators, e.g. "₹725,000"
pub fn format_price(value: f64) -> String {
  let rounded = value.round() as i64;
  let digits = rounded.unsigned_abs().to_string();
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(ch);
  }
  let sign = if rounded < 0 { "-" } else { "" };
  format!("{sign}₹{grouped}")
}
