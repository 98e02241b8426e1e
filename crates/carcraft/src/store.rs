use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::export;
use crate::medium::Medium;
use crate::record::{CarAttributes, PredictionDetails, PredictionRecord, RecordId};
use crate::stats::{self, StatsSummary};

/// Key the whole collection is persisted under
pub const STORAGE_KEY: &str = "carPredictions";

/// Maximum number of records kept; the oldest are dropped first
pub const RETENTION_LIMIT: usize = 50;

/// Persisted, newest-first collection of prediction records.
///
/// The medium holds the only copy of the data. Every mutation reads the
/// collection, changes it, and writes it back whole, so a failed write
/// leaves the last successfully persisted state in place.
pub struct PredictionStore<M: Medium> {
  medium: M,
}

impl<M: Medium> PredictionStore<M> {
  pub fn new(medium: M) -> Self {
    Self { medium }
  }

  pub fn medium(&self) -> &M {
    &self.medium
  }

  /// Store a fresh prediction at the front of the collection
  pub fn create(
    &mut self,
    attributes: CarAttributes,
    predicted_price: f64,
    confidence: f64,
    details: PredictionDetails,
  ) -> Result<PredictionRecord> {
    attributes.validate()?;
    if !predicted_price.is_finite() {
      return Err(StoreError::validation(format!("predicted price {predicted_price} is not finite")));
    }
    if !confidence.is_finite() || !(0.0..=100.0).contains(&confidence) {
      return Err(StoreError::validation(format!("confidence {confidence} must be within 0-100")));
    }

    let mut records = self.get_all()?;
    let now = Utc::now();
    let id = next_id(&records, now.timestamp_millis());
    let record = PredictionRecord::new(id, attributes, predicted_price, confidence, details, now);

    records.insert(0, record.clone());
    if records.len() > RETENTION_LIMIT {
      let evicted = records.len() - RETENTION_LIMIT;
      records.truncate(RETENTION_LIMIT);
      debug!(evicted, "retention limit reached, dropped oldest predictions");
    }

    self.persist(&records)?;
    info!(id = %record.id, car = %record.attributes.display_name(), "stored prediction");
    Ok(record)
  }

  /// All records, most recently created first.
  ///
  /// Unparseable persisted data reads as an empty collection; the next
  /// successful write replaces it.
  pub fn get_all(&self) -> Result<Vec<PredictionRecord>> {
    let Some(raw) = self.medium.get(STORAGE_KEY)? else {
      return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<PredictionRecord>>(&raw) {
      Ok(records) => Ok(records),
      Err(e) => {
        warn!(error = %e, "ignoring corrupt prediction data");
        Ok(Vec::new())
      }
    }
  }

  pub fn get_saved(&self) -> Result<Vec<PredictionRecord>> {
    Ok(self.get_all()?.into_iter().filter(|r| r.saved).collect())
  }

  pub fn get(&self, id: RecordId) -> Result<Option<PredictionRecord>> {
    Ok(self.get_all()?.into_iter().find(|r| r.id == id))
  }

  /// The `limit` most recent records
  pub fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>> {
    let mut records = self.get_all()?;
    records.truncate(limit);
    Ok(records)
  }

  /// Flip the saved flag. `Ok(false)` when no record has this id.
  pub fn toggle_save(&mut self, id: RecordId) -> Result<bool> {
    Ok(self.toggle_save_record(id)?.is_some())
  }

  /// Like [`toggle_save`](Self::toggle_save), returning the updated record
  pub fn toggle_save_record(&mut self, id: RecordId) -> Result<Option<PredictionRecord>> {
    self.update(id, |record| record.saved = !record.saved)
  }

  /// Attach the real selling price and derive accuracy from it
  pub fn add_actual_price(&mut self, id: RecordId, actual_price: f64) -> Result<bool> {
    Ok(self.record_actual_price(id, actual_price)?.is_some())
  }

  /// Like [`add_actual_price`](Self::add_actual_price), returning the updated record
  pub fn record_actual_price(
    &mut self,
    id: RecordId,
    actual_price: f64,
  ) -> Result<Option<PredictionRecord>> {
    if !actual_price.is_finite() || actual_price <= 0.0 {
      return Err(StoreError::validation(format!(
        "actual price {actual_price} must be a positive number"
      )));
    }
    self.update(id, |record| record.set_actual_price(actual_price))
  }

  pub fn delete(&mut self, id: RecordId) -> Result<bool> {
    let mut records = self.get_all()?;
    let before = records.len();
    records.retain(|r| r.id != id);
    if records.len() == before {
      return Ok(false);
    }

    self.persist(&records)?;
    info!(%id, "deleted prediction");
    Ok(true)
  }

  pub fn clear_all(&mut self) -> Result<bool> {
    self.medium.remove(STORAGE_KEY)?;
    info!("cleared all predictions");
    Ok(true)
  }

  /// CSV text of every record, header first
  pub fn export_csv(&self) -> Result<String> {
    Ok(export::to_csv(&self.get_all()?))
  }

  pub fn compute_stats(&self) -> Result<StatsSummary> {
    Ok(stats::summarize(&self.get_all()?))
  }

  fn update<F>(&mut self, id: RecordId, change: F) -> Result<Option<PredictionRecord>>
  where
    F: FnOnce(&mut PredictionRecord),
  {
    let mut records = self.get_all()?;
    let Some(record) = records.iter_mut().find(|r| r.id == id) else {
      debug!(%id, "no prediction with this id");
      return Ok(None);
    };

    change(record);
    let updated = record.clone();
    self.persist(&records)?;
    debug!(%id, "updated prediction");
    Ok(Some(updated))
  }

  fn persist(&mut self, records: &[PredictionRecord]) -> Result<()> {
    let json = serde_json::to_string(records)?;
    self.medium.set(STORAGE_KEY, &json)?;
    Ok(())
  }
}

/// Suggested file name for an export taken on `date`
pub fn export_filename(date: NaiveDate) -> String {
  format!("car-predictions-{}.csv", date.format("%Y-%m-%d"))
}

/// Time-based id, bumped past the newest existing id so ids never collide.
///
/// When the newest id is already `u64::MAX` the lowest free id from the
/// clock onwards (wrapping to zero) is used instead.
fn next_id(records: &[PredictionRecord], now_millis: i64) -> RecordId {
  let now = u64::try_from(now_millis).unwrap_or(0);
  let Some(max) = records.iter().map(|r| r.id.0).max() else {
    return RecordId(now);
  };

  match max.checked_add(1) {
    Some(floor) => RecordId(now.max(floor)),
    None => {
      let taken: HashSet<u64> = records.iter().map(|r| r.id.0).collect();
      let free = (now..=u64::MAX).chain(0..now).find(|candidate| !taken.contains(candidate));
      RecordId(free.unwrap_or(now))
    }
  }
}
