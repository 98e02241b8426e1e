//! Persistence media for the prediction store
//!
//! A medium is a string key-value store that survives restarts. The store
//! writes its whole collection under a single key, so media only need
//! whole-value get/set/remove.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::MediumError;

pub trait Medium {
  fn get(&self, key: &str) -> Result<Option<String>, MediumError>;
  fn set(&mut self, key: &str, value: &str) -> Result<(), MediumError>;
  fn remove(&mut self, key: &str) -> Result<(), MediumError>;
}

/// File-backed medium: one `<key>.json` file per key under a root directory
#[derive(Debug, Clone)]
pub struct FileMedium {
  root: PathBuf,
}

impl FileMedium {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.root.join(format!("{key}.json"))
  }
}

impl Medium for FileMedium {
  fn get(&self, key: &str) -> Result<Option<String>, MediumError> {
    let path = self.path_for(key);
    if !path.exists() {
      return Ok(None);
    }

    // Non-UTF-8 content reads as lossy text; judging it corrupt is the store's job
    let bytes = fs::read(&path)?;
    let text = match String::from_utf8(bytes) {
      Ok(text) => text,
      Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    Ok(Some(text))
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), MediumError> {
    fs::create_dir_all(&self.root).map_err(|e| {
      MediumError::unavailable(format!("cannot create {}: {e}", self.root.display()))
    })?;

    // Write then rename so readers never observe a partial value
    let path = self.path_for(key);
    let tmp = self.root.join(format!(".{key}.json.tmp"));
    fs::write(&tmp, value)?;
    if let Err(e) = fs::rename(&tmp, &path) {
      let _ = fs::remove_file(&tmp);
      return Err(e.into());
    }
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), MediumError> {
    let path = self.path_for(key);
    if path.exists() {
      fs::remove_file(&path)?;
    }
    Ok(())
  }
}

#[derive(Debug, Default)]
struct MemoryState {
  data: HashMap<String, String>,
  quota: Option<usize>,
  unavailable: bool,
}

/// In-memory medium for tests and demos.
///
/// Clones share the same underlying map, so a test can keep a handle to
/// inspect or corrupt what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
  state: Arc<RwLock<MemoryState>>,
}

impl MemoryMedium {
  pub fn new() -> Self {
    Self::default()
  }

  /// Medium that rejects writes once the total stored bytes would exceed `quota`
  pub fn with_quota(quota: usize) -> Self {
    let medium = Self::new();
    medium.write_state().quota = Some(quota);
    medium
  }

  /// Simulate the medium being cleared or blocked out from under the store
  pub fn set_unavailable(&self, unavailable: bool) {
    self.write_state().unavailable = unavailable;
  }

  /// Write a raw value, bypassing quota checks
  pub fn put_raw(&self, key: &str, value: &str) {
    self.write_state().data.insert(key.to_string(), value.to_string());
  }

  pub fn raw(&self, key: &str) -> Option<String> {
    self.read_state().data.get(key).cloned()
  }

  fn read_state(&self) -> std::sync::RwLockReadGuard<'_, MemoryState> {
    self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, MemoryState> {
    self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl Medium for MemoryMedium {
  fn get(&self, key: &str) -> Result<Option<String>, MediumError> {
    let state = self.read_state();
    if state.unavailable {
      return Err(MediumError::unavailable("memory medium is offline"));
    }
    Ok(state.data.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), MediumError> {
    let mut state = self.write_state();
    if state.unavailable {
      return Err(MediumError::unavailable("memory medium is offline"));
    }

    if let Some(quota) = state.quota {
      let others: usize =
        state.data.iter().filter(|(k, _)| k.as_str() != key).map(|(k, v)| k.len() + v.len()).sum();
      let needed = others + key.len() + value.len();
      if needed > quota {
        return Err(MediumError::QuotaExceeded { needed, quota });
      }
    }

    state.data.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), MediumError> {
    let mut state = self.write_state();
    if state.unavailable {
      return Err(MediumError::unavailable("memory medium is offline"));
    }
    state.data.remove(key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_file_medium_round_trip_and_remove() {
    let temp = TempDir::new().unwrap();
    let mut medium = FileMedium::new(temp.path().join("storage"));

    assert_eq!(medium.get("k").unwrap(), None);
    medium.set("k", "[1,2,3]").unwrap();
    assert_eq!(medium.get("k").unwrap().as_deref(), Some("[1,2,3]"));
    assert!(!temp.path().join("storage").join(".k.json.tmp").exists());

    medium.remove("k").unwrap();
    assert_eq!(medium.get("k").unwrap(), None);
    // removing twice is fine
    medium.remove("k").unwrap();
  }

  #[test]
  fn test_file_medium_returns_undecodable_bytes_as_text() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("k.json"), [0xff, 0xfe, 0x00, 0x5b]).unwrap();

    let medium = FileMedium::new(temp.path());
    let value = medium.get("k").unwrap().unwrap();
    assert!(value.ends_with('['));
  }

  #[test]
  fn test_memory_medium_quota() {
    let mut medium = MemoryMedium::with_quota(10);
    medium.set("k", "12345").unwrap();
    // replacing the same key only counts the new value
    medium.set("k", "123456789").unwrap();

    let err = medium.set("k", "1234567890").unwrap_err();
    assert!(matches!(err, MediumError::QuotaExceeded { needed: 11, quota: 10 }));
    assert_eq!(medium.get("k").unwrap().as_deref(), Some("123456789"));
  }

  #[test]
  fn test_memory_medium_unavailable() {
    let mut medium = MemoryMedium::new();
    medium.set_unavailable(true);
    assert!(medium.get("k").is_err());
    assert!(medium.set("k", "v").is_err());
    medium.set_unavailable(false);
    assert!(medium.set("k", "v").is_ok());
  }
}
