use thiserror::Error;

/// Failures raised by a persistence medium
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediumError {
  #[error("Storage quota exceeded: {needed} bytes needed, {quota} available")]
  QuotaExceeded { needed: usize, quota: usize },

  #[error("Storage unavailable: {message}")]
  Unavailable { message: String },

  #[error("Storage I/O failed: {message}")]
  Io { message: String },
}

impl MediumError {
  pub fn unavailable(message: impl Into<String>) -> Self {
    Self::Unavailable { message: message.into() }
  }

  pub fn io(message: impl Into<String>) -> Self {
    Self::Io { message: message.into() }
  }
}

impl From<std::io::Error> for MediumError {
  fn from(err: std::io::Error) -> Self {
    Self::io(err.to_string())
  }
}

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Persistence failed: {0}")]
  Persistence(#[from] MediumError),

  #[error("Could not serialize predictions: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Invalid input: {message}")]
  Validation { message: String },
}

impl StoreError {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation { message: message.into() }
  }

  /// True for medium and serialization failures, the "persistence" kind
  pub fn is_persistence(&self) -> bool {
    matches!(self, Self::Persistence(_) | Self::Serialization(_))
  }
}

pub type Result<T> = std::result::Result<T, StoreError>;
