//! Key encoding and decoding for the storage layer.
//!
//! Entity keys are zero-padded ids so a forward scan is in id order.
//! Search log keys are `log:{timestamp_ms:013}:{ulid}` so a forward scan is
//! chronological, with the ULID breaking ties within a millisecond.

use ulid::Ulid;

use crate::error::StorageError;

/// Key for an entity record
/// Format: {id:020}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityKey {
    pub id: u64,
}

impl EntityKey {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    /// Encode key to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{:020}", self.id).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        let id: u64 = s
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid entity id: {}", e)))?;
        Ok(Self { id })
    }
}

/// Key for a search log entry
/// Format: log:{timestamp_ms:013}:{ulid}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLogKey {
    /// When the search happened, in milliseconds
    pub timestamp_ms: i64,
    /// Uniqueness within the same millisecond
    pub ulid: Ulid,
}

impl SearchLogKey {
    /// Create a key with a fresh ULID
    pub fn new(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            ulid: Ulid::new(),
        }
    }

    /// Encode key to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("log:{:013}:{}", self.timestamp_ms, self.ulid).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts[0] != "log" {
            return Err(StorageError::Key(format!(
                "Invalid search log key format: {}",
                s
            )));
        }

        let timestamp_ms: i64 = parts[1]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid timestamp: {}", e)))?;
        let ulid: Ulid = parts[2]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid ULID: {}", e)))?;

        Ok(Self { timestamp_ms, ulid })
    }
}
