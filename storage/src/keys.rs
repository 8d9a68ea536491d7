// storage/src/keys.rs
//
// Key layouts. Time-ordered trees use `scope(16) | time(8) | id(16)` so that a
// prefix scan over `scope` yields rows in chronological order and a range
// over `scope | time` bounds a date window.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{StorageError, StorageResult};

pub const UUID_LEN: usize = 16;
pub const TIME_LEN: usize = 8;

/// Big-endian encoding of microseconds since the epoch with the sign bit
/// flipped, so byte order matches time order including pre-1970 instants.
pub fn time_bytes(ts: &DateTime<Utc>) -> [u8; TIME_LEN] {
    ((ts.timestamp_micros() as u64) ^ (1u64 << 63)).to_be_bytes()
}

pub fn scoped_key(scope: Uuid, ts: &DateTime<Utc>, id: Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(UUID_LEN * 2 + TIME_LEN);
    key.extend_from_slice(scope.as_bytes());
    key.extend_from_slice(&time_bytes(ts));
    key.extend_from_slice(id.as_bytes());
    key
}

/// Inclusive bounds covering every scoped key for `scope` between `start`
/// and `end`; missing bounds are open.
pub fn scoped_bounds(
    scope: Uuid,
    start: Option<&DateTime<Utc>>,
    end: Option<&DateTime<Utc>>,
) -> (Vec<u8>, Vec<u8>) {
    let mut low = scope.as_bytes().to_vec();
    match start {
        Some(ts) => low.extend_from_slice(&time_bytes(ts)),
        None => low.extend_from_slice(&[0u8; TIME_LEN]),
    }
    low.extend_from_slice(&[0u8; UUID_LEN]);

    let mut high = scope.as_bytes().to_vec();
    match end {
        Some(ts) => high.extend_from_slice(&time_bytes(ts)),
        None => high.extend_from_slice(&[0xffu8; TIME_LEN]),
    }
    high.extend_from_slice(&[0xffu8; UUID_LEN]);
    (low, high)
}

pub fn pair_key(first: Uuid, second: Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(UUID_LEN * 2);
    key.extend_from_slice(first.as_bytes());
    key.extend_from_slice(second.as_bytes());
    key
}

/// The trailing UUID of a scoped or pair key.
pub fn trailing_uuid(key: &[u8]) -> StorageResult<Uuid> {
    if key.len() < UUID_LEN {
        return Err(StorageError::Corrupt(format!("key of length {} has no id suffix", key.len())));
    }
    Uuid::from_slice(&key[key.len() - UUID_LEN..]).map_err(|e| StorageError::Corrupt(e.to_string()))
}

pub fn uuid_from_value(value: &[u8]) -> StorageResult<Uuid> {
    Uuid::from_slice(value).map_err(|e| StorageError::Corrupt(e.to_string()))
}
