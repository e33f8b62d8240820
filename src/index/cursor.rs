//! Opaque pagination tokens.
//!
//! A token is URL-safe base64 of a small JSON envelope. The envelope carries
//! the config fingerprint and a checksum over the position, so tokens from a
//! differently configured index or edited by hand are rejected.

use crate::compute::cell::CellId;
use crate::error::{IndexError, Result};
use crate::storage::EntryKey;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rustc_hash::FxHasher;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

const CURSOR_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CursorKind {
    Query,
    Nearest,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    v: u8,
    kind: CursorKind,
    fingerprint: u64,
    checksum: u64,
    /// JSON-encoded position, kept as text so the checksum is stable.
    position: String,
}

/// Where a shape query stopped: the last composite key it visited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct QueryPosition {
    cell: u64,
    /// `f64::to_bits`, so infinities survive JSON.
    sort_key: u64,
    key: String,
}

/// Where a nearest search stopped: the distance and composite key of the
/// last returned row, plus the radius the search had reached.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NearestPosition {
    pub last_distance: f64,
    pub last_entry: EntryKey,
    pub radius: f64,
}

/// Floats are stored as `f64::to_bits` so the resume point compares equal
/// to the row it was taken from.
#[derive(Serialize, Deserialize)]
struct NearestToken {
    distance: u64,
    radius: u64,
    cell: u64,
    sort_key: u64,
    key: String,
}

pub(crate) fn encode_query(entry: &EntryKey, fingerprint: u64) -> Result<String> {
    let position = QueryPosition {
        cell: entry.cell.0,
        sort_key: entry.sort_key.0.to_bits(),
        key: entry.key.clone(),
    };
    encode(CursorKind::Query, fingerprint, &position)
}

pub(crate) fn decode_query(token: &str, fingerprint: u64) -> Result<EntryKey> {
    let position: QueryPosition = decode(token, CursorKind::Query, fingerprint)?;
    entry_key(position.cell, position.sort_key, position.key)
}

pub(crate) fn encode_nearest(position: &NearestPosition, fingerprint: u64) -> Result<String> {
    let token = NearestToken {
        distance: position.last_distance.to_bits(),
        radius: position.radius.to_bits(),
        cell: position.last_entry.cell.0,
        sort_key: position.last_entry.sort_key.0.to_bits(),
        key: position.last_entry.key.clone(),
    };
    encode(CursorKind::Nearest, fingerprint, &token)
}

pub(crate) fn decode_nearest(token: &str, fingerprint: u64) -> Result<NearestPosition> {
    let token: NearestToken = decode(token, CursorKind::Nearest, fingerprint)?;
    let last_distance = f64::from_bits(token.distance);
    let radius = f64::from_bits(token.radius);
    if !last_distance.is_finite() || last_distance < 0.0 || !radius.is_finite() || radius <= 0.0 {
        return Err(reject("distance or radius out of range"));
    }
    Ok(NearestPosition {
        last_distance,
        last_entry: entry_key(token.cell, token.sort_key, token.key)?,
        radius,
    })
}

fn entry_key(cell: u64, sort_key: u64, key: String) -> Result<EntryKey> {
    let cell = CellId(cell);
    if !cell.is_valid() {
        return Err(reject("cell id is not valid"));
    }
    Ok(EntryKey::new(cell, f64::from_bits(sort_key), key))
}

fn encode<P: Serialize>(kind: CursorKind, fingerprint: u64, position: &P) -> Result<String> {
    let position = serde_json::to_string(position)?;
    let envelope = Envelope {
        v: CURSOR_VERSION,
        kind,
        fingerprint,
        checksum: checksum(kind, fingerprint, &position),
        position,
    };
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(&envelope)?))
}

fn decode<P: DeserializeOwned>(token: &str, kind: CursorKind, fingerprint: u64) -> Result<P> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| reject(&format!("not base64: {}", e)))?;
    let envelope: Envelope =
        serde_json::from_slice(&bytes).map_err(|e| reject(&format!("malformed envelope: {}", e)))?;

    if envelope.v != CURSOR_VERSION {
        return Err(reject(&format!("unsupported version {}", envelope.v)));
    }
    if envelope.kind != kind {
        return Err(reject("cursor belongs to a different kind of query"));
    }
    if envelope.fingerprint != fingerprint {
        return Err(reject("cursor was issued under a different index configuration"));
    }
    if envelope.checksum != checksum(envelope.kind, envelope.fingerprint, &envelope.position) {
        return Err(reject("checksum mismatch"));
    }

    serde_json::from_str(&envelope.position)
        .map_err(|e| reject(&format!("malformed position: {}", e)))
}

fn checksum(kind: CursorKind, fingerprint: u64, position: &str) -> u64 {
    let mut hasher = FxHasher::default();
    kind.hash(&mut hasher);
    fingerprint.hash(&mut hasher);
    position.hash(&mut hasher);
    hasher.finish()
}

fn reject(reason: &str) -> IndexError {
    log::warn!("rejected cursor: {}", reason);
    IndexError::InvalidCursor(reason.to_string())
}
