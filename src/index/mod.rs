//! # Index Store
//!
//! The inverted index is an external collaborator behind [`IndexStore`]: the
//! engine hands it a match-all request, a [`HitCollector`], and a per-field
//! decoder; the store walks its hits, calls the decoder for every stored
//! field, and signals emit/close on the collector.
//!
//! Stored fields are opaque bytes to the engine; the decoder interprets them
//! by column type:
//!
//! | Column type | Stored encoding |
//! |---|---|
//! | TEXT / KEYWORD | UTF-8 bytes |
//! | INTEGER / FLOAT | `f64`, big-endian |
//! | DATETIME | `i64` epoch milliseconds, big-endian |
//! | GEOPOINT | two `f64` (lat, lon), big-endian |
//!
//! The store's internal identifier travels as the [`ID_FIELD`] stored field
//! and is skipped during decoding.

mod memory;

pub use memory::MemoryIndexStore;

use crate::error::Result;
use crate::record::HitCollector;
use crate::sql::context::QueryContext;

/// Stored-field name of the store's internal hit identifier.
pub const ID_FIELD: &str = "_id";

/// Search shape accepted by the store. Scans issue a match-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchRequest {
    MatchAll,
}

/// Called once per stored field of every hit. Receives the collector so
/// decoded values land on the in-flight row. Returning false stops decoding
/// the current hit.
pub type FieldDecoder<'a> = dyn FnMut(&mut HitCollector, &str, &[u8]) -> bool + 'a;

pub trait IndexStore: Send + Sync {
    /// Runs `request` against `table`, feeding every hit through `decoder`
    /// into `collector`. Emits one result per hit and closes the collector
    /// when the hit iterator is exhausted, on cancellation, or on error.
    fn search(
        &self,
        ctx: &QueryContext,
        table: &str,
        request: &SearchRequest,
        collector: &mut HitCollector,
        decoder: &mut FieldDecoder,
    ) -> Result<()>;
}

/// Byte codecs for stored field values.
pub mod codec {
    use crate::error::{Error, Result};
    use chrono::{DateTime, TimeZone, Utc};

    pub fn encode_numeric(v: f64) -> [u8; 8] {
        v.to_be_bytes()
    }

    pub fn decode_numeric(raw: &[u8]) -> Result<f64> {
        let bytes: [u8; 8] = raw
            .try_into()
            .map_err(|_| Error::Index(format!("numeric field has {} bytes, want 8", raw.len())))?;
        Ok(f64::from_be_bytes(bytes))
    }

    pub fn encode_datetime(t: DateTime<Utc>) -> [u8; 8] {
        t.timestamp_millis().to_be_bytes()
    }

    pub fn decode_datetime(raw: &[u8]) -> Result<DateTime<Utc>> {
        let bytes: [u8; 8] = raw
            .try_into()
            .map_err(|_| Error::Index(format!("datetime field has {} bytes, want 8", raw.len())))?;
        let millis = i64::from_be_bytes(bytes);
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| Error::Index(format!("datetime millis {} out of range", millis)))
    }

    pub fn encode_geo_point(lat: f64, lon: f64) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&lat.to_be_bytes());
        out[8..].copy_from_slice(&lon.to_be_bytes());
        out
    }

    pub fn decode_geo_point(raw: &[u8]) -> Result<(f64, f64)> {
        if raw.len() != 16 {
            return Err(Error::Index(format!(
                "geopoint field has {} bytes, want 16",
                raw.len()
            )));
        }
        let lat = f64::from_be_bytes(raw[..8].try_into().unwrap());
        let lon = f64::from_be_bytes(raw[8..].try_into().unwrap());
        Ok((lat, lon))
    }

    pub fn decode_text(raw: &[u8]) -> Result<String> {
        String::from_utf8(raw.to_vec())
            .map_err(|e| Error::Index(format!("text field is not valid utf-8: {}", e)))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn numeric_round_trip() {
            assert_eq!(decode_numeric(&encode_numeric(-2.5)).unwrap(), -2.5);
        }

        #[test]
        fn datetime_round_trip() {
            let t = Utc.with_ymd_and_hms(2023, 3, 14, 1, 59, 26).unwrap();
            assert_eq!(decode_datetime(&encode_datetime(t)).unwrap(), t);
        }

        #[test]
        fn geo_point_round_trip() {
            let (lat, lon) = decode_geo_point(&encode_geo_point(48.85, 2.35)).unwrap();
            assert_eq!((lat, lon), (48.85, 2.35));
        }

        #[test]
        fn short_buffers_fail() {
            assert!(matches!(decode_numeric(&[1, 2, 3]), Err(Error::Index(_))));
            assert!(matches!(decode_geo_point(&[0; 8]), Err(Error::Index(_))));
        }
    }
}
