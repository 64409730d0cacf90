//! Entry records
//!
//! An entry is a single measurement: a parameter id, a timestamp and an
//! opaque payload. On the page every entry is stored as one record:
//!
//! ```text
//! ┌──────────────┬────────────────────┬──────────────┬─────────────────────┐
//! │ key: u32     │ timestamp: i64     │ length: u32  │ payload             │
//! │ (4 bytes)    │ (8 bytes)          │ (4 bytes)    │ (length - 16 bytes) │
//! └──────────────┴────────────────────┴──────────────┴─────────────────────┘
//! ```
//!
//! `length` always covers the whole record, header included, so the payload
//! size is derived from it and never stored separately.

use crate::page::error::{PageError, PageResult};
use crate::page::timestamp::Timestamp;

/// Parameter identifier (the entry key)
pub type ParamId = u32;

/// Size of the fixed record header in bytes
pub const ENTRY_HEADER_SIZE: usize = 16;

/// Largest payload whose record length still fits in 32 bits
pub const MAX_PAYLOAD_SIZE: usize = u32::MAX as usize - ENTRY_HEADER_SIZE;

/// An owned entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: ParamId,
    timestamp: Timestamp,
    length: u32,
    payload: Vec<u8>,
}

impl Entry {
    /// Create an entry, computing its record length from the payload
    pub fn new(key: ParamId, timestamp: Timestamp, payload: impl Into<Vec<u8>>) -> PageResult<Self> {
        let payload = payload.into();
        let length = Self::get_size(payload.len()).ok_or_else(|| {
            PageError::BadData(format!("payload of {} bytes is too large", payload.len()))
        })?;

        Ok(Self {
            key,
            timestamp,
            length,
            payload,
        })
    }

    /// Calculate the record size needed to store a payload of `payload_len` bytes
    pub fn get_size(payload_len: usize) -> Option<u32> {
        if payload_len > MAX_PAYLOAD_SIZE {
            return None;
        }
        Some((payload_len + ENTRY_HEADER_SIZE) as u32)
    }

    /// Decode a record previously produced by `copy_entry`
    ///
    /// Trailing bytes past the record's declared length are ignored, so a
    /// receiver larger than the record decodes fine.
    pub fn decode(record: &[u8]) -> PageResult<Self> {
        let view = EntryView::parse(record)
            .ok_or_else(|| PageError::BadData("truncated or malformed record".into()))?;
        Ok(view.to_entry())
    }

    pub fn key(&self) -> ParamId {
        self.key
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Total record length (header + payload)
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Payload bytes
    pub fn storage(&self) -> &[u8] {
        &self.payload
    }

    /// Borrow this entry in by-reference form
    pub fn as_entry_ref(&self) -> EntryRef<'_> {
        EntryRef::new(self.key, self.timestamp, &self.payload)
    }
}

/// An entry whose payload lives in caller-managed memory
///
/// Appending an `EntryRef` copies the payload straight into the page without
/// building an owned `Entry` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRef<'a> {
    pub key: ParamId,
    pub timestamp: Timestamp,
    pub payload: &'a [u8],
}

impl<'a> EntryRef<'a> {
    pub fn new(key: ParamId, timestamp: Timestamp, payload: &'a [u8]) -> Self {
        Self {
            key,
            timestamp,
            payload,
        }
    }

    /// Record length this entry occupies on the page
    pub fn record_len(&self) -> PageResult<u32> {
        Entry::get_size(self.payload.len()).ok_or_else(|| {
            PageError::BadData(format!(
                "payload of {} bytes is too large",
                self.payload.len()
            ))
        })
    }

    /// Write the full record into `dst`, which must be exactly `record_len()` bytes
    pub(crate) fn encode_into(&self, dst: &mut [u8]) {
        debug_assert_eq!(dst.len(), ENTRY_HEADER_SIZE + self.payload.len());

        let length = dst.len() as u32;
        dst[0..4].copy_from_slice(&self.key.to_le_bytes());
        dst[4..12].copy_from_slice(&self.timestamp.to_le_bytes());
        dst[12..16].copy_from_slice(&length.to_le_bytes());
        dst[ENTRY_HEADER_SIZE..].copy_from_slice(self.payload);
    }
}

/// Zero-copy view onto a record stored in a page
///
/// The view borrows the page, so it cannot outlive it and the page cannot
/// be mutated while the view exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryView<'a> {
    key: ParamId,
    timestamp: Timestamp,
    record: &'a [u8],
}

impl<'a> EntryView<'a> {
    /// Parse a record starting at the beginning of `bytes`
    ///
    /// Returns `None` when the header is truncated or the declared length is
    /// smaller than the header or larger than the available bytes.
    pub fn parse(bytes: &'a [u8]) -> Option<Self> {
        let (key, timestamp, length) = read_header(bytes)?;
        let length = length as usize;
        if length < ENTRY_HEADER_SIZE || length > bytes.len() {
            return None;
        }

        Some(Self {
            key,
            timestamp,
            record: &bytes[..length],
        })
    }

    pub fn key(&self) -> ParamId {
        self.key
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Total record length (header + payload)
    pub fn length(&self) -> u32 {
        self.record.len() as u32
    }

    /// Payload bytes
    pub fn payload(&self) -> &'a [u8] {
        &self.record[ENTRY_HEADER_SIZE..]
    }

    /// The whole record as stored on the page
    pub fn as_bytes(&self) -> &'a [u8] {
        self.record
    }

    /// Copy into an owned entry
    pub fn to_entry(&self) -> Entry {
        Entry {
            key: self.key,
            timestamp: self.timestamp,
            length: self.length(),
            payload: self.payload().to_vec(),
        }
    }
}

/// Read `(key, timestamp, length)` from the start of a record
pub(crate) fn read_header(bytes: &[u8]) -> Option<(ParamId, Timestamp, u32)> {
    let header = bytes.get(..ENTRY_HEADER_SIZE)?;
    let key = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let timestamp = Timestamp::from_le_bytes([
        header[4], header[5], header[6], header[7], header[8], header[9], header[10], header[11],
    ]);
    let length = u32::from_le_bytes([header[12], header[13], header[14], header[15]]);
    Some((key, timestamp, length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_size() {
        assert_eq!(Entry::get_size(0), Some(16));
        assert_eq!(Entry::get_size(16), Some(32));
        assert_eq!(Entry::get_size(MAX_PAYLOAD_SIZE), Some(u32::MAX));
        assert_eq!(Entry::get_size(MAX_PAYLOAD_SIZE + 1), None);
    }

    #[test]
    fn test_entry_length_includes_header() {
        let entry = Entry::new(7, Timestamp::from_micros(100), vec![1u8; 10]).unwrap();

        assert_eq!(entry.key(), 7);
        assert_eq!(entry.length(), 26);
        assert_eq!(entry.storage(), &[1u8; 10]);
    }

    #[test]
    fn test_encode_and_parse_view() {
        let payload = b"temperature=21.5";
        let entry = EntryRef::new(3, Timestamp::from_micros(-5), payload);
        let mut buf = vec![0u8; entry.record_len().unwrap() as usize];
        entry.encode_into(&mut buf);

        let view = EntryView::parse(&buf).unwrap();
        assert_eq!(view.key(), 3);
        assert_eq!(view.timestamp(), Timestamp::from_micros(-5));
        assert_eq!(view.length() as usize, buf.len());
        assert_eq!(view.payload(), payload);
        assert_eq!(view.as_bytes(), &buf[..]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        // Too short for a header
        assert!(EntryView::parse(&[0u8; 10]).is_none());

        // Declared length smaller than the header
        let mut buf = [0u8; 16];
        buf[12..16].copy_from_slice(&8u32.to_le_bytes());
        assert!(EntryView::parse(&buf).is_none());

        // Declared length past the end of the buffer
        buf[12..16].copy_from_slice(&64u32.to_le_bytes());
        assert!(EntryView::parse(&buf).is_none());
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let entry = Entry::new(9, Timestamp::from_micros(1), b"abc".to_vec()).unwrap();
        let mut buf = vec![0xFFu8; 64];
        entry
            .as_entry_ref()
            .encode_into(&mut buf[..entry.length() as usize]);

        assert_eq!(Entry::decode(&buf).unwrap(), entry);
        assert!(matches!(Entry::decode(&buf[..8]), Err(PageError::BadData(_))));
    }
}
