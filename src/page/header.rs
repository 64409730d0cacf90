//! Fixed page header
//!
//! Layout (56 bytes, little-endian):
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   kind: u32                             │
//! │   entry_count: u32                      │
//! │   last_offset: u32                      │
//! │   length: u64                           │
//! │   overwrites_count: u32                 │
//! │   page_id: u32                          │
//! │   bbox.min_key: u32                     │
//! │   bbox.max_key: u32                     │
//! │   bbox.min_timestamp: i64               │
//! │   bbox.max_timestamp: i64               │
//! │   checksum: u32                         │
//! └─────────────────────────────────────────┘
//! ```

use crate::page::bbox::BoundingBox;
use crate::page::error::{PageError, PageResult};
use crate::page::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Largest supported page (4 GiB)
pub const MAX_PAGE_SIZE: u64 = 0x1_0000_0000;

/// Largest representable offset inside a page
pub const MAX_PAGE_OFFSET: u32 = 0xFFFF_FFFF;

/// Header size in bytes
pub const HEADER_SIZE: usize = 56;

/// Size of one index slot (a 32-bit record offset)
pub const INDEX_SLOT_SIZE: usize = 4;

/// Bytes covered by the header checksum
const CHECKSUM_START: usize = HEADER_SIZE - 4;

/// Page type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum PageKind {
    /// Page with administrative data used by the storage volume itself
    Metadata = 0,
    /// Data page holding indexed entries
    Index = 1,
}

impl TryFrom<u32> for PageKind {
    type Error = PageError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PageKind::Metadata),
            1 => Ok(PageKind::Index),
            _ => Err(PageError::Corruption(format!("Unknown page kind: {}", value))),
        }
    }
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageKind::Metadata => write!(f, "metadata"),
            PageKind::Index => write!(f, "index"),
        }
    }
}

/// In-memory copy of the page header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Page type
    pub kind: PageKind,
    /// Number of entries stored
    pub count: u32,
    /// Offset of the most recently appended record (0 while empty)
    pub last_offset: u32,
    /// Page size in bytes
    pub length: u64,
    /// How many times the page was cleared and reused
    pub overwrites_count: u32,
    /// Page index in the storage volume
    pub page_id: u32,
    /// Page data limits
    pub bbox: BoundingBox,
}

impl PageHeader {
    pub fn new(kind: PageKind, length: u64, page_id: u32) -> Self {
        Self {
            kind,
            count: 0,
            last_offset: 0,
            length,
            overwrites_count: 0,
            page_id,
            bbox: BoundingBox::EMPTY,
        }
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];

        buf[0..4].copy_from_slice(&(self.kind as u32).to_le_bytes());
        buf[4..8].copy_from_slice(&self.count.to_le_bytes());
        buf[8..12].copy_from_slice(&self.last_offset.to_le_bytes());
        buf[12..20].copy_from_slice(&self.length.to_le_bytes());
        buf[20..24].copy_from_slice(&self.overwrites_count.to_le_bytes());
        buf[24..28].copy_from_slice(&self.page_id.to_le_bytes());
        buf[28..32].copy_from_slice(&self.bbox.min_key.to_le_bytes());
        buf[32..36].copy_from_slice(&self.bbox.max_key.to_le_bytes());
        buf[36..44].copy_from_slice(&self.bbox.min_timestamp.to_le_bytes());
        buf[44..52].copy_from_slice(&self.bbox.max_timestamp.to_le_bytes());

        let checksum = crc32fast::hash(&buf[..CHECKSUM_START]);
        buf[CHECKSUM_START..].copy_from_slice(&checksum.to_le_bytes());

        buf
    }

    /// Parse header from bytes
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> PageResult<Self> {
        let stored_checksum = read_u32(buf, CHECKSUM_START);
        let computed_checksum = crc32fast::hash(&buf[..CHECKSUM_START]);

        if stored_checksum != computed_checksum {
            return Err(PageError::Corruption(format!(
                "Header checksum mismatch: stored={}, computed={}",
                stored_checksum, computed_checksum
            )));
        }

        let kind = PageKind::try_from(read_u32(buf, 0))?;
        let mut length_bytes = [0u8; 8];
        length_bytes.copy_from_slice(&buf[12..20]);

        Ok(Self {
            kind,
            count: read_u32(buf, 4),
            last_offset: read_u32(buf, 8),
            length: u64::from_le_bytes(length_bytes),
            overwrites_count: read_u32(buf, 20),
            page_id: read_u32(buf, 24),
            bbox: BoundingBox {
                min_key: read_u32(buf, 28),
                max_key: read_u32(buf, 32),
                min_timestamp: read_timestamp(buf, 36),
                max_timestamp: read_timestamp(buf, 44),
            },
        })
    }
}

pub(crate) fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn read_timestamp(buf: &[u8], at: usize) -> Timestamp {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    Timestamp::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let mut header = PageHeader::new(PageKind::Index, 4096, 17);
        header.count = 3;
        header.last_offset = 4000;
        header.overwrites_count = 2;
        header.bbox.update(7, Timestamp::from_micros(100));
        header.bbox.update(9, Timestamp::from_micros(-300));

        let bytes = header.to_bytes();
        let restored = PageHeader::from_bytes(&bytes).unwrap();

        assert_eq!(restored, header);
    }

    #[test]
    fn test_header_detects_corruption() {
        let header = PageHeader::new(PageKind::Metadata, 8192, 1);
        let mut bytes = header.to_bytes();
        bytes[5] ^= 0xFF;

        assert!(matches!(
            PageHeader::from_bytes(&bytes),
            Err(PageError::Corruption(_))
        ));
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(PageKind::try_from(1).unwrap(), PageKind::Index);
        assert!(PageKind::try_from(2).is_err());
    }
}
