//! Page layout engine
//!
//! A page is a fixed-size arena. The index of 32-bit record offsets grows
//! from the low end (right after the header) upward, records are packed from
//! the high end downward:
//!
//! ```text
//! ┌──────────────┬───────────────────┬────────────┬──────────────────────┐
//! │ HEADER (56)  │ INDEX ──►         │ free space │        ◄── RECORDS   │
//! └──────────────┴───────────────────┴────────────┴──────────────────────┘
//! 0              56          index_high_water     entry_low_water   length
//! ```
//!
//! The header is written through to the buffer on every mutation, so the
//! buffer always holds a complete page that [`Page::open`] can reattach to.

use crate::page::bbox::BoundingBox;
use crate::page::entry::{read_header, Entry, EntryRef, EntryView, ParamId, ENTRY_HEADER_SIZE};
use crate::page::error::{PageError, PageResult};
use crate::page::header::{
    read_u32, PageHeader, PageKind, HEADER_SIZE, INDEX_SLOT_SIZE, MAX_PAGE_OFFSET, MAX_PAGE_SIZE,
};
use crate::page::timestamp::Timestamp;
use serde::Serialize;

/// Byte offset of a record inside its page
pub type EntryOffset = u32;

/// A page over a caller-provided buffer
///
/// `B` is any contiguous byte buffer: `Vec<u8>`, `&mut [u8]`, or a
/// `memmap2::MmapMut` handed over by the storage volume. The page never
/// reallocates or resizes it.
#[derive(Debug)]
pub struct Page<B> {
    buf: B,
    pub(crate) header: PageHeader,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Page<B> {
    /// Initialize an empty page over `buf`
    ///
    /// The whole buffer becomes the page; its length is the page capacity.
    /// Existing content past the header is ignored (and never zeroed).
    pub fn new(kind: PageKind, mut buf: B, page_id: u32) -> PageResult<Self> {
        let length = buf.as_mut().len() as u64;
        if length > MAX_PAGE_SIZE || length < HEADER_SIZE as u64 {
            return Err(PageError::InvalidCapacity(length));
        }

        let mut page = Self {
            buf,
            header: PageHeader::new(kind, length, page_id),
        };
        page.write_header();

        tracing::debug!(page_id, %kind, capacity = length, "Initialized page");
        Ok(page)
    }

    /// Attach to a buffer that already holds a page
    ///
    /// Verifies the header checksum, the recorded capacity and every index
    /// slot, so a page reopened from a mapped file can be trusted by the
    /// lookup paths.
    pub fn open(buf: B) -> PageResult<Self> {
        let bytes = buf.as_ref();
        let length = bytes.len() as u64;
        if length > MAX_PAGE_SIZE || length < HEADER_SIZE as u64 {
            return Err(PageError::InvalidCapacity(length));
        }

        let mut header_buf = [0u8; HEADER_SIZE];
        header_buf.copy_from_slice(&bytes[..HEADER_SIZE]);
        let header = PageHeader::from_bytes(&header_buf)?;

        if header.length != length {
            return Err(PageError::Corruption(format!(
                "Page length mismatch: header={}, buffer={}",
                header.length, length
            )));
        }

        let page = Self { buf, header };
        page.validate_index()?;

        tracing::debug!(
            page_id = header.page_id,
            entries = header.count,
            overwrites = header.overwrites_count,
            "Opened page"
        );
        Ok(page)
    }

    /// Add new entry to page data
    ///
    /// Returns the index of the new entry. On error nothing is written.
    pub fn add_entry(&mut self, entry: &Entry) -> PageResult<u32> {
        self.add_entry_ref(&entry.as_entry_ref())
    }

    /// Add new entry whose payload lives in caller memory
    pub fn add_entry_ref(&mut self, entry: &EntryRef<'_>) -> PageResult<u32> {
        let record_len = entry.record_len()?;
        let offset = self.reserve(record_len)?;

        let start = offset as usize;
        let end = start + record_len as usize;
        let slot = self.index_high_water() as usize;
        {
            let bytes = self.buf.as_mut();
            entry.encode_into(&mut bytes[start..end]);
            bytes[slot..slot + INDEX_SLOT_SIZE].copy_from_slice(&offset.to_le_bytes());
        }

        let index = self.header.count;
        self.header.count += 1;
        self.header.last_offset = offset;
        self.header.bbox.update(entry.key, entry.timestamp);
        self.write_header();

        Ok(index)
    }

    /// Clear all page content
    ///
    /// Counts and bounding box are reset and the overwrite generation is
    /// bumped. Record bytes stay in the buffer as garbage.
    pub fn clear(&mut self) {
        self.header.count = 0;
        self.header.last_offset = 0;
        self.header.bbox = BoundingBox::EMPTY;
        self.header.overwrites_count = self.header.overwrites_count.wrapping_add(1);
        self.write_header();

        tracing::debug!(
            page_id = self.header.page_id,
            overwrites = self.header.overwrites_count,
            "Cleared page"
        );
    }

    /// Find room for a record of `record_len` bytes
    ///
    /// The single fit check shared by every append path. Returns the offset
    /// the record will be written at.
    fn reserve(&self, record_len: u32) -> PageResult<EntryOffset> {
        if self.header.count == MAX_PAGE_OFFSET {
            return Err(PageError::OutOfSpace {
                required: record_len as u64,
                available: 0,
            });
        }

        let available = self.get_free_space();
        if record_len as u64 > available {
            tracing::trace!(
                page_id = self.header.page_id,
                record_len,
                available,
                "Page full"
            );
            return Err(PageError::OutOfSpace {
                required: record_len as u64,
                available,
            });
        }

        // entry_low_water <= MAX_PAGE_SIZE and record_len >= ENTRY_HEADER_SIZE,
        // so the offset always fits in 32 bits
        Ok((self.entry_low_water() - record_len as u64) as EntryOffset)
    }

    pub(crate) fn set_index_slot(&mut self, index: u32, offset: EntryOffset) {
        let at = HEADER_SIZE + index as usize * INDEX_SLOT_SIZE;
        self.buf.as_mut()[at..at + INDEX_SLOT_SIZE].copy_from_slice(&offset.to_le_bytes());
    }

    fn write_header(&mut self) {
        let bytes = self.header.to_bytes();
        self.buf.as_mut()[..HEADER_SIZE].copy_from_slice(&bytes);
    }
}

impl<B: AsRef<[u8]>> Page<B> {
    /// Return number of entries stored in page
    pub fn get_entries_count(&self) -> u32 {
        self.header.count
    }

    /// Returns amount of free space in bytes
    ///
    /// This is the largest record that can still be appended: the gap
    /// between index and records minus one more index slot.
    pub fn get_free_space(&self) -> u64 {
        self.entry_low_water()
            .saturating_sub(self.index_high_water() + INDEX_SLOT_SIZE as u64)
    }

    /// Check if a point lies inside the page bounding box
    pub fn inside_bbox(&self, key: ParamId, timestamp: Timestamp) -> bool {
        self.header.bbox.contains(key, timestamp)
    }

    /// Get length of the entry, 0 if `index` is out of range
    pub fn get_entry_length(&self, index: u32) -> u32 {
        self.read_entry(index).map(|e| e.length()).unwrap_or(0)
    }

    /// Copy entry from page to receiving buffer
    ///
    /// Returns 0 if `index` is out of range, `-length` if `receiver` is too
    /// small (nothing is written; retry with a buffer of `length` bytes), and
    /// `length` after copying the full record.
    pub fn copy_entry(&self, index: u32, receiver: &mut [u8]) -> i64 {
        match self.try_copy_entry(index, receiver) {
            Ok(length) => length as i64,
            Err(PageError::BufferTooSmall { required }) => -(required as i64),
            Err(_) => 0,
        }
    }

    /// Typed form of [`copy_entry`](Self::copy_entry)
    pub fn try_copy_entry(&self, index: u32, receiver: &mut [u8]) -> PageResult<u32> {
        let entry = self.read_entry(index).ok_or(PageError::IndexOutOfRange {
            index,
            count: self.header.count,
        })?;

        let record = entry.as_bytes();
        if receiver.len() < record.len() {
            return Err(PageError::BufferTooSmall {
                required: entry.length(),
            });
        }

        receiver[..record.len()].copy_from_slice(record);
        Ok(entry.length())
    }

    /// Get a view of the entry without copying, `None` if out of range
    pub fn read_entry(&self, index: u32) -> Option<EntryView<'_>> {
        if index >= self.header.count {
            return None;
        }
        self.read_entry_at(self.index_slot(index))
    }

    /// Get a view of the record stored at `offset`
    ///
    /// The offset is checked against the record region, so an offset from a
    /// stale generation of the page yields `None` or a view of whatever is
    /// stored there now, never an out-of-bounds read.
    pub fn read_entry_at(&self, offset: EntryOffset) -> Option<EntryView<'_>> {
        if self.header.count == 0 || (offset as u64) < self.entry_low_water() {
            return None;
        }
        EntryView::parse(self.buf.as_ref().get(offset as usize..)?)
    }

    /// Record offsets in index order
    pub fn offsets(&self) -> impl Iterator<Item = EntryOffset> + '_ {
        (0..self.header.count).map(move |i| self.index_slot(i))
    }

    pub fn page_id(&self) -> u32 {
        self.header.page_id
    }

    pub fn kind(&self) -> PageKind {
        self.header.kind
    }

    /// Total page size in bytes
    pub fn capacity(&self) -> u64 {
        self.header.length
    }

    /// How many times the page was cleared
    pub fn overwrite_generation(&self) -> u32 {
        self.header.overwrites_count
    }

    /// Offset of the most recently appended record, `None` while empty
    pub fn last_offset(&self) -> Option<EntryOffset> {
        (self.header.count > 0).then_some(self.header.last_offset)
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.header.bbox
    }

    pub fn header(&self) -> &PageHeader {
        &self.header
    }

    /// Snapshot of page counters
    pub fn stats(&self) -> PageStats {
        PageStats {
            page_id: self.header.page_id,
            kind: self.header.kind,
            entries: self.header.count,
            capacity: self.header.length,
            free_space: self.get_free_space(),
            overwrites: self.header.overwrites_count,
            bbox: (!self.header.bbox.is_empty()).then_some(self.header.bbox),
        }
    }

    /// Release the underlying buffer
    pub fn into_inner(self) -> B {
        self.buf
    }

    /// Key and timestamp of the entry at `index`
    pub(crate) fn entry_key(&self, index: u32) -> Option<(ParamId, Timestamp)> {
        let offset = self.index_slot(index) as usize;
        read_header(self.buf.as_ref().get(offset..)?).map(|(key, ts, _)| (key, ts))
    }

    pub(crate) fn index_slot(&self, index: u32) -> EntryOffset {
        debug_assert!(index < self.header.count);
        read_u32(self.buf.as_ref(), HEADER_SIZE + index as usize * INDEX_SLOT_SIZE)
    }

    fn index_high_water(&self) -> u64 {
        HEADER_SIZE as u64 + self.header.count as u64 * INDEX_SLOT_SIZE as u64
    }

    fn entry_low_water(&self) -> u64 {
        if self.header.count == 0 {
            self.header.length
        } else {
            self.header.last_offset as u64
        }
    }

    fn validate_index(&self) -> PageResult<()> {
        if self.header.count == 0 {
            return Ok(());
        }

        let low = self.entry_low_water();
        if low < self.index_high_water() || low > self.header.length {
            return Err(PageError::Corruption(format!(
                "Record region starts at {} but index ends at {}",
                low,
                self.index_high_water()
            )));
        }

        for index in 0..self.header.count {
            let offset = self.index_slot(index);
            if (offset as u64) < low
                || offset as u64 + ENTRY_HEADER_SIZE as u64 > self.header.length
                || self.read_entry(index).is_none()
            {
                return Err(PageError::Corruption(format!(
                    "Index slot {} points at invalid record offset {}",
                    index, offset
                )));
            }
        }

        Ok(())
    }
}

/// Page counters for logging and inspection
#[derive(Debug, Clone, Serialize)]
pub struct PageStats {
    pub page_id: u32,
    pub kind: PageKind,
    pub entries: u32,
    pub capacity: u64,
    pub free_space: u64,
    pub overwrites: u32,
    pub bbox: Option<BoundingBox>,
}

impl std::fmt::Display for PageStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Page: {} ({}), Entries: {}, Free: {}/{} bytes, Overwrites: {}",
            self.page_id, self.kind, self.entries, self.free_space, self.capacity, self.overwrites
        )?;
        if let Some(bbox) = &self.bbox {
            write!(
                f,
                ", Keys: {}..={}, Time: {}..={}",
                bbox.min_key, bbox.max_key, bbox.min_timestamp, bbox.max_timestamp
            )?;
        }
        Ok(())
    }
}
